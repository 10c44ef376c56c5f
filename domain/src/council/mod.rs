//! Council of specialists
//!
//! - [`Specialist`] - closed set of roles fanned out every round
//! - [`CouncilThought`] - one specialist's contribution to one round
//! - [`CouncilRound`] / [`Blackboard`] - barrier results and their history

pub mod blackboard;
pub mod specialist;
pub mod thought;

pub use blackboard::{Blackboard, CouncilRound, consensus_score};
pub use specialist::{Specialist, UnknownSpecialist};
pub use thought::{CouncilThought, NEUTRAL_CONFIDENCE, ThoughtReply, parse_thought_reply};
