//! Missions, their decomposition into subtasks, and mission outcomes.
//!
//! - [`entities::Mission`] - immutable request record
//! - [`entities::SubtaskSpec`] - one unit of work for one specialist type
//! - [`parsing::parse_decomposition`] - decomposer reply → ordered subtasks
//! - [`request::MissionRequest`] - what a caller submits
//! - [`outcome::MissionOutcome`] - what a mission hands back to its caller

pub mod entities;
pub mod outcome;
pub mod parsing;
pub mod request;
pub mod schedule;

pub use entities::{Mission, PLACEHOLDER_GOAL, SubtaskId, SubtaskSpec};
pub use outcome::{MissionOutcome, MissionReport, MissionStatus};
pub use parsing::{parse_decomposition, parse_decomposition_json};
pub use request::MissionRequest;
pub use schedule::order_subtasks;
