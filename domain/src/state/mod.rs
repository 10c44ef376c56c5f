//! Orchestration state
//!
//! - [`OrchestrationStatus`] - the supervisor's status machine
//! - [`Transcript`] - bounded, ordered, append-only message log
//! - [`OrchestrationState`] - the single mutable object of a mission
//! - [`StateSnapshot`] - what a council round is allowed to read

pub mod message;
pub mod orchestration;
pub mod status;
pub mod transcript;

pub use message::{AgentMessage, MessageKind};
pub use orchestration::{
    CostAccumulator, OrchestrationState, SUPERVISOR_INSTRUCTIONS_KEY, StateSnapshot,
};
pub use status::OrchestrationStatus;
pub use transcript::{Transcript, TranscriptBudget};
