//! Domain layer for swarm-council
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Mission
//!
//! A mission turns one business goal for one workspace into work:
//!
//! - **Decomposition**: the goal is split into dependency-ordered subtasks,
//!   each assigned to a specialist type
//! - **Council**: every specialist runs concurrently against one snapshot of
//!   the state; their thoughts form the blackboard
//! - **Supervisor**: a pure, quality-gated status machine decides whether to
//!   research, execute or complete
//!
//! ## Budget and cache
//!
//! Every inference call is accounted against the workspace's token ceiling,
//! and identical calls are memoized by a SHA-256 fingerprint.

pub mod budget;
pub mod cache;
pub mod core;
pub mod council;
pub mod mission;
pub mod prompt;
pub mod state;
pub mod supervisor;
pub mod telemetry;
pub mod util;

// Re-export commonly used types
pub use budget::{LedgerEntry, Pricing, TokenUsage, estimate_tokens};
pub use cache::{CacheKey, ConversationTurn};
pub use core::{
    error::{BudgetExceeded, DecompositionError, DomainError, SpecialistFailure, StateCorruption},
    ids::{MissionId, WorkspaceId},
};
pub use council::{
    Blackboard, CouncilRound, CouncilThought, Specialist, consensus_score, parse_thought_reply,
};
pub use mission::{
    Mission, MissionOutcome, MissionReport, MissionRequest, MissionStatus, PLACEHOLDER_GOAL,
    SubtaskId, SubtaskSpec, parse_decomposition,
};
pub use prompt::PromptTemplate;
pub use state::{
    AgentMessage, CostAccumulator, MessageKind, OrchestrationState, OrchestrationStatus,
    StateSnapshot, Transcript, TranscriptBudget,
};
pub use supervisor::{NextAction, RoutingPolicy, SupervisorDecision, SupervisorProposal};
pub use telemetry::{Component, EventOutcome, TelemetryEvent};
