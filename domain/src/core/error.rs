//! Domain error types
//!
//! The taxonomy mirrors how far a failure is allowed to travel:
//!
//! | Error | Scope | Recovery |
//! |-------|-------|----------|
//! | [`DecompositionError`] | mission | fatal, mission stops before the loop |
//! | [`BudgetExceeded`] | mission | fatal, partial results stay usable |
//! | [`SpecialistFailure`] | one specialist in one round | fallback thought |
//! | [`StateCorruption`] | mission | halt, no repair |
//!
//! Transient inference errors live next to the gateway port in the
//! application layer, since only the retry loop cares about them.

use crate::state::status::OrchestrationStatus;
use std::time::Duration;
use thiserror::Error;

/// Failure to turn a goal into an executable list of subtasks.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecompositionError {
    #[error("Decomposition inference failed: {0}")]
    Inference(String),

    #[error("Decomposition reply could not be parsed: {0}")]
    Unparsable(String),

    #[error("Decomposition produced no subtasks")]
    Empty,

    #[error("Subtask {subtask} has unknown specialist type '{value}'")]
    UnknownSpecialist { subtask: String, value: String },

    #[error("Subtask {subtask} has no objective")]
    MissingObjective { subtask: String },

    #[error("Duplicate subtask id: {0}")]
    DuplicateId(String),

    #[error("Subtask {subtask} depends on unknown subtask {dependency}")]
    DanglingDependency { subtask: String, dependency: String },

    #[error("Dependency cycle between subtasks: {}", .0.join(", "))]
    DependencyCycle(Vec<String>),
}

/// A workspace ran out of token budget.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Budget exceeded for workspace {workspace_id}: {used} of {ceiling} tokens committed")]
pub struct BudgetExceeded {
    pub workspace_id: String,
    pub used: u64,
    pub ceiling: u64,
}

/// Why a single specialist failed to produce a real thought.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpecialistFailure {
    #[error("inference failed: {0}")]
    Inference(String),

    #[error("timed out after {}ms", .0.as_millis())]
    TimedOut(Duration),

    #[error("{0}")]
    Budget(BudgetExceeded),

    #[error("task aborted: {0}")]
    Aborted(String),
}

/// An invariant of the orchestration state was violated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StateCorruption {
    #[error("Illegal status transition {from} -> {to}")]
    IllegalTransition {
        from: OrchestrationStatus,
        to: OrchestrationStatus,
    },

    #[error("Quality score {0} is outside 0..=1")]
    QualityOutOfRange(f64),

    #[error("Subtask {subtask} depends on {dependency}, which is not in the batch")]
    DanglingDependency { subtask: String, dependency: String },

    #[error("Subtask specs were already set for this mission")]
    SubtasksAlreadySet,
}

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error(transparent)]
    Decomposition(#[from] DecompositionError),

    #[error(transparent)]
    BudgetExceeded(#[from] BudgetExceeded),

    #[error(transparent)]
    StateCorruption(#[from] StateCorruption),

    #[error("Operation cancelled")]
    Cancelled,
}

impl DomainError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DomainError::Cancelled)
    }
}
