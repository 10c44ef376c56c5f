//! Mission outcomes
//!
//! A mission never fails with an error at its boundary: every failure is
//! folded into a [`MissionStatus`] and handed back inside a
//! [`MissionOutcome`] together with whatever partial results exist.

use super::entities::{Mission, SubtaskId, SubtaskSpec};
use crate::council::thought::CouncilThought;
use crate::state::message::AgentMessage;
use crate::state::orchestration::CostAccumulator;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Terminal status of a mission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionStatus {
    /// Reached COMPLETE with every specialist contributing
    Completed,
    /// Reached COMPLETE, but at least one fallback thought was used
    Degraded,
    /// Workspace budget ran out
    BudgetExceeded,
    /// The goal could not be decomposed
    DecompositionFailed,
    /// Iteration ceiling reached before COMPLETE
    IterationLimitReached,
    /// Wall-clock ceiling reached before COMPLETE
    TimedOut,
    /// An orchestration invariant was violated
    StateCorruption,
    /// Cancelled by the caller
    Cancelled,
}

impl MissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MissionStatus::Completed => "completed",
            MissionStatus::Degraded => "degraded",
            MissionStatus::BudgetExceeded => "budget_exceeded",
            MissionStatus::DecompositionFailed => "decomposition_failed",
            MissionStatus::IterationLimitReached => "iteration_limit_reached",
            MissionStatus::TimedOut => "timed_out",
            MissionStatus::StateCorruption => "state_corruption",
            MissionStatus::Cancelled => "cancelled",
        }
    }

    /// Reached COMPLETE, with or without fallbacks.
    pub fn is_success(&self) -> bool {
        matches!(self, MissionStatus::Completed | MissionStatus::Degraded)
    }

    pub fn is_failure(&self) -> bool {
        !self.is_success()
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, MissionStatus::Degraded)
    }
}

impl std::fmt::Display for MissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Everything a mission hands back to its caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionOutcome {
    pub mission: Mission,
    pub status: MissionStatus,
    /// Retained transcript, in sequence order
    pub messages: Vec<AgentMessage>,
    /// Messages dropped by transcript eviction
    pub evicted_messages: u64,
    pub context_variables: Map<String, Value>,
    pub last_agent: Option<String>,
    pub quality_score: f64,
    /// Blackboard contents, in round then registration order
    pub thoughts: Vec<CouncilThought>,
    pub subtasks: Vec<SubtaskSpec>,
    /// Planned subtasks never addressed by a non-degraded thought
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unaddressed_subtasks: Vec<SubtaskId>,
    pub cost: CostAccumulator,
    /// Supervisor steps taken
    pub iterations: usize,
    pub rounds: usize,
    /// Human-readable reason for a non-success status
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MissionOutcome {
    pub fn degraded_thoughts(&self) -> usize {
        self.thoughts.iter().filter(|t| t.degraded).count()
    }

    /// Content of the last real thought, if any.
    pub fn final_answer(&self) -> Option<&str> {
        self.thoughts
            .iter()
            .rev()
            .find(|t| !t.degraded)
            .map(|t| t.content.as_str())
    }

    /// Compact view for callers that only need the headline.
    pub fn report(&self) -> MissionReport {
        MissionReport {
            mission_id: self.mission.id().to_string(),
            status: self.status,
            transcript: self
                .messages
                .iter()
                .map(|m| format!("[{}] {}", m.role, m.content))
                .collect(),
            quality_score: self.quality_score,
            last_agent: self.last_agent.clone(),
            cost_usd: self.cost.cost_usd(),
            tokens: self.cost.tokens(),
        }
    }
}

/// Compact mission report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionReport {
    pub mission_id: String,
    pub status: MissionStatus,
    pub transcript: Vec<String>,
    pub quality_score: f64,
    pub last_agent: Option<String>,
    pub cost_usd: f64,
    pub tokens: u64,
}
