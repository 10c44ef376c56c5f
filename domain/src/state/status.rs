//! Orchestration status machine.
//!
//! ```text
//! PLANNING ──▶ RESEARCHING ──▶ EXECUTING ──▶ COMPLETE
//!                 ▲    │  ▲         │
//!                 └────┘  └─────────┘   (quality below threshold)
//! ```

use serde::{Deserialize, Serialize};

/// Status of the orchestration loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrchestrationStatus {
    /// Decomposition is done, no council round has run yet
    #[default]
    Planning,
    /// Council gathers and refines findings
    Researching,
    /// Council turns findings into deliverables
    Executing,
    /// Terminal
    Complete,
}

impl OrchestrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrchestrationStatus::Planning => "planning",
            OrchestrationStatus::Researching => "researching",
            OrchestrationStatus::Executing => "executing",
            OrchestrationStatus::Complete => "complete",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            OrchestrationStatus::Planning => "Planning",
            OrchestrationStatus::Researching => "Researching",
            OrchestrationStatus::Executing => "Executing",
            OrchestrationStatus::Complete => "Complete",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrchestrationStatus::Complete)
    }

    /// Whether a council round runs while in this status.
    pub fn runs_council(&self) -> bool {
        matches!(
            self,
            OrchestrationStatus::Researching | OrchestrationStatus::Executing
        )
    }

    /// Edges of the machine. Staying put is always allowed except from
    /// `Complete`, which has no outgoing edges besides itself.
    pub fn can_transition_to(&self, next: OrchestrationStatus) -> bool {
        use OrchestrationStatus::*;
        matches!(
            (self, next),
            (Planning, Planning)
                | (Planning, Researching)
                | (Researching, Researching)
                | (Researching, Executing)
                | (Executing, Executing)
                | (Executing, Researching)
                | (Executing, Complete)
                | (Complete, Complete)
        )
    }
}

impl std::fmt::Display for OrchestrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
