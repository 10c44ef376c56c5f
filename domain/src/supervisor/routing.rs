//! Supervisor routing: the pure transition function.
//!
//! | Status | Condition | Next | Council round |
//! |--------|-----------|------|---------------|
//! | Planning | always | Researching | research |
//! | Researching | no real contribution yet | Researching | research |
//! | Researching | quality >= threshold | Executing | execution |
//! | Researching | quality < threshold | Researching | research |
//! | Executing | quality >= threshold | Complete | none |
//! | Executing | quality < threshold | Researching | research |
//! | Complete | always | Complete | none |
//!
//! A guided proposal may only pick among the edges the quality gate allows.

use crate::state::status::OrchestrationStatus;
use crate::state::transcript::Transcript;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::str::FromStr;

/// Default quality threshold below which work is sent back to research.
pub const DEFAULT_QUALITY_THRESHOLD: f64 = 0.7;

/// Routing label chosen by the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextAction {
    /// Run (another) research round
    Research,
    /// Run an execution round
    Execute,
    /// Finish the mission
    Complete,
    /// Stay in the current status and re-run its round
    Stay,
}

impl NextAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            NextAction::Research => "research",
            NextAction::Execute => "execute",
            NextAction::Complete => "complete",
            NextAction::Stay => "stay",
        }
    }
}

impl std::fmt::Display for NextAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Never fails: unrecognized labels become [`NextAction::Stay`].
impl FromStr for NextAction {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        Ok(match normalized.as_str() {
            "research" | "researching" | "revise" | "refine" | "back_to_research" => {
                NextAction::Research
            }
            "execute" | "executing" | "execution" | "build" | "deliver" => NextAction::Execute,
            "complete" | "completed" | "finish" | "done" | "end" => NextAction::Complete,
            _ => NextAction::Stay,
        })
    }
}

/// Routing proposal from a guided supervisor consultation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupervisorProposal {
    pub next_action: NextAction,
    pub rationale: String,
    pub instructions: Option<String>,
}

/// Parse a guided supervisor reply.
///
/// Expects a JSON object `{"next_action", "rationale", "instructions"}`,
/// possibly wrapped in prose or a fenced block. Returns `None` when no JSON
/// object is present; a missing or unknown `next_action` yields `Stay`.
pub fn parse_supervisor_reply(reply: &str) -> Option<SupervisorProposal> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    if start >= end {
        return None;
    }
    let parsed: serde_json::Value = serde_json::from_str(&reply[start..=end]).ok()?;

    let next_action = parsed
        .get("next_action")
        .or_else(|| parsed.get("action"))
        .and_then(|v| v.as_str())
        .map(|label| label.parse().unwrap_or(NextAction::Stay))
        .unwrap_or(NextAction::Stay);

    let rationale = parsed
        .get("rationale")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .trim()
        .to_string();

    let instructions = parsed
        .get("instructions")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    Some(SupervisorProposal {
        next_action,
        rationale,
        instructions,
    })
}

/// Outcome of one supervisor step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupervisorDecision {
    pub next_action: NextAction,
    pub next_status: OrchestrationStatus,
    pub rationale: String,
    pub instructions: Option<String>,
    /// Whether a council round runs under `next_status`
    pub run_council: bool,
    /// Whether a guided proposal determined the route
    pub followed_proposal: bool,
}

impl SupervisorDecision {
    fn rules(next_action: NextAction, next_status: OrchestrationStatus, rationale: String) -> Self {
        Self {
            next_action,
            next_status,
            rationale,
            instructions: None,
            run_council: next_status.runs_council(),
            followed_proposal: false,
        }
    }

    /// Node name recorded as `next_node`.
    pub fn node(&self) -> &'static str {
        if self.run_council { "council" } else { "end" }
    }
}

/// Quality-gated routing policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoutingPolicy {
    pub quality_threshold: f64,
}

impl Default for RoutingPolicy {
    fn default() -> Self {
        Self {
            quality_threshold: DEFAULT_QUALITY_THRESHOLD,
        }
    }
}

impl RoutingPolicy {
    pub fn new(quality_threshold: f64) -> Self {
        Self { quality_threshold }
    }

    fn passes(&self, quality: f64) -> bool {
        quality >= self.quality_threshold
    }

    /// Pure transition function.
    ///
    /// `proposal` only chooses among the edges the quality gate permits;
    /// anything else is overridden by the rules.
    pub fn decide(
        &self,
        status: OrchestrationStatus,
        quality: f64,
        messages: &Transcript,
        proposal: Option<&SupervisorProposal>,
    ) -> SupervisorDecision {
        use OrchestrationStatus::*;

        let rules = self.rules(status, quality, messages.has_contribution());

        let Some(proposal) = proposal else {
            return rules;
        };

        let passes = self.passes(quality);
        let proposed = match (status, proposal.next_action) {
            (Researching, NextAction::Research | NextAction::Stay) => Some(Researching),
            (Researching, NextAction::Execute) if passes && messages.has_contribution() => {
                Some(Executing)
            }
            (Executing, NextAction::Research) => Some(Researching),
            (Executing, NextAction::Execute | NextAction::Stay) if passes => Some(Executing),
            (Executing, NextAction::Complete) if passes => Some(Complete),
            _ => None,
        };

        match proposed {
            Some(next_status) => SupervisorDecision {
                next_action: proposal.next_action,
                next_status,
                rationale: if proposal.rationale.is_empty() {
                    rules.rationale
                } else {
                    proposal.rationale.clone()
                },
                instructions: proposal.instructions.clone(),
                run_council: next_status.runs_council(),
                followed_proposal: true,
            },
            None => SupervisorDecision {
                rationale: format!(
                    "{} (proposal '{}' overridden)",
                    rules.rationale, proposal.next_action
                ),
                instructions: proposal.instructions.clone(),
                ..rules
            },
        }
    }

    fn rules(&self, status: OrchestrationStatus, quality: f64, contributed: bool) -> SupervisorDecision {
        use OrchestrationStatus::*;

        let threshold = self.quality_threshold;
        match status {
            Planning => SupervisorDecision::rules(
                NextAction::Research,
                Researching,
                "Plan ready, starting research".to_string(),
            ),
            Researching if !contributed => SupervisorDecision::rules(
                NextAction::Stay,
                Researching,
                "No specialist contribution yet, repeating research".to_string(),
            ),
            Researching if self.passes(quality) => SupervisorDecision::rules(
                NextAction::Execute,
                Executing,
                format!("Quality {:.2} >= {:.2}, moving to execution", quality, threshold),
            ),
            Researching => SupervisorDecision::rules(
                NextAction::Research,
                Researching,
                format!("Quality {:.2} < {:.2}, researching further", quality, threshold),
            ),
            Executing if self.passes(quality) => SupervisorDecision::rules(
                NextAction::Complete,
                Complete,
                format!("Quality {:.2} >= {:.2}, mission complete", quality, threshold),
            ),
            Executing => SupervisorDecision::rules(
                NextAction::Research,
                Researching,
                format!("Quality {:.2} < {:.2}, back to research", quality, threshold),
            ),
            Complete => SupervisorDecision::rules(
                NextAction::Complete,
                Complete,
                "Mission already complete".to_string(),
            ),
        }
    }
}
