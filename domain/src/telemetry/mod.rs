//! Structured telemetry events.
//!
//! Events are emitted for every specialist invocation (dispatch, cache hit,
//! success, fallback), every decomposition and every supervisor decision.
//! They are separate from tracing logs and consumed by telemetry sinks.

use crate::core::ids::WorkspaceId;
use crate::council::specialist::Specialist;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Emitting component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    Decomposer,
    Specialist(Specialist),
    Supervisor,
    Orchestrator,
}

impl Component {
    pub fn label(&self) -> String {
        match self {
            Component::Decomposer => "decomposer".to_string(),
            Component::Specialist(s) => format!("specialist:{}", s.as_str()),
            Component::Supervisor => "supervisor".to_string(),
            Component::Orchestrator => "orchestrator".to_string(),
        }
    }
}

impl std::fmt::Display for Component {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// What happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventOutcome {
    /// Work handed to a component
    Dispatched,
    /// Served from the thought cache at zero cost
    CacheHit,
    Success,
    /// Failure absorbed by a fallback value
    Fallback,
    /// Failure that ended the operation
    Failure,
    /// Spend refused before any call was made
    BudgetDenied,
    /// Committed usage exceeded its reservation
    BudgetOverrun,
    /// Supervisor routing decision
    Decision,
}

impl EventOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventOutcome::Dispatched => "dispatched",
            EventOutcome::CacheHit => "cache_hit",
            EventOutcome::Success => "success",
            EventOutcome::Fallback => "fallback",
            EventOutcome::Failure => "failure",
            EventOutcome::BudgetDenied => "budget_denied",
            EventOutcome::BudgetOverrun => "budget_overrun",
            EventOutcome::Decision => "decision",
        }
    }

    /// Ends a dispatched unit of work.
    pub fn resolves_dispatch(&self) -> bool {
        matches!(
            self,
            EventOutcome::CacheHit
                | EventOutcome::Success
                | EventOutcome::Fallback
                | EventOutcome::Failure
        )
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, EventOutcome::Fallback | EventOutcome::Failure)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryEvent {
    pub component: Component,
    pub outcome: EventOutcome,
    pub latency_ms: u64,
    pub cost_usd: f64,
    pub tokens: u64,
    pub workspace_id: WorkspaceId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl TelemetryEvent {
    pub fn new(component: Component, outcome: EventOutcome, workspace_id: WorkspaceId) -> Self {
        Self {
            component,
            outcome,
            latency_ms: 0,
            cost_usd: 0.0,
            tokens: 0,
            workspace_id,
            detail: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency_ms = latency.as_millis() as u64;
        self
    }

    pub fn with_spend(mut self, tokens: u64, cost_usd: f64) -> Self {
        self.tokens = tokens;
        self.cost_usd = cost_usd;
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_component_label() {
        assert_eq!(Component::Specialist(Specialist::Qa).label(), "specialist:qa");
        assert_eq!(Component::Decomposer.to_string(), "decomposer");
    }

    #[test]
    fn test_outcome_classification() {
        assert!(EventOutcome::CacheHit.resolves_dispatch());
        assert!(!EventOutcome::Dispatched.resolves_dispatch());
        assert!(EventOutcome::Fallback.is_failure());
        assert!(!EventOutcome::BudgetDenied.is_failure());
    }

    #[test]
    fn test_event_serializes_snake_case() {
        let event = TelemetryEvent::new(
            Component::Specialist(Specialist::Research),
            EventOutcome::CacheHit,
            WorkspaceId::new("w1"),
        )
        .with_latency(Duration::from_millis(12));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["outcome"], "cache_hit");
        assert_eq!(json["component"]["specialist"], "research");
        assert_eq!(json["latency_ms"], 12);
        assert_eq!(json["cost_usd"], 0.0);
        assert!(json.get("detail").is_none());
    }
}
