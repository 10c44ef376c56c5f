//! Council thoughts and specialist reply parsing.

use super::specialist::Specialist;
use crate::core::error::SpecialistFailure;
use crate::mission::entities::SubtaskId;
use serde::{Deserialize, Serialize};

/// Confidence assumed when a reply does not state one.
pub const NEUTRAL_CONFIDENCE: f64 = 0.5;

/// One specialist's contribution to one council round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouncilThought {
    /// Stable agent id, `<specialist>` (e.g. `research`)
    pub agent_id: String,
    pub specialist: Specialist,
    /// Round number (1-indexed)
    pub round: usize,
    pub content: String,
    /// Self-reported confidence in 0..=1; 0 for degraded thoughts
    pub confidence: f64,
    #[serde(default)]
    pub tool_observations: Vec<String>,
    /// Substitute produced after a failure
    pub degraded: bool,
    /// Why the specialist failed, when degraded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    /// Subtasks this thought claims to have addressed
    #[serde(default)]
    pub addressed_subtasks: Vec<SubtaskId>,
    /// Served from the thought cache
    #[serde(default)]
    pub cached: bool,
}

impl CouncilThought {
    pub fn new(specialist: Specialist, round: usize, content: impl Into<String>, confidence: f64) -> Self {
        Self {
            agent_id: specialist.as_str().to_string(),
            specialist,
            round,
            content: content.into(),
            confidence: unit_interval(confidence),
            tool_observations: Vec::new(),
            degraded: false,
            failure: None,
            addressed_subtasks: Vec::new(),
            cached: false,
        }
    }

    /// Deterministic substitute for a failed specialist.
    pub fn fallback(specialist: Specialist, round: usize, failure: &SpecialistFailure) -> Self {
        Self {
            content: format!(
                "{} could not contribute this round ({}). Continuing with the remaining council.",
                specialist.display_name(),
                failure
            ),
            confidence: 0.0,
            degraded: true,
            failure: Some(failure.to_string()),
            ..Self::new(specialist, round, "", 0.0)
        }
    }

    pub fn with_addressed(mut self, subtasks: Vec<SubtaskId>) -> Self {
        self.addressed_subtasks = subtasks;
        self
    }

    pub fn with_observations(mut self, observations: Vec<String>) -> Self {
        self.tool_observations = observations;
        self
    }

    pub fn mark_cached(mut self) -> Self {
        self.cached = true;
        self
    }

    /// Confidence counted toward the consensus score.
    pub fn effective_confidence(&self) -> f64 {
        if self.degraded || !self.confidence.is_finite() {
            0.0
        } else {
            self.confidence
        }
    }
}

/// Structured fields recovered from a specialist reply.
#[derive(Debug, Clone, PartialEq)]
pub struct ThoughtReply {
    pub content: String,
    pub confidence: f64,
    /// `None` when the reply did not say which subtasks it addressed
    pub addressed_subtasks: Option<Vec<SubtaskId>>,
    pub tool_observations: Vec<String>,
}

/// Parse a specialist reply.
///
/// # Supported Formats
///
/// 1. **JSON** (preferred): `{"content": "...", "confidence": 0.8,
///    "addressed_subtasks": ["1"], "tool_observations": []}`
/// 2. **Free text** with a `Confidence: 0.8`, `Confidence: 80%` or
///    `Confidence: 8/10` line
///
/// Confidence is clamped to 0..=1 and defaults to [`NEUTRAL_CONFIDENCE`].
///
/// ```
/// use swarm_domain::council::parse_thought_reply;
///
/// let reply = parse_thought_reply(r#"{"content": "Target SMBs", "confidence": 0.9}"#);
/// assert_eq!(reply.content, "Target SMBs");
/// assert_eq!(reply.confidence, 0.9);
///
/// let reply = parse_thought_reply("Ship on Friday.\nConfidence: 7/10");
/// assert_eq!(reply.confidence, 0.7);
/// ```
pub fn parse_thought_reply(reply: &str) -> ThoughtReply {
    if let Some(start) = reply.find('{')
        && let Some(end) = reply.rfind('}')
        && start < end
        && let Ok(parsed) = serde_json::from_str::<serde_json::Value>(&reply[start..=end])
        && let Some(content) = parsed
            .get("content")
            .or_else(|| parsed.get("thought"))
            .and_then(|v| v.as_str())
    {
        let confidence = parsed
            .get("confidence")
            .and_then(|v| v.as_f64())
            .map(normalize_confidence)
            .unwrap_or(NEUTRAL_CONFIDENCE);

        let addressed_subtasks = parsed
            .get("addressed_subtasks")
            .and_then(|v| v.as_array())
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| match id {
                        serde_json::Value::String(s) => Some(SubtaskId::new(s.trim())),
                        serde_json::Value::Number(n) => Some(SubtaskId::new(n.to_string())),
                        _ => None,
                    })
                    .collect()
            });

        let tool_observations = parsed
            .get("tool_observations")
            .and_then(|v| v.as_array())
            .map(|obs| {
                obs.iter()
                    .filter_map(|o| o.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();

        return ThoughtReply {
            content: content.trim().to_string(),
            confidence,
            addressed_subtasks,
            tool_observations,
        };
    }

    let mut confidence = NEUTRAL_CONFIDENCE;
    let mut body = Vec::new();
    for line in reply.lines() {
        let lower = line.trim().to_lowercase();
        if let Some(rest) = lower.strip_prefix("confidence")
            && let Some(value) = parse_confidence_value(rest.trim_start_matches([':', ' ', '=']))
        {
            confidence = value;
            continue;
        }
        body.push(line);
    }

    ThoughtReply {
        content: body.join("\n").trim().to_string(),
        confidence,
        addressed_subtasks: None,
        tool_observations: Vec::new(),
    }
}

fn parse_confidence_value(raw: &str) -> Option<f64> {
    let raw = raw.trim().trim_end_matches('.');
    if let Some(num) = raw.strip_suffix("/10") {
        return num.trim().parse::<f64>().ok().map(|n| unit_interval(n / 10.0));
    }
    if let Some(num) = raw.strip_suffix('%') {
        return num.trim().parse::<f64>().ok().map(|n| unit_interval(n / 100.0));
    }
    raw.parse::<f64>().ok().map(normalize_confidence)
}

/// Values above 1 are read as percentages.
fn normalize_confidence(value: f64) -> f64 {
    if value > 1.0 {
        unit_interval(value / 100.0)
    } else {
        unit_interval(value)
    }
}

/// Clamp into 0..=1; `NaN` and infinities become [`NEUTRAL_CONFIDENCE`].
fn unit_interval(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        NEUTRAL_CONFIDENCE
    }
}
