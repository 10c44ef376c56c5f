//! Transcript messages

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What produced a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// The mission goal as submitted
    Goal,
    /// Decomposition summary
    Plan,
    /// A real specialist thought
    Thought,
    /// A substitute thought produced after a specialist failure
    Fallback,
    /// A supervisor routing decision
    Decision,
    /// Orchestrator notices (stops, budget, timeouts)
    System,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Goal => "goal",
            MessageKind::Plan => "plan",
            MessageKind::Thought => "thought",
            MessageKind::Fallback => "fallback",
            MessageKind::Decision => "decision",
            MessageKind::System => "system",
        }
    }
}

/// An entry of the mission transcript. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMessage {
    /// Strictly increasing insertion sequence number
    pub seq: u64,
    /// Author: a specialist id, `supervisor`, `decomposer`, `user` or `orchestrator`
    pub role: String,
    pub kind: MessageKind,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl AgentMessage {
    pub(crate) fn new(
        seq: u64,
        role: impl Into<String>,
        kind: MessageKind,
        content: impl Into<String>,
    ) -> Self {
        Self {
            seq,
            role: role.into(),
            kind,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Real (non-substitute) specialist contribution.
    pub fn is_contribution(&self) -> bool {
        self.kind == MessageKind::Thought
    }
}
