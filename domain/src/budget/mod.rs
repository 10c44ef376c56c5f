//! Token budget accounting types.

use crate::core::ids::WorkspaceId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tokens reported by one inference call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
        }
    }

    pub fn total(&self) -> u64 {
        self.prompt_tokens.saturating_add(self.completion_tokens)
    }

    /// Rough estimate for gateways that report nothing: ~4 bytes per token.
    pub fn estimate(prompt: &str, completion: &str) -> Self {
        Self {
            prompt_tokens: estimate_tokens(prompt),
            completion_tokens: estimate_tokens(completion),
        }
    }
}

/// ~4 bytes per token, at least 1 for non-empty text.
pub fn estimate_tokens(text: &str) -> u64 {
    if text.is_empty() {
        0
    } else {
        (text.len() as u64).div_ceil(4)
    }
}

/// USD price per 1k tokens.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pricing {
    pub prompt_per_1k: f64,
    pub completion_per_1k: f64,
}

impl Default for Pricing {
    fn default() -> Self {
        Self {
            prompt_per_1k: 0.0005,
            completion_per_1k: 0.0015,
        }
    }
}

impl Pricing {
    pub fn free() -> Self {
        Self {
            prompt_per_1k: 0.0,
            completion_per_1k: 0.0,
        }
    }

    pub fn cost_of(&self, usage: TokenUsage) -> f64 {
        (usage.prompt_tokens as f64 * self.prompt_per_1k
            + usage.completion_tokens as f64 * self.completion_per_1k)
            / 1000.0
    }
}

/// One recorded spend. Entries only accumulate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub workspace_id: WorkspaceId,
    pub tokens_used: u64,
    pub cost_usd: f64,
    /// Who spent it (`specialist:research`, `planner`, `supervisor`)
    pub label: String,
    pub timestamp: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn new(
        workspace_id: WorkspaceId,
        tokens_used: u64,
        cost_usd: f64,
        label: impl Into<String>,
    ) -> Self {
        Self {
            workspace_id,
            tokens_used,
            cost_usd: cost_usd.max(0.0),
            label: label.into(),
            timestamp: Utc::now(),
        }
    }
}
