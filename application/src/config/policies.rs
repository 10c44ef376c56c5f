//! Retry, budget and cache policies.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use swarm_domain::{Pricing, WorkspaceId};

/// Bounded exponential backoff with jitter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Fraction of the delay randomized away, 0..=1.
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(5),
            jitter: 0.2,
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (1 = first retry).
    ///
    /// `entropy` picks the jitter; equal inputs give equal delays.
    pub fn delay_for(&self, attempt: u32, entropy: u64) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        let raw = self.base_delay.saturating_mul(1u32 << exp);
        let capped = raw.min(self.max_delay);

        let jitter = self.jitter.clamp(0.0, 1.0);
        if jitter == 0.0 {
            return capped;
        }
        let unit = (entropy % 10_000) as f64 / 10_000.0;
        capped.mul_f64(1.0 - jitter * unit)
    }

    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.max_attempts == 0 {
            issues.push("retry: max_attempts must be >= 1".to_string());
        }
        if self.max_delay < self.base_delay {
            issues.push("retry: max_delay_ms must be >= base_delay_ms".to_string());
        }
        if !(0.0..=1.0).contains(&self.jitter) {
            issues.push(format!("retry: jitter ({}) must be within 0..=1", self.jitter));
        }
        issues
    }
}

/// Token ceilings and pricing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetPolicy {
    /// Ceiling for workspaces without an override.
    pub default_ceiling: u64,
    pub workspace_ceilings: HashMap<WorkspaceId, u64>,
    pub pricing: Pricing,
}

impl Default for BudgetPolicy {
    fn default() -> Self {
        Self {
            default_ceiling: 200_000,
            workspace_ceilings: HashMap::new(),
            pricing: Pricing::default(),
        }
    }
}

impl BudgetPolicy {
    pub fn with_default_ceiling(mut self, ceiling: u64) -> Self {
        self.default_ceiling = ceiling;
        self
    }

    pub fn with_workspace_ceiling(mut self, workspace: impl Into<WorkspaceId>, ceiling: u64) -> Self {
        self.workspace_ceilings.insert(workspace.into(), ceiling);
        self
    }

    pub fn with_pricing(mut self, pricing: Pricing) -> Self {
        self.pricing = pricing;
        self
    }

    /// Ceiling for `workspace`; unknown workspaces get the default.
    pub fn ceiling_for(&self, workspace: &WorkspaceId) -> u64 {
        self.workspace_ceilings
            .get(workspace)
            .copied()
            .unwrap_or(self.default_ceiling)
    }
}

/// Thought cache sizing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachePolicy {
    pub enabled: bool,
    pub capacity: usize,
    /// `None` keeps entries until evicted by capacity.
    pub ttl: Option<Duration>,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: 1_024,
            ttl: Some(Duration::from_secs(3_600)),
        }
    }
}

impl CachePolicy {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.enabled && self.capacity == 0 {
            issues.push("cache: capacity must be >= 1 when enabled".to_string());
        }
        if self.ttl.is_some_and(|ttl| ttl.is_zero()) {
            issues.push("cache: ttl_seconds cannot be 0".to_string());
        }
        issues
    }
}
