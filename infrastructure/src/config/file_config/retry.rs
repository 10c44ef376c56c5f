//! Retry configuration from TOML (`[retry]` section)

use super::ConfigValidationError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use swarm_application::RetryPolicy;

/// Backoff for transient inference errors.
///
/// # Example
///
/// ```toml
/// [retry]
/// max_attempts = 3
/// base_delay_ms = 250
/// max_delay_ms = 5000
/// jitter = 0.2
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRetryConfig {
    /// Total attempts including the first
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    /// Fraction of each delay randomized away
    pub jitter: f64,
}

impl Default for FileRetryConfig {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            base_delay_ms: policy.base_delay.as_millis() as u64,
            max_delay_ms: policy.max_delay.as_millis() as u64,
            jitter: policy.jitter,
        }
    }
}

impl FileRetryConfig {
    pub fn to_retry_policy(&self) -> (RetryPolicy, Vec<ConfigValidationError>) {
        let policy = RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            jitter: self.jitter,
        };
        let issues = ConfigValidationError::constraints(policy.validate());
        (policy, issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_config_roundtrips_defaults() {
        let (policy, issues) = FileRetryConfig::default().to_retry_policy();
        assert_eq!(policy, RetryPolicy::default());
        assert!(issues.is_empty());
    }

    #[test]
    fn test_inverted_delays_are_reported() {
        let config = FileRetryConfig {
            base_delay_ms: 1000,
            max_delay_ms: 10,
            ..Default::default()
        };
        let (_, issues) = config.to_retry_policy();
        assert_eq!(issues.len(), 1);
    }
}
