//! Health configuration from TOML (`[health]` section)

use super::ConfigValidationError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use swarm_application::HealthThresholds;

/// Thresholds for the end-of-mission health report.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileHealthConfig {
    pub degraded_failure_rate: f64,
    pub unhealthy_failure_rate: f64,
    /// Unresolved dispatches tolerated
    pub max_backlog: u64,
    pub max_mean_latency_ms: u64,
}

impl Default for FileHealthConfig {
    fn default() -> Self {
        let thresholds = HealthThresholds::default();
        Self {
            degraded_failure_rate: thresholds.degraded_failure_rate,
            unhealthy_failure_rate: thresholds.unhealthy_failure_rate,
            max_backlog: thresholds.max_backlog,
            max_mean_latency_ms: thresholds.max_mean_latency.as_millis() as u64,
        }
    }
}

impl FileHealthConfig {
    /// Convert to [`HealthThresholds`]. Invalid rates fall back to the
    /// defaults.
    pub fn to_thresholds(&self) -> (HealthThresholds, Vec<ConfigValidationError>) {
        let mut issues = Vec::new();
        let rates = [self.degraded_failure_rate, self.unhealthy_failure_rate];
        if rates.iter().any(|r| !(0.0..=1.0).contains(r)) {
            issues.push(ConfigValidationError::invalid(
                "health",
                "failure rates must be within 0..=1",
            ));
        } else if self.degraded_failure_rate > self.unhealthy_failure_rate {
            issues.push(ConfigValidationError::invalid(
                "health",
                "degraded_failure_rate cannot exceed unhealthy_failure_rate",
            ));
        }

        let defaults = HealthThresholds::default();
        let thresholds = if issues.is_empty() {
            HealthThresholds {
                degraded_failure_rate: self.degraded_failure_rate,
                unhealthy_failure_rate: self.unhealthy_failure_rate,
                max_backlog: self.max_backlog,
                max_mean_latency: Duration::from_millis(self.max_mean_latency_ms),
            }
        } else {
            HealthThresholds {
                max_backlog: self.max_backlog,
                max_mean_latency: Duration::from_millis(self.max_mean_latency_ms),
                ..defaults
            }
        };
        (thresholds, issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverted_rates_fall_back() {
        let config = FileHealthConfig {
            degraded_failure_rate: 0.9,
            unhealthy_failure_rate: 0.1,
            ..Default::default()
        };
        let (thresholds, issues) = config.to_thresholds();
        assert_eq!(issues.len(), 1);
        assert_eq!(thresholds.degraded_failure_rate, 0.2);
        assert_eq!(thresholds.unhealthy_failure_rate, 0.5);
    }

    #[test]
    fn test_health_config_deserialize() {
        let toml_str = r#"
[health]
max_backlog = 4
max_mean_latency_ms = 1500
"#;
        let config: super::super::FileConfig = toml::from_str(toml_str).unwrap();
        let (thresholds, issues) = config.health.to_thresholds();
        assert!(issues.is_empty());
        assert_eq!(thresholds.max_backlog, 4);
        assert_eq!(thresholds.max_mean_latency, Duration::from_millis(1500));
    }
}
