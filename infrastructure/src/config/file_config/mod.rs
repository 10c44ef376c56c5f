//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! Each section converts into its application counterpart, returning the
//! issues found along the way; [`FileConfig::validate`] collects them all.

mod budget;
mod cache;
mod council;
mod gateway;
mod health;
mod mission;
mod output;
mod retry;
mod storage;
mod supervisor;
mod telemetry;

pub use budget::FileBudgetConfig;
pub use cache::FileCacheConfig;
pub use council::FileCouncilConfig;
pub use gateway::{FileGatewayConfig, GatewayProvider};
pub use health::FileHealthConfig;
pub use mission::FileMissionConfig;
pub use output::{FileOutputConfig, FileOutputFormat};
pub use retry::FileRetryConfig;
pub use storage::FileStorageConfig;
pub use supervisor::FileSupervisorConfig;
pub use telemetry::FileTelemetryConfig;

use serde::{Deserialize, Serialize};
use std::time::Duration;
use swarm_application::MissionParams;
use thiserror::Error;

/// A problem found while converting file configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    #[error("{field}: unknown value '{value}'")]
    UnknownValue { field: String, value: String },

    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },

    /// A constraint reported by the converted parameters themselves.
    #[error("{0}")]
    Constraint(String),
}

impl ConfigValidationError {
    pub(crate) fn invalid(field: &str, message: impl Into<String>) -> Self {
        ConfigValidationError::InvalidField {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn constraints(messages: Vec<String>) -> Vec<Self> {
        messages.into_iter().map(ConfigValidationError::Constraint).collect()
    }
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Supervisor loop limits and transcript sizing
    pub mission: FileMissionConfig,
    /// Token ceilings and pricing
    pub budget: FileBudgetConfig,
    /// Thought cache
    pub cache: FileCacheConfig,
    /// Retry of transient inference errors
    pub retry: FileRetryConfig,
    /// Registered specialists
    pub council: FileCouncilConfig,
    /// Routing
    pub supervisor: FileSupervisorConfig,
    /// Inference endpoint
    pub gateway: FileGatewayConfig,
    /// Workspace context persistence
    pub storage: FileStorageConfig,
    /// JSONL telemetry log
    pub telemetry: FileTelemetryConfig,
    /// Health thresholds
    pub health: FileHealthConfig,
    /// Output settings
    pub output: FileOutputConfig,
}

impl FileConfig {
    /// Build [`MissionParams`] from `[mission]`, `[council]` and
    /// `[supervisor]`.
    ///
    /// Unknown specialist names are dropped and reported; constraint
    /// violations of the result are reported but kept.
    pub fn to_mission_params(&self) -> (MissionParams, Vec<ConfigValidationError>) {
        let (specialists, mut issues) = self.council.parse_specialists();

        let params = MissionParams::default()
            .with_max_iterations(self.mission.max_iterations)
            .with_mission_timeout(Duration::from_secs(self.mission.timeout_seconds))
            .with_reservation_tokens(self.mission.reservation_tokens)
            .with_transcript(self.mission.transcript_budget())
            .with_specialists(specialists)
            .with_specialist_timeout(Duration::from_secs(
                self.council.specialist_timeout_seconds,
            ))
            .with_quality_threshold(self.supervisor.quality_threshold)
            .with_guided_supervisor(self.supervisor.guided);

        issues.extend(ConfigValidationError::constraints(params.validate()));
        (params, issues)
    }

    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut issues = Vec::new();
        issues.extend(self.to_mission_params().1);
        issues.extend(self.budget.to_budget_policy().1);
        issues.extend(self.cache.to_cache_policy().1);
        issues.extend(self.retry.to_retry_policy().1);
        issues.extend(self.health.to_thresholds().1);
        issues.extend(self.gateway.validate());
        issues
    }
}
