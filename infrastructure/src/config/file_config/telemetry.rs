//! Telemetry configuration from TOML (`[telemetry]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw telemetry configuration from TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileTelemetryConfig {
    /// Append every telemetry event to this JSONL file
    pub jsonl_path: Option<PathBuf>,
    /// Print the health report after each mission
    pub health_report: bool,
}
