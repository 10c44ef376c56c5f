//! Supervisor configuration from TOML (`[supervisor]` section)

use serde::{Deserialize, Serialize};
use swarm_domain::supervisor::DEFAULT_QUALITY_THRESHOLD;

/// Raw supervisor configuration from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSupervisorConfig {
    /// Consensus below this routes work back to research
    pub quality_threshold: f64,
    /// Ask the gateway for routing proposals
    pub guided: bool,
}

impl Default for FileSupervisorConfig {
    fn default() -> Self {
        Self {
            quality_threshold: DEFAULT_QUALITY_THRESHOLD,
            guided: false,
        }
    }
}
