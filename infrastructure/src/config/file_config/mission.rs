//! Mission configuration from TOML (`[mission]` section)

use serde::{Deserialize, Serialize};
use swarm_application::MissionParams;
use swarm_domain::TranscriptBudget;

/// Supervisor loop limits and transcript sizing.
///
/// # Example
///
/// ```toml
/// [mission]
/// max_iterations = 12
/// timeout_seconds = 600
/// transcript_capacity = 256
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileMissionConfig {
    /// Supervisor steps before the mission stops
    pub max_iterations: usize,
    /// Wall-clock ceiling for one mission
    pub timeout_seconds: u64,
    /// Tokens reserved ahead of each inference call
    pub reservation_tokens: u64,
    /// Messages kept in the transcript ring buffer
    pub transcript_capacity: usize,
    /// Longer messages are truncated head+tail
    pub max_message_bytes: usize,
    /// Recent messages rendered into prompts
    pub prompt_window: usize,
}

impl Default for FileMissionConfig {
    fn default() -> Self {
        let params = MissionParams::default();
        Self {
            max_iterations: params.max_iterations,
            timeout_seconds: params.mission_timeout.as_secs(),
            reservation_tokens: params.reservation_tokens,
            transcript_capacity: params.transcript.capacity(),
            max_message_bytes: params.transcript.max_message_bytes(),
            prompt_window: params.transcript.prompt_window(),
        }
    }
}

impl FileMissionConfig {
    pub fn transcript_budget(&self) -> TranscriptBudget {
        TranscriptBudget::new(
            self.transcript_capacity,
            self.max_message_bytes,
            self.prompt_window,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mission_config_default_matches_params() {
        let config = FileMissionConfig::default();
        assert_eq!(config.max_iterations, 12);
        assert_eq!(config.timeout_seconds, 600);
        assert_eq!(config.transcript_budget(), TranscriptBudget::default());
    }

    #[test]
    fn test_mission_config_deserialize() {
        let toml_str = r#"
[mission]
transcript_capacity = 32
prompt_window = 4
"#;
        let config: super::super::FileConfig = toml::from_str(toml_str).unwrap();
        let budget = config.mission.transcript_budget();
        assert_eq!(budget.capacity(), 32);
        assert_eq!(budget.prompt_window(), 4);
        assert_eq!(budget.max_message_bytes(), 16_000);
    }
}
