//! Gateway configuration from TOML (`[gateway]` section)

use super::ConfigValidationError;
use serde::{Deserialize, Serialize};

/// Which inference backend to talk to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayProvider {
    /// Any endpoint speaking the OpenAI chat completions shape
    #[default]
    #[serde(alias = "openai_compatible")]
    OpenAi,
    /// Deterministic canned replies, no network
    Offline,
}

/// Raw gateway configuration from TOML.
///
/// # Example
///
/// ```toml
/// [gateway]
/// provider = "openai"
/// base_url = "http://localhost:11434/v1"
/// model = "llama3.1"
/// api_key_env = "OLLAMA_API_KEY"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileGatewayConfig {
    pub provider: GatewayProvider,
    /// Base URL; `/chat/completions` is appended
    pub base_url: String,
    pub model: String,
    /// Literal API key. Prefer `api_key_env`.
    pub api_key: Option<String>,
    /// Environment variable holding the API key
    pub api_key_env: String,
    pub request_timeout_seconds: u64,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

impl Default for FileGatewayConfig {
    fn default() -> Self {
        Self {
            provider: GatewayProvider::default(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
            request_timeout_seconds: 60,
            temperature: 0.7,
            max_tokens: None,
        }
    }
}

impl FileGatewayConfig {
    /// The configured key, or the value of `api_key_env`.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .filter(|key| !key.trim().is_empty())
    }

    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut issues = Vec::new();
        if self.provider == GatewayProvider::Offline {
            return issues;
        }
        if self.base_url.trim().is_empty() {
            issues.push(ConfigValidationError::invalid(
                "gateway.base_url",
                "cannot be empty",
            ));
        }
        if self.model.trim().is_empty() {
            issues.push(ConfigValidationError::invalid("gateway.model", "cannot be empty"));
        }
        if self.request_timeout_seconds == 0 {
            issues.push(ConfigValidationError::invalid(
                "gateway.request_timeout_seconds",
                "cannot be 0",
            ));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            issues.push(ConfigValidationError::invalid(
                "gateway.temperature",
                format!("{} must be within 0..=2", self.temperature),
            ));
        }
        issues
    }
}
