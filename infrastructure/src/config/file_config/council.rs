//! Council configuration from TOML (`[council]` section)

use super::ConfigValidationError;
use serde::{Deserialize, Serialize};
use swarm_domain::Specialist;

/// Registered specialists and their per-call timeout.
///
/// # Example
///
/// ```toml
/// [council]
/// specialists = ["research", "strategy", "qa"]
/// specialist_timeout_seconds = 90
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCouncilConfig {
    /// Specialist names; aliases such as "analyst" or "reviewer" are accepted
    pub specialists: Vec<String>,
    /// Timeout around one specialist's whole invocation chain
    pub specialist_timeout_seconds: u64,
}

impl Default for FileCouncilConfig {
    fn default() -> Self {
        Self {
            specialists: Specialist::ALL
                .iter()
                .map(|s| s.as_str().to_string())
                .collect(),
            specialist_timeout_seconds: 90,
        }
    }
}

impl FileCouncilConfig {
    /// Parse the specialist names, dropping unknown ones.
    pub fn parse_specialists(&self) -> (Vec<Specialist>, Vec<ConfigValidationError>) {
        let mut specialists = Vec::new();
        let mut issues = Vec::new();
        for name in &self.specialists {
            match name.parse::<Specialist>() {
                Ok(specialist) => specialists.push(specialist),
                Err(_) => issues.push(ConfigValidationError::UnknownValue {
                    field: "council.specialists".to_string(),
                    value: name.clone(),
                }),
            }
        }
        (specialists, issues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_registers_everyone() {
        let (specialists, issues) = FileCouncilConfig::default().parse_specialists();
        assert_eq!(specialists, Specialist::ALL.to_vec());
        assert!(issues.is_empty());
    }

    #[test]
    fn test_aliases_and_unknown_names() {
        let config = FileCouncilConfig {
            specialists: vec!["analyst".into(), "astrologer".into(), "Reviewer".into()],
            ..Default::default()
        };
        let (specialists, issues) = config.parse_specialists();
        assert_eq!(specialists, vec![Specialist::Research, Specialist::Qa]);
        assert_eq!(
            issues,
            vec![ConfigValidationError::UnknownValue {
                field: "council.specialists".into(),
                value: "astrologer".into(),
            }]
        );
    }
}
