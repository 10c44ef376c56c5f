//! Cache configuration from TOML (`[cache]` section)

use super::ConfigValidationError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use swarm_application::CachePolicy;

/// Raw thought cache configuration from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCacheConfig {
    pub enabled: bool,
    /// Entries kept before least-recently-used eviction
    pub capacity: usize,
    /// Entry lifetime; omit to keep entries until evicted
    pub ttl_seconds: Option<u64>,
}

impl Default for FileCacheConfig {
    fn default() -> Self {
        let policy = CachePolicy::default();
        Self {
            enabled: policy.enabled,
            capacity: policy.capacity,
            ttl_seconds: policy.ttl.map(|ttl| ttl.as_secs()),
        }
    }
}

impl FileCacheConfig {
    pub fn to_cache_policy(&self) -> (CachePolicy, Vec<ConfigValidationError>) {
        let policy = CachePolicy {
            enabled: self.enabled,
            capacity: self.capacity,
            ttl: self.ttl_seconds.map(Duration::from_secs),
        };
        let issues = ConfigValidationError::constraints(policy.validate());
        (policy, issues)
    }
}
