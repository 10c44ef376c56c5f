//! Storage configuration from TOML (`[storage]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where workspace context is persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileStorageConfig {
    /// Directory holding one JSON file per workspace
    pub context_dir: Option<PathBuf>,
    /// Keep context in memory only
    pub in_memory: bool,
}

impl FileStorageConfig {
    /// The configured directory, else `<data dir>/swarm-council/context`,
    /// else `.swarm/context`.
    pub fn resolve_context_dir(&self) -> PathBuf {
        if let Some(dir) = &self.context_dir {
            return dir.clone();
        }
        dirs::data_dir()
            .map(|dir| dir.join("swarm-council").join("context"))
            .unwrap_or_else(|| PathBuf::from(".swarm").join("context"))
    }
}
