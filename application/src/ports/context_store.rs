//! Context store port
//!
//! Durable per-workspace key-value context. A mission loads it once on entry
//! and saves it once on exit.

use async_trait::async_trait;
use serde_json::{Map, Value};
use swarm_domain::WorkspaceId;
use thiserror::Error;

/// Errors from a context store
#[derive(Error, Debug)]
pub enum ContextStoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Stored context for workspace {workspace} is corrupt: {message}")]
    Corrupt { workspace: String, message: String },

    #[error("Invalid workspace id: {0}")]
    InvalidWorkspace(String),

    #[error("Context store unavailable: {0}")]
    Unavailable(String),
}

/// Persistence port for workspace context variables
#[async_trait]
pub trait ContextStore: Send + Sync {
    /// Load the context of `workspace`. Unknown workspaces load as empty.
    async fn load(&self, workspace: &WorkspaceId) -> Result<Map<String, Value>, ContextStoreError>;

    /// Replace the stored context of `workspace`.
    async fn save(
        &self,
        workspace: &WorkspaceId,
        context: &Map<String, Value>,
    ) -> Result<(), ContextStoreError>;
}
