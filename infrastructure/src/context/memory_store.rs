//! In-memory context store.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::HashMap;
use swarm_application::{ContextStore, ContextStoreError};
use swarm_domain::WorkspaceId;

/// Context store that lives as long as the process.
#[derive(Debug, Default)]
pub struct InMemoryContextStore {
    contexts: RwLock<HashMap<WorkspaceId, Map<String, Value>>>,
}

impl InMemoryContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed `workspace` with `context`.
    pub fn with_context(self, workspace: impl Into<WorkspaceId>, context: Map<String, Value>) -> Self {
        self.contexts.write().insert(workspace.into(), context);
        self
    }

    pub fn workspaces(&self) -> usize {
        self.contexts.read().len()
    }
}

#[async_trait]
impl ContextStore for InMemoryContextStore {
    async fn load(&self, workspace: &WorkspaceId) -> Result<Map<String, Value>, ContextStoreError> {
        Ok(self.contexts.read().get(workspace).cloned().unwrap_or_default())
    }

    async fn save(
        &self,
        workspace: &WorkspaceId,
        context: &Map<String, Value>,
    ) -> Result<(), ContextStoreError> {
        self.contexts
            .write()
            .insert(workspace.clone(), context.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_workspaces_are_isolated() {
        let mut seeded = Map::new();
        seeded.insert("industry".into(), Value::from("bakery"));
        let store = InMemoryContextStore::new().with_context("acme", seeded.clone());

        assert_eq!(store.load(&WorkspaceId::new("acme")).await.unwrap(), seeded);
        assert!(store.load(&WorkspaceId::new("other")).await.unwrap().is_empty());

        let mut updated = seeded.clone();
        updated.insert("last_status".into(), Value::from("completed"));
        store.save(&WorkspaceId::new("acme"), &updated).await.unwrap();

        assert_eq!(store.load(&WorkspaceId::new("acme")).await.unwrap(), updated);
        assert_eq!(store.workspaces(), 1);
    }
}
