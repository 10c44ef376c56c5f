//! Identifier value objects.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tenant boundary for budgets, cache accounting and persisted context.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkspaceId(String);

impl WorkspaceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for WorkspaceId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for WorkspaceId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for WorkspaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for one mission invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MissionId(Uuid);

impl MissionId {
    /// Generate a new random `MissionId`.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl std::fmt::Display for MissionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workspace_id() {
        let id: WorkspaceId = "w1".into();
        assert_eq!(id.as_str(), "w1");
        assert_eq!(id.to_string(), "w1");
    }

    #[test]
    fn test_mission_ids_are_unique() {
        assert_ne!(MissionId::generate(), MissionId::generate());
    }

    #[test]
    fn test_workspace_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&WorkspaceId::new("acme")).unwrap();
        assert_eq!(json, "\"acme\"");
    }
}
