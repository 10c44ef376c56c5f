//! Caller-facing mission request.

use crate::core::ids::WorkspaceId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// What a caller submits to start a mission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionRequest {
    pub goal: String,
    pub workspace_id: WorkspaceId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// Context overrides; these win over persisted context
    #[serde(default)]
    pub overrides: Map<String, Value>,
}

impl MissionRequest {
    pub fn new(workspace_id: impl Into<WorkspaceId>, goal: impl Into<String>) -> Self {
        Self {
            goal: goal.into(),
            workspace_id: workspace_id.into(),
            session_id: None,
            overrides: Map::new(),
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_override(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.overrides.insert(key.into(), value.into());
        self
    }

    /// Overrides plus the session id under `session_id`, when present.
    pub fn effective_overrides(&self) -> Map<String, Value> {
        let mut overrides = self.overrides.clone();
        if let Some(session) = &self.session_id {
            overrides.insert("session_id".to_string(), Value::from(session.clone()));
        }
        overrides
    }
}
