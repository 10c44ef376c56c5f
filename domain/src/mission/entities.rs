//! Mission domain entities

use crate::core::ids::{MissionId, WorkspaceId};
use crate::council::specialist::Specialist;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Goal used when a mission arrives without one.
pub const PLACEHOLDER_GOAL: &str =
    "Identify and execute the next most valuable action for this workspace";

/// One end-to-end orchestration request (Entity)
///
/// Created once at invocation start and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mission {
    id: MissionId,
    workspace_id: WorkspaceId,
    goal: String,
    created_at: DateTime<Utc>,
}

impl Mission {
    /// Create a mission. A blank goal is replaced by [`PLACEHOLDER_GOAL`].
    pub fn new(workspace_id: impl Into<WorkspaceId>, goal: impl Into<String>) -> Self {
        let goal = goal.into();
        let goal = if goal.trim().is_empty() {
            PLACEHOLDER_GOAL.to_string()
        } else {
            goal.trim().to_string()
        };

        Self {
            id: MissionId::generate(),
            workspace_id: workspace_id.into(),
            goal,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> MissionId {
        self.id
    }

    pub fn workspace_id(&self) -> &WorkspaceId {
        &self.workspace_id
    }

    pub fn goal(&self) -> &str {
        &self.goal
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Whether the caller supplied no goal of their own.
    pub fn uses_placeholder_goal(&self) -> bool {
        self.goal == PLACEHOLDER_GOAL
    }
}

/// Identifier of a subtask within one decomposition batch.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubtaskId(String);

impl SubtaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SubtaskId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for SubtaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for SubtaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A decomposed unit of work assigned to one specialist type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubtaskSpec {
    pub id: SubtaskId,
    pub specialist_type: Specialist,
    pub objective: String,
    pub success_criteria: Vec<String>,
    pub dependencies: Vec<SubtaskId>,
    #[serde(default)]
    pub inputs: serde_json::Map<String, serde_json::Value>,
}

impl SubtaskSpec {
    pub fn new(
        id: impl Into<SubtaskId>,
        specialist_type: Specialist,
        objective: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            specialist_type,
            objective: objective.into(),
            success_criteria: Vec::new(),
            dependencies: Vec::new(),
            inputs: serde_json::Map::new(),
        }
    }

    pub fn with_criterion(mut self, criterion: impl Into<String>) -> Self {
        self.success_criteria.push(criterion.into());
        self
    }

    pub fn with_dependency(mut self, id: impl Into<SubtaskId>) -> Self {
        self.dependencies.push(id.into());
        self
    }

    pub fn with_input(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.inputs.insert(key.into(), value.into());
        self
    }

    /// Ready once every dependency has been addressed.
    pub fn is_ready(&self, completed: &HashSet<SubtaskId>) -> bool {
        !completed.contains(&self.id) && self.dependencies.iter().all(|d| completed.contains(d))
    }

    /// One-line rendering for prompts.
    pub fn summary_line(&self) -> String {
        let mut line = format!("[{}] ({}) {}", self.id, self.specialist_type, self.objective);
        if !self.success_criteria.is_empty() {
            line.push_str(&format!(" | done when: {}", self.success_criteria.join("; ")));
        }
        if !self.dependencies.is_empty() {
            let deps: Vec<&str> = self.dependencies.iter().map(|d| d.as_str()).collect();
            line.push_str(&format!(" | after: {}", deps.join(", ")));
        }
        line
    }
}
