//! Mutable orchestration state and its immutable round snapshot.

use super::message::MessageKind;
use super::status::OrchestrationStatus;
use super::transcript::{Transcript, TranscriptBudget};
use crate::core::error::StateCorruption;
use crate::core::ids::{MissionId, WorkspaceId};
use crate::council::specialist::Specialist;
use crate::mission::entities::{Mission, SubtaskId, SubtaskSpec};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Running token and cost totals. Only ever grows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostAccumulator {
    tokens: u64,
    cost_usd: f64,
}

impl CostAccumulator {
    /// Add spend. Negative or NaN costs are ignored.
    pub fn add(&mut self, tokens: u64, cost_usd: f64) {
        self.tokens = self.tokens.saturating_add(tokens);
        if cost_usd.is_finite() && cost_usd > 0.0 {
            self.cost_usd += cost_usd;
        }
    }

    pub fn tokens(&self) -> u64 {
        self.tokens
    }

    pub fn cost_usd(&self) -> f64 {
        self.cost_usd
    }
}

/// The single mutable object threaded through a mission.
///
/// Single-writer: only the supervisor step mutates it. Council rounds read
/// a [`StateSnapshot`] instead.
#[derive(Debug, Clone)]
pub struct OrchestrationState {
    mission_id: MissionId,
    workspace_id: WorkspaceId,
    goal: String,
    status: OrchestrationStatus,
    transcript: Transcript,
    subtask_specs: Vec<SubtaskSpec>,
    context_variables: Map<String, Value>,
    quality_score: f64,
    next_node: Option<String>,
    cost: CostAccumulator,
    last_agent: Option<String>,
    completed_subtasks: HashSet<SubtaskId>,
    iteration: usize,
}

impl OrchestrationState {
    pub fn new(mission: &Mission, budget: TranscriptBudget) -> Self {
        Self {
            mission_id: mission.id(),
            workspace_id: mission.workspace_id().clone(),
            goal: mission.goal().to_string(),
            status: OrchestrationStatus::Planning,
            transcript: Transcript::new(budget),
            subtask_specs: Vec::new(),
            context_variables: Map::new(),
            quality_score: 0.0,
            next_node: None,
            cost: CostAccumulator::default(),
            last_agent: None,
            completed_subtasks: HashSet::new(),
            iteration: 0,
        }
    }

    // ==================== Accessors ====================

    pub fn mission_id(&self) -> MissionId {
        self.mission_id
    }

    pub fn workspace_id(&self) -> &WorkspaceId {
        &self.workspace_id
    }

    pub fn goal(&self) -> &str {
        &self.goal
    }

    pub fn status(&self) -> OrchestrationStatus {
        self.status
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn subtask_specs(&self) -> &[SubtaskSpec] {
        &self.subtask_specs
    }

    pub fn context_variables(&self) -> &Map<String, Value> {
        &self.context_variables
    }

    pub fn quality_score(&self) -> f64 {
        self.quality_score
    }

    pub fn next_node(&self) -> Option<&str> {
        self.next_node.as_deref()
    }

    pub fn cost(&self) -> CostAccumulator {
        self.cost
    }

    pub fn last_agent(&self) -> Option<&str> {
        self.last_agent.as_deref()
    }

    pub fn completed_subtasks(&self) -> &HashSet<SubtaskId> {
        &self.completed_subtasks
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    // ==================== Mutation ====================

    /// Move along the status machine. Illegal edges are corruption.
    pub fn advance(&mut self, next: OrchestrationStatus) -> Result<(), StateCorruption> {
        if !self.status.can_transition_to(next) {
            return Err(StateCorruption::IllegalTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    pub fn set_quality(&mut self, score: f64) -> Result<(), StateCorruption> {
        if !(0.0..=1.0).contains(&score) {
            return Err(StateCorruption::QualityOutOfRange(score));
        }
        self.quality_score = score;
        Ok(())
    }

    /// Install the decomposition. Write-once.
    pub fn set_subtasks(&mut self, specs: Vec<SubtaskSpec>) -> Result<(), StateCorruption> {
        if !self.subtask_specs.is_empty() {
            return Err(StateCorruption::SubtasksAlreadySet);
        }
        let ids: HashSet<&SubtaskId> = specs.iter().map(|s| &s.id).collect();
        for spec in &specs {
            if let Some(missing) = spec.dependencies.iter().find(|d| !ids.contains(d)) {
                return Err(StateCorruption::DanglingDependency {
                    subtask: spec.id.to_string(),
                    dependency: missing.to_string(),
                });
            }
        }
        self.subtask_specs = specs;
        Ok(())
    }

    /// Record subtasks addressed by a non-degraded thought. Unknown ids are ignored.
    pub fn mark_addressed<'a>(&mut self, ids: impl IntoIterator<Item = &'a SubtaskId>) {
        for id in ids {
            if self.subtask_specs.iter().any(|s| &s.id == id) {
                self.completed_subtasks.insert(id.clone());
            }
        }
    }

    /// Subtasks no non-degraded thought has addressed yet, in plan order.
    pub fn unaddressed_subtasks(&self) -> Vec<SubtaskId> {
        self.subtask_specs
            .iter()
            .filter(|s| !self.completed_subtasks.contains(&s.id))
            .map(|s| s.id.clone())
            .collect()
    }

    /// Merge `overrides` into the context bag. Keys in `overrides` win.
    pub fn merge_context(&mut self, overrides: Map<String, Value>) {
        for (key, value) in overrides {
            self.context_variables.insert(key, value);
        }
    }

    pub fn set_context(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.context_variables.insert(key.into(), value.into());
    }

    /// Append to the transcript and return the sequence number.
    pub fn append(&mut self, role: impl Into<String>, kind: MessageKind, content: impl AsRef<str>) -> u64 {
        let role = role.into();
        if kind == MessageKind::Thought || kind == MessageKind::Fallback {
            self.last_agent = Some(role.clone());
        }
        self.transcript.push(role, kind, content)
    }

    pub fn set_next_node(&mut self, node: impl Into<String>) {
        self.next_node = Some(node.into());
    }

    pub fn add_cost(&mut self, tokens: u64, cost_usd: f64) {
        self.cost.add(tokens, cost_usd);
    }

    /// Count a supervisor step and return the new iteration number.
    pub fn begin_iteration(&mut self) -> usize {
        self.iteration += 1;
        self.iteration
    }

    /// Freeze what a council round may read.
    pub fn snapshot(&self, round: usize) -> StateSnapshot {
        StateSnapshot {
            mission_id: self.mission_id,
            workspace_id: self.workspace_id.clone(),
            goal: self.goal.clone(),
            status: self.status,
            round,
            subtasks: self.subtask_specs.clone(),
            completed_subtasks: self.completed_subtasks.clone(),
            context_variables: self.context_variables.clone(),
            transcript: self.transcript.render_recent(),
            quality_score: self.quality_score,
            supervisor_instructions: self
                .context_variables
                .get(SUPERVISOR_INSTRUCTIONS_KEY)
                .and_then(|v| v.as_str())
                .map(str::to_string),
        }
    }
}

/// Context key carrying the latest supervisor instructions.
pub const SUPERVISOR_INSTRUCTIONS_KEY: &str = "supervisor_instructions";

/// Read-only view handed to every specialist of one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub mission_id: MissionId,
    pub workspace_id: WorkspaceId,
    pub goal: String,
    pub status: OrchestrationStatus,
    pub round: usize,
    pub subtasks: Vec<SubtaskSpec>,
    pub completed_subtasks: HashSet<SubtaskId>,
    pub context_variables: Map<String, Value>,
    /// Rendered prompt window of the transcript
    pub transcript: String,
    pub quality_score: f64,
    pub supervisor_instructions: Option<String>,
}

impl StateSnapshot {
    /// Subtasks of `specialist`'s type whose dependencies are all addressed.
    pub fn ready_assignments(&self, specialist: Specialist) -> Vec<&SubtaskSpec> {
        self.subtasks
            .iter()
            .filter(|s| s.specialist_type == specialist && s.is_ready(&self.completed_subtasks))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> OrchestrationState {
        OrchestrationState::new(&Mission::new("w1", "Launch"), TranscriptBudget::default())
    }

    #[test]
    fn test_advance_rejects_illegal_edge() {
        let mut state = state();
        let err = state.advance(OrchestrationStatus::Complete).unwrap_err();
        assert_eq!(
            err,
            StateCorruption::IllegalTransition {
                from: OrchestrationStatus::Planning,
                to: OrchestrationStatus::Complete
            }
        );
        assert_eq!(state.status(), OrchestrationStatus::Planning);
    }

    #[test]
    fn test_advance_full_path() {
        let mut state = state();
        for next in [
            OrchestrationStatus::Researching,
            OrchestrationStatus::Executing,
            OrchestrationStatus::Researching,
            OrchestrationStatus::Executing,
            OrchestrationStatus::Complete,
        ] {
            state.advance(next).unwrap();
        }
        assert!(state.status().is_terminal());
    }

    #[test]
    fn test_quality_range() {
        let mut state = state();
        assert!(state.set_quality(0.7).is_ok());
        assert!(state.set_quality(1.2).is_err());
        assert!(state.set_quality(f64::NAN).is_err());
        assert_eq!(state.quality_score(), 0.7);
    }

    #[test]
    fn test_cost_is_monotonic() {
        let mut cost = CostAccumulator::default();
        cost.add(100, 0.01);
        cost.add(0, -5.0);
        cost.add(0, f64::NAN);
        assert_eq!(cost.tokens(), 100);
        assert_eq!(cost.cost_usd(), 0.01);
    }

    #[test]
    fn test_subtasks_are_write_once() {
        let mut state = state();
        state
            .set_subtasks(vec![SubtaskSpec::new("1", Specialist::Research, "Look")])
            .unwrap();
        assert_eq!(
            state.set_subtasks(vec![SubtaskSpec::new("2", Specialist::Qa, "Check")]),
            Err(StateCorruption::SubtasksAlreadySet)
        );
    }

    #[test]
    fn test_set_subtasks_rejects_dangling_dependency() {
        let mut state = state();
        let result = state.set_subtasks(vec![
            SubtaskSpec::new("1", Specialist::Qa, "Check").with_dependency("9"),
        ]);
        assert!(matches!(result, Err(StateCorruption::DanglingDependency { .. })));
    }

    #[test]
    fn test_merge_context_caller_wins() {
        let mut state = state();
        state.set_context("tone", "formal");
        state.set_context("region", "EU");
        let mut overrides = Map::new();
        overrides.insert("tone".to_string(), Value::from("playful"));
        state.merge_context(overrides);
        assert_eq!(state.context_variables()["tone"], "playful");
        assert_eq!(state.context_variables()["region"], "EU");
    }

    #[test]
    fn test_last_agent_tracks_thoughts_only() {
        let mut state = state();
        state.append("research", MessageKind::Thought, "found it");
        state.append("supervisor", MessageKind::Decision, "go on");
        assert_eq!(state.last_agent(), Some("research"));
    }

    #[test]
    fn test_ready_assignments_respect_dependencies() {
        let mut state = state();
        state
            .set_subtasks(vec![
                SubtaskSpec::new("1", Specialist::Research, "Gather"),
                SubtaskSpec::new("2", Specialist::Creative, "Write").with_dependency("1"),
            ])
            .unwrap();

        let snapshot = state.snapshot(1);
        assert_eq!(snapshot.ready_assignments(Specialist::Research).len(), 1);
        assert!(snapshot.ready_assignments(Specialist::Creative).is_empty());

        state.mark_addressed([&SubtaskId::new("1"), &SubtaskId::new("unknown")]);
        assert_eq!(state.completed_subtasks().len(), 1);
        let snapshot = state.snapshot(2);
        assert!(snapshot.ready_assignments(Specialist::Research).is_empty());
        assert_eq!(snapshot.ready_assignments(Specialist::Creative)[0].id.as_str(), "2");
        assert_eq!(state.unaddressed_subtasks(), vec![SubtaskId::new("2")]);

        state.mark_addressed([&SubtaskId::new("2")]);
        assert!(state.unaddressed_subtasks().is_empty());
    }

    #[test]
    fn test_snapshot_carries_supervisor_instructions() {
        let mut state = state();
        state.set_context(SUPERVISOR_INSTRUCTIONS_KEY, "Cite sources");
        assert_eq!(
            state.snapshot(1).supervisor_instructions.as_deref(),
            Some("Cite sources")
        );
    }
}
