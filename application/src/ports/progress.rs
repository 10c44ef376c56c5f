//! Progress notification port
//!
//! Defines the interface for reporting progress during a mission.

use swarm_domain::{
    CouncilRound, CouncilThought, Mission, MissionStatus, OrchestrationStatus, SubtaskSpec,
    SupervisorDecision,
};

/// Callback for progress updates during a mission
///
/// Implementations live in the presentation layer and can display
/// progress in various ways (console, web UI, etc.)
pub trait MissionProgress: Send + Sync {
    /// Called once the goal has been decomposed
    fn on_decomposed(&self, mission: &Mission, subtasks: &[SubtaskSpec]);

    /// Called when a council round starts
    fn on_round_start(&self, round: usize, status: OrchestrationStatus, specialists: usize);

    /// Called as each specialist of a round resolves
    fn on_specialist_done(&self, thought: &CouncilThought);

    /// Called after the round barrier
    fn on_round_complete(&self, round: &CouncilRound);

    // ==================== Optional Callbacks ====================

    /// Called after every supervisor step
    fn on_decision(&self, _decision: &SupervisorDecision) {}

    /// Called once the mission reached a terminal status
    fn on_mission_finished(&self, _status: MissionStatus) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl MissionProgress for NoProgress {
    fn on_decomposed(&self, _mission: &Mission, _subtasks: &[SubtaskSpec]) {}
    fn on_round_start(&self, _round: usize, _status: OrchestrationStatus, _specialists: usize) {}
    fn on_specialist_done(&self, _thought: &CouncilThought) {}
    fn on_round_complete(&self, _round: &CouncilRound) {}
}
