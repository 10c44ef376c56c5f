//! Mission parameters: orchestration loop control.
//!
//! [`MissionParams`] groups the static parameters that control the
//! supervisor loop in [`RunMissionUseCase`](crate::use_cases::run_mission::RunMissionUseCase).

use serde::{Deserialize, Serialize};
use std::time::Duration;
use swarm_domain::supervisor::DEFAULT_QUALITY_THRESHOLD;
use swarm_domain::{RoutingPolicy, Specialist, TranscriptBudget};

/// Orchestration loop control parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionParams {
    /// Maximum supervisor steps before the mission stops.
    pub max_iterations: usize,
    /// Wall-clock ceiling for the whole mission.
    pub mission_timeout: Duration,
    /// Timeout around each specialist's whole invocation chain.
    pub specialist_timeout: Duration,
    /// Registered specialists, fanned out every round.
    pub specialists: Vec<Specialist>,
    /// Quality below which work is routed back to research.
    pub quality_threshold: f64,
    /// Consult the gateway for routing proposals.
    pub guided_supervisor: bool,
    /// Transcript limits.
    pub transcript: TranscriptBudget,
    /// Tokens reserved up front for one inference call.
    pub reservation_tokens: u64,
}

impl Default for MissionParams {
    fn default() -> Self {
        Self {
            max_iterations: 12,
            mission_timeout: Duration::from_secs(600),
            specialist_timeout: Duration::from_secs(90),
            specialists: Specialist::ALL.to_vec(),
            quality_threshold: DEFAULT_QUALITY_THRESHOLD,
            guided_supervisor: false,
            transcript: TranscriptBudget::default(),
            reservation_tokens: 2_000,
        }
    }
}

impl MissionParams {
    // ==================== Builder Methods ====================

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_mission_timeout(mut self, timeout: Duration) -> Self {
        self.mission_timeout = timeout;
        self
    }

    pub fn with_specialist_timeout(mut self, timeout: Duration) -> Self {
        self.specialist_timeout = timeout;
        self
    }

    pub fn with_specialists(mut self, specialists: Vec<Specialist>) -> Self {
        self.specialists = specialists;
        self
    }

    pub fn with_quality_threshold(mut self, threshold: f64) -> Self {
        self.quality_threshold = threshold;
        self
    }

    pub fn with_guided_supervisor(mut self, guided: bool) -> Self {
        self.guided_supervisor = guided;
        self
    }

    pub fn with_transcript(mut self, transcript: TranscriptBudget) -> Self {
        self.transcript = transcript;
        self
    }

    pub fn with_reservation_tokens(mut self, tokens: u64) -> Self {
        self.reservation_tokens = tokens;
        self
    }

    /// Registered specialists in registration order, without duplicates.
    pub fn council(&self) -> Vec<Specialist> {
        let mut council = self.specialists.clone();
        council.sort_by_key(|s| s.registration_index());
        council.dedup();
        council
    }

    pub fn routing_policy(&self) -> RoutingPolicy {
        RoutingPolicy::new(self.quality_threshold)
    }

    // ==================== Validation ====================

    /// Validate these parameters, returning a list of issues.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.max_iterations == 0 {
            issues.push("mission: max_iterations must be >= 1".to_string());
        }
        if self.mission_timeout.is_zero() {
            issues.push("mission: timeout cannot be 0".to_string());
        }
        if self.specialist_timeout.is_zero() {
            issues.push("council: specialist_timeout cannot be 0".to_string());
        }
        if self.specialists.is_empty() {
            issues.push("council: at least one specialist must be registered".to_string());
        }
        if !(0.0..=1.0).contains(&self.quality_threshold) {
            issues.push(format!(
                "supervisor: quality_threshold ({}) must be within 0..=1",
                self.quality_threshold
            ));
        }
        issues.extend(self.transcript.validate());
        issues
    }
}
