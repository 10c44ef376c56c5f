//! Council rounds and the blackboard
//!
//! A [`CouncilRound`] is the barrier result of one fan-out: exactly one
//! thought per registered specialist, in registration order. The
//! [`Blackboard`] accumulates rounds for the lifetime of a mission.

use super::thought::CouncilThought;
use crate::state::status::OrchestrationStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Result of one council round.
///
/// ```
/// use swarm_domain::council::{CouncilRound, CouncilThought, Specialist};
/// use swarm_domain::state::OrchestrationStatus;
///
/// let thoughts = vec![
///     CouncilThought::new(Specialist::Research, 1, "Market is growing", 0.8),
///     CouncilThought::new(Specialist::Strategy, 1, "Focus on SMBs", 0.6),
/// ];
/// let round = CouncilRound::new(1, OrchestrationStatus::Researching, thoughts);
/// assert!((round.consensus - 0.7).abs() < 1e-9);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouncilRound {
    /// Round number (1-indexed)
    pub round: usize,
    /// Status the round ran under
    pub status: OrchestrationStatus,
    /// Sorted by registration order
    pub thoughts: Vec<CouncilThought>,
    /// Mean effective confidence (degraded thoughts count as 0)
    pub consensus: f64,
    pub completed_at: DateTime<Utc>,
}

impl CouncilRound {
    pub fn new(round: usize, status: OrchestrationStatus, mut thoughts: Vec<CouncilThought>) -> Self {
        thoughts.sort_by_key(|t| t.specialist.registration_index());
        let consensus = consensus_score(&thoughts);
        Self {
            round,
            status,
            thoughts,
            consensus,
            completed_at: Utc::now(),
        }
    }

    pub fn degraded_count(&self) -> usize {
        self.thoughts.iter().filter(|t| t.degraded).count()
    }

    pub fn is_fully_degraded(&self) -> bool {
        !self.thoughts.is_empty() && self.degraded_count() == self.thoughts.len()
    }

    /// Visual summary, `●` per real thought and `○` per fallback.
    pub fn summary(&self) -> String {
        let marks: String = self
            .thoughts
            .iter()
            .map(|t| if t.degraded { '○' } else { '●' })
            .collect();
        format!("[{}] {:.2}", marks, self.consensus)
    }
}

/// Mean effective confidence; 0 for an empty round.
pub fn consensus_score(thoughts: &[CouncilThought]) -> f64 {
    if thoughts.is_empty() {
        return 0.0;
    }
    let total: f64 = thoughts.iter().map(CouncilThought::effective_confidence).sum();
    (total / thoughts.len() as f64).clamp(0.0, 1.0)
}

/// All rounds of a mission, in order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Blackboard {
    rounds: Vec<CouncilRound>,
}

impl Blackboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, round: CouncilRound) {
        self.rounds.push(round);
    }

    pub fn rounds(&self) -> &[CouncilRound] {
        &self.rounds
    }

    pub fn last_round(&self) -> Option<&CouncilRound> {
        self.rounds.last()
    }

    /// Number of the next round (1-indexed).
    pub fn next_round_number(&self) -> usize {
        self.rounds.len() + 1
    }

    /// Every thought across rounds, in round then registration order.
    pub fn thoughts(&self) -> impl Iterator<Item = &CouncilThought> {
        self.rounds.iter().flat_map(|r| r.thoughts.iter())
    }

    pub fn degraded_count(&self) -> usize {
        self.rounds.iter().map(CouncilRound::degraded_count).sum()
    }

    pub fn into_thoughts(self) -> Vec<CouncilThought> {
        self.rounds.into_iter().flat_map(|r| r.thoughts).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::SpecialistFailure;
    use crate::council::specialist::Specialist;

    #[test]
    fn test_round_sorts_by_registration_order() {
        let thoughts = vec![
            CouncilThought::new(Specialist::Qa, 1, "qa", 0.5),
            CouncilThought::new(Specialist::Research, 1, "research", 0.5),
            CouncilThought::new(Specialist::Creative, 1, "creative", 0.5),
        ];
        let round = CouncilRound::new(1, OrchestrationStatus::Researching, thoughts);
        let order: Vec<Specialist> = round.thoughts.iter().map(|t| t.specialist).collect();
        assert_eq!(
            order,
            vec![Specialist::Research, Specialist::Creative, Specialist::Qa]
        );
    }

    #[test]
    fn test_degraded_thoughts_count_as_zero() {
        let failure = SpecialistFailure::Inference("boom".to_string());
        let thoughts = vec![
            CouncilThought::new(Specialist::Research, 1, "a", 1.0),
            CouncilThought::fallback(Specialist::Strategy, 1, &failure),
        ];
        let round = CouncilRound::new(1, OrchestrationStatus::Executing, thoughts);
        assert_eq!(round.consensus, 0.5);
        assert_eq!(round.degraded_count(), 1);
        assert!(!round.is_fully_degraded());
        assert_eq!(round.summary(), "[●○] 0.50");
    }

    #[test]
    fn test_empty_round_scores_zero() {
        assert_eq!(consensus_score(&[]), 0.0);
    }

    #[test]
    fn test_blackboard_accumulates() {
        let mut board = Blackboard::new();
        assert_eq!(board.next_round_number(), 1);
        board.record(CouncilRound::new(
            1,
            OrchestrationStatus::Researching,
            vec![CouncilThought::new(Specialist::Research, 1, "r1", 0.4)],
        ));
        board.record(CouncilRound::new(
            2,
            OrchestrationStatus::Executing,
            vec![CouncilThought::new(Specialist::Research, 2, "r2", 0.9)],
        ));
        assert_eq!(board.next_round_number(), 3);
        assert_eq!(board.thoughts().count(), 2);
        assert_eq!(board.last_round().unwrap().round, 2);
        let contents: Vec<String> = board.into_thoughts().into_iter().map(|t| t.content).collect();
        assert_eq!(contents, vec!["r1", "r2"]);
    }
}
