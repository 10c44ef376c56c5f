//! Run Council use case
//!
//! One council round: every registered specialist runs concurrently against
//! the same immutable snapshot, and the round joins at a barrier once each
//! of them produced a thought or a fallback.
//!
//! ```text
//!                    ┌──▶ research ──┐
//! Arc<StateSnapshot> ├──▶ strategy ──┤ join_next ──▶ CouncilRound
//!                    ├──▶   ...    ──┤              (registration order)
//!                    └──▶ qa ────────┘
//! ```

use super::shared::{InvocationError, InvocationPipeline, InvocationRequest};
use crate::config::MissionParams;
use crate::ports::progress::MissionProgress;
use std::collections::HashSet;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use swarm_domain::{
    BudgetExceeded, Component, ConversationTurn, CostAccumulator, CouncilRound, CouncilThought,
    EventOutcome, PromptTemplate, Specialist, SpecialistFailure, StateSnapshot, SubtaskId,
    TelemetryEvent, parse_thought_reply,
};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// A finished round and what it cost.
#[derive(Debug, Clone)]
pub struct RoundOutcome {
    pub round: CouncilRound,
    pub cost: CostAccumulator,
}

/// Use case for running council rounds
#[derive(Clone)]
pub struct RunCouncilUseCase {
    pipeline: InvocationPipeline,
    specialists: Vec<Specialist>,
    specialist_timeout: Duration,
}

impl RunCouncilUseCase {
    pub fn new(pipeline: InvocationPipeline, params: &MissionParams) -> Self {
        Self {
            pipeline,
            specialists: params.council(),
            specialist_timeout: params.specialist_timeout,
        }
    }

    pub fn specialists(&self) -> &[Specialist] {
        &self.specialists
    }

    /// Run one round against `snapshot`.
    ///
    /// Fails when the workspace is already out of budget, in which case no
    /// specialist is invoked, or when every specialist was refused a
    /// reservation. Otherwise returns exactly one thought per registered
    /// specialist.
    pub async fn run_round(
        &self,
        snapshot: Arc<StateSnapshot>,
        progress: &dyn MissionProgress,
    ) -> Result<RoundOutcome, BudgetExceeded> {
        let workspace = snapshot.workspace_id.clone();
        let governor = self.pipeline.governor();
        if !governor.check_budget(&workspace) {
            let exceeded = governor.exceeded(&workspace);
            self.pipeline.emit(
                TelemetryEvent::new(Component::Orchestrator, EventOutcome::BudgetDenied, workspace)
                    .with_detail(format!("round {} skipped", snapshot.round)),
            );
            warn!("Round {} aborted: {}", snapshot.round, exceeded);
            return Err(exceeded);
        }

        info!(
            "Council round {} ({}) with {} specialists",
            snapshot.round,
            snapshot.status.as_str(),
            self.specialists.len()
        );
        progress.on_round_start(snapshot.round, snapshot.status, self.specialists.len());

        let mut join_set = JoinSet::new();

        for &specialist in &self.specialists {
            let pipeline = self.pipeline.clone();
            let snapshot = Arc::clone(&snapshot);
            let timeout = self.specialist_timeout;

            join_set.spawn(async move {
                let panicked = SpecialistFailure::Aborted("specialist panicked".to_string());
                let fallback = Contribution::fallback(specialist, snapshot.round, &panicked);
                let label = specialist.cache_role();
                let contribution = pipeline
                    .fallback()
                    .execute_with_fallback(
                        async {
                            Ok::<_, Infallible>(
                                Self::think(&pipeline, specialist, &snapshot, timeout).await,
                            )
                        },
                        fallback,
                        &label,
                    )
                    .await;

                if contribution.thought.degraded {
                    pipeline.emit(
                        TelemetryEvent::new(
                            Component::Specialist(specialist),
                            EventOutcome::Fallback,
                            snapshot.workspace_id.clone(),
                        )
                        .with_detail(contribution.thought.failure.clone().unwrap_or_default()),
                    );
                }
                (specialist, contribution)
            });
        }

        let mut thoughts = Vec::with_capacity(self.specialists.len());
        let mut cost = CostAccumulator::default();
        let mut resolved = HashSet::new();
        let mut denied = Vec::new();

        while let Some(result) = join_set.join_next().await {
            match result {
                Ok((specialist, contribution)) => {
                    debug!(
                        "{} resolved (degraded: {}, confidence {:.2})",
                        specialist, contribution.thought.degraded, contribution.thought.confidence
                    );
                    progress.on_specialist_done(&contribution.thought);
                    cost.add(contribution.tokens, contribution.cost_usd);
                    denied.extend(contribution.denied);
                    resolved.insert(specialist);
                    thoughts.push(contribution.thought);
                }
                Err(e) => {
                    warn!("Council task join error: {}", e);
                }
            }
        }

        // a task that could not be joined still owes the round a thought
        for &specialist in &self.specialists {
            if !resolved.contains(&specialist) {
                let failure = SpecialistFailure::Aborted("task did not complete".to_string());
                let thought = CouncilThought::fallback(specialist, snapshot.round, &failure);
                progress.on_specialist_done(&thought);
                thoughts.push(thought);
            }
        }

        if !self.specialists.is_empty()
            && denied.len() == self.specialists.len()
            && let Some(exceeded) = denied.pop()
        {
            warn!("Round {} aborted: every specialist refused, {}", snapshot.round, exceeded);
            return Err(exceeded);
        }

        let round = CouncilRound::new(snapshot.round, snapshot.status, thoughts);
        info!(
            "Round {} complete: {} ({} degraded)",
            round.round,
            round.summary(),
            round.degraded_count()
        );
        progress.on_round_complete(&round);

        Ok(RoundOutcome { round, cost })
    }

    /// One specialist's full invocation chain, bounded by `timeout`.
    async fn think(
        pipeline: &InvocationPipeline,
        specialist: Specialist,
        snapshot: &StateSnapshot,
        timeout: Duration,
    ) -> Contribution {
        let component = Component::Specialist(specialist);
        let request = InvocationRequest {
            component,
            role: specialist.cache_role(),
            workspace_id: snapshot.workspace_id.clone(),
            system: PromptTemplate::specialist_system(specialist, snapshot.status),
            conversation: vec![ConversationTurn::user(PromptTemplate::specialist_prompt(
                snapshot, specialist,
            ))],
        };

        let failure = match tokio::time::timeout(timeout, pipeline.invoke(&request)).await {
            Ok(Ok(invocation)) => {
                pipeline.emit(invocation.event(component, snapshot.workspace_id.clone()));
                let mut thought = to_thought(specialist, snapshot, &invocation.content);
                if invocation.cached {
                    thought = thought.mark_cached();
                }
                return Contribution {
                    thought,
                    tokens: invocation.usage.total(),
                    cost_usd: invocation.cost_usd,
                    denied: None,
                };
            }
            Ok(Err(InvocationError::Budget(e))) => {
                warn!("{} refused in round {}: {}", specialist, snapshot.round, e);
                return Contribution {
                    denied: Some(e.clone()),
                    ..Contribution::fallback(specialist, snapshot.round, &SpecialistFailure::Budget(e))
                };
            }
            Ok(Err(InvocationError::Inference(e))) => SpecialistFailure::Inference(e.to_string()),
            Err(_) => SpecialistFailure::TimedOut(timeout),
        };

        warn!("{} failed in round {}: {}", specialist, snapshot.round, failure);
        Contribution::fallback(specialist, snapshot.round, &failure)
    }
}

/// What one specialist task hands back to the barrier.
#[derive(Debug, Clone)]
struct Contribution {
    thought: CouncilThought,
    tokens: u64,
    cost_usd: f64,
    /// Set when the call was refused a budget reservation
    denied: Option<BudgetExceeded>,
}

impl Contribution {
    fn fallback(specialist: Specialist, round: usize, failure: &SpecialistFailure) -> Self {
        Self {
            thought: CouncilThought::fallback(specialist, round, failure),
            tokens: 0,
            cost_usd: 0.0,
            denied: None,
        }
    }
}

/// Build a thought from a reply. Claimed subtasks are limited to the
/// specialist's ready assignments; a reply that claims none addresses all
/// of them.
fn to_thought(specialist: Specialist, snapshot: &StateSnapshot, content: &str) -> CouncilThought {
    let reply = parse_thought_reply(content);
    let ready: Vec<SubtaskId> = snapshot
        .ready_assignments(specialist)
        .into_iter()
        .map(|s| s.id.clone())
        .collect();

    let addressed = match reply.addressed_subtasks {
        Some(claimed) => claimed.into_iter().filter(|id| ready.contains(id)).collect(),
        None => ready,
    };

    CouncilThought::new(specialist, snapshot.round, reply.content, reply.confidence)
        .with_addressed(addressed)
        .with_observations(reply.tool_observations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BudgetPolicy, CachePolicy, RetryPolicy};
    use crate::ports::inference_gateway::InferenceError;
    use crate::ports::progress::NoProgress;
    use crate::services::{FallbackManager, ThoughtCache, TokenGovernor};
    use crate::use_cases::testing::{
        RecordingProgress, RecordingTelemetry, Scripted, ScriptedGateway, specialist_needle,
        thought_json,
    };
    use swarm_domain::{
        Mission, OrchestrationState, OrchestrationStatus, SubtaskSpec, TranscriptBudget,
        WorkspaceId,
    };

    struct Harness {
        council: RunCouncilUseCase,
        gateway: Arc<ScriptedGateway>,
        telemetry: Arc<RecordingTelemetry>,
        governor: Arc<TokenGovernor>,
    }

    fn harness(gateway: ScriptedGateway, ceiling: u64, params: MissionParams) -> Harness {
        let gateway = Arc::new(gateway);
        let telemetry = Arc::new(RecordingTelemetry::default());
        let governor = Arc::new(TokenGovernor::new(
            BudgetPolicy::default().with_default_ceiling(ceiling),
        ));
        let pipeline = InvocationPipeline::new(
            gateway.clone(),
            Arc::new(ThoughtCache::new(&CachePolicy::default())),
            governor.clone(),
            telemetry.clone(),
            FallbackManager::new(RetryPolicy::none()),
            &params,
        );
        Harness {
            council: RunCouncilUseCase::new(pipeline, &params),
            gateway,
            telemetry,
            governor,
        }
    }

    fn snapshot(subtasks: Vec<SubtaskSpec>) -> Arc<StateSnapshot> {
        let mut state = OrchestrationState::new(&Mission::new("w1", "Launch"), TranscriptBudget::default());
        state.set_subtasks(subtasks).unwrap();
        state.advance(OrchestrationStatus::Researching).unwrap();
        Arc::new(state.snapshot(1))
    }

    #[tokio::test]
    async fn test_every_specialist_contributes_in_registration_order() {
        let h = harness(
            ScriptedGateway::always(&thought_json("insight", 0.8, &[])),
            100_000,
            MissionParams::default(),
        );
        let progress = RecordingProgress::default();

        let outcome = h.council.run_round(snapshot(Vec::new()), &progress).await.unwrap();

        let order: Vec<Specialist> = outcome.round.thoughts.iter().map(|t| t.specialist).collect();
        assert_eq!(order, Specialist::ALL.to_vec());
        assert!((outcome.round.consensus - 0.8).abs() < 1e-9);
        assert_eq!(outcome.cost.tokens(), 5 * 50);
        assert_eq!(h.gateway.calls(), 5);
        assert_eq!(h.telemetry.count(EventOutcome::Dispatched), 5);
        assert_eq!(h.telemetry.count(EventOutcome::Success), 5);

        let events = progress.events.lock();
        assert_eq!(events.first().map(String::as_str), Some("round_start:1:researching"));
        assert_eq!(events.last().map(String::as_str), Some("round_complete:1"));
        assert_eq!(events.iter().filter(|e| e.starts_with("done:")).count(), 5);
    }

    #[tokio::test]
    async fn test_one_failing_specialist_yields_a_fallback() {
        let gateway = ScriptedGateway::always(&thought_json("insight", 0.9, &[])).rule(
            specialist_needle(Specialist::Creative),
            Scripted::Fail(InferenceError::Authentication("revoked".into())),
        );
        let h = harness(gateway, 100_000, MissionParams::default());

        let outcome = h.council.run_round(snapshot(Vec::new()), &NoProgress).await.unwrap();

        assert_eq!(outcome.round.thoughts.len(), 5);
        let creative = &outcome.round.thoughts[2];
        assert_eq!(creative.specialist, Specialist::Creative);
        assert!(creative.degraded);
        assert_eq!(creative.confidence, 0.0);
        assert!(creative.failure.as_deref().unwrap_or_default().contains("revoked"));
        assert_eq!(outcome.round.degraded_count(), 1);
        assert!((outcome.round.consensus - 0.9 * 4.0 / 5.0).abs() < 1e-9);
        assert_eq!(h.telemetry.count(EventOutcome::Fallback), 1);
    }

    #[tokio::test]
    async fn test_panicking_specialist_is_isolated() {
        let gateway = ScriptedGateway::always(&thought_json("insight", 0.6, &[]))
            .rule(specialist_needle(Specialist::Qa), Scripted::Panic);
        let h = harness(gateway, 100_000, MissionParams::default());

        let outcome = h.council.run_round(snapshot(Vec::new()), &NoProgress).await.unwrap();

        assert_eq!(outcome.round.thoughts.len(), 5);
        let qa = &outcome.round.thoughts[4];
        assert!(qa.degraded);
        assert!(qa.failure.as_deref().unwrap_or_default().contains("panicked"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_specialist_times_out() {
        let gateway = ScriptedGateway::always(&thought_json("insight", 0.7, &[]))
            .rule(specialist_needle(Specialist::Research), Scripted::Hang);
        let params = MissionParams::default().with_specialist_timeout(Duration::from_secs(5));
        let h = harness(gateway, 100_000, params);

        let outcome = h.council.run_round(snapshot(Vec::new()), &NoProgress).await.unwrap();

        let research = &outcome.round.thoughts[0];
        assert!(research.degraded);
        assert!(research.failure.as_deref().unwrap_or_default().contains("timed out"));
        assert_eq!(h.governor.total(&WorkspaceId::new("w1")).reserved, 0);
    }

    #[tokio::test]
    async fn test_exhausted_budget_invokes_nobody() {
        let h = harness(
            ScriptedGateway::always(&thought_json("insight", 0.7, &[])),
            100,
            MissionParams::default(),
        );
        h.governor.record_usage(&WorkspaceId::new("w1"), 100, 0.0);
        assert!(!h.governor.check_budget(&WorkspaceId::new("w1")));

        let err = h.council.run_round(snapshot(Vec::new()), &NoProgress).await.unwrap_err();

        assert_eq!(err.ceiling, 100);
        assert_eq!(h.gateway.calls(), 0);
        assert_eq!(h.telemetry.count(EventOutcome::Dispatched), 0);
        assert_eq!(h.governor.entries(&WorkspaceId::new("w1")).len(), 1);
    }

    #[tokio::test]
    async fn test_round_refused_for_every_specialist_is_budget_exceeded() {
        // headroom left, but less than one reservation
        let h = harness(
            ScriptedGateway::always(&thought_json("insight", 0.7, &[])),
            1_000,
            MissionParams::default().with_reservation_tokens(2_000),
        );
        assert!(h.governor.check_budget(&WorkspaceId::new("w1")));

        let err = h.council.run_round(snapshot(Vec::new()), &NoProgress).await.unwrap_err();

        assert_eq!(err.ceiling, 1_000);
        assert_eq!(h.gateway.calls(), 0);
        assert_eq!(h.telemetry.count(EventOutcome::BudgetDenied), 5);
        assert_eq!(h.governor.total(&WorkspaceId::new("w1")).tokens_used, 0);
    }

    #[tokio::test]
    async fn test_addressed_subtasks_are_limited_to_ready_assignments() {
        let subtasks = vec![
            SubtaskSpec::new("1", Specialist::Research, "Size the market"),
            SubtaskSpec::new("2", Specialist::Research, "Pick a niche").with_dependency("1"),
            SubtaskSpec::new("3", Specialist::Strategy, "Position"),
        ];
        let gateway = ScriptedGateway::always("Advisory note.\nConfidence: 60%").rule(
            specialist_needle(Specialist::Research),
            Scripted::Reply(thought_json("sized", 0.9, &["1", "2", "3"])),
        );
        let params = MissionParams::default()
            .with_specialists(vec![Specialist::Research, Specialist::Strategy]);
        let h = harness(gateway, 100_000, params);

        let outcome = h.council.run_round(snapshot(subtasks), &NoProgress).await.unwrap();

        let research = &outcome.round.thoughts[0];
        assert_eq!(research.addressed_subtasks, vec![SubtaskId::new("1")]);
        let strategy = &outcome.round.thoughts[1];
        assert_eq!(strategy.addressed_subtasks, vec![SubtaskId::new("3")]);
        assert_eq!(strategy.confidence, 0.6);
    }
}
