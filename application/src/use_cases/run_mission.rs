//! Run Mission use case
//!
//! Drives one mission end to end:
//!
//! ```text
//! load context ─▶ decompose ─▶ ┌─▶ supervise ─▶ [council round] ─┐ ─▶ save context
//!                              └──────────── until COMPLETE ─────┘
//! ```
//!
//! Hard stops: budget exhaustion, the iteration ceiling, the wall-clock
//! ceiling and cancellation. None of them is an error at this boundary;
//! each becomes a [`MissionStatus`] on the returned [`MissionOutcome`].

use super::decompose::DecomposeUseCase;
use super::run_council::RunCouncilUseCase;
use super::shared::{InvocationPipeline, check_cancelled};
use super::supervise::SuperviseUseCase;
use crate::config::MissionParams;
use crate::ports::context_store::ContextStore;
use crate::ports::inference_gateway::InferenceGateway;
use crate::ports::progress::{MissionProgress, NoProgress};
use crate::ports::telemetry::TelemetrySink;
use crate::services::{FallbackManager, ThoughtCache, TokenGovernor};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use swarm_domain::state::SUPERVISOR_INSTRUCTIONS_KEY;
use swarm_domain::{
    Blackboard, BudgetExceeded, Component, DomainError, EventOutcome, MessageKind, Mission,
    MissionOutcome, MissionRequest, MissionStatus, OrchestrationState, StateCorruption,
    TelemetryEvent,
};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Everything a mission needs, injected at construction.
#[derive(Clone)]
pub struct MissionDeps {
    pub gateway: Arc<dyn InferenceGateway>,
    pub context_store: Arc<dyn ContextStore>,
    pub cache: Arc<ThoughtCache>,
    pub governor: Arc<TokenGovernor>,
    pub telemetry: Arc<dyn TelemetrySink>,
    pub fallback: FallbackManager,
    pub params: MissionParams,
}

/// Why the mission loop stopped before COMPLETE.
#[derive(Error, Debug)]
enum Halt {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Iteration limit of {0} reached before completion")]
    IterationLimit(usize),

    #[error("Mission exceeded its {}s wall-clock limit", .0.as_secs())]
    TimedOut(Duration),
}

impl From<BudgetExceeded> for Halt {
    fn from(e: BudgetExceeded) -> Self {
        Halt::Domain(e.into())
    }
}

impl From<StateCorruption> for Halt {
    fn from(e: StateCorruption) -> Self {
        Halt::Domain(e.into())
    }
}

impl Halt {
    fn status(&self) -> MissionStatus {
        match self {
            Halt::Domain(DomainError::Decomposition(_)) => MissionStatus::DecompositionFailed,
            Halt::Domain(DomainError::BudgetExceeded(_)) => MissionStatus::BudgetExceeded,
            Halt::Domain(DomainError::StateCorruption(_)) => MissionStatus::StateCorruption,
            Halt::Domain(DomainError::Cancelled) => MissionStatus::Cancelled,
            Halt::IterationLimit(_) => MissionStatus::IterationLimitReached,
            Halt::TimedOut(_) => MissionStatus::TimedOut,
        }
    }
}

/// Use case for running a mission
pub struct RunMissionUseCase {
    context_store: Arc<dyn ContextStore>,
    params: MissionParams,
    pipeline: InvocationPipeline,
    decompose: DecomposeUseCase,
    council: RunCouncilUseCase,
    supervise: SuperviseUseCase,
    cancellation_token: Option<CancellationToken>,
}

impl RunMissionUseCase {
    pub fn new(deps: MissionDeps) -> Self {
        let pipeline = InvocationPipeline::new(
            deps.gateway,
            deps.cache,
            deps.governor,
            deps.telemetry,
            deps.fallback,
            &deps.params,
        );
        Self {
            context_store: deps.context_store,
            decompose: DecomposeUseCase::new(pipeline.clone()),
            council: RunCouncilUseCase::new(pipeline.clone(), &deps.params),
            supervise: SuperviseUseCase::new(
                pipeline.clone(),
                deps.params.routing_policy(),
                deps.params.guided_supervisor,
            ),
            pipeline,
            params: deps.params,
            cancellation_token: None,
        }
    }

    /// Set a cancellation token for graceful shutdown
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation_token = Some(token);
        self
    }

    pub fn params(&self) -> &MissionParams {
        &self.params
    }

    /// Execute the mission with default (no-op) progress
    pub async fn execute(&self, request: MissionRequest) -> MissionOutcome {
        self.execute_with_progress(request, &NoProgress).await
    }

    /// Execute the mission with progress callbacks
    pub async fn execute_with_progress(
        &self,
        request: MissionRequest,
        progress: &dyn MissionProgress,
    ) -> MissionOutcome {
        let mission = Mission::new(request.workspace_id.clone(), request.goal.clone());
        let workspace = mission.workspace_id().clone();
        info!("Starting mission {} for workspace {}", mission.id(), workspace);
        self.pipeline.emit(TelemetryEvent::new(
            Component::Orchestrator,
            EventOutcome::Dispatched,
            workspace.clone(),
        ));
        let started = tokio::time::Instant::now();

        let mut state = OrchestrationState::new(&mission, self.params.transcript.clone());
        let mut blackboard = Blackboard::new();

        let prior = match self.context_store.load(&workspace).await {
            Ok(context) => context,
            Err(e) => {
                warn!("Could not load context for workspace {}, starting empty: {}", workspace, e);
                Map::new()
            }
        };
        state.merge_context(prior);
        state.merge_context(request.effective_overrides());
        state.append("user", MessageKind::Goal, mission.goal());

        let limit = self.params.mission_timeout;
        let result = {
            let drive = self.drive(&mission, &mut state, &mut blackboard, progress);
            let cancelled = async {
                match &self.cancellation_token {
                    Some(token) => token.cancelled().await,
                    None => std::future::pending().await,
                }
            };
            tokio::select! {
                result = tokio::time::timeout(limit, drive) => {
                    result.unwrap_or(Err(Halt::TimedOut(limit)))
                }
                _ = cancelled => Err(Halt::Domain(DomainError::Cancelled)),
            }
        };

        let (status, error) = match result {
            Ok(()) if blackboard.degraded_count() > 0 => (MissionStatus::Degraded, None),
            Ok(()) => (MissionStatus::Completed, None),
            Err(halt) => {
                warn!("Mission {} stopped: {}", mission.id(), halt);
                state.append(
                    "orchestrator",
                    MessageKind::System,
                    format!("Mission stopped: {}", halt),
                );
                (halt.status(), Some(halt.to_string()))
            }
        };

        let unaddressed_subtasks = state.unaddressed_subtasks();
        if status.is_success() && !unaddressed_subtasks.is_empty() {
            warn!(
                "Mission {} completed with {} subtasks never addressed: {}",
                mission.id(),
                unaddressed_subtasks.len(),
                unaddressed_subtasks
                    .iter()
                    .map(|id| id.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }

        self.persist(&mission, &mut state, status).await;

        let cost = state.cost();
        self.pipeline.emit(
            TelemetryEvent::new(
                Component::Orchestrator,
                if status.is_success() {
                    EventOutcome::Success
                } else {
                    EventOutcome::Failure
                },
                workspace,
            )
            .with_latency(started.elapsed())
            .with_spend(cost.tokens(), cost.cost_usd())
            .with_detail(status.as_str()),
        );
        info!(
            "Mission {} finished: {} (quality {:.2}, {} tokens, ${:.4})",
            mission.id(),
            status,
            state.quality_score(),
            cost.tokens(),
            cost.cost_usd()
        );
        progress.on_mission_finished(status);

        let rounds = blackboard.rounds().len();
        MissionOutcome {
            status,
            messages: state.transcript().to_vec(),
            evicted_messages: state.transcript().evicted(),
            context_variables: state.context_variables().clone(),
            last_agent: state.last_agent().map(str::to_string),
            quality_score: state.quality_score(),
            thoughts: blackboard.into_thoughts(),
            subtasks: state.subtask_specs().to_vec(),
            unaddressed_subtasks,
            cost,
            iterations: state.iteration(),
            rounds,
            error,
            mission,
        }
    }

    /// Decompose, then alternate supervisor steps and council rounds until
    /// the supervisor reaches COMPLETE.
    async fn drive(
        &self,
        mission: &Mission,
        state: &mut OrchestrationState,
        blackboard: &mut Blackboard,
        progress: &dyn MissionProgress,
    ) -> Result<(), Halt> {
        check_cancelled(&self.cancellation_token)?;

        let (decomposed, spent) = self
            .decompose
            .decompose_metered(mission, state.context_variables())
            .await;
        state.add_cost(spent.tokens(), spent.cost_usd());
        state.set_subtasks(decomposed?)?;
        let plan = state
            .subtask_specs()
            .iter()
            .map(|s| s.summary_line())
            .collect::<Vec<_>>()
            .join("\n");
        state.append("decomposer", MessageKind::Plan, plan);
        progress.on_decomposed(mission, state.subtask_specs());

        loop {
            check_cancelled(&self.cancellation_token)?;
            if state.iteration() >= self.params.max_iterations {
                return Err(Halt::IterationLimit(self.params.max_iterations));
            }
            state.begin_iteration();

            let (decision, tokens, cost_usd) = self.supervise.step(state).await;
            state.add_cost(tokens, cost_usd);
            state.advance(decision.next_status)?;
            state.set_next_node(decision.node());
            if let Some(instructions) = &decision.instructions {
                state.set_context(SUPERVISOR_INSTRUCTIONS_KEY, instructions.clone());
            }
            state.append("supervisor", MessageKind::Decision, &decision.rationale);
            progress.on_decision(&decision);

            if state.status().is_terminal() {
                return Ok(());
            }
            if !decision.run_council {
                continue;
            }

            let snapshot = Arc::new(state.snapshot(blackboard.next_round_number()));
            let outcome = self.council.run_round(snapshot, progress).await?;

            for thought in &outcome.round.thoughts {
                let kind = if thought.degraded {
                    MessageKind::Fallback
                } else {
                    state.mark_addressed(&thought.addressed_subtasks);
                    MessageKind::Thought
                };
                state.append(thought.agent_id.clone(), kind, &thought.content);
            }
            state.set_quality(outcome.round.consensus)?;
            state.add_cost(outcome.cost.tokens(), outcome.cost.cost_usd());
            blackboard.record(outcome.round);
        }
    }

    /// Stamp the outcome into the context bag and save it once.
    async fn persist(&self, mission: &Mission, state: &mut OrchestrationState, status: MissionStatus) {
        let quality = state.quality_score();
        let last_agent = state.last_agent().map(str::to_string);
        let mut completed: Vec<String> = state
            .completed_subtasks()
            .iter()
            .map(|id| id.to_string())
            .collect();
        completed.sort();

        state.set_context("last_mission_id", mission.id().to_string());
        state.set_context("last_status", status.as_str());
        state.set_context("last_quality_score", quality);
        state.set_context("last_agent", Value::from(last_agent));
        state.set_context("completed_subtasks", completed);

        if let Err(e) = self
            .context_store
            .save(mission.workspace_id(), state.context_variables())
            .await
        {
            warn!(
                "Could not save context for workspace {}: {}",
                mission.workspace_id(),
                e
            );
        }
    }
}
