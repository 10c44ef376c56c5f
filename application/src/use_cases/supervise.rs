//! Supervise use case
//!
//! One supervisor step: the pure [`RoutingPolicy`] decides the next status.
//! In guided mode the gateway is first asked for a proposal, which the
//! policy may honor but never lets past the quality gate.

use super::shared::{InvocationPipeline, InvocationRequest};
use swarm_domain::supervisor::parse_supervisor_reply;
use swarm_domain::{
    Component, ConversationTurn, EventOutcome, OrchestrationState, PromptTemplate, RoutingPolicy,
    SupervisorDecision, SupervisorProposal, TelemetryEvent,
};
use tracing::{debug, warn};

/// Cache and ledger role of the guided supervisor.
pub const SUPERVISOR_ROLE: &str = "supervisor";

/// Use case for supervisor routing
#[derive(Clone)]
pub struct SuperviseUseCase {
    pipeline: InvocationPipeline,
    policy: RoutingPolicy,
    guided: bool,
}

impl SuperviseUseCase {
    pub fn new(pipeline: InvocationPipeline, policy: RoutingPolicy, guided: bool) -> Self {
        Self {
            pipeline,
            policy,
            guided,
        }
    }

    pub fn policy(&self) -> &RoutingPolicy {
        &self.policy
    }

    /// Decide the next step for `state`.
    ///
    /// Returns the decision and the spend of a guided consultation.
    pub async fn step(&self, state: &OrchestrationState) -> (SupervisorDecision, u64, f64) {
        let mut tokens = 0;
        let mut cost_usd = 0.0;

        let proposal = if self.guided && state.status().runs_council() {
            match self.consult(state).await {
                Some((proposal, spent_tokens, spent_cost)) => {
                    tokens = spent_tokens;
                    cost_usd = spent_cost;
                    proposal
                }
                None => None,
            }
        } else {
            None
        };

        let decision = self.policy.decide(
            state.status(),
            state.quality_score(),
            state.transcript(),
            proposal.as_ref(),
        );

        debug!(
            "Supervisor: {} -> {} ({})",
            state.status().as_str(),
            decision.next_status.as_str(),
            decision.rationale
        );
        self.pipeline.emit(
            TelemetryEvent::new(
                Component::Supervisor,
                EventOutcome::Decision,
                state.workspace_id().clone(),
            )
            .with_spend(tokens, cost_usd)
            .with_detail(format!(
                "{} -> {}",
                state.status().as_str(),
                decision.next_status.as_str()
            )),
        );

        (decision, tokens, cost_usd)
    }

    /// Ask the gateway for a proposal. `None` when the call itself failed;
    /// `Some((None, ..))` when the reply was not a usable proposal.
    async fn consult(
        &self,
        state: &OrchestrationState,
    ) -> Option<(Option<SupervisorProposal>, u64, f64)> {
        let component = Component::Supervisor;
        let request = InvocationRequest {
            component,
            role: SUPERVISOR_ROLE.to_string(),
            workspace_id: state.workspace_id().clone(),
            system: PromptTemplate::supervisor_system().to_string(),
            conversation: vec![ConversationTurn::user(PromptTemplate::supervisor_prompt(
                state.goal(),
                state.status(),
                state.quality_score(),
                self.policy.quality_threshold,
                &state.transcript().render_recent(),
            ))],
        };

        match self.pipeline.invoke(&request).await {
            Ok(invocation) => {
                self.pipeline
                    .emit(invocation.event(component, state.workspace_id().clone()));
                let proposal = parse_supervisor_reply(&invocation.content);
                if proposal.is_none() {
                    warn!("Supervisor proposal unreadable, routing by rules only");
                }
                Some((proposal, invocation.usage.total(), invocation.cost_usd))
            }
            Err(e) => {
                self.pipeline.emit(
                    TelemetryEvent::new(
                        component,
                        EventOutcome::Failure,
                        state.workspace_id().clone(),
                    )
                    .with_detail(e.to_string()),
                );
                warn!("Supervisor consultation failed, routing by rules only: {}", e);
                None
            }
        }
    }
}
