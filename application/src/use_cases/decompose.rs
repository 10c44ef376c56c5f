//! Decompose use case
//!
//! Turns a mission goal into a validated, dependency-ordered list of
//! subtasks. Any failure here is fatal to the mission.

use super::shared::{InvocationError, InvocationPipeline, InvocationRequest};
use serde_json::{Map, Value};
use swarm_domain::{
    Component, ConversationTurn, CostAccumulator, DecompositionError, DomainError, EventOutcome,
    Mission, PromptTemplate, SubtaskSpec, TelemetryEvent, parse_decomposition,
};
use tracing::{debug, info, warn};

/// Cache and ledger role of the decomposer.
pub const PLANNER_ROLE: &str = "planner";

/// Use case for decomposing a goal into subtasks
#[derive(Clone)]
pub struct DecomposeUseCase {
    pipeline: InvocationPipeline,
}

impl DecomposeUseCase {
    pub fn new(pipeline: InvocationPipeline) -> Self {
        Self { pipeline }
    }

    /// Decompose `mission`'s goal, with `prior_context` included in the
    /// conversation.
    ///
    /// Budget exhaustion surfaces as [`DomainError::BudgetExceeded`]; every
    /// other failure as [`DomainError::Decomposition`].
    pub async fn decompose(
        &self,
        mission: &Mission,
        prior_context: &Map<String, Value>,
    ) -> Result<Vec<SubtaskSpec>, DomainError> {
        self.decompose_metered(mission, prior_context).await.0
    }

    /// [`decompose`](Self::decompose), also returning what the call cost.
    ///
    /// The spend is reported on failure too: a reply that was paid for but
    /// could not be parsed still counts toward the mission's cost.
    pub async fn decompose_metered(
        &self,
        mission: &Mission,
        prior_context: &Map<String, Value>,
    ) -> (Result<Vec<SubtaskSpec>, DomainError>, CostAccumulator) {
        let mut cost = CostAccumulator::default();
        let workspace = mission.workspace_id().clone();
        if mission.uses_placeholder_goal() {
            info!("No goal given for workspace {}, using placeholder goal", workspace);
        }

        let request = InvocationRequest {
            component: Component::Decomposer,
            role: PLANNER_ROLE.to_string(),
            workspace_id: workspace.clone(),
            system: PromptTemplate::decomposition_system().to_string(),
            conversation: vec![ConversationTurn::user(PromptTemplate::decomposition_prompt(
                mission.goal(),
                prior_context,
            ))],
        };

        let invocation = match self.pipeline.invoke(&request).await {
            Ok(invocation) => invocation,
            Err(InvocationError::Budget(e)) => {
                self.pipeline.emit(
                    TelemetryEvent::new(Component::Decomposer, EventOutcome::Failure, workspace)
                        .with_detail(e.to_string()),
                );
                warn!("Decomposition refused: {}", e);
                return (Err(e.into()), cost);
            }
            Err(InvocationError::Inference(e)) => {
                self.pipeline.emit(
                    TelemetryEvent::new(Component::Decomposer, EventOutcome::Failure, workspace)
                        .with_detail(e.to_string()),
                );
                return (Err(DecompositionError::Inference(e.to_string()).into()), cost);
            }
        };
        cost.add(invocation.usage.total(), invocation.cost_usd);

        match parse_decomposition(&invocation.content) {
            Ok(subtasks) => {
                self.pipeline
                    .emit(invocation.event(Component::Decomposer, workspace).with_detail(format!(
                        "{} subtasks",
                        subtasks.len()
                    )));
                debug!(
                    "Decomposed into: {}",
                    subtasks
                        .iter()
                        .map(|s| s.id.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                );
                (Ok(subtasks), cost)
            }
            Err(e) => {
                // an unusable plan must not be served again from the cache
                self.pipeline
                    .cache()
                    .invalidate(&request.role, &request.cache_messages());
                self.pipeline.emit(
                    TelemetryEvent::new(Component::Decomposer, EventOutcome::Failure, workspace)
                        .with_spend(invocation.usage.total(), invocation.cost_usd)
                        .with_detail(e.to_string()),
                );
                warn!("Decomposition failed: {}", e);
                (Err(e.into()), cost)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BudgetPolicy, CachePolicy, MissionParams, RetryPolicy};
    use crate::ports::inference_gateway::InferenceError;
    use crate::services::{FallbackManager, ThoughtCache, TokenGovernor};
    use crate::use_cases::testing::{RecordingTelemetry, ScriptedGateway, plan_json};
    use std::sync::Arc;
    use swarm_domain::{PLACEHOLDER_GOAL, Specialist, WorkspaceId};

    fn use_case(gateway: Arc<ScriptedGateway>, ceiling: u64) -> (DecomposeUseCase, Arc<RecordingTelemetry>) {
        let telemetry = Arc::new(RecordingTelemetry::default());
        let pipeline = InvocationPipeline::new(
            gateway,
            Arc::new(ThoughtCache::new(&CachePolicy::default())),
            Arc::new(TokenGovernor::new(
                BudgetPolicy::default().with_default_ceiling(ceiling),
            )),
            telemetry.clone(),
            FallbackManager::new(RetryPolicy::none()),
            &MissionParams::default(),
        );
        (DecomposeUseCase::new(pipeline), telemetry)
    }

    #[tokio::test]
    async fn test_decompose_orders_subtasks() {
        let reply = plan_json(&[("2", "strategy", &["1"]), ("1", "research", &[])]);
        let gateway = Arc::new(ScriptedGateway::always(&reply));
        let (use_case, telemetry) = use_case(gateway, 100_000);

        let subtasks = use_case
            .decompose(&Mission::new("w1", "Launch a newsletter"), &Map::new())
            .await
            .unwrap();

        assert_eq!(subtasks.len(), 2);
        assert_eq!(subtasks[0].id.as_str(), "1");
        assert_eq!(subtasks[0].specialist_type, Specialist::Research);
        assert_eq!(subtasks[1].id.as_str(), "2");
        assert_eq!(telemetry.count(EventOutcome::Success), 1);
    }

    #[tokio::test]
    async fn test_unparsable_reply_is_fatal_and_not_cached() {
        let gateway = Arc::new(ScriptedGateway::always("I would start with research."));
        let (use_case, telemetry) = use_case(Arc::clone(&gateway), 100_000);
        let mission = Mission::new("w1", "Launch");

        let (result, cost) = use_case.decompose_metered(&mission, &Map::new()).await;
        let err = result.unwrap_err();
        assert!(matches!(err, DomainError::Decomposition(DecompositionError::Unparsable(_))));
        assert_eq!(telemetry.count(EventOutcome::Failure), 1);
        assert_eq!(cost.tokens(), 50);

        let _ = use_case.decompose(&mission, &Map::new()).await;
        assert_eq!(gateway.calls(), 2);
    }

    #[tokio::test]
    async fn test_unknown_specialist_is_rejected() {
        let reply = plan_json(&[("1", "astrologer", &[])]);
        let gateway = Arc::new(ScriptedGateway::always(&reply));
        let (use_case, _) = use_case(gateway, 100_000);

        let err = use_case
            .decompose(&Mission::new("w1", "Launch"), &Map::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::Decomposition(DecompositionError::UnknownSpecialist { .. })
        ));
    }

    #[tokio::test]
    async fn test_inference_failure_is_decomposition_error() {
        let gateway = Arc::new(ScriptedGateway::failing(InferenceError::Authentication(
            "bad key".into(),
        )));
        let (use_case, _) = use_case(gateway, 100_000);

        let err = use_case
            .decompose(&Mission::new("w1", "Launch"), &Map::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Decomposition(DecompositionError::Inference(_))));
    }

    #[tokio::test]
    async fn test_exhausted_budget_makes_no_call() {
        let gateway = Arc::new(ScriptedGateway::always("unused"));
        let (use_case, telemetry) = use_case(Arc::clone(&gateway), 0);

        let err = use_case
            .decompose(&Mission::new("w1", "Launch"), &Map::new())
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::BudgetExceeded(_)));
        assert_eq!(gateway.calls(), 0);
        // the dispatch is still resolved by a terminal event
        assert_eq!(telemetry.count(EventOutcome::Dispatched), 1);
        assert_eq!(telemetry.count(EventOutcome::Failure), 1);
    }

    #[tokio::test]
    async fn test_blank_goal_uses_placeholder_and_context() {
        let reply = plan_json(&[("1", "operator", &[])]);
        let gateway = Arc::new(ScriptedGateway::always(&reply));
        let (use_case, _) = use_case(gateway, 100_000);
        let mission = Mission::new(WorkspaceId::new("w1"), "   ");
        assert_eq!(mission.goal(), PLACEHOLDER_GOAL);

        let mut context = Map::new();
        context.insert("industry".into(), Value::from("bakery"));
        let subtasks = use_case.decompose(&mission, &context).await.unwrap();
        assert_eq!(subtasks[0].specialist_type, Specialist::Operator);
    }
}
