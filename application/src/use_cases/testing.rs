//! Scripted port implementations shared by the use case tests.

use crate::ports::context_store::{ContextStore, ContextStoreError};
use crate::ports::inference_gateway::{InferenceError, InferenceGateway, InferenceReply};
use crate::ports::progress::MissionProgress;
use crate::ports::telemetry::TelemetrySink;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use swarm_domain::{
    ConversationTurn, CouncilRound, CouncilThought, EventOutcome, Mission, MissionStatus,
    OrchestrationStatus, Specialist, SubtaskSpec, SupervisorDecision, TelemetryEvent, TokenUsage,
    WorkspaceId,
};

pub(crate) const PLANNER: &str = "planner of a council";
pub(crate) const SUPERVISOR: &str = "You supervise";

pub(crate) fn specialist_needle(specialist: Specialist) -> String {
    format!("You are the {} ", specialist.display_name())
}

#[derive(Debug, Clone)]
pub(crate) enum Scripted {
    Reply(String),
    Fail(InferenceError),
    Hang,
    Panic,
}

/// Gateway answering by the first rule whose needle occurs in the system
/// prompt.
pub(crate) struct ScriptedGateway {
    rules: Vec<(String, Scripted)>,
    default: Scripted,
    usage: Option<TokenUsage>,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGateway {
    pub(crate) fn new(default: Scripted) -> Self {
        Self {
            rules: Vec::new(),
            default,
            usage: Some(TokenUsage::new(40, 10)),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn always(content: &str) -> Self {
        Self::new(Scripted::Reply(content.to_string()))
    }

    pub(crate) fn failing(error: InferenceError) -> Self {
        Self::new(Scripted::Fail(error))
    }

    pub(crate) fn rule(mut self, needle: impl Into<String>, reply: Scripted) -> Self {
        self.rules.push((needle.into(), reply));
        self
    }

    pub(crate) fn without_usage(mut self) -> Self {
        self.usage = None;
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of calls whose system prompt contained `needle`.
    pub(crate) fn calls_matching(&self, needle: &str) -> usize {
        self.prompts.lock().iter().filter(|p| p.contains(needle)).count()
    }
}

#[async_trait]
impl InferenceGateway for ScriptedGateway {
    async fn invoke(
        &self,
        role_instructions: &str,
        conversation: &[ConversationTurn],
    ) -> Result<InferenceReply, InferenceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().push(role_instructions.to_string());

        let scripted = self
            .rules
            .iter()
            .find(|(needle, _)| role_instructions.contains(needle.as_str()))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| self.default.clone());

        match scripted {
            Scripted::Reply(content) => Ok(InferenceReply::new(
                content,
                self.usage.unwrap_or_default(),
            )),
            Scripted::Fail(error) => Err(error),
            Scripted::Hang => {
                tokio::time::sleep(Duration::from_secs(3_600)).await;
                Err(InferenceError::Timeout)
            }
            Scripted::Panic => panic!("scripted panic for {} turns", conversation.len()),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

#[derive(Default)]
pub(crate) struct RecordingTelemetry {
    events: Mutex<Vec<TelemetryEvent>>,
}

impl RecordingTelemetry {
    pub(crate) fn outcomes(&self) -> Vec<EventOutcome> {
        self.events.lock().iter().map(|e| e.outcome).collect()
    }

    pub(crate) fn count(&self, outcome: EventOutcome) -> usize {
        self.events.lock().iter().filter(|e| e.outcome == outcome).count()
    }
}

impl TelemetrySink for RecordingTelemetry {
    fn record(&self, event: &TelemetryEvent) {
        self.events.lock().push(event.clone());
    }
}

/// In-memory store counting loads and saves.
#[derive(Default)]
pub(crate) struct CountingStore {
    pub(crate) data: Mutex<HashMap<WorkspaceId, Map<String, Value>>>,
    pub(crate) loads: AtomicUsize,
    pub(crate) saves: AtomicUsize,
    pub(crate) fail_load: bool,
}

impl CountingStore {
    pub(crate) fn with(workspace: &str, context: Map<String, Value>) -> Self {
        let store = Self::default();
        store.data.lock().insert(WorkspaceId::new(workspace), context);
        store
    }

    pub(crate) fn saved(&self, workspace: &str) -> Option<Map<String, Value>> {
        self.data.lock().get(&WorkspaceId::new(workspace)).cloned()
    }
}

#[async_trait]
impl ContextStore for CountingStore {
    async fn load(&self, workspace: &WorkspaceId) -> Result<Map<String, Value>, ContextStoreError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if self.fail_load {
            return Err(ContextStoreError::Unavailable("scripted outage".to_string()));
        }
        Ok(self.data.lock().get(workspace).cloned().unwrap_or_default())
    }

    async fn save(
        &self,
        workspace: &WorkspaceId,
        context: &Map<String, Value>,
    ) -> Result<(), ContextStoreError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.data.lock().insert(workspace.clone(), context.clone());
        Ok(())
    }
}

/// Progress observer recording callback names.
#[derive(Default)]
pub(crate) struct RecordingProgress {
    pub(crate) events: Mutex<Vec<String>>,
}

impl MissionProgress for RecordingProgress {
    fn on_decomposed(&self, _mission: &Mission, subtasks: &[SubtaskSpec]) {
        self.events.lock().push(format!("decomposed:{}", subtasks.len()));
    }

    fn on_round_start(&self, round: usize, status: OrchestrationStatus, _specialists: usize) {
        self.events
            .lock()
            .push(format!("round_start:{}:{}", round, status.as_str()));
    }

    fn on_specialist_done(&self, thought: &CouncilThought) {
        self.events
            .lock()
            .push(format!("done:{}", thought.specialist));
    }

    fn on_round_complete(&self, round: &CouncilRound) {
        self.events
            .lock()
            .push(format!("round_complete:{}", round.round));
    }

    fn on_decision(&self, decision: &SupervisorDecision) {
        self.events
            .lock()
            .push(format!("decision:{}", decision.next_status.as_str()));
    }

    fn on_mission_finished(&self, status: MissionStatus) {
        self.events.lock().push(format!("finished:{}", status));
    }
}

/// A specialist reply in the JSON shape the prompts ask for.
pub(crate) fn thought_json(content: &str, confidence: f64, addressed: &[&str]) -> String {
    serde_json::json!({
        "content": content,
        "confidence": confidence,
        "addressed_subtasks": addressed,
    })
    .to_string()
}

/// A decomposition reply with one subtask per `(id, type, deps)`.
pub(crate) fn plan_json(subtasks: &[(&str, &str, &[&str])]) -> String {
    let items: Vec<Value> = subtasks
        .iter()
        .map(|(id, kind, deps)| {
            serde_json::json!({
                "id": id,
                "specialist_type": kind,
                "objective": format!("Work item {}", id),
                "success_criteria": [format!("{} is done", id)],
                "dependencies": deps,
            })
        })
        .collect();
    format!("```subtasks\n{}\n```", serde_json::json!({ "subtasks": items }))
}
