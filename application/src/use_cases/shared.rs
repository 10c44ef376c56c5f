//! Shared invocation pipeline for use cases.
//!
//! Every spend-incurring call (decomposition, specialists, guided
//! supervision) goes through [`InvocationPipeline::invoke`]:
//!
//! ```text
//! cache get ──hit──▶ return (no reservation, no ledger write)
//!     │miss
//!     ▼
//! try_reserve ──denied──▶ BudgetExceeded
//!     │
//!     ▼
//! invoke with retry ──err──▶ release reservation
//!     │ok
//!     ▼
//! commit usage ─▶ cache set ─▶ return
//! ```
//!
//! The pipeline emits `Dispatched`, `BudgetDenied` and `BudgetOverrun`
//! events; callers emit the terminal outcome of each dispatch.

use crate::config::MissionParams;
use crate::ports::inference_gateway::{InferenceError, InferenceGateway};
use crate::ports::telemetry::TelemetrySink;
use crate::services::{Commit, FallbackManager, Reservation, ThoughtCache, TokenGovernor};
use std::sync::Arc;
use std::time::Duration;
use swarm_domain::{
    BudgetExceeded, Component, ConversationTurn, DomainError, EventOutcome, TelemetryEvent,
    TokenUsage, WorkspaceId,
};
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Why an invocation produced no reply.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InvocationError {
    #[error(transparent)]
    Budget(#[from] BudgetExceeded),

    #[error(transparent)]
    Inference(#[from] InferenceError),
}

/// One call to make.
#[derive(Debug, Clone)]
pub struct InvocationRequest {
    pub component: Component,
    /// Cache and ledger label (`planner`, `specialist:qa`, `supervisor`)
    pub role: String,
    pub workspace_id: WorkspaceId,
    pub system: String,
    pub conversation: Vec<ConversationTurn>,
}

impl InvocationRequest {
    /// System prompt plus conversation, as seen by the cache.
    pub fn cache_messages(&self) -> Vec<ConversationTurn> {
        let mut messages = Vec::with_capacity(self.conversation.len() + 1);
        messages.push(ConversationTurn::system(self.system.clone()));
        messages.extend(self.conversation.iter().cloned());
        messages
    }
}

/// A reply and what it cost.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub content: String,
    pub usage: TokenUsage,
    pub cost_usd: f64,
    pub cached: bool,
    pub latency: Duration,
}

impl Invocation {
    /// Terminal telemetry event for a successful dispatch.
    pub fn event(&self, component: Component, workspace_id: WorkspaceId) -> TelemetryEvent {
        let outcome = if self.cached {
            EventOutcome::CacheHit
        } else {
            EventOutcome::Success
        };
        TelemetryEvent::new(component, outcome, workspace_id)
            .with_latency(self.latency)
            .with_spend(self.usage.total(), self.cost_usd)
    }
}

/// Releases a reservation that was neither committed nor released, e.g. when
/// the surrounding future is cancelled by a timeout.
struct ReservationGuard {
    governor: Arc<TokenGovernor>,
    reservation: Option<Reservation>,
}

impl ReservationGuard {
    fn commit(mut self, usage: TokenUsage) -> Option<Commit> {
        self.reservation
            .take()
            .map(|reservation| self.governor.commit(reservation, usage))
    }
}

impl Drop for ReservationGuard {
    fn drop(&mut self) {
        if let Some(reservation) = self.reservation.take() {
            self.governor.release(reservation);
        }
    }
}

/// Cache → budget → retry → commit pipeline shared by all use cases.
#[derive(Clone)]
pub struct InvocationPipeline {
    gateway: Arc<dyn InferenceGateway>,
    cache: Arc<ThoughtCache>,
    governor: Arc<TokenGovernor>,
    telemetry: Arc<dyn TelemetrySink>,
    fallback: FallbackManager,
    reservation_tokens: u64,
}

impl InvocationPipeline {
    pub fn new(
        gateway: Arc<dyn InferenceGateway>,
        cache: Arc<ThoughtCache>,
        governor: Arc<TokenGovernor>,
        telemetry: Arc<dyn TelemetrySink>,
        fallback: FallbackManager,
        params: &MissionParams,
    ) -> Self {
        Self {
            gateway,
            cache,
            governor,
            telemetry,
            fallback,
            reservation_tokens: params.reservation_tokens,
        }
    }

    pub fn governor(&self) -> &Arc<TokenGovernor> {
        &self.governor
    }

    pub fn cache(&self) -> &Arc<ThoughtCache> {
        &self.cache
    }

    pub fn fallback(&self) -> &FallbackManager {
        &self.fallback
    }

    pub fn emit(&self, event: TelemetryEvent) {
        self.telemetry.record(&event);
    }

    /// Run one call through the pipeline.
    pub async fn invoke(&self, request: &InvocationRequest) -> Result<Invocation, InvocationError> {
        let started = Instant::now();
        let workspace = &request.workspace_id;
        self.emit(TelemetryEvent::new(
            request.component,
            EventOutcome::Dispatched,
            workspace.clone(),
        ));

        let cache_messages = request.cache_messages();
        if let Some(content) = self.cache.get(&request.role, &cache_messages) {
            return Ok(Invocation {
                content,
                usage: TokenUsage::default(),
                cost_usd: 0.0,
                cached: true,
                latency: started.elapsed(),
            });
        }

        let reservation = match self
            .governor
            .try_reserve(workspace, self.reservation_tokens, request.role.clone())
        {
            Ok(reservation) => reservation,
            Err(e) => {
                self.emit(
                    TelemetryEvent::new(request.component, EventOutcome::BudgetDenied, workspace.clone())
                        .with_detail(e.to_string()),
                );
                return Err(e.into());
            }
        };
        let guard = ReservationGuard {
            governor: Arc::clone(&self.governor),
            reservation: Some(reservation),
        };

        let reply = self
            .fallback
            .execute_with_retry(&request.role, |_| {
                self.gateway.invoke(&request.system, &request.conversation)
            })
            .await?;

        let usage = if reply.token_usage.total() == 0 {
            let prompt: String = cache_messages.iter().map(|m| m.content.as_str()).collect();
            TokenUsage::estimate(&prompt, &reply.content)
        } else {
            reply.token_usage
        };

        let commit = guard.commit(usage);
        let cost_usd = commit.as_ref().map_or(0.0, |c| c.entry.cost_usd);
        if let Some(over) = commit.and_then(|c| c.overrun) {
            self.emit(
                TelemetryEvent::new(request.component, EventOutcome::BudgetOverrun, workspace.clone())
                    .with_spend(usage.total(), cost_usd)
                    .with_detail(format!("{} tokens over reservation", over)),
            );
        }

        self.cache.set(&request.role, &cache_messages, reply.content.clone());
        debug!(
            "{} answered with {} tokens via {}",
            request.role,
            usage.total(),
            self.gateway.name()
        );

        Ok(Invocation {
            content: reply.content,
            usage,
            cost_usd,
            cached: false,
            latency: started.elapsed(),
        })
    }
}

/// Check if cancellation has been requested.
///
/// Returns `Err(DomainError::Cancelled)` if the token exists and is cancelled.
pub(crate) fn check_cancelled(token: &Option<CancellationToken>) -> Result<(), DomainError> {
    if let Some(token) = token
        && token.is_cancelled()
    {
        return Err(DomainError::Cancelled);
    }
    Ok(())
}
