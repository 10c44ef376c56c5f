//! Application layer for swarm-council
//!
//! This crate contains use cases, port definitions, shared services and
//! application configuration. It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod services;
pub mod use_cases;

// Re-export commonly used types
pub use config::{BudgetPolicy, CachePolicy, MissionParams, RetryPolicy};
pub use ports::{
    context_store::{ContextStore, ContextStoreError},
    inference_gateway::{InferenceError, InferenceGateway, InferenceReply},
    progress::{MissionProgress, NoProgress},
    telemetry::{CompositeTelemetry, NoTelemetry, TelemetrySink},
};
pub use services::{
    FallbackManager, HealthMonitor, HealthReport, HealthStatus, HealthThresholds, ThoughtCache,
    TokenGovernor,
};
pub use use_cases::decompose::DecomposeUseCase;
pub use use_cases::run_council::{RoundOutcome, RunCouncilUseCase};
pub use use_cases::run_mission::{MissionDeps, RunMissionUseCase};
pub use use_cases::shared::{Invocation, InvocationError, InvocationPipeline, InvocationRequest};
pub use use_cases::supervise::SuperviseUseCase;
