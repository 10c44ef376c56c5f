//! Infrastructure layer for swarm-council
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: configuration file loading, workspace
//! context storage, inference gateways and the JSONL telemetry log.

pub mod config;
pub mod context;
pub mod gateway;
pub mod logging;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileConfig, FileGatewayConfig, FileOutputConfig,
    FileOutputFormat, GatewayProvider,
};
pub use context::{FileContextStore, InMemoryContextStore};
pub use gateway::{OfflineGateway, OpenAiCompatibleGateway};
pub use logging::JsonlTelemetryLogger;
