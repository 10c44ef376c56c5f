//! Logging infrastructure: structured telemetry logging.
//!
//! Provides [`JsonlTelemetryLogger`], a JSONL file writer that implements
//! the [`TelemetrySink`](swarm_application::TelemetrySink) port.

mod jsonl_telemetry;

pub use jsonl_telemetry::JsonlTelemetryLogger;
