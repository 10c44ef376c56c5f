//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod context_store;
pub mod inference_gateway;
pub mod progress;
pub mod telemetry;
