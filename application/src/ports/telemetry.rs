//! Telemetry port
//!
//! Structured events for every specialist invocation, decomposition and
//! supervisor decision. Sinks must be cheap and must not fail: they are
//! called from inside council tasks.

use std::sync::Arc;
use swarm_domain::TelemetryEvent;

/// Consumer of [`TelemetryEvent`]s
pub trait TelemetrySink: Send + Sync {
    fn record(&self, event: &TelemetryEvent);
}

/// No-op sink for when telemetry is not needed
pub struct NoTelemetry;

impl TelemetrySink for NoTelemetry {
    fn record(&self, _event: &TelemetryEvent) {}
}

/// A sink that forwards every event to several inner sinks.
///
/// ```text
/// specialist pipeline ──▶ CompositeTelemetry ──┬──▶ HealthMonitor
///                                              └──▶ JsonlTelemetryLogger
/// ```
#[derive(Default)]
pub struct CompositeTelemetry {
    sinks: Vec<Arc<dyn TelemetrySink>>,
}

impl CompositeTelemetry {
    pub fn new(sinks: Vec<Arc<dyn TelemetrySink>>) -> Self {
        Self { sinks }
    }

    pub fn with(mut self, sink: Arc<dyn TelemetrySink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl TelemetrySink for CompositeTelemetry {
    fn record(&self, event: &TelemetryEvent) {
        for sink in &self.sinks {
            sink.record(event);
        }
    }
}
