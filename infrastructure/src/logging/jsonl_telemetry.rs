//! JSONL file writer for telemetry events.
//!
//! Each [`TelemetryEvent`] becomes a single JSON line with a `type` field
//! (the outcome) and `timestamp`, appended via a buffered writer.

use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use swarm_application::TelemetrySink;
use swarm_domain::TelemetryEvent;
use tracing::warn;

/// JSONL telemetry logger that appends one JSON object per event.
///
/// Thread-safe via `Mutex<BufWriter<File>>`. Flushes on `Drop`.
pub struct JsonlTelemetryLogger {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl JsonlTelemetryLogger {
    /// Open `path` for appending, creating it and its parent directories.
    ///
    /// Returns `None` if the file cannot be opened.
    pub fn new(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = std::fs::create_dir_all(parent)
        {
            warn!(
                "Could not create telemetry log directory {}: {}",
                parent.display(),
                e
            );
            return None;
        }

        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(f) => f,
            Err(e) => {
                warn!("Could not open telemetry log {}: {}", path.display(), e);
                return None;
            }
        };

        Some(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    /// Get the path to the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn record_of(event: &TelemetryEvent) -> serde_json::Value {
    let mut record = serde_json::json!({
        "type": event.outcome.as_str(),
        "timestamp": event
            .timestamp
            .to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        "component": event.component.label(),
        "workspace_id": event.workspace_id.as_str(),
        "latency_ms": event.latency_ms,
        "tokens": event.tokens,
        "cost_usd": event.cost_usd,
    });
    if let Some(detail) = &event.detail {
        record["detail"] = serde_json::Value::String(detail.clone());
    }
    record
}

impl TelemetrySink for JsonlTelemetryLogger {
    fn record(&self, event: &TelemetryEvent) {
        let Ok(line) = serde_json::to_string(&record_of(event)) else {
            return;
        };

        let mut writer = self.writer.lock();
        let _ = writeln!(writer, "{}", line);
        // append-only, flush per line for crash safety
        let _ = writer.flush();
    }
}

impl Drop for JsonlTelemetryLogger {
    fn drop(&mut self) {
        let _ = self.writer.lock().flush();
    }
}
