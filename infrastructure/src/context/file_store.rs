//! File-backed context store.
//!
//! Each workspace's context lives in `<root>/<encoded id>.json`. Writes go
//! to a temporary sibling first and are renamed into place, so a crash never
//! leaves a half-written context behind.
//!
//! Ids are percent-encoded: ASCII alphanumerics, `-` and `_` are kept, every
//! other byte becomes `%XX`. Distinct ids therefore never share a file.

use async_trait::async_trait;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::{Map, Value};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use swarm_application::{ContextStore, ContextStoreError};
use swarm_domain::WorkspaceId;
use tracing::debug;

/// Context store keeping one JSON object per workspace on disk.
#[derive(Debug)]
pub struct FileContextStore {
    root: PathBuf,
    writes: AtomicU64,
}

impl FileContextStore {
    /// Create a store rooted at `root`. The directory is created on first save.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            writes: AtomicU64::new(0),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File holding `workspace`'s context.
    pub fn path_for(&self, workspace: &WorkspaceId) -> Result<PathBuf, ContextStoreError> {
        Ok(self.root.join(format!("{}.json", file_stem(workspace.as_str())?)))
    }
}

/// Bytes escaped in file names; `.` is escaped so no name is hidden or `..`.
const FILE_STEM: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_');

/// Map a workspace id onto a single safe file name component.
fn file_stem(id: &str) -> Result<String, ContextStoreError> {
    if id.trim().is_empty() {
        return Err(ContextStoreError::InvalidWorkspace(id.to_string()));
    }
    Ok(utf8_percent_encode(id, FILE_STEM).to_string())
}

#[async_trait]
impl ContextStore for FileContextStore {
    async fn load(&self, workspace: &WorkspaceId) -> Result<Map<String, Value>, ContextStoreError> {
        let path = self.path_for(workspace)?;
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No stored context for workspace {}", workspace);
                return Ok(Map::new());
            }
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(other) => Err(ContextStoreError::Corrupt {
                workspace: workspace.to_string(),
                message: format!("expected a JSON object, found {}", json_kind(&other)),
            }),
            Err(e) => Err(ContextStoreError::Corrupt {
                workspace: workspace.to_string(),
                message: e.to_string(),
            }),
        }
    }

    async fn save(
        &self,
        workspace: &WorkspaceId,
        context: &Map<String, Value>,
    ) -> Result<(), ContextStoreError> {
        let path = self.path_for(workspace)?;
        tokio::fs::create_dir_all(&self.root).await?;

        let bytes = serde_json::to_vec_pretty(context).map_err(|e| ContextStoreError::Corrupt {
            workspace: workspace.to_string(),
            message: e.to_string(),
        })?;

        let seq = self.writes.fetch_add(1, Ordering::Relaxed);
        let tmp = path.with_extension(format!("json.{}-{}.tmp", std::process::id(), seq));
        tokio::fs::write(&tmp, &bytes).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        debug!(
            "Saved {} context keys for workspace {} to {}",
            context.len(),
            workspace,
            path.display()
        );
        Ok(())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
