//! # Directory-backed Agent Store
//!
//! One `<agent_id>.json` record per agent. Dot-files and files without a
//! `.json` extension are ignored, so editors' swap files and our own
//! temporary files never load as agents.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use shared_types::{Agent, AgentId, AgentKeys};
use tracing::{debug, info};

use crate::error::AgentStoreError;
use crate::ports::outbound::AgentStore;

const RECORD_EXTENSION: &str = "json";

#[derive(Debug, Clone)]
pub struct FileAgentStore {
    dir: PathBuf,
}

impl FileAgentStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, id: &AgentId) -> Result<PathBuf, AgentStoreError> {
        validate_id(id)?;
        Ok(self.dir.join(format!("{id}.{RECORD_EXTENSION}")))
    }

    async fn read_record(&self, path: &Path) -> Result<Option<Agent>, AgentStoreError> {
        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(path, e)),
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| AgentStoreError::InvalidRecord {
                name: path.display().to_string(),
                reason: e.to_string(),
            })
    }
}

/// Agent ids become file names: no separators, no leading dot.
fn validate_id(id: &AgentId) -> Result<(), AgentStoreError> {
    let raw = id.as_str();
    let bad = raw.is_empty()
        || raw.starts_with('.')
        || raw.chars().any(|c| matches!(c, '/' | '\\' | '\0'));
    if bad {
        return Err(AgentStoreError::InvalidAgentId(raw.to_string()));
    }
    Ok(())
}

fn io_error(path: &Path, source: std::io::Error) -> AgentStoreError {
    AgentStoreError::Io {
        path: path.display().to_string(),
        source,
    }
}

fn is_record_name(name: &str) -> bool {
    !name.starts_with('.')
        && Path::new(name)
            .extension()
            .is_some_and(|ext| ext == RECORD_EXTENSION)
}

#[async_trait]
impl AgentStore for FileAgentStore {
    async fn load_all(&self) -> Result<Vec<Agent>, AgentStoreError> {
        let mut entries = tokio::fs::read_dir(&self.dir)
            .await
            .map_err(|e| io_error(&self.dir, e))?;

        let mut paths = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| io_error(&self.dir, e))?
        {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if !is_record_name(name) {
                debug!(file = name, "skipping non-record file");
                continue;
            }
            let file_type = entry
                .file_type()
                .await
                .map_err(|e| io_error(&entry.path(), e))?;
            if file_type.is_file() {
                paths.push(entry.path());
            }
        }
        paths.sort();

        let mut agents = Vec::with_capacity(paths.len());
        for path in &paths {
            if let Some(agent) = self.read_record(path).await? {
                agents.push(agent);
            }
        }
        info!(dir = %self.dir.display(), agents = agents.len(), "loaded agent records");
        Ok(agents)
    }

    async fn load(&self, id: &AgentId) -> Result<Option<Agent>, AgentStoreError> {
        let path = self.record_path(id)?;
        self.read_record(&path).await
    }

    async fn save_keys(&self, id: &AgentId, keys: &AgentKeys) -> Result<(), AgentStoreError> {
        let path = self.record_path(id)?;
        let mut agent = self
            .read_record(&path)
            .await?
            .unwrap_or_else(|| Agent::new(id.clone()));
        agent.vsms_keys = Some(keys.clone());

        let body = serde_json::to_vec_pretty(&agent).map_err(|e| {
            AgentStoreError::InvalidRecord {
                name: path.display().to_string(),
                reason: e.to_string(),
            }
        })?;

        // Write next to the record and rename so readers never see a
        // partial file.
        let tmp = self.dir.join(format!(".{id}.{RECORD_EXTENSION}.tmp"));
        tokio::fs::write(&tmp, &body)
            .await
            .map_err(|e| io_error(&tmp, e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| io_error(&path, e))?;

        info!(agent_id = %id, path = %path.display(), "stored agent keys");
        Ok(())
    }
}
