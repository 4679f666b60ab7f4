//! # Agent Store Adapters
//!
//! The backend is selected by the scheme of the configured location:
//! `file://<dir>/` or `http(s)://…`.

mod file_store;
mod http_store;

use std::path::PathBuf;

use async_trait::async_trait;
use shared_types::{Agent, AgentId, AgentKeys};

pub use file_store::FileAgentStore;
pub use http_store::{BasicAuth, HttpAgentStore};

use crate::error::AgentStoreError;
use crate::ports::outbound::AgentStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentStoreLocation {
    Directory(PathBuf),
    Http(String),
}

impl AgentStoreLocation {
    pub fn parse(raw: &str) -> Result<Self, AgentStoreError> {
        let raw = raw.trim();
        if let Some(dir) = raw.strip_prefix("file://") {
            if dir.is_empty() {
                return Err(AgentStoreError::UnsupportedLocation(raw.to_string()));
            }
            return Ok(Self::Directory(PathBuf::from(dir)));
        }
        if raw.starts_with("http://") || raw.starts_with("https://") {
            return Ok(Self::Http(raw.to_string()));
        }
        Err(AgentStoreError::UnsupportedLocation(raw.to_string()))
    }
}

/// Store chosen at runtime from an [`AgentStoreLocation`].
#[derive(Debug, Clone)]
pub enum AgentStoreBackend {
    File(FileAgentStore),
    Http(HttpAgentStore),
}

impl AgentStoreBackend {
    pub fn open(location: &AgentStoreLocation, auth: Option<BasicAuth>) -> Result<Self, AgentStoreError> {
        Ok(match location {
            AgentStoreLocation::Directory(dir) => Self::File(FileAgentStore::new(dir.clone())),
            AgentStoreLocation::Http(url) => Self::Http(HttpAgentStore::new(url.clone(), auth)?),
        })
    }
}

#[async_trait]
impl AgentStore for AgentStoreBackend {
    async fn load_all(&self) -> Result<Vec<Agent>, AgentStoreError> {
        match self {
            Self::File(store) => store.load_all().await,
            Self::Http(store) => store.load_all().await,
        }
    }

    async fn load(&self, id: &AgentId) -> Result<Option<Agent>, AgentStoreError> {
        match self {
            Self::File(store) => store.load(id).await,
            Self::Http(store) => store.load(id).await,
        }
    }

    async fn save_keys(&self, id: &AgentId, keys: &AgentKeys) -> Result<(), AgentStoreError> {
        match self {
            Self::File(store) => store.save_keys(id, keys).await,
            Self::Http(store) => store.save_keys(id, keys).await,
        }
    }
}
