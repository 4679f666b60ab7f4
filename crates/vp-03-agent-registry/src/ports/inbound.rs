//! # Inbound Ports
//!
//! API offered by the registry to the dispatch path and the CLI.

use std::sync::Arc;

use async_trait::async_trait;
use shared_types::{Agent, AgentId, AgentKeys};

use crate::error::{AgentStoreError, RegistrationError};

/// Sender routing.
#[async_trait]
pub trait AgentResolver: Send + Sync {
    /// Agent that owns `sender`, if any.
    async fn resolve(&self, sender: &str) -> Result<Option<Arc<Agent>>, AgentStoreError>;
}

/// Agent key (re-)registration.
#[async_trait]
pub trait KeyRegistrationApi: Send + Sync {
    /// Generate, publish and store a new key pair for `agent_id`.
    async fn register_key(&self, agent_id: &AgentId) -> Result<AgentKeys, RegistrationError>;
}
