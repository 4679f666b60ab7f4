//! # Outbound Ports
//!
//! Backing stores for agent records and the service that learns about new
//! agent public keys.

use async_trait::async_trait;
use shared_types::{Agent, AgentId, AgentKeys};

use crate::error::{AgentStoreError, PublishError};

/// Persistent agent records.
///
/// Production: `FileAgentStore`, `HttpAgentStore`.
#[async_trait]
pub trait AgentStore: Send + Sync {
    /// Every record in the store.
    async fn load_all(&self) -> Result<Vec<Agent>, AgentStoreError>;

    /// One record, `None` when the store has no such agent.
    async fn load(&self, id: &AgentId) -> Result<Option<Agent>, AgentStoreError>;

    /// Replace the key pair of `id`, creating the record when missing.
    async fn save_keys(&self, id: &AgentId, keys: &AgentKeys) -> Result<(), AgentStoreError>;
}

/// Registers an agent public key with the verification service.
#[async_trait]
pub trait AgentKeyPublisher: Send + Sync {
    /// `public_der` is SubjectPublicKeyInfo DER.
    async fn publish_key(&self, agent_id: &AgentId, public_der: &[u8]) -> Result<(), PublishError>;
}
