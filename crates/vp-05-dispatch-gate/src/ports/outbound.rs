//! # Outbound Ports
//!
//! Agent lookup, the verification backend and the SMS gateway, as the gate
//! needs them. Adapters map their own failures onto [`DispatchError`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use shared_types::{Agent, AgentId, HashCode, PhoneNumber};
use vp_02_segmentation::MessagePart;

use crate::domain::errors::DispatchError;
use crate::domain::message::GatewayReply;

/// Sender identifier to agent.
#[async_trait]
pub trait AgentDirectory: Send + Sync {
    /// `Err(AgentResolution)` when the store is unreachable.
    async fn agent_for(&self, sender: &str) -> Result<Option<Arc<Agent>>, DispatchError>;
}

#[async_trait]
pub trait VerificationBackend: Send + Sync {
    /// Registered public keys (SPKI DER) by phone number. Recipients without
    /// a key are absent.
    async fn recipient_keys(
        &self,
        recipients: &[PhoneNumber],
    ) -> Result<HashMap<String, Vec<u8>>, DispatchError>;

    /// Store hashes for `agent`. `agent_public_der` accompanies them only
    /// when the backend runs in debug mode.
    async fn store_hashes(
        &self,
        agent: &AgentId,
        hashes: &[HashCode],
        agent_public_der: Option<&[u8]>,
    ) -> Result<(), DispatchError>;

    /// The agent key the backend holds, for debug comparisons.
    async fn registered_agent_key(&self, agent: &AgentId) -> Result<Option<String>, DispatchError>;
}

/// Sends one part of a message the gate segmented itself.
#[async_trait]
pub trait PartForwarder: Send + Sync {
    /// `Err` only for transport failures; gateway rejections come back as a
    /// non-2xx [`GatewayReply`].
    async fn forward_part(&self, part: &MessagePart) -> Result<GatewayReply, String>;
}
