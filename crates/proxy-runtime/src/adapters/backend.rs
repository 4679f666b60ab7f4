//! Verification client behind the gate and the key registrar.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use shared_types::{AgentId, HashCode, PhoneNumber};
use tracing::debug;
use vp_03_agent_registry::{AgentKeyPublisher, PublishError};
use vp_04_verification_client::VerificationClient;
use vp_05_dispatch_gate::{DispatchError, VerificationBackend};

#[derive(Clone)]
pub struct VerificationBackendAdapter {
    client: Arc<VerificationClient>,
}

impl VerificationBackendAdapter {
    pub fn new(client: Arc<VerificationClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &VerificationClient {
        &self.client
    }
}

#[async_trait]
impl VerificationBackend for VerificationBackendAdapter {
    async fn recipient_keys(
        &self,
        recipients: &[PhoneNumber],
    ) -> Result<HashMap<String, Vec<u8>>, DispatchError> {
        self.client
            .get_user_keys(recipients)
            .await
            .map_err(|e| DispatchError::BackendSubmission(e.to_string()))
    }

    async fn store_hashes(
        &self,
        agent: &AgentId,
        hashes: &[HashCode],
        agent_public_der: Option<&[u8]>,
    ) -> Result<(), DispatchError> {
        let response = self
            .client
            .store_hashes(agent, hashes, agent_public_der)
            .await
            .map_err(|e| DispatchError::BackendSubmission(e.to_string()))?;
        debug!(agent_id = %agent, response = %response, "hashes stored");
        Ok(())
    }

    async fn registered_agent_key(&self, agent: &AgentId) -> Result<Option<String>, DispatchError> {
        self.client
            .get_agent_public_key(agent)
            .await
            .map_err(|e| DispatchError::BackendSubmission(e.to_string()))
    }
}

#[async_trait]
impl AgentKeyPublisher for VerificationBackendAdapter {
    async fn publish_key(&self, agent_id: &AgentId, public_der: &[u8]) -> Result<(), PublishError> {
        self.client
            .update_key(agent_id, public_der)
            .await
            .map_err(|e| PublishError(e.to_string()))
    }
}
