//! Agent lookup for the gate, backed by the agent registry.

use std::sync::Arc;

use async_trait::async_trait;
use shared_types::Agent;
use vp_03_agent_registry::{AgentRegistry, AgentResolver, AgentStore};
use vp_05_dispatch_gate::{AgentDirectory, DispatchError};

pub struct RegistryDirectory<S> {
    registry: AgentRegistry<S>,
}

impl<S: AgentStore> RegistryDirectory<S> {
    pub fn new(registry: AgentRegistry<S>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &AgentRegistry<S> {
        &self.registry
    }
}

#[async_trait]
impl<S: AgentStore> AgentDirectory for RegistryDirectory<S> {
    async fn agent_for(&self, sender: &str) -> Result<Option<Arc<Agent>>, DispatchError> {
        self.registry
            .resolve(sender)
            .await
            .map_err(|e| DispatchError::AgentResolution(e.to_string()))
    }
}
