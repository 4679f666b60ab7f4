//! # Agent Registry Service
//!
//! [`AgentRegistry`] routes sender identifiers to agents, either from a map
//! built once at startup (cached) or from the store on every lookup (live).
//! [`KeyRegistrar`] rotates an agent's hashing key.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use shared_types::{Agent, AgentId, AgentKeys};
use tracing::{info, warn};
use vp_01_text_hashing::AgentKeyPair;

use crate::error::{AgentStoreError, RegistrationError};
use crate::ports::inbound::{AgentResolver, KeyRegistrationApi};
use crate::ports::outbound::{AgentKeyPublisher, AgentStore};

// =============================================================================
// SENDER ROUTING
// =============================================================================

#[derive(Debug, Default)]
struct AgentIndex {
    by_sender: HashMap<String, AgentId>,
    by_id: HashMap<AgentId, Arc<Agent>>,
}

impl AgentIndex {
    /// A sender id claimed by several agents routes to the one loaded last.
    fn build(agents: Vec<Agent>) -> Self {
        let mut index = Self::default();
        for agent in agents {
            for sender in &agent.sender_ids {
                if let Some(previous) = index.by_sender.insert(sender.clone(), agent.id.clone()) {
                    if previous != agent.id {
                        warn!(
                            sender = %sender,
                            previous = %previous,
                            agent_id = %agent.id,
                            "sender id claimed by more than one agent"
                        );
                    }
                }
            }
            index.by_id.insert(agent.id.clone(), Arc::new(agent));
        }
        index
    }

    fn lookup(&self, sender: &str) -> Option<Arc<Agent>> {
        self.by_sender
            .get(sender)
            .and_then(|id| self.by_id.get(id))
            .cloned()
    }
}

pub struct AgentRegistry<S> {
    store: S,
    /// `None` in live mode.
    index: Option<AgentIndex>,
}

impl<S: AgentStore> AgentRegistry<S> {
    /// Load every agent once; later lookups never touch the store.
    pub async fn cached(store: S) -> Result<Self, AgentStoreError> {
        let index = AgentIndex::build(store.load_all().await?);
        info!(
            agents = index.by_id.len(),
            senders = index.by_sender.len(),
            "agent cache ready"
        );
        Ok(Self {
            store,
            index: Some(index),
        })
    }

    /// Consult the store on every lookup.
    pub fn live(store: S) -> Self {
        Self { store, index: None }
    }

    pub fn is_cached(&self) -> bool {
        self.index.is_some()
    }

    /// Number of cached agents; `None` in live mode.
    pub fn agent_count(&self) -> Option<usize> {
        self.index.as_ref().map(|index| index.by_id.len())
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

#[async_trait]
impl<S: AgentStore> AgentResolver for AgentRegistry<S> {
    async fn resolve(&self, sender: &str) -> Result<Option<Arc<Agent>>, AgentStoreError> {
        match &self.index {
            Some(index) => Ok(index.lookup(sender)),
            None => Ok(AgentIndex::build(self.store.load_all().await?).lookup(sender)),
        }
    }
}

// =============================================================================
// KEY REGISTRATION
// =============================================================================

pub struct KeyRegistrar<S, P> {
    store: S,
    publisher: P,
}

impl<S: AgentStore, P: AgentKeyPublisher> KeyRegistrar<S, P> {
    pub fn new(store: S, publisher: P) -> Self {
        Self { store, publisher }
    }
}

fn unix_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}

#[async_trait]
impl<S: AgentStore, P: AgentKeyPublisher> KeyRegistrationApi for KeyRegistrar<S, P> {
    /// The backend learns the public key before the store does; a failed
    /// publish leaves the stored pair untouched.
    async fn register_key(&self, agent_id: &AgentId) -> Result<AgentKeys, RegistrationError> {
        let pair = AgentKeyPair::generate()?;

        self.publisher
            .publish_key(agent_id, pair.public_der())
            .await
            .map_err(|source| RegistrationError::Publication {
                agent_id: agent_id.to_string(),
                source,
            })?;
        info!(agent_id = %agent_id, "agent public key registered with verification service");

        let keys = pair.to_agent_keys(unix_seconds());
        self.store
            .save_keys(agent_id, &keys)
            .await
            .map_err(|source| RegistrationError::Store {
                agent_id: agent_id.to_string(),
                source,
            })?;
        Ok(keys)
    }
}
