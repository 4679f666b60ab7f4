//! # Proxy Container
//!
//! Builds the long-lived services from a [`ProxyConfig`]:
//!
//! ```text
//! ProxyConfig ──► AgentStoreBackend ──► AgentRegistry ──► RegistryDirectory ─┐
//!             ──► VerificationClient ──► VerificationBackendAdapter ─────────┼──► DispatchGate
//!             ──► KannelGateway                                               │
//!             ──► GateConfig ─────────────────────────────────────────────────┘
//! ```

pub mod config;

use std::sync::Arc;

use thiserror::Error;
use tracing::info;
use vp_03_agent_registry::{
    AgentRegistry, AgentStoreBackend, AgentStoreError, AgentStoreLocation, BasicAuth, KeyRegistrar,
    RegistrationError,
};
use vp_04_verification_client::{
    AuthMode, ClientConfig, ServiceAccountKey, VerificationClient, VerificationClientError,
};
use vp_05_dispatch_gate::{DispatchGate, FallbackPolicy, GateConfig};

use crate::adapters::{GatewayError, KannelGateway, RegistryDirectory, VerificationBackendAdapter};

pub use config::{ConfigError, ProxyConfig, DEFAULT_CONFIG_FILE};

pub type ProxyDirectory = RegistryDirectory<AgentStoreBackend>;
pub type ProxyGate = DispatchGate<ProxyDirectory, VerificationBackendAdapter>;
pub type ProxyRegistrar = KeyRegistrar<AgentStoreBackend, VerificationBackendAdapter>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    AgentStore(#[from] AgentStoreError),

    #[error(transparent)]
    Verification(#[from] VerificationClientError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Registration(#[from] RegistrationError),
}

/// Everything the HTTP front end needs.
pub struct ProxyContainer {
    pub config: ProxyConfig,
    pub gate: Arc<ProxyGate>,
    pub gateway: Arc<KannelGateway>,
}

impl ProxyContainer {
    pub async fn build(config: ProxyConfig) -> Result<Self, RuntimeError> {
        let store = open_agent_store(&config)?;
        let registry = if config.agents.cache {
            AgentRegistry::cached(store).await?
        } else {
            info!(source = %config.agents.source, "agent records are read on every request");
            AgentRegistry::live(store)
        };

        let backend = VerificationBackendAdapter::new(Arc::new(verification_client(&config)?));
        let gate = DispatchGate::new(RegistryDirectory::new(registry), backend, gate_config(&config));
        let gateway = KannelGateway::new(config.gateway.url.clone(), config.gateway.timeout())?;

        Ok(Self {
            config,
            gate: Arc::new(gate),
            gateway: Arc::new(gateway),
        })
    }
}

pub fn gate_config(config: &ProxyConfig) -> GateConfig {
    GateConfig {
        fallback: FallbackPolicy::new(config.policy.send_unverified),
        debug_mode: config.verification.debug_mode,
    }
}

pub fn open_agent_store(config: &ProxyConfig) -> Result<AgentStoreBackend, AgentStoreError> {
    let location = AgentStoreLocation::parse(&config.agents.source)?;
    let auth = config.agents.username.as_ref().map(|username| BasicAuth {
        username: username.clone(),
        password: config.agents.password.clone(),
    });
    AgentStoreBackend::open(&location, auth)
}

pub fn verification_client(config: &ProxyConfig) -> Result<VerificationClient, VerificationClientError> {
    let settings = &config.verification;
    let auth = match (&settings.api_key, &settings.service_account_file) {
        (Some(key), _) => AuthMode::ApiKey(key.clone()),
        (None, Some(path)) => {
            let mut key = ServiceAccountKey::from_file(path)?;
            if let Some(token_uri) = &settings.token_uri {
                key.token_uri = token_uri.clone();
            }
            AuthMode::ServiceAccount(key)
        }
        (None, None) => {
            return Err(VerificationClientError::Credentials(
                "no api key or service account configured".into(),
            ))
        }
    };
    VerificationClient::new(
        ClientConfig {
            api_root: settings.api_root.clone(),
            timeout: settings.timeout(),
            retry: settings.retry_policy(),
            debug_mode: settings.debug_mode,
        },
        auth,
    )
}

/// Key registration wired to the configured store and backend.
pub fn key_registrar(config: &ProxyConfig) -> Result<ProxyRegistrar, RuntimeError> {
    let store = open_agent_store(config)?;
    let backend = VerificationBackendAdapter::new(Arc::new(verification_client(config)?));
    Ok(KeyRegistrar::new(store, backend))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(source: &str) -> ProxyConfig {
        let mut config = ProxyConfig::default();
        config.verification.api_key = Some("k".into());
        config.agents.source = source.into();
        config
    }

    #[test]
    fn test_gate_config_follows_policy() {
        let mut config = config("file:///tmp/agents/");
        config.policy.send_unverified = false;
        config.verification.debug_mode = true;
        let gate = gate_config(&config);
        assert!(!gate.fallback.send_unverified);
        assert!(gate.debug_mode);
    }

    #[test]
    fn test_open_agent_store_by_scheme() {
        assert!(matches!(
            open_agent_store(&config("file:///tmp/agents/")),
            Ok(AgentStoreBackend::File(_))
        ));
        assert!(matches!(
            open_agent_store(&config("https://agents.example.com/")),
            Ok(AgentStoreBackend::Http(_))
        ));
        assert!(matches!(
            open_agent_store(&config("ftp://agents")),
            Err(AgentStoreError::UnsupportedLocation(_))
        ));
    }

    #[test]
    fn test_client_needs_credentials() {
        let mut none = ProxyConfig::default();
        none.verification.api_key = None;
        assert!(matches!(
            verification_client(&none),
            Err(VerificationClientError::Credentials(_))
        ));
        assert!(verification_client(&config("file:///tmp/")).is_ok());
    }

    #[tokio::test]
    async fn test_build_with_cached_agents() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.json"), r#"{"id": "a", "sender_ids": ["A"]}"#).unwrap();
        let source = format!("file://{}/", dir.path().display());

        let container = ProxyContainer::build(config(&source)).await.unwrap();

        assert_eq!(container.gate.directory().registry().agent_count(), Some(1));
        assert_eq!(container.gateway.url(), "http://localhost:13131/cgi-bin/sendsms");
    }
}
