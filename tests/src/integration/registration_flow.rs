//! # Key Registration Flow
//!
//! `register-key` against the file store and a stand-in verification
//! service, then a dispatch signed with the new key.

use std::sync::atomic::Ordering;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use proxy_runtime::container;
use proxy_runtime::{ProxyConfig, ProxyContainer};
use serde_json::{json, Value};
use shared_types::{AgentId, PhoneNumber};
use tempfile::TempDir;
use vp_01_text_hashing::{AgentKeyPair, VerificationHashGenerator};
use vp_02_segmentation::MessagePart;
use vp_03_agent_registry::{AgentStore, FileAgentStore, KeyRegistrationApi, RegistrationError};
use vp_05_dispatch_gate::{DispatchReport, GatewayReply, MessageDispatch, OutboundMessage, PartForwarder};

use crate::support::start_verification_service;

const ALICE: &str = "+15550000001";

struct NoParts;

#[async_trait]
impl PartForwarder for NoParts {
    async fn forward_part(&self, _part: &MessagePart) -> Result<GatewayReply, String> {
        Err("unexpected part".into())
    }
}

fn config(api_root: String, agents: &TempDir) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.verification.api_root = api_root;
    config.verification.api_key = Some("test-key".into());
    config.verification.max_retries = 0;
    config.agents.source = format!("file://{}/", agents.path().display());
    config
}

fn write_record(agents: &TempDir, record: &Value) {
    std::fs::write(
        agents.path().join("brand.json"),
        serde_json::to_vec_pretty(record).unwrap(),
    )
    .unwrap();
}

#[tokio::test]
async fn test_registered_key_published_and_stored() {
    let (api_root, service) = start_verification_service().await;
    let agents = tempfile::tempdir().unwrap();
    write_record(
        &agents,
        &json!({ "id": "brand", "sender_ids": ["BRAND"], "display_name": "Brand Inc." }),
    );
    let config = config(api_root, &agents);

    let registrar = container::key_registrar(&config).unwrap();
    let keys = registrar.register_key(&AgentId::new("brand")).await.unwrap();

    let published = service.agent_keys.lock().unwrap()["brand"].clone();
    assert_eq!(URL_SAFE.decode(published).unwrap(), keys.public_der().unwrap());

    let stored = FileAgentStore::new(agents.path())
        .load(&AgentId::new("brand"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.vsms_keys.as_ref(), Some(&keys));
    assert_eq!(stored.sender_ids, vec!["BRAND".to_string()]);
    assert_eq!(stored.extra["display_name"], "Brand Inc.");
}

#[tokio::test]
async fn test_new_key_signs_dispatches() {
    let (api_root, service) = start_verification_service().await;
    let device = AgentKeyPair::generate().unwrap();
    service.register_device(ALICE, &device);
    let agents = tempfile::tempdir().unwrap();
    write_record(&agents, &json!({ "id": "brand", "sender_ids": ["BRAND"] }));
    let config = config(api_root, &agents);

    let keys = container::key_registrar(&config)
        .unwrap()
        .register_key(&AgentId::new("brand"))
        .await
        .unwrap();
    let proxy = ProxyContainer::build(config).await.unwrap();

    let message = OutboundMessage::new("BRAND", PhoneNumber::parse_list(ALICE).unwrap(), "Welcome!");
    let report = proxy.gate.dispatch(&message, &NoParts).await;

    assert_eq!(report, DispatchReport::ForwardOriginal { verified: true });
    let expected = VerificationHashGenerator::new()
        .create_hashes(device.private_der(), &keys.public_der().unwrap(), "Welcome!")
        .unwrap();
    assert_eq!(service.stored(), vec![("brand".to_string(), expected)]);
}

#[tokio::test]
async fn test_rejected_publication_leaves_store_untouched() {
    let (api_root, service) = start_verification_service().await;
    service.reject_key_updates.store(true, Ordering::SeqCst);
    let agents = tempfile::tempdir().unwrap();
    write_record(&agents, &json!({ "id": "brand", "sender_ids": ["BRAND"] }));
    let before = std::fs::read(agents.path().join("brand.json")).unwrap();

    let result = container::key_registrar(&config(api_root, &agents))
        .unwrap()
        .register_key(&AgentId::new("brand"))
        .await;

    assert!(matches!(result, Err(RegistrationError::Publication { .. })));
    assert_eq!(std::fs::read(agents.path().join("brand.json")).unwrap(), before);
    assert!(service.agent_keys.lock().unwrap().is_empty());
}
