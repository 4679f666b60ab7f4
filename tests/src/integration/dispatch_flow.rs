//! # Dispatch Flow
//!
//! The gate with real hashing and segmentation behind in-memory ports.
//! Hashes are checked from the recipient's side: the device derives the
//! same secret from its private key and the agent's public key.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use shared_types::{Agent, AgentId, HashCode, PhoneNumber};
use vp_01_text_hashing::{AgentKeyPair, VerificationHashGenerator};
use vp_02_segmentation::{Encoding, MessagePart};
use vp_05_dispatch_gate::{
    AgentDirectory, DispatchError, DispatchGate, DispatchReport, FallbackPolicy, GateConfig,
    GatewayReply, MessageDispatch, OutboundMessage, PartForwarder, VerificationBackend,
};

use crate::support::agent_record;

struct Directory(Vec<Arc<Agent>>);

#[async_trait]
impl AgentDirectory for Directory {
    async fn agent_for(&self, sender: &str) -> Result<Option<Arc<Agent>>, DispatchError> {
        Ok(self.0.iter().find(|a| a.routes(sender)).cloned())
    }
}

#[derive(Default)]
struct Backend {
    keys: HashMap<String, Vec<u8>>,
    stored: Mutex<Vec<Vec<HashCode>>>,
}

#[async_trait]
impl VerificationBackend for Backend {
    async fn recipient_keys(
        &self,
        recipients: &[PhoneNumber],
    ) -> Result<HashMap<String, Vec<u8>>, DispatchError> {
        Ok(recipients
            .iter()
            .filter_map(|r| self.keys.get(r.as_str()).map(|k| (r.to_string(), k.clone())))
            .collect())
    }

    async fn store_hashes(
        &self,
        _agent: &AgentId,
        hashes: &[HashCode],
        _agent_public_der: Option<&[u8]>,
    ) -> Result<(), DispatchError> {
        self.stored.lock().unwrap().push(hashes.to_vec());
        Ok(())
    }

    async fn registered_agent_key(&self, _agent: &AgentId) -> Result<Option<String>, DispatchError> {
        Ok(None)
    }
}

#[derive(Default)]
struct Gateway {
    parts: Mutex<Vec<MessagePart>>,
}

#[async_trait]
impl PartForwarder for Gateway {
    async fn forward_part(&self, part: &MessagePart) -> Result<GatewayReply, String> {
        self.parts.lock().unwrap().push(part.clone());
        Ok(GatewayReply {
            status: 202,
            content_type: Some("text/plain".into()),
            body: b"0: Accepted for delivery".to_vec(),
        })
    }
}

struct Setup {
    agent_keys: AgentKeyPair,
    devices: Vec<(PhoneNumber, AgentKeyPair)>,
    gate: DispatchGate<Directory, Backend>,
}

fn setup(numbers: &[&str]) -> Setup {
    let agent_keys = AgentKeyPair::generate().unwrap();
    let agent = agent_record("brand", &["BRAND"], &agent_keys);

    let devices: Vec<_> = numbers
        .iter()
        .map(|n| (PhoneNumber::normalize(n).unwrap(), AgentKeyPair::generate().unwrap()))
        .collect();
    let backend = Backend {
        keys: devices
            .iter()
            .map(|(n, k)| (n.to_string(), k.public_der().to_vec()))
            .collect(),
        ..Default::default()
    };

    let gate = DispatchGate::new(
        Directory(vec![Arc::new(agent)]),
        backend,
        GateConfig {
            fallback: FallbackPolicy::new(false),
            debug_mode: false,
        },
    );
    Setup {
        agent_keys,
        devices,
        gate,
    }
}

/// What a recipient device would compute for `text`.
fn device_hashes(setup: &Setup, device: usize, text: &str) -> Vec<HashCode> {
    VerificationHashGenerator::new()
        .hash_codes(setup.devices[device].1.private_der(), setup.agent_keys.public_der(), text)
        .unwrap()
}

#[tokio::test]
async fn test_hashes_match_every_recipient_device() {
    let setup = setup(&["+15550000001", "+15550000002"]);
    let recipients: Vec<_> = setup.devices.iter().map(|(n, _)| n.clone()).collect();
    let text = "Your code is 1234. Visit https://example.com/Help";

    let report = setup
        .gate
        .dispatch(&OutboundMessage::new("BRAND", recipients, text), &Gateway::default())
        .await;

    assert_eq!(report, DispatchReport::ForwardOriginal { verified: true });
    let stored = setup.gate.backend().stored.lock().unwrap().clone();
    assert_eq!(stored.len(), 1);
    let mut expected = device_hashes(&setup, 0, text);
    expected.extend(device_hashes(&setup, 1, text));
    assert_eq!(stored[0], expected);
}

#[tokio::test]
async fn test_ucs2_message_segmented_and_hashed_per_part() {
    let setup = setup(&["+15550000001"]);
    let recipients = vec![setup.devices[0].0.clone()];
    let text = "Привет! ".repeat(20);
    let gateway = Gateway::default();

    let report = setup
        .gate
        .dispatch(&OutboundMessage::new("BRAND", recipients, text.clone()), &gateway)
        .await;

    let parts = gateway.parts.lock().unwrap().clone();
    assert!(matches!(
        report,
        DispatchReport::PartsForwarded { verified: true, parts: 3, .. }
    ));
    assert_eq!(parts.len(), 3);
    assert!(parts.iter().all(|p| p.encoding == Encoding::Ucs2));
    assert!(parts.iter().all(|p| p.text.chars().count() <= 67));
    assert_eq!(parts.iter().map(|p| p.text.as_str()).collect::<String>(), text);

    let reference = parts[0].header.unwrap().reference;
    for (i, part) in parts.iter().enumerate() {
        let header = part.header.unwrap();
        assert_eq!(header.reference, reference);
        assert_eq!(header.total, 3);
        assert_eq!(header.ordinal as usize, i + 1);
    }

    // whole message first, then each part in order
    let stored = setup.gate.backend().stored.lock().unwrap().clone();
    assert_eq!(stored.len(), 4);
    assert_eq!(stored[0], device_hashes(&setup, 0, &text));
    for (i, part) in parts.iter().enumerate() {
        assert_eq!(stored[i + 1], device_hashes(&setup, 0, &part.text));
    }
}

#[tokio::test]
async fn test_unregistered_recipients_suppress_when_strict() {
    let setup = setup(&["+15550000001"]);
    let stranger = PhoneNumber::normalize("+15559999999").unwrap();

    let report = setup
        .gate
        .dispatch(&OutboundMessage::new("BRAND", vec![stranger], "hi"), &Gateway::default())
        .await;

    assert_eq!(
        report,
        DispatchReport::Suppressed {
            reason: Some(DispatchError::NoRecipientKey)
        }
    );
    assert!(setup.gate.backend().stored.lock().unwrap().is_empty());
}
