//! # HTTP Flow
//!
//! The assembled proxy between a `sendsms` client, a stand-in Kannel and a
//! stand-in verification service.
//!
//! ```text
//! reqwest ──► vsms-proxy ──► MockKannel
//!                  │
//!                  └──► MockVerificationService
//! ```

use std::path::Path;
use std::sync::Arc;

use proxy_runtime::http::{self, ProxyState, FAILED_PART_HEADER};
use proxy_runtime::{ProxyConfig, ProxyContainer};
use reqwest::StatusCode;
use shared_types::Agent;
use tempfile::TempDir;
use vp_01_text_hashing::{AgentKeyPair, VerificationHashGenerator};

use crate::support::{
    agent_record, query_pairs, spawn, start_kannel, start_verification_service, MockKannel,
    MockVerificationService,
};

const ALICE: &str = "+15550000001";
const SENDSMS: &str = "/cgi-bin/sendsms";

struct Proxy {
    url: String,
    kannel: Arc<MockKannel>,
    service: Arc<MockVerificationService>,
    agent_keys: AgentKeyPair,
    device: AgentKeyPair,
    _agents: TempDir,
}

impl Proxy {
    fn sendsms(&self, query: &str) -> String {
        format!("{}{SENDSMS}?{query}", self.url)
    }

    /// Hashes ALICE's device computes for `text`, in stored form.
    fn device_hashes(&self, text: &str) -> Vec<String> {
        VerificationHashGenerator::new()
            .create_hashes(self.device.private_der(), self.agent_keys.public_der(), text)
            .unwrap()
    }
}

fn write_agent(dir: &Path, agent: &Agent) {
    let path = dir.join(format!("{}.json", agent.id));
    std::fs::write(path, serde_json::to_vec(agent).unwrap()).unwrap();
}

/// Proxy for agent `brand` (sender `BRAND`); ALICE has a registered device.
async fn start_proxy(send_unverified: bool, gateway_url: Option<String>) -> Proxy {
    let (api_root, service) = start_verification_service().await;
    let (kannel_url, kannel) = start_kannel().await;

    let agent_keys = AgentKeyPair::generate().unwrap();
    let device = AgentKeyPair::generate().unwrap();
    service.register_device(ALICE, &device);

    let agents = tempfile::tempdir().unwrap();
    write_agent(agents.path(), &agent_record("brand", &["BRAND"], &agent_keys));

    let mut config = ProxyConfig::default();
    config.gateway.url = gateway_url.unwrap_or(kannel_url);
    config.verification.api_root = api_root;
    config.verification.api_key = Some("test-key".into());
    config.verification.max_retries = 0;
    config.agents.source = format!("file://{}/", agents.path().display());
    config.policy.send_unverified = send_unverified;

    let container = ProxyContainer::build(config).await.unwrap();
    let state = ProxyState {
        gate: container.gate.clone(),
        gateway: container.gateway.clone(),
    };
    let url = spawn(http::router(&container.config.listen.path, state)).await;

    Proxy {
        url,
        kannel,
        service,
        agent_keys,
        device,
        _agents: agents,
    }
}

#[tokio::test]
async fn test_short_message_verified_and_relayed_unchanged() {
    let proxy = start_proxy(true, None).await;
    let query = "username=u&password=p&from=BRAND&to=%2B15550000001&text=Hello%20world";

    let response = reqwest::get(proxy.sendsms(query)).await.unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(response.headers()["content-type"], "text/html");
    assert_eq!(response.text().await.unwrap(), "0: Accepted for delivery");

    let stored = proxy.service.stored();
    assert_eq!(stored, vec![("brand".to_string(), proxy.device_hashes("Hello world"))]);

    let requests = proxy.kannel.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].query.as_deref(), Some(query));
}

#[tokio::test]
async fn test_long_message_forwarded_as_hashed_parts() {
    let proxy = start_proxy(true, None).await;
    let text = "a".repeat(400);

    let response = reqwest::get(proxy.sendsms(&format!("from=BRAND&to=%2B15550000001&text={text}")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let requests = proxy.kannel.requests();
    assert_eq!(requests.len(), 3);
    let mut parts = Vec::new();
    for (i, request) in requests.iter().enumerate() {
        let params = query_pairs(request.query.as_deref().unwrap());
        assert_eq!(params["from"], b"BRAND");
        assert_eq!(params["coding"], b"0");
        let udh = &params["udh"];
        assert_eq!(&udh[..3], &[0x05, 0x00, 0x03]);
        assert_eq!(udh[4], 3);
        assert_eq!(udh[5] as usize, i + 1);
        parts.push(String::from_utf8(params["text"].clone()).unwrap());
    }
    assert_eq!(parts.concat(), text);

    let stored = proxy.service.stored();
    assert_eq!(stored.len(), 4);
    assert_eq!(stored[0].1, proxy.device_hashes(&text));
    for (i, part) in parts.iter().enumerate() {
        assert_eq!(stored[i + 1].1, proxy.device_hashes(part));
    }
}

#[tokio::test]
async fn test_post_request_relays_kannel_headers() {
    let proxy = start_proxy(true, None).await;

    let response = reqwest::Client::new()
        .post(format!("{}{SENDSMS}", proxy.url))
        .header("x-kannel-from", "BRAND")
        .header("x-kannel-to", ALICE)
        .header("x-kannel-username", "u")
        .header("content-type", "text/plain")
        .body("Hello from POST")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(proxy.service.stored()[0].1, proxy.device_hashes("Hello from POST"));

    let requests = proxy.kannel.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, reqwest::Method::POST);
    assert_eq!(requests[0].headers["x-kannel-to"], ALICE);
    assert_eq!(requests[0].headers["x-kannel-username"], "u");
    assert_eq!(requests[0].body, b"Hello from POST");
}

#[tokio::test]
async fn test_unverifiable_message_suppressed_when_strict() {
    let proxy = start_proxy(false, None).await;

    let response = reqwest::get(proxy.sendsms("from=BRAND&to=%2B15559999999&text=hi"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PRECONDITION_FAILED);
    assert!(proxy.kannel.requests().is_empty());
    assert!(proxy.service.stored().is_empty());
}

#[tokio::test]
async fn test_unverifiable_message_relayed_when_allowed() {
    let proxy = start_proxy(true, None).await;

    let response = reqwest::get(proxy.sendsms("from=BRAND&to=%2B15559999999&text=hi"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(proxy.kannel.requests().len(), 1);
    assert!(proxy.service.stored().is_empty());
}

#[tokio::test]
async fn test_unknown_sender_relayed_without_hashes() {
    let proxy = start_proxy(true, None).await;

    let response = reqwest::get(proxy.sendsms("from=OTHER&to=%2B15550000001&text=hi"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(proxy.kannel.requests().len(), 1);
    assert!(proxy.service.stored().is_empty());
}

#[tokio::test]
async fn test_invalid_recipient_rejected() {
    let proxy = start_proxy(true, None).await;

    let missing = reqwest::get(proxy.sendsms("from=BRAND&text=hi")).await.unwrap();
    let invalid = reqwest::get(proxy.sendsms("from=BRAND&to=alice&text=hi")).await.unwrap();

    assert_eq!(missing.status(), StatusCode::BAD_REQUEST);
    assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
    assert!(proxy.kannel.requests().is_empty());
}

#[tokio::test]
async fn test_gateway_status_mirrored() {
    let proxy = start_proxy(true, None).await;
    proxy.kannel.answer_with(503);

    let response = reqwest::get(proxy.sendsms("from=BRAND&to=%2B15550000001&text=hi"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(response.headers().get(FAILED_PART_HEADER).is_none());
}

#[tokio::test]
async fn test_rejected_part_reported() {
    let proxy = start_proxy(true, None).await;
    proxy.kannel.answer_with(503);
    let text = "b".repeat(200);

    let response = reqwest::get(proxy.sendsms(&format!("from=BRAND&to=%2B15550000001&text={text}")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.headers()[FAILED_PART_HEADER], "1");
    assert_eq!(proxy.kannel.requests().len(), 1);
}

#[tokio::test]
async fn test_caller_segmented_message_not_split_again() {
    let proxy = start_proxy(true, None).await;
    let text = "c".repeat(200);

    let response = reqwest::get(proxy.sendsms(&format!(
        "from=BRAND&to=%2B15550000001&udh=%05%00%03%2A%02%01&text={text}"
    )))
    .await
    .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(proxy.kannel.requests().len(), 1);
    let stored = proxy.service.stored();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].1, proxy.device_hashes(&text));
}

#[tokio::test]
async fn test_unreachable_gateway_is_bad_gateway() {
    let closed = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead_url = format!("http://{}{SENDSMS}", closed.local_addr().unwrap());
    drop(closed);
    let proxy = start_proxy(true, Some(dead_url)).await;

    let short = reqwest::get(proxy.sendsms("from=BRAND&to=%2B15550000001&text=hi"))
        .await
        .unwrap();
    let long = reqwest::get(proxy.sendsms(&format!(
        "from=BRAND&to=%2B15550000001&text={}",
        "d".repeat(200)
    )))
    .await
    .unwrap();

    assert_eq!(short.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(long.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(long.headers()[FAILED_PART_HEADER], "1");
}

#[tokio::test]
async fn test_health_and_metrics() {
    proxy_telemetry::register_metrics().unwrap();
    let proxy = start_proxy(true, None).await;
    reqwest::get(proxy.sendsms("from=BRAND&to=%2B15550000001&text=hi"))
        .await
        .unwrap();

    let health = reqwest::get(format!("{}/health", proxy.url)).await.unwrap();
    assert_eq!(health.status(), StatusCode::OK);
    assert_eq!(health.text().await.unwrap(), "ok");

    let metrics = reqwest::get(format!("{}/metrics", proxy.url)).await.unwrap();
    assert_eq!(metrics.status(), StatusCode::OK);
    let body = metrics.text().await.unwrap();
    assert!(body.contains("vp_dispatch_outcomes_total"));
    assert!(body.contains("vp_backend_hash_submissions_total"));
}
