//! # Test Doubles
//!
//! Local HTTP stand-ins for the Verified SMS service and the Kannel gateway,
//! each bound to an ephemeral port.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::{Json, Router};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use percent_encoding::percent_decode_str;
use serde_json::{json, Value};
use shared_types::Agent;
use vp_01_text_hashing::AgentKeyPair;

/// Serve `router` on 127.0.0.1 and return its base URL.
pub async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    format!("http://{addr}")
}

/// Decode `a=1&b=2` pairs, `+` left as is.
pub fn query_pairs(raw: &str) -> HashMap<String, Vec<u8>> {
    raw.split('&')
        .filter_map(|pair| pair.split_once('='))
        .map(|(k, v)| {
            (
                percent_decode_str(k).decode_utf8_lossy().into_owned(),
                percent_decode_str(v).collect(),
            )
        })
        .collect()
}

/// Agent record routing `sender_ids` to `id`, keyed with `keys`.
pub fn agent_record(id: &str, sender_ids: &[&str], keys: &AgentKeyPair) -> Agent {
    let mut agent = Agent::new(id);
    agent.sender_ids = sender_ids.iter().map(|s| s.to_string()).collect();
    agent.vsms_keys = Some(keys.to_agent_keys(1_700_000_000.0));
    agent
}

// =============================================================================
// VERIFICATION SERVICE
// =============================================================================

#[derive(Default)]
pub struct MockVerificationService {
    /// Standard base64 SPKI per phone number.
    pub user_keys: Mutex<HashMap<String, String>>,
    /// Agent keys as last PATCHed.
    pub agent_keys: Mutex<HashMap<String, String>>,
    /// `(agent, hash values)` per storeHashes call.
    pub stored: Mutex<Vec<(String, Vec<String>)>>,
    pub reject_key_updates: AtomicBool,
}

impl MockVerificationService {
    pub fn register_device(&self, phone: &str, device: &AgentKeyPair) {
        self.user_keys
            .lock()
            .unwrap()
            .insert(phone.to_string(), STANDARD.encode(device.public_der()));
    }

    pub fn stored(&self) -> Vec<(String, Vec<String>)> {
        self.stored.lock().unwrap().clone()
    }
}

async fn verification_handler(
    State(service): State<Arc<MockVerificationService>>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let Some(rest) = uri.path().strip_prefix("/v1/") else {
        return (StatusCode::NOT_FOUND, Json(Value::Null));
    };

    if rest == "userKeys:batchGet" {
        let keys = service.user_keys.lock().unwrap();
        let entries: Vec<Value> = body["phoneNumbers"]
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
            .map(|n| match keys.get(n) {
                Some(key) => json!({ "phoneNumber": n, "publicKey": key }),
                None => json!({ "phoneNumber": n }),
            })
            .collect();
        return (StatusCode::OK, Json(json!({ "userKeys": entries })));
    }

    let Some(agent_part) = rest.strip_prefix("agents/") else {
        return (StatusCode::NOT_FOUND, Json(Value::Null));
    };
    if let Some(agent) = agent_part.strip_suffix(":storeHashes") {
        let values = body["hashes"]["values"]
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect();
        service.stored.lock().unwrap().push((agent.to_string(), values));
        return (StatusCode::OK, Json(json!({})));
    }
    if let Some(agent) = agent_part.strip_suffix("/key") {
        if method == Method::PATCH {
            if service.reject_key_updates.load(Ordering::SeqCst) {
                return (StatusCode::FORBIDDEN, Json(json!({ "error": "forbidden" })));
            }
            let key = body["publicKey"].as_str().unwrap_or_default().to_string();
            service.agent_keys.lock().unwrap().insert(agent.to_string(), key);
            return (StatusCode::OK, Json(json!({})));
        }
        let key = service.agent_keys.lock().unwrap().get(agent).cloned();
        return (StatusCode::OK, Json(json!({ "publicKey": key })));
    }
    (StatusCode::NOT_FOUND, Json(Value::Null))
}

/// Returns the API root (`…/v1/`) and the shared service state.
pub async fn start_verification_service() -> (String, Arc<MockVerificationService>) {
    let service = Arc::new(MockVerificationService::default());
    let router = Router::new()
        .fallback(verification_handler)
        .with_state(service.clone());
    let base = spawn(router).await;
    (format!("{base}/v1/"), service)
}

// =============================================================================
// KANNEL
// =============================================================================

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

pub struct MockKannel {
    pub requests: Mutex<Vec<RecordedRequest>>,
    pub status: AtomicU16,
}

impl Default for MockKannel {
    fn default() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            status: AtomicU16::new(202),
        }
    }
}

impl MockKannel {
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn answer_with(&self, status: u16) {
        self.status.store(status, Ordering::SeqCst);
    }
}

async fn kannel_handler(
    State(kannel): State<Arc<MockKannel>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, [(&'static str, &'static str); 1], &'static str) {
    kannel.requests.lock().unwrap().push(RecordedRequest {
        method,
        query: uri.query().map(str::to_string),
        headers,
        body: body.to_vec(),
    });
    let status = StatusCode::from_u16(kannel.status.load(Ordering::SeqCst)).unwrap_or(StatusCode::OK);
    (status, [("content-type", "text/html")], "0: Accepted for delivery")
}

/// Returns the `sendsms` URL and the shared gateway state.
pub async fn start_kannel() -> (String, Arc<MockKannel>) {
    let kannel = Arc::new(MockKannel::default());
    let router = Router::new().fallback(kannel_handler).with_state(kannel.clone());
    let base = spawn(router).await;
    (format!("{base}/cgi-bin/sendsms"), kannel)
}
