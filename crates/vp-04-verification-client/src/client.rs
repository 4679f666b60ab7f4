//! # Verification Backend Client
//!
//! | Operation | Request |
//! |-----------|---------|
//! | `get_user_keys` | `POST userKeys:batchGet` |
//! | `store_hashes` | `POST agents/{id}:storeHashes` |
//! | `update_key` | `PATCH agents/{id}/key` |
//! | `get_agent_public_key` | `GET agents/{id}/key` |
//!
//! Every request is retried on connection errors and 500-504 answers
//! according to the client's [`RetryPolicy`].

use std::collections::HashMap;
use std::time::Duration;

use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE};
use base64::Engine;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use proxy_telemetry::{metric_inc, time_histogram, BACKEND_REQUEST_DURATION, BACKEND_RETRIES};
use reqwest::{Client, Method, RequestBuilder};
use serde::Deserialize;
use serde_json::{json, Value};
use shared_types::{AgentId, HashCode, PhoneNumber};
use tracing::{debug, warn};
use vp_01_text_hashing::{public_key_der, VerificationHashGenerator};

use crate::auth::{AuthMode, TokenSource};
use crate::error::VerificationClientError;
use crate::retry::{is_retryable_status, RetryPolicy};

pub const DEFAULT_API_ROOT: &str = "https://verifiedsms.googleapis.com/v1/";

/// Characters left as-is in an agent id path segment.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Recipient phone number to SubjectPublicKeyInfo DER.
pub type UserKeys = HashMap<String, Vec<u8>>;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_root: String,
    pub timeout: Duration,
    pub retry: RetryPolicy,
    /// Send the agent public key along with stored hashes so the backend
    /// can check it. Not for production traffic.
    pub debug_mode: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_root: DEFAULT_API_ROOT.to_string(),
            timeout: Duration::from_secs(10),
            retry: RetryPolicy::default(),
            debug_mode: false,
        }
    }
}

enum Authenticator {
    ApiKey(String),
    ServiceAccount(TokenSource),
}

pub struct VerificationClient {
    http: Client,
    api_root: String,
    auth: Authenticator,
    retry: RetryPolicy,
    debug_mode: bool,
    generator: VerificationHashGenerator,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserKeyEntry {
    phone_number: String,
    #[serde(default)]
    public_key: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchGetResponse {
    #[serde(default)]
    user_keys: Vec<UserKeyEntry>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AgentKeyResponse {
    #[serde(default)]
    public_key: Option<String>,
}

/// Public keys come back in either base64 alphabet, padded or not.
fn decode_key(raw: &str) -> Result<Vec<u8>, VerificationClientError> {
    let normalized: String = raw
        .trim()
        .trim_end_matches('=')
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();
    STANDARD_NO_PAD
        .decode(normalized)
        .map_err(|e| VerificationClientError::Parse(format!("public key: {e}")))
}

fn agent_path(agent_id: &AgentId, suffix: &str) -> String {
    format!(
        "agents/{}{suffix}",
        utf8_percent_encode(agent_id.as_str(), PATH_SEGMENT)
    )
}

impl VerificationClient {
    pub fn new(config: ClientConfig, auth: AuthMode) -> Result<Self, VerificationClientError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()?;
        let auth = match auth {
            AuthMode::ApiKey(key) => Authenticator::ApiKey(key),
            AuthMode::ServiceAccount(key) => Authenticator::ServiceAccount(TokenSource::new(key)?),
        };
        let mut api_root = config.api_root;
        if !api_root.ends_with('/') {
            api_root.push('/');
        }
        Ok(Self {
            http,
            api_root,
            auth,
            retry: config.retry,
            debug_mode: config.debug_mode,
            generator: VerificationHashGenerator::new(),
        })
    }

    pub fn debug_mode(&self) -> bool {
        self.debug_mode
    }

    async fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder, VerificationClientError> {
        Ok(match &self.auth {
            Authenticator::ApiKey(key) => request.query(&[("key", key)]),
            Authenticator::ServiceAccount(tokens) => request.bearer_auth(tokens.bearer(&self.http).await?),
        })
    }

    async fn send_once(
        &self,
        method: &Method,
        url: &str,
        body: Option<&Value>,
    ) -> Result<Value, VerificationClientError> {
        let mut request = self.authorize(self.http.request(method.clone(), url)).await?;
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await.map_err(|e| {
            if e.is_connect() {
                VerificationClientError::Connection(format!("Cannot connect to {url}"))
            } else {
                VerificationClientError::Http(e)
            }
        })?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(VerificationClientError::Status {
                status: status.as_u16(),
                body: text,
            });
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| VerificationClientError::Parse(e.to_string()))
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, VerificationClientError> {
        let _timer = time_histogram!(BACKEND_REQUEST_DURATION);
        let url = format!("{}{path}", self.api_root);
        let mut retry = 0;
        loop {
            match self.send_once(&method, &url, body.as_ref()).await {
                Err(e) if e.is_retryable() && retry < self.retry.max_retries => {
                    let delay = self.retry.delay(retry);
                    warn!(
                        %method,
                        path,
                        retry = retry + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "verification backend request failed, retrying"
                    );
                    metric_inc!(BACKEND_RETRIES);
                    tokio::time::sleep(delay).await;
                    retry += 1;
                }
                result => return result,
            }
        }
    }

    /// Current public keys of `phone_numbers`. Numbers without a registered
    /// key are absent from the result.
    pub async fn get_user_keys(&self, phone_numbers: &[PhoneNumber]) -> Result<UserKeys, VerificationClientError> {
        let numbers: Vec<&str> = phone_numbers.iter().map(PhoneNumber::as_str).collect();
        let response = self
            .execute(Method::POST, "userKeys:batchGet", Some(json!({ "phoneNumbers": numbers })))
            .await?;
        let parsed: BatchGetResponse =
            serde_json::from_value(response).map_err(|e| VerificationClientError::Parse(e.to_string()))?;

        let mut keys = UserKeys::new();
        for entry in parsed.user_keys {
            match entry.public_key {
                Some(key) if !key.is_empty() => {
                    keys.insert(entry.phone_number, decode_key(&key)?);
                }
                _ => debug!(phone_number = %entry.phone_number, "no key registered"),
            }
        }
        Ok(keys)
    }

    /// Register `hashes` for `agent_id`. In debug mode the agent public key
    /// is sent along when given.
    pub async fn store_hashes(
        &self,
        agent_id: &AgentId,
        hashes: &[HashCode],
        agent_public_der: Option<&[u8]>,
    ) -> Result<Value, VerificationClientError> {
        let values: Vec<String> = hashes.iter().map(HashCode::to_base64).collect();
        let mut body = json!({ "hashes": { "values": values } });
        if let (true, Some(public_der)) = (self.debug_mode, agent_public_der) {
            body["publicKey"] = Value::String(URL_SAFE.encode(public_der));
        }
        debug!(agent_id = %agent_id, hashes = hashes.len(), "storing hashes");
        self.execute(Method::POST, &agent_path(agent_id, ":storeHashes"), Some(body))
            .await
    }

    /// Replace the public key registered for `agent_id`.
    pub async fn update_key(&self, agent_id: &AgentId, public_der: &[u8]) -> Result<(), VerificationClientError> {
        let body = json!({ "publicKey": URL_SAFE.encode(public_der) });
        self.execute(Method::PATCH, &agent_path(agent_id, "/key"), Some(body))
            .await?;
        Ok(())
    }

    /// The public key the backend holds for `agent_id`, as sent by it.
    pub async fn get_agent_public_key(&self, agent_id: &AgentId) -> Result<Option<String>, VerificationClientError> {
        let response = self
            .execute(Method::GET, &agent_path(agent_id, "/key"), None)
            .await?;
        let parsed: AgentKeyResponse =
            serde_json::from_value(response).map_err(|e| VerificationClientError::Parse(e.to_string()))?;
        Ok(parsed.public_key.filter(|key| !key.is_empty()))
    }

    /// Fetch recipient keys, hash each message and store all hashes in one
    /// request. Returns the stored hashes in base64 form.
    pub async fn create_hashes(
        &self,
        agent_id: &AgentId,
        messages: &[(PhoneNumber, String)],
        agent_private_der: &[u8],
    ) -> Result<Vec<String>, VerificationClientError> {
        let recipients: Vec<PhoneNumber> = messages.iter().map(|(to, _)| to.clone()).collect();
        let user_keys = self.get_user_keys(&recipients).await?;

        let mut hashes = Vec::new();
        for (recipient, message) in messages {
            let device_key = user_keys
                .get(recipient.as_str())
                .ok_or_else(|| VerificationClientError::MissingRecipientKey(recipient.to_string()))?;
            hashes.extend(self.generator.hash_codes(agent_private_der, device_key, message)?);
        }

        let agent_public = if self.debug_mode {
            Some(public_key_der(agent_private_der)?)
        } else {
            None
        };
        self.store_hashes(agent_id, &hashes, agent_public.as_deref())
            .await?;
        Ok(hashes.iter().map(HashCode::to_base64).collect())
    }
}
