//! # Backend Authentication
//!
//! Either an API key sent as the `key` query parameter, or a service account
//! whose RS256-signed JWT assertion is exchanged for a bearer token at the
//! OAuth2 token endpoint.

use std::fmt;
use std::path::Path;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::VerificationClientError;

pub const VERIFIED_SMS_SCOPE: &str = "https://www.googleapis.com/auth/verifiedsms";
pub const DEFAULT_TOKEN_URI: &str = "https://www.googleapis.com/oauth2/v4/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime requested for each assertion.
const ASSERTION_LIFETIME_SECS: u64 = 3600;
/// A token this close to expiry is replaced before use.
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// The fields of a service account key file the proxy needs.
#[derive(Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    /// PEM encoded RSA key.
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl ServiceAccountKey {
    pub fn from_json(raw: &str) -> Result<Self, VerificationClientError> {
        serde_json::from_str(raw).map_err(|e| VerificationClientError::Credentials(e.to_string()))
    }

    pub fn from_file(path: &Path) -> Result<Self, VerificationClientError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            VerificationClientError::Credentials(format!("{}: {e}", path.display()))
        })?;
        Self::from_json(&raw)
    }
}

impl fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("client_email", &self.client_email)
            .field("private_key", &"<redacted>")
            .field("private_key_id", &self.private_key_id)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

/// How requests to the backend are authorized. Chosen once per client.
#[derive(Clone)]
pub enum AuthMode {
    ApiKey(String),
    ServiceAccount(ServiceAccountKey),
}

impl fmt::Debug for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ApiKey(_) => f.write_str("ApiKey(<redacted>)"),
            Self::ServiceAccount(key) => f.debug_tuple("ServiceAccount").field(key).finish(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Claims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: u64,
    pub exp: u64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    ASSERTION_LIFETIME_SECS
}

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// Mints bearer tokens on demand and reuses them until they near expiry.
pub(crate) struct TokenSource {
    key: ServiceAccountKey,
    encoding_key: EncodingKey,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenSource {
    pub fn new(key: ServiceAccountKey) -> Result<Self, VerificationClientError> {
        let encoding_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| VerificationClientError::Credentials(e.to_string()))?;
        Ok(Self {
            key,
            encoding_key,
            cached: Mutex::new(None),
        })
    }

    pub fn claims(&self, now: u64) -> Claims {
        Claims {
            iss: self.key.client_email.clone(),
            scope: VERIFIED_SMS_SCOPE.to_string(),
            aud: self.key.token_uri.clone(),
            iat: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        }
    }

    fn assertion(&self) -> Result<String, VerificationClientError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key.private_key_id.clone();
        jsonwebtoken::encode(&header, &self.claims(now), &self.encoding_key)
            .map_err(|e| VerificationClientError::Credentials(e.to_string()))
    }

    /// A valid bearer token, minting a new one when needed.
    pub async fn bearer(&self, http: &Client) -> Result<String, VerificationClientError> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Instant::now() + REFRESH_MARGIN {
                return Ok(token.access_token.clone());
            }
            debug!("access token near expiry, minting a new one");
        }
        let fresh = self.mint(http).await?;
        let access_token = fresh.access_token.clone();
        *cached = Some(fresh);
        Ok(access_token)
    }

    async fn mint(&self, http: &Client) -> Result<CachedToken, VerificationClientError> {
        let assertion = self.assertion()?;
        let response = http
            .post(&self.key.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(VerificationClientError::TokenExchange(format!(
                "status {}: {body}",
                status.as_u16()
            )));
        }
        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| VerificationClientError::TokenExchange(e.to_string()))?;

        info!(
            client_email = %self.key.client_email,
            expires_in = token.expires_in,
            "obtained access token"
        );
        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: Instant::now() + Duration::from_secs(token.expires_in),
        })
    }
}
