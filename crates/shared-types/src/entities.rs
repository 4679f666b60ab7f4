//! # Core Domain Entities
//!
//! ## Clusters
//!
//! - **Agents**: `AgentId`, `Agent`, `AgentKeys`
//! - **Recipients**: `PhoneNumber`
//! - **Hashing output**: `HashCode`

use std::fmt;

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use serde::{Deserialize, Serialize, Serializer};
use zeroize::Zeroizing;

use crate::errors::EntityError;

// =============================================================================
// CLUSTER A: AGENTS
// =============================================================================

/// Identifier of a Verified SMS agent (brand identity).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(String);

impl AgentId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AgentId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Hashing key pair of an agent, as kept by the agent store.
///
/// Both keys are DER documents encoded with standard base64: the private key
/// as PKCS#8 (or SEC1), the public key as SubjectPublicKeyInfo. `ts` is the
/// registration time in fractional Unix seconds.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentKeys {
    pub private: String,
    pub public: String,
    #[serde(default)]
    pub ts: f64,
}

impl AgentKeys {
    /// Build a record from raw DER documents.
    pub fn from_der(private_der: &[u8], public_der: &[u8], ts: f64) -> Self {
        Self {
            private: STANDARD.encode(private_der),
            public: STANDARD.encode(public_der),
            ts,
        }
    }

    /// Decoded private key DER. The buffer is wiped on drop.
    pub fn private_der(&self) -> Result<Zeroizing<Vec<u8>>, EntityError> {
        STANDARD
            .decode(self.private.trim())
            .map(Zeroizing::new)
            .map_err(|e| EntityError::InvalidKeyEncoding {
                field: "private",
                reason: e.to_string(),
            })
    }

    /// Decoded public key DER.
    pub fn public_der(&self) -> Result<Vec<u8>, EntityError> {
        STANDARD
            .decode(self.public.trim())
            .map_err(|e| EntityError::InvalidKeyEncoding {
                field: "public",
                reason: e.to_string(),
            })
    }
}

impl fmt::Debug for AgentKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentKeys")
            .field("private", &"<redacted>")
            .field("public", &self.public)
            .field("ts", &self.ts)
            .finish()
    }
}

/// An agent record.
///
/// Fields the proxy does not understand are kept in `extra` so a
/// read-modify-write of the store preserves them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,

    /// Sender identifiers (the `from` of an SMS) routed to this agent.
    #[serde(default)]
    pub sender_ids: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vsms_keys: Option<AgentKeys>,

    /// Per-agent override of the unverified-send fallback.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub send_unverified: Option<bool>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Agent {
    pub fn new(id: impl Into<AgentId>) -> Self {
        Self {
            id: id.into(),
            sender_ids: Vec::new(),
            vsms_keys: None,
            send_unverified: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Whether `sender` routes to this agent.
    pub fn routes(&self, sender: &str) -> bool {
        self.sender_ids.iter().any(|s| s == sender)
    }

    /// The registered key pair, or `MissingKeys`.
    pub fn keys(&self) -> Result<&AgentKeys, EntityError> {
        self.vsms_keys
            .as_ref()
            .ok_or_else(|| EntityError::MissingKeys {
                agent_id: self.id.to_string(),
            })
    }
}

impl From<String> for AgentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

// =============================================================================
// CLUSTER B: RECIPIENTS
// =============================================================================

/// A recipient phone number in `+<digits>` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Normalize a gateway `to` value: strip every `+`, then prefix one.
    pub fn normalize(raw: &str) -> Result<Self, EntityError> {
        let digits: String = raw.trim().chars().filter(|c| *c != '+').collect();
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(EntityError::InvalidPhoneNumber(raw.to_string()));
        }
        Ok(Self(format!("+{digits}")))
    }

    /// Parse a whitespace separated recipient list, dropping duplicates.
    pub fn parse_list(raw: &str) -> Result<Vec<Self>, EntityError> {
        let mut numbers: Vec<Self> = Vec::new();
        for token in raw.split_whitespace() {
            let number = Self::normalize(token)?;
            if !numbers.contains(&number) {
                numbers.push(number);
            }
        }
        if numbers.is_empty() {
            return Err(EntityError::InvalidPhoneNumber(raw.to_string()));
        }
        Ok(numbers)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// CLUSTER C: HASHING OUTPUT
// =============================================================================

/// A 32-byte verification hash. Rendered as unpadded URL-safe base64.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct HashCode([u8; 32]);

impl HashCode {
    pub const LEN: usize = 32;

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_base64(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.0)
    }
}

impl fmt::Debug for HashCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HashCode({})", self.to_base64())
    }
}

impl fmt::Display for HashCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base64())
    }
}

impl Serialize for HashCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base64())
    }
}
