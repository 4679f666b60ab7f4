//! # Hashing Errors
//!
//! Error types for shared-secret derivation and hash generation.

use std::fmt;

use thiserror::Error;

/// Which key a `KeyFormat` error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRole {
    /// Agent private key (PKCS#8 or SEC1 DER).
    AgentPrivate,
    /// Recipient public key (SubjectPublicKeyInfo DER).
    RecipientPublic,
}

impl fmt::Display for KeyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyRole::AgentPrivate => f.write_str("agent private key"),
            KeyRole::RecipientPublic => f.write_str("recipient public key"),
        }
    }
}

/// Errors that can occur while deriving hash codes.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HashingError {
    /// Key bytes could not be parsed as a P-384 key.
    #[error("Malformed {role}: {reason}")]
    KeyFormat { role: KeyRole, reason: String },

    /// HKDF refused the requested output length.
    #[error("Key derivation failed: {0}")]
    Derivation(String),

    /// Fresh key pair could not be encoded.
    #[error("Key generation failed: {0}")]
    KeyGeneration(String),
}

impl HashingError {
    pub(crate) fn key_format(role: KeyRole, reason: impl fmt::Display) -> Self {
        Self::KeyFormat {
            role,
            reason: reason.to_string(),
        }
    }
}
