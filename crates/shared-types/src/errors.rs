//! # Error Types
//!
//! Errors raised while building or decoding shared entities.

use thiserror::Error;

/// Errors produced by entity constructors and accessors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntityError {
    /// Recipient is empty or contains something other than digits and `+`.
    #[error("Invalid phone number: {0:?}")]
    InvalidPhoneNumber(String),

    /// Agent record was loaded without a `vsms_keys` section.
    #[error("Agent {agent_id} has no registered key pair")]
    MissingKeys { agent_id: String },

    /// Stored key is not valid standard base64.
    #[error("Agent {field} key is not valid base64: {reason}")]
    InvalidKeyEncoding { field: &'static str, reason: String },
}
