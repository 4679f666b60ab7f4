//! Errors raised by the verification backend client.

use thiserror::Error;
use vp_01_text_hashing::HashingError;

use crate::retry::is_retryable_status;

#[derive(Debug, Error)]
pub enum VerificationClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Connection failed: {0}")]
    Connection(String),

    /// Non-2xx answer from the backend.
    #[error("Verification service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Invalid service account credentials: {0}")]
    Credentials(String),

    #[error("Access token exchange failed: {0}")]
    TokenExchange(String),

    #[error("No public key registered for recipient {0}")]
    MissingRecipientKey(String),

    #[error(transparent)]
    Hashing(#[from] HashingError),
}

impl VerificationClientError {
    /// Transient failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Connection(_) => true,
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Status { status, .. } => is_retryable_status(*status),
            _ => false,
        }
    }
}
