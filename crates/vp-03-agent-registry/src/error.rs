//! Error types for the agent registry.

use thiserror::Error;
use vp_01_text_hashing::HashingError;

/// Errors raised by agent stores.
#[derive(Debug, Error)]
pub enum AgentStoreError {
    /// Location is neither `file://` nor `http(s)://`.
    #[error("Unsupported agent store location: {0}")]
    UnsupportedLocation(String),

    /// Agent id cannot be used as a record name.
    #[error("Invalid agent id {0:?}")]
    InvalidAgentId(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A record is not valid agent JSON.
    #[error("Invalid agent record {name}: {reason}")]
    InvalidRecord { name: String, reason: String },

    #[error("Agent store request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// HTTP store answered with an error status.
    #[error("Agent store returned status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// The verification backend refused a key update.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct PublishError(pub String);

/// Errors raised while registering a new agent key.
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("Key pair generation failed: {0}")]
    KeyGeneration(#[from] HashingError),

    #[error("Key update for agent {agent_id} failed at the verification service: {source}")]
    Publication {
        agent_id: String,
        #[source]
        source: PublishError,
    },

    /// The key was published but could not be saved locally.
    #[error("Key for agent {agent_id} was published but not stored: {source}")]
    Store {
        agent_id: String,
        #[source]
        source: AgentStoreError,
    },
}
