//! Per-message failures. All of them are resolved by the fallback policy;
//! none is fatal to the process.

use thiserror::Error;
use vp_02_segmentation::{EncodingError, SegmentationError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// The agent store could not be consulted.
    #[error("Agent lookup failed: {0}")]
    AgentResolution(String),

    /// Agent or recipient key material is malformed or on the wrong curve.
    #[error("Invalid key material: {0}")]
    KeyFormat(String),

    /// Network failure or non-2xx answer from the verification backend.
    #[error("Hash submission failed: {0}")]
    BackendSubmission(String),

    #[error("No recipient has a registered public key")]
    NoRecipientKey,

    #[error(transparent)]
    Encoding(#[from] EncodingError),

    #[error(transparent)]
    Segmentation(#[from] SegmentationError),
}
