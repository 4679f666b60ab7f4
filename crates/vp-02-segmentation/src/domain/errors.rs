//! # Segmentation Errors

use thiserror::Error;

/// Errors raised while splitting a message.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SegmentationError {
    /// The part count field of the concatenation header is one byte.
    #[error("Message needs {required} parts, at most 255 are addressable")]
    TooManyParts { required: usize },
}

/// Errors raised while decoding gateway text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EncodingError {
    /// `coding` is not 0, 1 or 2.
    #[error("Unknown data coding {0:?}")]
    UnknownCoding(String),

    /// Bytes are not valid under the requested coding.
    #[error("Text is not valid for coding {coding}: {reason}")]
    InvalidText { coding: u8, reason: String },
}
