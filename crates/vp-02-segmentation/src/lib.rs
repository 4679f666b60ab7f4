//! # Segmentation Subsystem (VP-02)
//!
//! Decides how many SMS a text needs and produces the parts with their
//! concatenation headers.
//!
//! ## Components
//!
//! - `gsm7`: GSM 03.38 default alphabet and septet accounting
//! - `segmenter`: capacity rules and greedy splitting
//! - `udh`: the 6-byte concatenation User Data Header
//! - `coding`: Kannel `coding` values and text decoding

pub mod domain;

// Re-export public API
pub use domain::coding::DataCoding;
pub use domain::errors::{EncodingError, SegmentationError};
pub use domain::segmenter::{Encoding, MessagePart, MessageSegmenter, MAX_PARTS};
pub use domain::udh::{ConcatHeader, CONCAT_HEADER_LEN};
