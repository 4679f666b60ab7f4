//! # Message Segmenter
//!
//! Splits text that does not fit one SMS into concatenated parts.
//!
//! | Encoding | Single SMS | Per part (with UDH) | Unit            |
//! |----------|------------|---------------------|-----------------|
//! | GSM 7    | 160        | 153                 | septets         |
//! | UCS-2    | 70         | 67                  | UTF-16 code units |
//!
//! Characters are never split: an extension-table character (escape pair)
//! and an astral character (surrogate pair) always land in one part.

use tracing::debug;

use super::errors::SegmentationError;
use super::gsm7;
use super::udh::ConcatHeader;

/// Concatenation reference numbers are a single byte.
pub const MAX_PARTS: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Gsm7,
    Ucs2,
}

impl Encoding {
    /// Pick GSM 7 when every character is in the default alphabet.
    pub fn for_text(text: &str) -> Self {
        if gsm7::is_representable(text) {
            Self::Gsm7
        } else {
            Self::Ucs2
        }
    }

    /// Encoding for `text` together with the capacity units it takes.
    pub fn measure(text: &str) -> (Self, usize) {
        match gsm7::septet_len(text) {
            Some(septets) => (Self::Gsm7, septets),
            None => (Self::Ucs2, Self::Ucs2.length(text)),
        }
    }

    pub fn single_capacity(self) -> usize {
        match self {
            Self::Gsm7 => 160,
            Self::Ucs2 => 70,
        }
    }

    pub fn part_capacity(self) -> usize {
        match self {
            Self::Gsm7 => 153,
            Self::Ucs2 => 67,
        }
    }

    /// Gateway `coding` value for this encoding.
    pub fn data_coding(self) -> u8 {
        match self {
            Self::Gsm7 => 0,
            Self::Ucs2 => 2,
        }
    }

    /// Capacity units taken by `c`.
    fn cost(self, c: char) -> usize {
        match self {
            Self::Gsm7 => gsm7::septets(c).unwrap_or(2),
            Self::Ucs2 => c.len_utf16(),
        }
    }

    /// Capacity units taken by `text`.
    pub fn length(self, text: &str) -> usize {
        text.chars().map(|c| self.cost(c)).sum()
    }
}

/// One transport unit of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagePart {
    /// 1-based.
    pub ordinal: u8,
    pub total: u8,
    pub text: String,
    pub encoding: Encoding,
    /// Absent for a message that fits one SMS.
    pub header: Option<ConcatHeader>,
}

impl MessagePart {
    pub fn udh_bytes(&self) -> Option<[u8; 6]> {
        self.header.map(|h| h.to_bytes())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MessageSegmenter;

impl MessageSegmenter {
    pub fn new() -> Self {
        Self
    }

    /// Whether `message` needs more than one SMS.
    pub fn needs_split(&self, message: &str) -> bool {
        let (encoding, length) = Encoding::measure(message);
        length > encoding.single_capacity()
    }

    /// Split with a random concatenation reference.
    pub fn split(&self, message: &str) -> Result<Vec<MessagePart>, SegmentationError> {
        self.split_with_reference(message, rand::random())
    }

    /// Split using the given concatenation reference.
    pub fn split_with_reference(
        &self,
        message: &str,
        reference: u8,
    ) -> Result<Vec<MessagePart>, SegmentationError> {
        let (encoding, length) = Encoding::measure(message);
        if length <= encoding.single_capacity() {
            return Ok(vec![MessagePart {
                ordinal: 1,
                total: 1,
                text: message.to_string(),
                encoding,
                header: None,
            }]);
        }

        let chunks = chunk(message, encoding)?;
        // chunk() guarantees at most MAX_PARTS chunks
        let total = chunks.len() as u8;
        debug!(
            parts = total,
            reference,
            encoding = ?encoding,
            "message split into concatenated parts"
        );

        Ok(chunks
            .into_iter()
            .zip(1u8..)
            .map(|(text, ordinal)| MessagePart {
                ordinal,
                total,
                encoding: Encoding::for_text(&text),
                text,
                header: Some(ConcatHeader::new(reference, total, ordinal)),
            })
            .collect())
    }
}

/// Greedy split at character boundaries.
fn chunk(message: &str, encoding: Encoding) -> Result<Vec<String>, SegmentationError> {
    let capacity = encoding.part_capacity();
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut used = 0;

    for c in message.chars() {
        let cost = encoding.cost(c);
        if used + cost > capacity {
            chunks.push(std::mem::take(&mut current));
            used = 0;
        }
        current.push(c);
        used += cost;
    }
    if !current.is_empty() {
        chunks.push(current);
    }

    if chunks.len() > MAX_PARTS {
        return Err(SegmentationError::TooManyParts {
            required: chunks.len(),
        });
    }
    Ok(chunks)
}
