//! # Concatenation Header
//!
//! User Data Header carrying a single "concatenated short message, 8-bit
//! reference" information element (IEI 0x00).

/// UDH length byte: everything after it.
const UDH_LENGTH: u8 = 0x05;
/// Concatenated short messages, 8-bit reference number.
const IEI_CONCAT_8BIT: u8 = 0x00;
/// Information element payload length.
const IE_LENGTH: u8 = 0x03;

/// Size of the encoded header in bytes.
pub const CONCAT_HEADER_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConcatHeader {
    /// Shared by all parts of one message.
    pub reference: u8,
    pub total: u8,
    /// 1-based.
    pub ordinal: u8,
}

impl ConcatHeader {
    pub fn new(reference: u8, total: u8, ordinal: u8) -> Self {
        Self {
            reference,
            total,
            ordinal,
        }
    }

    pub fn to_bytes(&self) -> [u8; CONCAT_HEADER_LEN] {
        [
            UDH_LENGTH,
            IEI_CONCAT_8BIT,
            IE_LENGTH,
            self.reference,
            self.total,
            self.ordinal,
        ]
    }

    /// Parse a header produced by another segmenter. Only the 8-bit
    /// concatenation layout is understood.
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [UDH_LENGTH, IEI_CONCAT_8BIT, IE_LENGTH, reference, total, ordinal]
                if *ordinal >= 1 && ordinal <= total =>
            {
                Some(Self::new(*reference, *total, *ordinal))
            }
            _ => None,
        }
    }
}
