//! # Gateway Data Codings
//!
//! The `coding` values of the Kannel `sendsms` interface and how the text
//! bytes of each are decoded.

use super::errors::EncodingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataCoding {
    /// `0`: GSM 7-bit default alphabet.
    SevenBit,
    /// `1`: 8-bit data, UTF-8 text.
    EightBit,
    /// `2`: UCS-2, big-endian UTF-16 on the wire.
    Ucs2,
}

impl DataCoding {
    /// Resolve the `coding` parameter. Absent means 8-bit when the caller
    /// supplied a UDH, 7-bit otherwise.
    pub fn from_param(value: Option<&str>, has_udh: bool) -> Result<Self, EncodingError> {
        match value.map(str::trim) {
            None | Some("") if has_udh => Ok(Self::EightBit),
            None | Some("") => Ok(Self::SevenBit),
            Some("0") => Ok(Self::SevenBit),
            Some("1") => Ok(Self::EightBit),
            Some("2") => Ok(Self::Ucs2),
            Some(other) => Err(EncodingError::UnknownCoding(other.to_string())),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::SevenBit => 0,
            Self::EightBit => 1,
            Self::Ucs2 => 2,
        }
    }

    /// Decode gateway text bytes.
    ///
    /// 7-bit and 8-bit text arrive in the request charset, UTF-8; the
    /// gateway converts 7-bit text to septets itself.
    pub fn decode(self, bytes: &[u8]) -> Result<String, EncodingError> {
        let invalid = |reason: String| EncodingError::InvalidText {
            coding: self.code(),
            reason,
        };
        match self {
            Self::SevenBit | Self::EightBit => {
                String::from_utf8(bytes.to_vec()).map_err(|e| invalid(e.to_string()))
            }
            Self::Ucs2 => {
                if bytes.len() % 2 != 0 {
                    return Err(invalid(format!("odd length {}", bytes.len())));
                }
                let units = bytes
                    .chunks_exact(2)
                    .map(|pair| u16::from_be_bytes([pair[0], pair[1]]));
                char::decode_utf16(units)
                    .collect::<Result<String, _>>()
                    .map_err(|e| invalid(e.to_string()))
            }
        }
    }
}
