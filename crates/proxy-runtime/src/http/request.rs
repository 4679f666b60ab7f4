//! # Kannel `sendsms` Requests
//!
//! The two request shapes the proxy accepts, reduced to what the gate needs
//! while keeping enough of the original to relay it unchanged.
//!
//! | Field  | GET query        | POST                     |
//! |--------|------------------|--------------------------|
//! | from   | `from`           | `X-Kannel-From`          |
//! | to     | `to`             | `X-Kannel-To`            |
//! | coding | `coding`         | `X-Kannel-Coding`        |
//! | udh    | `udh`            | `X-Kannel-UDH`           |
//! | text   | `text` (raw)     | body                     |

use axum::http::{header, HeaderMap};
use percent_encoding::percent_decode_str;
use shared_types::{EntityError, PhoneNumber};
use thiserror::Error;
use tracing::{debug, warn};
use vp_02_segmentation::{ConcatHeader, DataCoding};
use vp_05_dispatch_gate::OutboundMessage;

pub const HEADER_FROM: &str = "x-kannel-from";
pub const HEADER_TO: &str = "x-kannel-to";
pub const HEADER_CODING: &str = "x-kannel-coding";
pub const HEADER_UDH: &str = "x-kannel-udh";
const KANNEL_HEADER_PREFIX: &str = "x-kannel-";

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("Missing recipient")]
    MissingRecipient,

    #[error("{0}")]
    InvalidRecipient(#[from] EntityError),
}

/// How the request reached the proxy, kept for relaying.
#[derive(Debug, Clone)]
pub enum RequestOrigin {
    /// Raw query string of a GET request.
    Query(String),
    /// `X-Kannel-*` headers, `Content-Type` and body of a POST request.
    Body { headers: HeaderMap, body: Vec<u8> },
}

#[derive(Debug, Clone)]
pub struct KannelRequest {
    pub from: Option<String>,
    pub to: Option<String>,
    pub coding: Option<String>,
    /// Decoded UDH bytes; empty when the caller sent none.
    pub udh: Vec<u8>,
    /// Undecoded text bytes. `None` when a GET carried no `text`.
    ///
    /// A GET `text` is only percent-decoded: `+` stays `+`. Kannel itself
    /// form-decodes the value, so the handset shows a space where the proxy
    /// hashed a plus sign. Deployed hash generators behave the same way.
    pub text: Option<Vec<u8>>,
    pub origin: RequestOrigin,
}

impl KannelRequest {
    pub fn from_query(raw_query: &str) -> Self {
        let mut from = None;
        let mut to = None;
        let mut coding = None;
        let mut udh = Vec::new();
        let mut text = None;

        for pair in raw_query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            match form_decode(key).as_str() {
                "text" if text.is_none() => {
                    // no '+' to space, see `text`
                    text = Some(percent_decode_str(value).collect::<Vec<u8>>());
                }
                "from" if from.is_none() => from = Some(form_decode(value)),
                "to" if to.is_none() => to = Some(form_decode(value)),
                "coding" if coding.is_none() => coding = Some(form_decode(value)),
                "udh" if udh.is_empty() => udh = percent_decode_str(value).collect(),
                _ => {}
            }
        }

        Self {
            from,
            to,
            coding,
            udh,
            text,
            origin: RequestOrigin::Query(raw_query.to_string()),
        }
    }

    pub fn from_post(headers: &HeaderMap, body: &[u8]) -> Self {
        let value = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };

        let mut relayed = HeaderMap::new();
        for (name, v) in headers {
            if name.as_str().starts_with(KANNEL_HEADER_PREFIX) || *name == header::CONTENT_TYPE {
                relayed.append(name.clone(), v.clone());
            }
        }

        Self {
            from: value(HEADER_FROM),
            to: value(HEADER_TO),
            coding: value(HEADER_CODING),
            udh: value(HEADER_UDH)
                .map(|v| percent_decode_str(&v).collect())
                .unwrap_or_default(),
            text: Some(body.to_vec()),
            origin: RequestOrigin::Body {
                headers: relayed,
                body: body.to_vec(),
            },
        }
    }

    /// The caller's concatenation header, when its UDH carries one.
    pub fn concat_header(&self) -> Option<ConcatHeader> {
        ConcatHeader::parse(&self.udh)
    }

    /// Gate input. Text that cannot be decoded is dropped so the fallback
    /// policy decides.
    pub fn to_message(&self) -> Result<OutboundMessage, RequestError> {
        let to = self.to.as_deref().ok_or(RequestError::MissingRecipient)?;
        let recipients = PhoneNumber::parse_list(to)?;
        let sender = self.from.clone().unwrap_or_default();
        // Any UDH means the caller laid out the PDU; the gate must not split.
        let caller_segmented = !self.udh.is_empty();
        if caller_segmented {
            match self.concat_header() {
                Some(header) => debug!(
                    sender = %sender,
                    reference = header.reference,
                    ordinal = header.ordinal,
                    total = header.total,
                    "caller-segmented part"
                ),
                None => warn!(
                    sender = %sender,
                    udh_len = self.udh.len(),
                    "caller UDH carries no concatenation header, hashing text as sent"
                ),
            }
        }

        let text = self.text.as_deref().and_then(|bytes| {
            let decoded = DataCoding::from_param(self.coding.as_deref(), caller_segmented)
                .and_then(|coding| coding.decode(bytes));
            match decoded {
                Ok(text) => Some(text),
                Err(e) => {
                    warn!(sender = %sender, error = %e, "cannot decode message text");
                    None
                }
            }
        });

        let message = match text {
            Some(text) => OutboundMessage::new(sender, recipients, text),
            None => OutboundMessage::without_text(sender, recipients),
        };
        Ok(message.caller_segmented(caller_segmented))
    }
}

/// `application/x-www-form-urlencoded` value decoding.
fn form_decode(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}
