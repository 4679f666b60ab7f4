//! # Kannel Gateway Client
//!
//! Relays requests to the real `sendsms` endpoint: either the inbound
//! request as it came in, or one part of a message the gate segmented.
//!
//! Parts keep every parameter of the original request except the payload
//! fields, which are rewritten:
//!
//! ```text
//! GET  ...&text=<pct bytes>&coding=<0|2>&charset=<UTF-8|UTF-16BE>&udh=<pct bytes>
//! POST body=<bytes>  X-Kannel-Coding  X-Kannel-UDH  Content-Type: text/plain; charset=…
//! ```

use std::time::Duration;

use async_trait::async_trait;
use axum::http::{header, HeaderMap, HeaderValue};
use percent_encoding::{percent_decode_str, percent_encode, NON_ALPHANUMERIC};
use reqwest::{Client, Response};
use thiserror::Error;
use tracing::debug;
use vp_02_segmentation::{Encoding, MessagePart};
use vp_05_dispatch_gate::{GatewayReply, PartForwarder};

use crate::http::request::{KannelRequest, RequestOrigin, HEADER_CODING, HEADER_UDH};

/// Query parameters replaced in each forwarded part.
const PAYLOAD_PARAMS: [&str; 4] = ["text", "udh", "coding", "charset"];

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Gateway unreachable: {0}")]
    Connection(String),

    #[error("Gateway request failed: {0}")]
    Http(#[from] reqwest::Error),
}

fn classify(e: reqwest::Error) -> GatewayError {
    if e.is_connect() {
        GatewayError::Connection(e.to_string())
    } else {
        GatewayError::Http(e)
    }
}

#[derive(Debug, Clone)]
pub struct KannelGateway {
    http: Client,
    url: String,
}

impl KannelGateway {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, GatewayError> {
        let http = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn url_with_query(&self, query: &str) -> String {
        if query.is_empty() {
            return self.url.clone();
        }
        let separator = if self.url.contains('?') { '&' } else { '?' };
        format!("{}{}{}", self.url, separator, query)
    }

    /// Relay the inbound request unchanged.
    pub async fn forward_original(&self, request: &KannelRequest) -> Result<GatewayReply, GatewayError> {
        let response = match &request.origin {
            RequestOrigin::Query(query) => self.http.get(self.url_with_query(query)).send().await,
            RequestOrigin::Body { headers, body } => {
                self.http
                    .post(&self.url)
                    .headers(headers.clone())
                    .body(body.clone())
                    .send()
                    .await
            }
        }
        .map_err(classify)?;
        into_reply(response).await
    }

    /// Send one part of a segmented message in the shape of `request`.
    pub async fn send_part(
        &self,
        request: &KannelRequest,
        part: &MessagePart,
    ) -> Result<GatewayReply, GatewayError> {
        debug!(ordinal = part.ordinal, total = part.total, "forwarding part");
        let response = match &request.origin {
            RequestOrigin::Query(query) => {
                self.http
                    .get(self.url_with_query(&part_query(query, part)))
                    .send()
                    .await
            }
            RequestOrigin::Body { headers, .. } => {
                self.http
                    .post(&self.url)
                    .headers(part_headers(headers, part))
                    .body(part_payload(part))
                    .send()
                    .await
            }
        }
        .map_err(classify)?;
        into_reply(response).await
    }
}

async fn into_reply(response: Response) -> Result<GatewayReply, GatewayError> {
    let status = response.status().as_u16();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = response.bytes().await.map_err(classify)?.to_vec();
    Ok(GatewayReply {
        status,
        content_type,
        body,
    })
}

// =============================================================================
// PART ENCODING
// =============================================================================

/// Text bytes in the part's coding.
pub fn part_payload(part: &MessagePart) -> Vec<u8> {
    match part.encoding {
        Encoding::Gsm7 => part.text.as_bytes().to_vec(),
        Encoding::Ucs2 => part.text.encode_utf16().flat_map(u16::to_be_bytes).collect(),
    }
}

fn part_charset(part: &MessagePart) -> &'static str {
    match part.encoding {
        Encoding::Gsm7 => "UTF-8",
        Encoding::Ucs2 => "UTF-16BE",
    }
}

fn pct(bytes: &[u8]) -> String {
    percent_encode(bytes, NON_ALPHANUMERIC).to_string()
}

/// The original query with the payload parameters replaced by the part's.
pub fn part_query(original: &str, part: &MessagePart) -> String {
    let mut pairs: Vec<String> = original
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter(|pair| {
            let key = pair.split_once('=').map_or(*pair, |(k, _)| k);
            let key = percent_decode_str(key).decode_utf8_lossy();
            !PAYLOAD_PARAMS.iter().any(|param| *param == key)
        })
        .map(str::to_string)
        .collect();

    pairs.push(format!("text={}", pct(&part_payload(part))));
    pairs.push(format!("coding={}", part.encoding.data_coding()));
    pairs.push(format!("charset={}", part_charset(part)));
    if let Some(udh) = part.udh_bytes() {
        pairs.push(format!("udh={}", pct(&udh)));
    }
    pairs.join("&")
}

/// The original relayed headers with the payload headers replaced.
pub fn part_headers(original: &HeaderMap, part: &MessagePart) -> HeaderMap {
    let mut headers = original.clone();
    headers.remove(HEADER_UDH);
    headers.remove(HEADER_CODING);

    headers.insert(HEADER_CODING, HeaderValue::from(u16::from(part.encoding.data_coding())));
    if let Some(udh) = part.udh_bytes() {
        // percent-encoded output is always a valid header value
        if let Ok(value) = HeaderValue::from_str(&pct(&udh)) {
            headers.insert(HEADER_UDH, value);
        }
    }
    let content_type = format!("text/plain; charset={}", part_charset(part));
    if let Ok(value) = HeaderValue::from_str(&content_type) {
        headers.insert(header::CONTENT_TYPE, value);
    }
    headers
}

// =============================================================================
// PART FORWARDER
// =============================================================================

/// Forwards the gate's parts in the shape of one inbound request.
pub struct PartRelay<'a> {
    gateway: &'a KannelGateway,
    request: &'a KannelRequest,
}

impl<'a> PartRelay<'a> {
    pub fn new(gateway: &'a KannelGateway, request: &'a KannelRequest) -> Self {
        Self { gateway, request }
    }
}

#[async_trait]
impl PartForwarder for PartRelay<'_> {
    async fn forward_part(&self, part: &MessagePart) -> Result<GatewayReply, String> {
        self.gateway
            .send_part(self.request, part)
            .await
            .map_err(|e| e.to_string())
    }
}
