//! # Verification Client Subsystem (VP-04)
//!
//! HTTP/JSON client for the Verified SMS backend.
//!
//! ## Architecture
//!
//! ```text
//! VerificationClient ──► Authenticator ──► ?key=…  |  Bearer <token>
//!        │                                             ▲
//!        │                              TokenSource (RS256 JWT → OAuth2)
//!        └──► RetryPolicy (500-504, connection errors; capped backoff)
//! ```
//!
//! ## Security Notes
//!
//! - API keys and service account keys are redacted from `Debug` output.
//! - The agent public key is only attached to stored hashes in debug mode.

pub mod auth;
pub mod client;
pub mod error;
pub mod retry;

pub use auth::{AuthMode, ServiceAccountKey, DEFAULT_TOKEN_URI, VERIFIED_SMS_SCOPE};
pub use client::{ClientConfig, UserKeys, VerificationClient, DEFAULT_API_ROOT};
pub use error::VerificationClientError;
pub use retry::{is_retryable_status, RetryPolicy};
