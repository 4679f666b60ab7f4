//! # Text Hashing Subsystem (VP-01)
//!
//! Derives Verified SMS hash codes for a message.
//!
//! ## Pipeline
//!
//! ```text
//! message ──► UrlSpanFinder ──► TextSanitizer ──► HKDF-SHA256 ──► HashCode(s)
//!                                                    ▲
//! agent private key + recipient public key ──► ECDH (P-384)
//! ```
//!
//! ## Security Notes
//!
//! - Shared secrets and decoded private keys are wiped on drop.
//! - Nothing in this crate logs message text or key material.

pub mod domain;

// Re-export public API
pub use domain::errors::{HashingError, KeyRole};
pub use domain::hash_generator::VerificationHashGenerator;
pub use domain::keys::{public_key_der, AgentKeyPair};
pub use domain::sanitizer::TextSanitizer;
pub use domain::shared_secret::{derive as derive_shared_secret, SharedSecret};
pub use domain::url_finder::{UrlSpan, UrlSpanFinder, SUPPORTED_SCHEMES};
