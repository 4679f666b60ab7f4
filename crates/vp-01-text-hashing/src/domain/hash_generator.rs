//! # Verification Hash Generator
//!
//! Turns a message into the hash codes registered with the verification
//! backend: HKDF-SHA256 with the ECDH shared secret as input keying material,
//! no salt and the UTF-8 message as `info`, 32 bytes of output.
//!
//! When sanitizing changes the message, the sanitized hash comes first and
//! the hash of the message as given comes last.

use hkdf::Hkdf;
use sha2::Sha256;
use shared_types::HashCode;

use super::errors::HashingError;
use super::sanitizer::TextSanitizer;
use super::shared_secret::{self, SharedSecret};

#[derive(Debug, Default, Clone, Copy)]
pub struct VerificationHashGenerator {
    sanitizer: TextSanitizer,
}

impl VerificationHashGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// One or two digests of `message` under `secret`.
    pub fn get_digests(
        &self,
        secret: &SharedSecret,
        message: &str,
    ) -> Result<Vec<HashCode>, HashingError> {
        let sanitized = self.sanitizer.sanitize(message);
        let mut digests = Vec::with_capacity(2);
        if sanitized != message {
            digests.push(hkdf_sha256(secret, &sanitized)?);
        }
        digests.push(hkdf_sha256(secret, message)?);
        Ok(digests)
    }

    /// Derive the shared secret from DER keys and hash `message`.
    pub fn hash_codes(
        &self,
        agent_private_der: &[u8],
        recipient_public_der: &[u8],
        message: &str,
    ) -> Result<Vec<HashCode>, HashingError> {
        let secret = shared_secret::derive(agent_private_der, recipient_public_der)?;
        self.get_digests(&secret, message)
    }

    /// Same as [`hash_codes`](Self::hash_codes), rendered as unpadded
    /// URL-safe base64 strings.
    pub fn create_hashes(
        &self,
        agent_private_der: &[u8],
        recipient_public_der: &[u8],
        message: &str,
    ) -> Result<Vec<String>, HashingError> {
        Ok(self
            .hash_codes(agent_private_der, recipient_public_der, message)?
            .iter()
            .map(HashCode::to_base64)
            .collect())
    }
}

fn hkdf_sha256(secret: &SharedSecret, text: &str) -> Result<HashCode, HashingError> {
    let hk = Hkdf::<Sha256>::new(None, secret.as_bytes());
    let mut okm = [0u8; HashCode::LEN];
    hk.expand(text.as_bytes(), &mut okm)
        .map_err(|e| HashingError::Derivation(e.to_string()))?;
    Ok(HashCode::from_bytes(okm))
}
