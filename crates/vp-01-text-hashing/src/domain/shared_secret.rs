//! # Shared Secret Derivation
//!
//! ECDH over P-384 between an agent private key and a recipient public key.
//! The resulting secret is the raw 48-byte x-coordinate; it lives only as
//! long as the hash derivation that needs it and is wiped on drop.

use p384::pkcs8::{DecodePrivateKey, DecodePublicKey};
use p384::{PublicKey, SecretKey};
use zeroize::Zeroizing;

use super::errors::{HashingError, KeyRole};

/// ECDH output used as HKDF input keying material.
///
/// Deliberately neither `Clone` nor `Debug`.
pub struct SharedSecret(Zeroizing<Vec<u8>>);

impl SharedSecret {
    /// Wrap raw secret bytes (known-answer tests, external derivation).
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(Zeroizing::new(bytes.to_vec()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Parse an agent private key: PKCS#8 first, SEC1 `ECPrivateKey` second.
pub fn parse_private_key(der: &[u8]) -> Result<SecretKey, HashingError> {
    SecretKey::from_pkcs8_der(der).or_else(|pkcs8_err| {
        SecretKey::from_sec1_der(der)
            .map_err(|_| HashingError::key_format(KeyRole::AgentPrivate, pkcs8_err))
    })
}

/// Parse a recipient SubjectPublicKeyInfo.
pub fn parse_public_key(der: &[u8]) -> Result<PublicKey, HashingError> {
    PublicKey::from_public_key_der(der)
        .map_err(|e| HashingError::key_format(KeyRole::RecipientPublic, e))
}

/// Derive the shared secret from DER encoded keys.
pub fn derive(agent_private_der: &[u8], recipient_public_der: &[u8]) -> Result<SharedSecret, HashingError> {
    let secret = parse_private_key(agent_private_der)?;
    let public = parse_public_key(recipient_public_der)?;
    Ok(derive_from_keys(&secret, &public))
}

/// Derive the shared secret from parsed keys.
pub fn derive_from_keys(secret: &SecretKey, public: &PublicKey) -> SharedSecret {
    let shared = p384::ecdh::diffie_hellman(secret.to_nonzero_scalar(), public.as_affine());
    SharedSecret::from_bytes(&shared.raw_secret_bytes()[..])
}
