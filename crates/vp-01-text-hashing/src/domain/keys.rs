//! # Agent Key Pairs
//!
//! Generation and encoding of P-384 agent keys. Private keys are exported as
//! PKCS#8 DER, public keys as SubjectPublicKeyInfo DER.

use p384::pkcs8::{EncodePrivateKey, EncodePublicKey};
use p384::SecretKey;
use rand::rngs::OsRng;
use shared_types::AgentKeys;
use zeroize::Zeroizing;

use super::errors::{HashingError, KeyRole};
use super::shared_secret::parse_private_key;

/// A freshly generated or loaded agent key pair in DER form.
pub struct AgentKeyPair {
    private_der: Zeroizing<Vec<u8>>,
    public_der: Vec<u8>,
}

impl AgentKeyPair {
    /// Generate a new random key pair.
    pub fn generate() -> Result<Self, HashingError> {
        Self::from_secret(&SecretKey::random(&mut OsRng))
    }

    /// Re-derive the pair from a stored private key.
    pub fn from_private_der(der: &[u8]) -> Result<Self, HashingError> {
        Self::from_secret(&parse_private_key(der)?)
    }

    fn from_secret(secret: &SecretKey) -> Result<Self, HashingError> {
        let private = secret
            .to_pkcs8_der()
            .map_err(|e| HashingError::KeyGeneration(e.to_string()))?;
        let public = secret
            .public_key()
            .to_public_key_der()
            .map_err(|e| HashingError::KeyGeneration(e.to_string()))?;
        Ok(Self {
            private_der: Zeroizing::new(private.as_bytes().to_vec()),
            public_der: public.as_bytes().to_vec(),
        })
    }

    pub fn private_der(&self) -> &[u8] {
        &self.private_der
    }

    pub fn public_der(&self) -> &[u8] {
        &self.public_der
    }

    /// Store record for this pair, stamped with `ts` (Unix seconds).
    pub fn to_agent_keys(&self, ts: f64) -> AgentKeys {
        AgentKeys::from_der(&self.private_der, &self.public_der, ts)
    }
}

/// SubjectPublicKeyInfo DER of the public half of an agent private key.
pub fn public_key_der(agent_private_der: &[u8]) -> Result<Vec<u8>, HashingError> {
    let secret = parse_private_key(agent_private_der)?;
    secret
        .public_key()
        .to_public_key_der()
        .map(|doc| doc.as_bytes().to_vec())
        .map_err(|e| HashingError::key_format(KeyRole::AgentPrivate, e))
}
