//! Owner-sealed audit log entries.
//!
//! Agent reasoning leaves the enclave only inside an [`AuditEnvelope`]. Each
//! envelope is a NaCl box (X25519 + XSalsa20-Poly1305) from a fresh ephemeral
//! key to the owner's ed25519 identity mapped onto Curve25519, so only the
//! owner's signing key can open it.

use base64::{engine::general_purpose::STANDARD, Engine};
use borsh::{BorshDeserialize, BorshSerialize};
use crypto_box::aead::generic_array::GenericArray;
use crypto_box::aead::{Aead, AeadCore};
use crypto_box::{PublicKey, SalsaBox, SecretKey};
use ed25519_dalek::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use solana_pubkey::Pubkey;
use thiserror::Error;

use crate::errors::DelegationError;

pub const ENVELOPE_VERSION: u8 = 1;
pub const NONCE_LEN: usize = 24;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("Owner key is not a valid ed25519 public key: {0}")]
    InvalidOwnerKey(String),
    #[error("Envelope encoding error: {0}")]
    Encoding(String),
    #[error("Unsupported envelope version: {0}")]
    UnsupportedVersion(u8),
    #[error("Envelope could not be sealed")]
    SealFailed,
    #[error("Envelope could not be opened with this key")]
    DecryptionFailed,
}

impl From<AuditError> for DelegationError {
    fn from(err: AuditError) -> Self {
        DelegationError::EncryptionFailure(err.to_string())
    }
}

#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct AuditEnvelope {
    pub version: u8,
    pub ephemeral_public_key: [u8; 32],
    pub nonce: [u8; NONCE_LEN],
    pub ciphertext: Vec<u8>,
}

impl AuditEnvelope {
    pub fn to_bytes(&self) -> Result<Vec<u8>, AuditError> {
        borsh::to_vec(self).map_err(|e| AuditError::Encoding(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AuditError> {
        borsh::from_slice(bytes).map_err(|e| AuditError::Encoding(e.to_string()))
    }

    /// Text form stored in the log table's `encrypted_log_data` column.
    pub fn to_base64(&self) -> Result<String, AuditError> {
        Ok(STANDARD.encode(self.to_bytes()?))
    }

    pub fn from_base64(text: &str) -> Result<Self, AuditError> {
        let bytes = STANDARD
            .decode(text)
            .map_err(|e| AuditError::Encoding(e.to_string()))?;
        Self::from_bytes(&bytes)
    }
}

pub struct AuditLogCipher;

impl AuditLogCipher {
    pub fn encrypt(owner: &Pubkey, plaintext: &[u8]) -> Result<AuditEnvelope, AuditError> {
        let recipient = owner_box_key(owner)?;
        let ephemeral = SecretKey::generate(&mut OsRng);
        let nonce = SalsaBox::generate_nonce(&mut OsRng);

        let ciphertext = SalsaBox::new(&recipient, &ephemeral)
            .encrypt(&nonce, plaintext)
            .map_err(|_| AuditError::SealFailed)?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        nonce_bytes.copy_from_slice(nonce.as_slice());

        Ok(AuditEnvelope {
            version: ENVELOPE_VERSION,
            ephemeral_public_key: *ephemeral.public_key().as_bytes(),
            nonce: nonce_bytes,
            ciphertext,
        })
    }

    /// Owner-side inverse of [`AuditLogCipher::encrypt`].
    pub fn decrypt(owner_key: &SigningKey, envelope: &AuditEnvelope) -> Result<Vec<u8>, AuditError> {
        if envelope.version != ENVELOPE_VERSION {
            return Err(AuditError::UnsupportedVersion(envelope.version));
        }

        let secret = SecretKey::from(owner_key.to_scalar_bytes());
        let sender = PublicKey::from(envelope.ephemeral_public_key);

        SalsaBox::new(&sender, &secret)
            .decrypt(
                GenericArray::from_slice(&envelope.nonce),
                envelope.ciphertext.as_slice(),
            )
            .map_err(|_| AuditError::DecryptionFailed)
    }
}

fn owner_box_key(owner: &Pubkey) -> Result<PublicKey, AuditError> {
    let verifying = VerifyingKey::from_bytes(&owner.to_bytes())
        .map_err(|e| AuditError::InvalidOwnerKey(e.to_string()))?;
    Ok(PublicKey::from(verifying.to_montgomery().to_bytes()))
}
