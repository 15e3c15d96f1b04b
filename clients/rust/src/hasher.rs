//! Action hash chain.
//!
//! Every confirmed action moves the chain tip to
//! `SHA-256(previous_tip || payload)`, starting from 32 zero bytes. Given the
//! ordered payloads, anyone can fold them again and compare the result with
//! the tip committed on L1.

use sha2::{Digest, Sha256};
use thiserror::Error;

pub const HASH_LEN: usize = 32;
pub const GENESIS_HASH: [u8; HASH_LEN] = [0u8; HASH_LEN];

#[derive(Error, Debug, PartialEq, Eq)]
pub enum HashError {
    #[error("Invalid hash length: expected 32, got {0}")]
    InvalidLength(usize),
}

pub struct ActionHasher;

impl ActionHasher {
    pub fn next(previous: &[u8; HASH_LEN], payload: &[u8]) -> [u8; HASH_LEN] {
        let mut hasher = Sha256::new();
        hasher.update(previous);
        hasher.update(payload);
        hasher.finalize().into()
    }

    /// Same as [`ActionHasher::next`] for a tip that arrives as an untyped slice.
    pub fn next_from_slice(previous: &[u8], payload: &[u8]) -> Result<[u8; HASH_LEN], HashError> {
        let previous: &[u8; HASH_LEN] = previous
            .try_into()
            .map_err(|_| HashError::InvalidLength(previous.len()))?;
        Ok(Self::next(previous, payload))
    }

    pub fn fold<I, P>(payloads: I) -> [u8; HASH_LEN]
    where
        I: IntoIterator<Item = P>,
        P: AsRef<[u8]>,
    {
        Self::fold_from(GENESIS_HASH, payloads)
    }

    pub fn fold_from<I, P>(start: [u8; HASH_LEN], payloads: I) -> [u8; HASH_LEN]
    where
        I: IntoIterator<Item = P>,
        P: AsRef<[u8]>,
    {
        payloads
            .into_iter()
            .fold(start, |tip, payload| Self::next(&tip, payload.as_ref()))
    }

    pub fn verify<I, P>(payloads: I, expected: &[u8; HASH_LEN]) -> bool
    where
        I: IntoIterator<Item = P>,
        P: AsRef<[u8]>,
    {
        &Self::fold(payloads) == expected
    }
}
