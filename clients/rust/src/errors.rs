use solana_pubkey::Pubkey;
use thiserror::Error;

use crate::config::ConfigError;
use crate::state::DelegationStatus;
use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum DelegationError {
    #[error("Agent record already exists for owner {0}")]
    AlreadyExists(Pubkey),
    #[error("No agent record for owner {0}")]
    NotFound(Pubkey),
    #[error("Unauthorized: {caller} cannot act on the agent owned by {owner}")]
    Unauthorized { caller: Pubkey, owner: Pubkey },
    #[error("Agent {0} has a transition in flight")]
    Busy(Pubkey),
    #[error("Invalid delegation status: expected {expected}, found {actual}")]
    InvalidStatus {
        expected: DelegationStatus,
        actual: DelegationStatus,
    },
    #[error("WARNING: enclave attestation failed, sensitive operations were blocked: {0}")]
    AttestationFailure(String),
    #[error("Venue did not confirm {operation} for record {record}; reconcile before retrying")]
    VenueUnconfirmed {
        operation: &'static str,
        record: Pubkey,
    },
    #[error("Venue failed {operation}: {reason}")]
    VenueFailed {
        operation: &'static str,
        reason: String,
    },
    #[error("Audit log encryption failed: {0}")]
    EncryptionFailure(String),
    #[error("Overflow")]
    Overflow,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl DelegationError {
    /// Conditions a caller may treat as success or simply retry.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::AlreadyExists(_) | Self::Busy(_))
    }
}

pub type Result<T> = std::result::Result<T, DelegationError>;
