use solana_pubkey::Pubkey;
use thiserror::Error;

use crate::state::AgentState;

/// Which program currently owns the agent account.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ownership {
    Absent,
    OwnedByL1,
    OwnedByER,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Agent account already exists")]
    AlreadyExists,
    #[error("Agent account not found")]
    NotFound,
    /// The call never reached the venue, or was refused before execution.
    #[error("Transient venue error: {0}")]
    Transient(String),
    /// Submitted but no confirmation arrived in time. The outcome is unknown.
    #[error("Venue confirmation timed out: {0}")]
    Unconfirmed(String),
    #[error("Venue rejected the call: {0}")]
    Rejected(String),
}

impl LedgerError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// The two venues seen as one blocking capability. Implementations route each
/// call to L1 or the ephemeral rollup as appropriate.
pub trait LedgerClient: Send + Sync {
    /// Returns the new record's address.
    fn create_record(&self, owner: &Pubkey, tee_node: &Pubkey) -> Result<Pubkey, LedgerError>;

    fn delegate(&self, record: &Pubkey, target_validator: &Pubkey) -> Result<(), LedgerError>;

    /// Ephemeral rollup only.
    fn submit_action(&self, record: &Pubkey, action_hash: &[u8; 32]) -> Result<(), LedgerError>;

    fn commit_and_release(&self, record: &Pubkey) -> Result<(), LedgerError>;

    fn read_ownership(&self, record: &Pubkey) -> Result<Ownership, LedgerError>;

    /// Reads the account from whichever venue currently owns it.
    fn read_record(&self, record: &Pubkey) -> Result<Option<AgentState>, LedgerError>;
}
