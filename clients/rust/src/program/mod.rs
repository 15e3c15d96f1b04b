//! Client side of the on-chain agent program and its delegation hooks.

pub mod instructions;
pub mod ledger;

pub use instructions::*;
pub use ledger::*;

use solana_instruction::Instruction;
use solana_pubkey::Pubkey;
use thiserror::Error;

pub const PROGRAM_ID: Pubkey = Pubkey::from_str_const("3xAmgLtbu1SZdDrp85vXiW1JMF9iMcys1DsQMhWQg3gb");
pub const DELEGATION_PROGRAM_ID: Pubkey =
    Pubkey::from_str_const("DELeGGvXpWV2fqJUhqcF5ZSYMS4JTLjteaAMARRSaeSh");
pub const MAGIC_PROGRAM_ID: Pubkey = Pubkey::from_str_const("Magic11111111111111111111111111111111111111");
pub const MAGIC_CONTEXT_ID: Pubkey = Pubkey::from_str_const("MagicContext1111111111111111111111111111111");
pub const SYSTEM_PROGRAM_ID: Pubkey = Pubkey::from_str_const("11111111111111111111111111111111");
pub const DEFAULT_ER_VALIDATOR: Pubkey =
    Pubkey::from_str_const("MAS1Dt9qreoRMQ14YQuhg8UTZMMzDdKhmkZMECCzk57");

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Venue {
    /// The permanent ledger.
    Base,
    /// The ephemeral rollup validator.
    Ephemeral,
}

impl std::fmt::Display for Venue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Base => f.write_str("l1"),
            Self::Ephemeral => f.write_str("er"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountSnapshot {
    pub owner: Pubkey,
    pub data: Vec<u8>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(String),
    #[error("Timed out waiting for confirmation: {0}")]
    Timeout(String),
    #[error("Transaction failed: {}", logs.join("; "))]
    Failed { logs: Vec<String> },
}

/// RPC access to both venues. Implementations hold the signing keys, sign and
/// send transactions, and wait for confirmation before returning.
pub trait Transport: Send + Sync {
    /// Returns the transaction signature.
    fn send(&self, venue: Venue, instructions: &[Instruction]) -> Result<String, TransportError>;

    fn get_account(
        &self,
        venue: Venue,
        address: &Pubkey,
    ) -> Result<Option<AccountSnapshot>, TransportError>;
}
