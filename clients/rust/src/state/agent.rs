use borsh::{BorshDeserialize, BorshSerialize};
use solana_pubkey::Pubkey;

use crate::errors::DelegationError;
use crate::hasher::GENESIS_HASH;
use crate::ledger::Ownership;
use crate::state::Lease;
use crate::utils::checked_increment;

pub const AGENT_STATE_DISCRIMINATOR: [u8; 8] = [254, 187, 98, 119, 228, 48, 47, 49];

#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DelegationStatus {
    Absent,
    Local,
    Delegated,
}

impl std::fmt::Display for DelegationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Absent => "absent",
            Self::Local => "local",
            Self::Delegated => "delegated",
        };
        f.write_str(name)
    }
}

impl From<Ownership> for DelegationStatus {
    fn from(ownership: Ownership) -> Self {
        match ownership {
            Ownership::Absent => Self::Absent,
            Ownership::OwnedByL1 => Self::Local,
            Ownership::OwnedByER => Self::Delegated,
        }
    }
}

/// Controller-side row for one agent.
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct AgentRecord {
    pub owner: Pubkey,
    pub record_id: Pubkey,
    pub tee_node: Pubkey,
    pub last_action_hash: [u8; 32],
    pub action_count: u64,
    pub status: DelegationStatus,
    pub pending_transition: Option<Lease>,
}

impl AgentRecord {
    /// A row that exists only as a creation placeholder; `status` is `Absent`
    /// until the ledger confirms the account.
    pub fn placeholder(owner: Pubkey, record_id: Pubkey, tee_node: Pubkey) -> Self {
        Self {
            owner,
            record_id,
            tee_node,
            last_action_hash: GENESIS_HASH,
            action_count: 0,
            status: DelegationStatus::Absent,
            pending_transition: None,
        }
    }

    pub fn is_owner(&self, caller: &Pubkey) -> bool {
        &self.owner == caller
    }

    /// The owner or the agent's TEE node.
    pub fn is_operator(&self, caller: &Pubkey) -> bool {
        self.is_owner(caller) || &self.tee_node == caller
    }

    pub fn require_status(&self, expected: DelegationStatus) -> Result<(), DelegationError> {
        if self.status != expected {
            return Err(DelegationError::InvalidStatus {
                expected,
                actual: self.status,
            });
        }
        Ok(())
    }

    /// Moves the chain tip forward by one confirmed action.
    pub fn advance_chain(&mut self, new_hash: [u8; 32]) -> Result<(), DelegationError> {
        self.require_status(DelegationStatus::Delegated)?;
        self.action_count = checked_increment(self.action_count).ok_or(DelegationError::Overflow)?;
        self.last_action_hash = new_hash;
        Ok(())
    }

    pub fn live_lease(&self, now_ms: i64) -> Option<&Lease> {
        self.pending_transition
            .as_ref()
            .filter(|lease| !lease.is_expired(now_ms))
    }

    /// Overwrites the row with what the venues report.
    pub fn adopt_venue_state(&mut self, ownership: Ownership, state: Option<&AgentState>) {
        self.status = ownership.into();
        if let Some(state) = state {
            self.tee_node = state.tee_node;
            self.last_action_hash = state.last_action_hash;
            self.action_count = state.action_count;
        }
    }
}

/// Account layout of the on-chain agent program.
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct AgentState {
    pub owner: Pubkey,
    pub tee_node: Pubkey,
    pub last_action_hash: [u8; 32],
    pub action_count: u64,
}

impl AgentState {
    pub const SPACE: usize = 8 + 32 + 32 + 32 + 8;

    pub fn try_from_account_data(data: &[u8]) -> borsh::io::Result<Self> {
        if data.len() < 8 || data[..8] != AGENT_STATE_DISCRIMINATOR {
            return Err(borsh::io::Error::new(
                borsh::io::ErrorKind::InvalidData,
                "account discriminator mismatch",
            ));
        }
        Self::deserialize(&mut &data[8..])
    }

    pub fn to_account_data(&self) -> borsh::io::Result<Vec<u8>> {
        let mut data = Vec::with_capacity(Self::SPACE);
        data.extend_from_slice(&AGENT_STATE_DISCRIMINATOR);
        self.serialize(&mut data)?;
        Ok(data)
    }
}
