//! Per-owner agent rows and the transition lease that guards them.
//!
//! The lease is the lock: acquiring it is a compare-and-set on the row's
//! `pending_transition`, so any backend with an atomic conditional update
//! (a SQL row, a KV entry) can share one controller's view with another
//! process. [`InMemoryRecordStore`] covers callers within one process.

use std::collections::HashMap;

use parking_lot::Mutex;
use solana_pubkey::Pubkey;
use thiserror::Error;

use crate::state::{AgentRecord, Lease, TransitionKind};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Record already exists for owner {0}")]
    Exists(Pubkey),
    #[error("No record for owner {0}")]
    Missing(Pubkey),
    #[error("Lease held by a {kind} transition until {expires_at_ms}")]
    Held {
        kind: TransitionKind,
        expires_at_ms: i64,
    },
    #[error("Lease {0} is no longer held")]
    LeaseLost(u64),
    #[error("Record store backend error: {0}")]
    Backend(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Acquired {
    /// The row as it was when the lease was taken, lease included.
    pub record: AgentRecord,
    /// An expired lease that was taken over. Its transition may or may not
    /// have landed on a venue.
    pub reclaimed: Option<Lease>,
}

pub trait RecordStore: Send + Sync {
    fn load(&self, owner: &Pubkey) -> Result<Option<AgentRecord>, StoreError>;

    /// Inserts a new row already holding `lease`. Fails with
    /// [`StoreError::Exists`] if any row is present for the owner.
    fn insert(&self, record: AgentRecord, lease: Lease) -> Result<(), StoreError>;

    /// Takes the lease if it is free or expired.
    fn try_acquire(&self, owner: &Pubkey, lease: Lease, now_ms: i64) -> Result<Acquired, StoreError>;

    /// Writes `record` and clears the lease, provided `lease_id` still holds it.
    fn commit(&self, lease_id: u64, record: AgentRecord) -> Result<(), StoreError>;

    /// Clears the lease without touching the row.
    fn release(&self, owner: &Pubkey, lease_id: u64) -> Result<(), StoreError>;

    /// Deletes a row whose creation never reached the ledger.
    fn remove(&self, owner: &Pubkey, lease_id: u64) -> Result<(), StoreError>;
}

#[derive(Default)]
pub struct InMemoryRecordStore {
    rows: Mutex<HashMap<Pubkey, AgentRecord>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn holds(record: &AgentRecord, lease_id: u64) -> bool {
    record
        .pending_transition
        .as_ref()
        .is_some_and(|lease| lease.id == lease_id)
}

impl RecordStore for InMemoryRecordStore {
    fn load(&self, owner: &Pubkey) -> Result<Option<AgentRecord>, StoreError> {
        Ok(self.rows.lock().get(owner).cloned())
    }

    fn insert(&self, mut record: AgentRecord, lease: Lease) -> Result<(), StoreError> {
        let mut rows = self.rows.lock();
        if rows.contains_key(&record.owner) {
            return Err(StoreError::Exists(record.owner));
        }
        record.pending_transition = Some(lease);
        rows.insert(record.owner, record);
        Ok(())
    }

    fn try_acquire(&self, owner: &Pubkey, lease: Lease, now_ms: i64) -> Result<Acquired, StoreError> {
        let mut rows = self.rows.lock();
        let record = rows.get_mut(owner).ok_or(StoreError::Missing(*owner))?;

        if let Some(held) = record.live_lease(now_ms) {
            return Err(StoreError::Held {
                kind: held.kind,
                expires_at_ms: held.expires_at_ms,
            });
        }

        let reclaimed = record.pending_transition.replace(lease);
        Ok(Acquired {
            record: record.clone(),
            reclaimed,
        })
    }

    fn commit(&self, lease_id: u64, mut record: AgentRecord) -> Result<(), StoreError> {
        let mut rows = self.rows.lock();
        let current = rows
            .get_mut(&record.owner)
            .ok_or(StoreError::Missing(record.owner))?;
        if !holds(current, lease_id) {
            return Err(StoreError::LeaseLost(lease_id));
        }
        record.pending_transition = None;
        *current = record;
        Ok(())
    }

    fn release(&self, owner: &Pubkey, lease_id: u64) -> Result<(), StoreError> {
        let mut rows = self.rows.lock();
        let current = rows.get_mut(owner).ok_or(StoreError::Missing(*owner))?;
        if !holds(current, lease_id) {
            return Err(StoreError::LeaseLost(lease_id));
        }
        current.pending_transition = None;
        Ok(())
    }

    fn remove(&self, owner: &Pubkey, lease_id: u64) -> Result<(), StoreError> {
        let mut rows = self.rows.lock();
        match rows.get(owner) {
            Some(current) if holds(current, lease_id) => {
                rows.remove(owner);
                Ok(())
            }
            Some(_) => Err(StoreError::LeaseLost(lease_id)),
            None => Err(StoreError::Missing(*owner)),
        }
    }
}
