use borsh::{BorshDeserialize, BorshSerialize};
use solana_pubkey::Pubkey;

use crate::utils::now_ms;

#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionKind {
    Initialize,
    Delegate,
    RecordAction,
    CommitAndUndelegate,
}

impl TransitionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Initialize => "initialize",
            Self::Delegate => "delegate",
            Self::RecordAction => "record_action",
            Self::CommitAndUndelegate => "commit_and_undelegate",
        }
    }
}

impl std::fmt::Display for TransitionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The in-flight transition marker. A lease past `expires_at_ms` no longer
/// excludes other callers, but whoever takes it over must reconcile the
/// record against the venues first.
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct Lease {
    pub id: u64,
    pub kind: TransitionKind,
    pub holder: Pubkey,
    pub acquired_at_ms: i64,
    pub expires_at_ms: i64,
}

impl Lease {
    pub fn new(kind: TransitionKind, holder: Pubkey, ttl_ms: u64) -> Self {
        let acquired_at_ms = now_ms();
        Self {
            id: rand::random(),
            kind,
            holder,
            acquired_at_ms,
            expires_at_ms: acquired_at_ms.saturating_add(i64::try_from(ttl_ms).unwrap_or(i64::MAX)),
        }
    }

    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at_ms
    }
}
