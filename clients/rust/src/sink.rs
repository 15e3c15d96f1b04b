use std::collections::VecDeque;

use parking_lot::Mutex;
use solana_pubkey::Pubkey;
use thiserror::Error;
use tracing::warn;

use crate::audit::AuditEnvelope;

pub const DEFAULT_OUTBOX_CAPACITY: usize = 1024;

#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Log store unavailable: {0}")]
    Unavailable(String),
    #[error("Log store rejected entry: {0}")]
    Rejected(String),
}

/// Off-chain store for sealed audit entries. It only ever sees ciphertext.
pub trait LogSink: Send + Sync {
    fn push(&self, agent_id: &Pubkey, envelope: &AuditEnvelope) -> Result<(), SinkError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingEntry {
    pub agent_id: Pubkey,
    pub envelope: AuditEnvelope,
    pub attempts: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub delivered: usize,
    pub remaining: usize,
}

/// Entries whose push failed, held for a later flush.
pub struct AuditOutbox {
    entries: Mutex<VecDeque<PendingEntry>>,
    capacity: usize,
}

impl AuditOutbox {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    pub fn enqueue(&self, entry: PendingEntry) {
        let mut entries = self.entries.lock();
        if entries.len() >= self.capacity {
            if let Some(dropped) = entries.pop_front() {
                warn!(agent = %dropped.agent_id, attempts = dropped.attempts, "Audit outbox full; dropping oldest entry");
            }
        }
        entries.push_back(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Pushes every queued entry once. Failures go back on the queue.
    pub fn flush(&self, sink: &dyn LogSink) -> FlushReport {
        let pending: Vec<PendingEntry> = self.entries.lock().drain(..).collect();
        let mut report = FlushReport::default();

        for mut entry in pending {
            match sink.push(&entry.agent_id, &entry.envelope) {
                Ok(()) => report.delivered += 1,
                Err(err) => {
                    entry.attempts = entry.attempts.saturating_add(1);
                    warn!(agent = %entry.agent_id, attempts = entry.attempts, error = %err, "Audit log retry failed");
                    self.enqueue(entry);
                }
            }
        }

        report.remaining = self.len();
        report
    }
}

impl Default for AuditOutbox {
    fn default() -> Self {
        Self::new(DEFAULT_OUTBOX_CAPACITY)
    }
}
