//! Delegation lifecycle orchestration.
//!
//! ```text
//! Absent --initialize--> Local --delegate--> Delegated --record_action*--> Delegated
//!                          ^                                                  |
//!                          +------------------commit_and_undelegate-----------+
//! ```
//!
//! Every transition runs under the owner's lease in the [`RecordStore`]. A
//! venue call that times out is never taken as failed: the controller reads
//! the venues back first, and if it cannot, it leaves the lease to expire so
//! that the next caller repeats the reconciliation.

use std::sync::Arc;
use std::thread::sleep;
use std::time::Instant;

use solana_pubkey::Pubkey;
use tracing::{debug, error, info, warn};

use crate::attestation::{AttestationGate, AttestationReport, AttestationService};
use crate::audit::{AuditError, AuditLogCipher};
use crate::config::ControllerConfig;
use crate::errors::{DelegationError, Result};
use crate::events::LifecycleEvent;
use crate::hasher::ActionHasher;
use crate::ledger::{LedgerClient, LedgerError, Ownership};
use crate::sink::{AuditOutbox, FlushReport, LogSink, PendingEntry};
use crate::state::{AgentRecord, AgentState, DelegationStatus, Lease, TransitionKind};
use crate::store::{Acquired, RecordStore, StoreError};
use crate::utils::{checked_increment, find_agent_pda, now_ms};

/// Result of [`DelegationController::fetch_status`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusReport {
    pub owner: Pubkey,
    pub record_id: Pubkey,
    /// Where the venues say the authoritative copy lives.
    pub status: DelegationStatus,
    /// Set while a live lease is held for the owner.
    pub transitioning: Option<TransitionKind>,
    /// The controller's row, if it has one.
    pub cached: Option<AgentRecord>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AuditDelivery {
    Delivered,
    /// The sink refused the entry; it waits in the outbox.
    Queued,
}

/// A held lease and the row it guards.
struct Transition {
    lease_id: u64,
    record: AgentRecord,
}

/// How a venue call ended when it did not succeed.
enum VenueOutcome {
    /// The venues confirm nothing changed.
    NotApplied(String),
    /// The venues could not be read back.
    Unknown,
}

pub struct DelegationController {
    config: ControllerConfig,
    ledger: Arc<dyn LedgerClient>,
    store: Arc<dyn RecordStore>,
    gate: AttestationGate,
    sink: Arc<dyn LogSink>,
    outbox: AuditOutbox,
}

impl DelegationController {
    pub fn new(
        config: ControllerConfig,
        ledger: Arc<dyn LedgerClient>,
        store: Arc<dyn RecordStore>,
        attestation: Arc<dyn AttestationService>,
        sink: Arc<dyn LogSink>,
    ) -> Self {
        let gate = AttestationGate::new(attestation, config.approved_code_measurements.clone());
        let outbox = AuditOutbox::new(config.audit_outbox_capacity);
        Self {
            config,
            ledger,
            store,
            gate,
            sink,
            outbox,
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn record_address(&self, owner: &Pubkey) -> Pubkey {
        find_agent_pda(&self.config.program_id, owner).0
    }

    pub fn record(&self, owner: &Pubkey) -> Result<Option<AgentRecord>> {
        Ok(self.store.load(owner)?)
    }

    pub fn pending_audit_entries(&self) -> usize {
        self.outbox.len()
    }

    pub fn initialize(&self, caller: &Pubkey, owner: &Pubkey, tee_node: &Pubkey) -> Result<AgentRecord> {
        if caller != owner {
            return Err(DelegationError::Unauthorized {
                caller: *caller,
                owner: *owner,
            });
        }

        let record_id = self.record_address(owner);
        let placeholder = AgentRecord::placeholder(*owner, record_id, *tee_node);

        let tx = loop {
            let lease = Lease::new(TransitionKind::Initialize, *caller, self.config.lease.ttl_ms);
            let lease_id = lease.id;

            match self.store.insert(placeholder.clone(), lease.clone()) {
                Ok(()) => {
                    break Transition {
                        lease_id,
                        record: AgentRecord {
                            pending_transition: Some(lease),
                            ..placeholder.clone()
                        },
                    }
                }
                Err(StoreError::Exists(_)) => {
                    // Either a finished record or another caller's creation.
                    let settled = self
                        .store
                        .load(owner)?
                        .is_some_and(|existing| existing.status != DelegationStatus::Absent);
                    if settled {
                        return Err(DelegationError::AlreadyExists(*owner));
                    }
                    match self.acquire(caller, owner, TransitionKind::Initialize) {
                        Ok(tx) if tx.record.status != DelegationStatus::Absent => {
                            self.finish(tx)?;
                            return Err(DelegationError::AlreadyExists(*owner));
                        }
                        Ok(tx) => break tx,
                        // The other creation failed and dropped its placeholder.
                        Err(DelegationError::NotFound(_)) => {
                            debug!(owner = %owner, "Creation placeholder removed while waiting; inserting again");
                        }
                        Err(err) => return Err(err),
                    }
                }
                Err(err) => return Err(err.into()),
            }
        };

        self.create_on_ledger(tx, tee_node)
    }

    fn create_on_ledger(&self, mut tx: Transition, tee_node: &Pubkey) -> Result<AgentRecord> {
        let owner = tx.record.owner;
        let result = self
            .config
            .retry
            .run("create_record", || self.ledger.create_record(&owner, tee_node));

        match result {
            Ok(record_id) => {
                tx.record.record_id = record_id;
            }
            Err(LedgerError::AlreadyExists) => {
                warn!(owner = %owner, "Agent account already exists on the ledger; adopting it");
                if self.reconcile(&mut tx.record).is_err() {
                    return Err(self.abandon(&tx, "initialize"));
                }
                if tx.record.status == DelegationStatus::Absent {
                    self.discard(&tx);
                } else {
                    self.finish(tx)?;
                }
                return Err(DelegationError::AlreadyExists(owner));
            }
            Err(LedgerError::Unconfirmed(reason)) => {
                warn!(owner = %owner, %reason, "Agent creation unconfirmed; reconciling");
                if self.reconcile(&mut tx.record).is_err() {
                    return Err(self.abandon(&tx, "initialize"));
                }
                if tx.record.status == DelegationStatus::Absent {
                    self.discard(&tx);
                    return Err(DelegationError::VenueFailed {
                        operation: "initialize",
                        reason: format!("creation unconfirmed ({reason}) and the account does not exist"),
                    });
                }
            }
            Err(err) => {
                self.discard(&tx);
                return Err(DelegationError::VenueFailed {
                    operation: "initialize",
                    reason: err.to_string(),
                });
            }
        }

        if tx.record.status == DelegationStatus::Absent {
            tx.record.status = DelegationStatus::Local;
        }
        let record = self.finish(tx)?;
        self.emit(
            &record,
            LifecycleEvent::AgentInitialized {
                owner: record.owner,
                record_id: record.record_id,
                tee_node: record.tee_node,
            },
        );
        Ok(record)
    }

    pub fn delegate(&self, caller: &Pubkey, owner: &Pubkey) -> Result<AgentRecord> {
        let cached = self.load_existing(owner)?;
        if !cached.is_owner(caller) {
            return Err(DelegationError::Unauthorized {
                caller: *caller,
                owner: *owner,
            });
        }
        if cached.status == DelegationStatus::Delegated
            && cached.live_lease(now_ms()).is_none()
            && self.venue_confirms(&cached)
        {
            debug!(owner = %owner, "Agent already delegated");
            return Ok(cached);
        }

        let mut tx = self.acquire(caller, owner, TransitionKind::Delegate)?;
        if let Err(err) = self.sync_with_venue(&mut tx.record) {
            self.release(&tx);
            return Err(read_error("delegate", &tx.record.record_id, err));
        }
        match tx.record.status {
            DelegationStatus::Delegated => return self.finish(tx),
            DelegationStatus::Absent => {
                self.release(&tx);
                return Err(DelegationError::NotFound(*owner));
            }
            DelegationStatus::Local => {}
        }

        let record_id = tx.record.record_id;
        let validator = self.config.er_validator;
        info!(owner = %owner, record = %record_id, %validator, "Delegating agent to the ephemeral rollup");

        if let Err(outcome) = self.idempotent_call("delegate", &record_id, Ownership::OwnedByER, || {
            self.ledger.delegate(&record_id, &validator)
        }) {
            return Err(self.fail(&tx, "delegate", outcome));
        }

        tx.record.status = DelegationStatus::Delegated;
        let record = self.finish(tx)?;
        self.emit(
            &record,
            LifecycleEvent::AgentDelegated {
                owner: record.owner,
                record_id: record.record_id,
                validator,
            },
        );
        Ok(record)
    }

    /// Appends one action to the chain. Never resubmits on its own: an
    /// unconfirmed submission is settled by reading the rollup's copy.
    pub fn record_action(&self, caller: &Pubkey, owner: &Pubkey, payload: &[u8]) -> Result<AgentRecord> {
        let cached = self.load_existing(owner)?;
        if !cached.is_operator(caller) {
            return Err(DelegationError::Unauthorized {
                caller: *caller,
                owner: *owner,
            });
        }
        cached.require_status(DelegationStatus::Delegated)?;

        let mut tx = self.acquire(caller, owner, TransitionKind::RecordAction)?;
        if let Err(err) = tx.record.require_status(DelegationStatus::Delegated) {
            self.release(&tx);
            return Err(err);
        }
        if let Err(err) = self.gate.attest() {
            self.release(&tx);
            return Err(err);
        }
        if checked_increment(tx.record.action_count).is_none() {
            self.release(&tx);
            return Err(DelegationError::Overflow);
        }

        let record_id = tx.record.record_id;
        let new_hash = ActionHasher::next(&tx.record.last_action_hash, payload);

        match self.ledger.submit_action(&record_id, &new_hash) {
            Ok(()) => {}
            Err(LedgerError::Unconfirmed(reason)) => {
                warn!(owner = %owner, record = %record_id, %reason, "Action submission unconfirmed; reading the rollup back");
                match self.action_landed(&tx.record, &new_hash) {
                    Ok(true) => info!(owner = %owner, "Unconfirmed action found on the rollup"),
                    Ok(false) => {
                        // Not there yet, but it may still land. Whoever
                        // reclaims the lease reads the rollup again.
                        warn!(owner = %owner, record = %record_id, "Unconfirmed action not yet on the rollup");
                        return Err(self.fail(&tx, "record_action", VenueOutcome::Unknown));
                    }
                    Err(err) => {
                        error!(owner = %owner, error = %err, "Could not settle unconfirmed action");
                        return Err(self.fail(&tx, "record_action", VenueOutcome::Unknown));
                    }
                }
            }
            Err(err @ LedgerError::Rejected(_)) => {
                // The account may have been committed outside this controller.
                let cached_status = tx.record.status;
                if self.sync_with_venue(&mut tx.record).is_ok() && tx.record.status != cached_status {
                    self.finish(tx)?;
                    return Err(DelegationError::VenueFailed {
                        operation: "record_action",
                        reason: err.to_string(),
                    });
                }
                return Err(self.fail(&tx, "record_action", VenueOutcome::NotApplied(err.to_string())));
            }
            Err(err) => {
                return Err(self.fail(&tx, "record_action", VenueOutcome::NotApplied(err.to_string())))
            }
        }

        tx.record.advance_chain(new_hash)?;
        let record = self.finish(tx)?;

        let event = LifecycleEvent::ActionRecorded {
            owner: record.owner,
            record_id: record.record_id,
            action_count: record.action_count,
            action_hash: record.last_action_hash,
        };
        info!(event = event.name(), owner = %record.owner, action_count = record.action_count, "Action recorded");
        let text = format!(
            "Confidential Action Executed: {}\n{}",
            String::from_utf8_lossy(payload),
            event.audit_text()
        );
        self.push_audit_logged(&record, &text);
        Ok(record)
    }

    pub fn commit_and_undelegate(&self, caller: &Pubkey, owner: &Pubkey) -> Result<AgentRecord> {
        let cached = self.load_existing(owner)?;
        if !cached.is_operator(caller) {
            return Err(DelegationError::Unauthorized {
                caller: *caller,
                owner: *owner,
            });
        }
        if cached.status == DelegationStatus::Local
            && cached.live_lease(now_ms()).is_none()
            && self.venue_confirms(&cached)
        {
            debug!(owner = %owner, "Agent already on L1");
            return Ok(cached);
        }

        let mut tx = self.acquire(caller, owner, TransitionKind::CommitAndUndelegate)?;
        if let Err(err) = self.sync_with_venue(&mut tx.record) {
            self.release(&tx);
            return Err(read_error("commit_and_undelegate", &tx.record.record_id, err));
        }
        match tx.record.status {
            DelegationStatus::Local => return self.finish(tx),
            DelegationStatus::Absent => {
                self.release(&tx);
                return Err(DelegationError::NotFound(*owner));
            }
            DelegationStatus::Delegated => {}
        }

        let record_id = tx.record.record_id;
        info!(owner = %owner, record = %record_id, "Committing agent state and undelegating");

        if let Err(outcome) = self.idempotent_call(
            "commit_and_undelegate",
            &record_id,
            Ownership::OwnedByL1,
            || self.ledger.commit_and_release(&record_id),
        ) {
            return Err(self.fail(&tx, "commit_and_undelegate", outcome));
        }

        tx.record.status = DelegationStatus::Local;
        let record = self.finish(tx)?;
        self.emit(
            &record,
            LifecycleEvent::AgentCommitted {
                owner: record.owner,
                record_id: record.record_id,
                action_count: record.action_count,
                last_action_hash: record.last_action_hash,
            },
        );
        Ok(record)
    }

    /// Classifies the agent by which program owns its account. Does not wait
    /// for leases.
    pub fn fetch_status(&self, owner: &Pubkey) -> Result<StatusReport> {
        let cached = self.store.load(owner)?;
        let record_id = cached
            .as_ref()
            .map(|r| r.record_id)
            .unwrap_or_else(|| self.record_address(owner));

        let ownership = self
            .config
            .retry
            .run("read_ownership", || self.ledger.read_ownership(&record_id))
            .map_err(|err| read_error("read_ownership", &record_id, err))?;
        let status = DelegationStatus::from(ownership);
        let transitioning = cached
            .as_ref()
            .and_then(|r| r.live_lease(now_ms()))
            .map(|lease| lease.kind);

        if let Some(record) = &cached {
            if record.status != status && transitioning.is_none() {
                warn!(owner = %owner, cached = %record.status, venue = %status, "Cached status disagrees with venue ownership");
            }
        }

        Ok(StatusReport {
            owner: *owner,
            record_id,
            status,
            transitioning,
            cached,
        })
    }

    /// Runs the enclave attestation check on demand.
    pub fn check_attestation(&self) -> Result<AttestationReport> {
        let report = self.gate.attest()?;
        info!(measurement = %hex::encode(report.measurement), version = %report.version, "Enclave attestation verified");
        Ok(report)
    }

    /// Seals free-form agent reasoning for the owner and pushes it to the log
    /// store. Requires a fresh attestation.
    pub fn log_reasoning(&self, caller: &Pubkey, owner: &Pubkey, text: &str) -> Result<AuditDelivery> {
        let record = self.load_existing(owner)?;
        if !record.is_operator(caller) {
            return Err(DelegationError::Unauthorized {
                caller: *caller,
                owner: *owner,
            });
        }
        self.gate.attest()?;
        Ok(self.push_audit(&record, text)?)
    }

    pub fn flush_audit_backlog(&self) -> FlushReport {
        let report = self.outbox.flush(self.sink.as_ref());
        if report.delivered > 0 || report.remaining > 0 {
            info!(delivered = report.delivered, remaining = report.remaining, "Flushed audit backlog");
        }
        report
    }

    /// Checks an ordered payload history against the chain tip held by the
    /// authoritative venue.
    pub fn verify_action_history<P: AsRef<[u8]>>(&self, owner: &Pubkey, payloads: &[P]) -> Result<bool> {
        let record_id = self
            .store
            .load(owner)?
            .map(|r| r.record_id)
            .unwrap_or_else(|| self.record_address(owner));

        let state = self
            .config
            .retry
            .run("read_record", || self.ledger.read_record(&record_id))
            .map_err(|err| read_error("read_record", &record_id, err))?
            .ok_or(DelegationError::NotFound(*owner))?;

        Ok(state.action_count == payloads.len() as u64
            && ActionHasher::verify(payloads, &state.last_action_hash))
    }

    fn load_existing(&self, owner: &Pubkey) -> Result<AgentRecord> {
        match self.store.load(owner)? {
            Some(record) if record.status != DelegationStatus::Absent || record.pending_transition.is_some() => {
                Ok(record)
            }
            _ => Err(DelegationError::NotFound(*owner)),
        }
    }

    /// Takes the owner's lease, waiting at most `lease.wait_ms`.
    fn acquire(&self, caller: &Pubkey, owner: &Pubkey, kind: TransitionKind) -> Result<Transition> {
        let deadline = Instant::now() + self.config.lease.wait();
        loop {
            let lease = Lease::new(kind, *caller, self.config.lease.ttl_ms);
            let lease_id = lease.id;

            match self.store.try_acquire(owner, lease, now_ms()) {
                Ok(Acquired { record, reclaimed }) => {
                    let mut tx = Transition { lease_id, record };
                    if let Some(stale) = reclaimed {
                        warn!(owner = %owner, stale_kind = %stale.kind, stale_holder = %stale.holder, "Reclaiming expired lease; reconciling with venues");
                        if let Err(err) = self.reconcile(&mut tx.record) {
                            error!(owner = %owner, error = %err, "Reconciliation after lease expiry failed");
                            return Err(self.abandon(&tx, kind.as_str()));
                        }
                    }
                    return Ok(tx);
                }
                Err(StoreError::Held { kind: held, .. }) => {
                    let now = Instant::now();
                    if now >= deadline {
                        debug!(owner = %owner, requested = %kind, %held, "Lease busy");
                        return Err(DelegationError::Busy(*owner));
                    }
                    sleep(self.config.lease.poll_interval().min(deadline - now));
                }
                Err(StoreError::Missing(owner)) => return Err(DelegationError::NotFound(owner)),
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Writes the row and drops the lease.
    fn finish(&self, tx: Transition) -> Result<AgentRecord> {
        let mut record = tx.record;
        record.pending_transition = None;
        if let Err(err) = self.store.commit(tx.lease_id, record.clone()) {
            error!(owner = %record.owner, error = %err, "Lost the lease before committing the transition");
            return Err(err.into());
        }
        Ok(record)
    }

    fn release(&self, tx: &Transition) {
        if let Err(err) = self.store.release(&tx.record.owner, tx.lease_id) {
            warn!(owner = %tx.record.owner, error = %err, "Failed to release lease");
        }
    }

    /// Drops a creation placeholder whose account never appeared.
    fn discard(&self, tx: &Transition) {
        if let Err(err) = self.store.remove(&tx.record.owner, tx.lease_id) {
            warn!(owner = %tx.record.owner, error = %err, "Failed to remove creation placeholder");
        }
    }

    /// Leaves the lease in place to expire; whoever reclaims it reconciles.
    fn abandon(&self, tx: &Transition, operation: &'static str) -> DelegationError {
        error!(owner = %tx.record.owner, record = %tx.record.record_id, operation, "Venue outcome unknown; holding lease until expiry");
        DelegationError::VenueUnconfirmed {
            operation,
            record: tx.record.record_id,
        }
    }

    fn fail(&self, tx: &Transition, operation: &'static str, outcome: VenueOutcome) -> DelegationError {
        match outcome {
            VenueOutcome::NotApplied(reason) => {
                warn!(owner = %tx.record.owner, operation, %reason, "Venue call failed; state unchanged");
                self.release(tx);
                DelegationError::VenueFailed { operation, reason }
            }
            VenueOutcome::Unknown => self.abandon(tx, operation),
        }
    }

    /// Re-reads ownership and account state from the venues into `record`.
    fn reconcile(&self, record: &mut AgentRecord) -> std::result::Result<(), LedgerError> {
        let record_id = record.record_id;
        let ownership = self
            .config
            .retry
            .run("read_ownership", || self.ledger.read_ownership(&record_id))?;
        let state: Option<AgentState> = match ownership {
            Ownership::Absent => None,
            _ => self
                .config
                .retry
                .run("read_record", || self.ledger.read_record(&record_id))?,
        };
        record.adopt_venue_state(ownership, state.as_ref());
        info!(owner = %record.owner, status = %record.status, action_count = record.action_count, "Reconciled record with venues");
        Ok(())
    }

    /// Whether the ownership probe agrees with the cached status.
    fn venue_confirms(&self, record: &AgentRecord) -> bool {
        let record_id = record.record_id;
        matches!(
            self.config
                .retry
                .run("read_ownership", || self.ledger.read_ownership(&record_id)),
            Ok(ownership) if DelegationStatus::from(ownership) == record.status
        )
    }

    /// Reconciles `record` when the venues moved it outside this controller.
    fn sync_with_venue(&self, record: &mut AgentRecord) -> std::result::Result<(), LedgerError> {
        let record_id = record.record_id;
        let ownership = self
            .config
            .retry
            .run("read_ownership", || self.ledger.read_ownership(&record_id))?;
        let venue_status = DelegationStatus::from(ownership);
        if venue_status == record.status {
            return Ok(());
        }
        warn!(owner = %record.owner, cached = %record.status, venue = %venue_status, "Ownership changed outside this controller");
        self.reconcile(record)
    }

    /// Runs a call whose repetition is harmless until the account reaches
    /// `target`. Timeouts and rejections are checked against the ownership
    /// probe before anything is concluded.
    fn idempotent_call(
        &self,
        operation: &'static str,
        record_id: &Pubkey,
        target: Ownership,
        call: impl Fn() -> std::result::Result<(), LedgerError>,
    ) -> std::result::Result<(), VenueOutcome> {
        let mut attempt = 0;
        loop {
            let err = match self.config.retry.run(operation, &call) {
                Ok(()) => return Ok(()),
                Err(err) => err,
            };

            let ownership = match self
                .config
                .retry
                .run("read_ownership", || self.ledger.read_ownership(record_id))
            {
                Ok(ownership) => ownership,
                Err(read_err) => {
                    error!(operation, record = %record_id, error = %err, read_error = %read_err, "Could not read ownership after failed call");
                    return match err {
                        LedgerError::Unconfirmed(_) => Err(VenueOutcome::Unknown),
                        other => Err(VenueOutcome::NotApplied(other.to_string())),
                    };
                }
            };
            if ownership == target {
                info!(operation, record = %record_id, error = %err, "Venue already reflects the transition");
                return Ok(());
            }

            match err {
                LedgerError::Unconfirmed(reason) if attempt < self.config.retry.max_retries => {
                    attempt += 1;
                    warn!(operation, record = %record_id, %reason, attempt, "Call unconfirmed and not applied; resubmitting");
                    sleep(self.config.retry.delay_for_attempt(attempt));
                }
                other => return Err(VenueOutcome::NotApplied(other.to_string())),
            }
        }
    }

    /// `Ok(true)` if the rollup holds exactly `new_hash` one step past the
    /// record, `Ok(false)` if it still holds the record's tip.
    fn action_landed(&self, record: &AgentRecord, new_hash: &[u8; 32]) -> std::result::Result<bool, LedgerError> {
        let state = self
            .config
            .retry
            .run("read_record", || self.ledger.read_record(&record.record_id))?
            .ok_or(LedgerError::NotFound)?;

        let next_count = checked_increment(record.action_count);
        if &state.last_action_hash == new_hash && Some(state.action_count) == next_count {
            return Ok(true);
        }
        if state.last_action_hash == record.last_action_hash && state.action_count == record.action_count {
            return Ok(false);
        }
        Err(LedgerError::Rejected(format!(
            "rollup holds {} actions at tip {}, expected {} at tip {}",
            state.action_count,
            hex::encode(state.last_action_hash),
            record.action_count,
            hex::encode(record.last_action_hash)
        )))
    }

    fn emit(&self, record: &AgentRecord, event: LifecycleEvent) {
        info!(
            event = event.name(),
            owner = %event.owner(),
            record = %event.record_id(),
            status = %record.status,
            action_count = record.action_count,
            "Lifecycle transition completed"
        );
        self.push_audit_logged(record, &event.audit_text());
    }

    fn push_audit_logged(&self, record: &AgentRecord, text: &str) {
        if let Err(err) = self.push_audit(record, text) {
            warn!(owner = %record.owner, error = %err, "Audit entry not sealed; transition unaffected");
        }
    }

    fn push_audit(&self, record: &AgentRecord, text: &str) -> std::result::Result<AuditDelivery, AuditError> {
        let envelope = AuditLogCipher::encrypt(&record.owner, text.as_bytes())?;
        match self.sink.push(&record.record_id, &envelope) {
            Ok(()) => Ok(AuditDelivery::Delivered),
            Err(err) => {
                warn!(agent = %record.record_id, error = %err, "Audit log push failed; queued for retry");
                self.outbox.enqueue(PendingEntry {
                    agent_id: record.record_id,
                    envelope,
                    attempts: 1,
                });
                Ok(AuditDelivery::Queued)
            }
        }
    }
}

fn read_error(operation: &'static str, record: &Pubkey, err: LedgerError) -> DelegationError {
    match err {
        LedgerError::Unconfirmed(_) => DelegationError::VenueUnconfirmed {
            operation,
            record: *record,
        },
        other => DelegationError::VenueFailed {
            operation,
            reason: other.to_string(),
        },
    }
}
