use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread::sleep;
use std::time::Duration;

use ed25519_dalek::SigningKey;
use parking_lot::Mutex;
use rand::rngs::OsRng;
use solana_instruction::Instruction;
use solana_pubkey::Pubkey;
use spectre_client::program::{
    AccountSnapshot, AgentInstruction, Transport, TransportError, Venue, DELEGATION_PROGRAM_ID,
};
use spectre_client::{
    AttestationError, AttestationService, AuditEnvelope, AgentState, LogSink, QuoteVerdict,
    SinkError, GENESIS_HASH,
};

/// Generates an ed25519 keypair and the matching address.
pub fn new_keypair() -> (SigningKey, Pubkey) {
    let signing_key = SigningKey::generate(&mut OsRng);
    let pubkey = Pubkey::new_from_array(signing_key.verifying_key().to_bytes());
    (signing_key, pubkey)
}

/// What the cluster does with the next matching instruction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Fault {
    /// Applies the instruction but reports a confirmation timeout.
    DropConfirmation,
    /// Reports a confirmation timeout without applying anything.
    LostInFlight,
    /// Reports a confirmation timeout and holds the instruction until
    /// [`SimulatedCluster::land_deferred`].
    LandLate,
    /// Refuses the connection; nothing is applied.
    NetworkDown,
    /// Fails the transaction with the given log line.
    Reject(String),
}

#[derive(Default)]
struct ClusterState {
    base: HashMap<Pubkey, AccountSnapshot>,
    ephemeral: HashMap<Pubkey, AccountSnapshot>,
    faults: HashMap<&'static str, VecDeque<Fault>>,
    sent: HashMap<&'static str, usize>,
    deferred: Vec<(Venue, Instruction)>,
    reads_down: bool,
    slot: u64,
}

/// In-process stand-in for the base ledger and the ephemeral rollup running
/// the agent program.
pub struct SimulatedCluster {
    program_id: Pubkey,
    latency: Mutex<Duration>,
    state: Mutex<ClusterState>,
}

impl SimulatedCluster {
    pub fn new(program_id: Pubkey) -> Self {
        Self {
            program_id,
            latency: Mutex::new(Duration::ZERO),
            state: Mutex::new(ClusterState::default()),
        }
    }

    /// Delay applied to every send before it reaches the cluster.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = latency;
    }

    /// Queues `fault` for the next send of the named instruction.
    pub fn fail_next(&self, instruction: &'static str, fault: Fault) {
        self.state
            .lock()
            .faults
            .entry(instruction)
            .or_default()
            .push_back(fault);
    }

    pub fn set_reads_down(&self, down: bool) {
        self.state.lock().reads_down = down;
    }

    /// Applies every instruction held back by [`Fault::LandLate`].
    pub fn land_deferred(&self) {
        let mut state = self.state.lock();
        for (venue, instruction) in std::mem::take(&mut state.deferred) {
            if let Some(parsed) = AgentInstruction::unpack(&instruction.data) {
                let _ = self.execute(&mut state, venue, &instruction, &parsed);
            }
        }
    }

    /// Sends of the named instruction, faulted ones included.
    pub fn sent(&self, instruction: &str) -> usize {
        self.state.lock().sent.get(instruction).copied().unwrap_or(0)
    }

    pub fn account_owner(&self, venue: Venue, address: &Pubkey) -> Option<Pubkey> {
        let state = self.state.lock();
        accounts(&state, venue).get(address).map(|account| account.owner)
    }

    pub fn agent_state(&self, venue: Venue, address: &Pubkey) -> Option<AgentState> {
        let state = self.state.lock();
        accounts(&state, venue)
            .get(address)
            .and_then(|account| AgentState::try_from_account_data(&account.data).ok())
    }

    fn execute(
        &self,
        state: &mut ClusterState,
        venue: Venue,
        instruction: &Instruction,
        parsed: &AgentInstruction,
    ) -> Result<(), Vec<String>> {
        if instruction.program_id != self.program_id {
            return Err(vec![format!("Program {} is not deployed", instruction.program_id)]);
        }
        let key = |index: usize| {
            instruction
                .accounts
                .get(index)
                .map(|meta| meta.pubkey)
                .ok_or_else(|| vec!["Error: NotEnoughAccountKeys".to_string()])
        };

        match (venue, parsed) {
            (Venue::Base, AgentInstruction::InitializeAgent { tee_node }) => {
                let agent = key(0)?;
                let owner = key(1)?;
                if state.base.contains_key(&agent) {
                    return Err(vec![format!(
                        "Allocate: account Address {{ address: {agent}, base: None }} already in use"
                    )]);
                }
                let data = AgentState {
                    owner,
                    tee_node: *tee_node,
                    last_action_hash: GENESIS_HASH,
                    action_count: 0,
                }
                .to_account_data()
                .map_err(|e| vec![e.to_string()])?;
                state.base.insert(
                    agent,
                    AccountSnapshot {
                        owner: self.program_id,
                        data,
                    },
                );
                Ok(())
            }
            (Venue::Base, AgentInstruction::DelegateAgent { .. }) => {
                let agent = key(4)?;
                let account = state
                    .base
                    .get_mut(&agent)
                    .ok_or_else(|| vec!["Error: AccountNotInitialized".to_string()])?;
                if account.owner != self.program_id {
                    return Err(vec!["Error: AccountOwnedByWrongProgram".to_string()]);
                }
                account.owner = DELEGATION_PROGRAM_ID;
                let clone = AccountSnapshot {
                    owner: self.program_id,
                    data: account.data.clone(),
                };
                state.ephemeral.insert(agent, clone);
                Ok(())
            }
            (Venue::Ephemeral, AgentInstruction::RecordAction { action_hash }) => {
                let agent = key(0)?;
                let signer = key(1)?;
                let account = state
                    .ephemeral
                    .get_mut(&agent)
                    .ok_or_else(|| vec!["Error: AccountNotDelegated".to_string()])?;
                let mut agent_state = AgentState::try_from_account_data(&account.data)
                    .map_err(|e| vec![e.to_string()])?;
                if signer != agent_state.owner && signer != agent_state.tee_node {
                    return Err(vec!["Error: Unauthorized".to_string()]);
                }
                agent_state.last_action_hash = *action_hash;
                agent_state.action_count = agent_state
                    .action_count
                    .checked_add(1)
                    .ok_or_else(|| vec!["Error: Overflow".to_string()])?;
                account.data = agent_state.to_account_data().map_err(|e| vec![e.to_string()])?;
                Ok(())
            }
            (Venue::Ephemeral, AgentInstruction::CommitAndUndelegate) => {
                let agent = key(0)?;
                let account = state
                    .ephemeral
                    .remove(&agent)
                    .ok_or_else(|| vec!["Error: AccountNotDelegated".to_string()])?;
                state.base.insert(
                    agent,
                    AccountSnapshot {
                        owner: self.program_id,
                        data: account.data,
                    },
                );
                Ok(())
            }
            (venue, parsed) => Err(vec![format!(
                "Instruction {} cannot run on {venue}",
                parsed.name()
            )]),
        }
    }
}

fn accounts(state: &ClusterState, venue: Venue) -> &HashMap<Pubkey, AccountSnapshot> {
    match venue {
        Venue::Base => &state.base,
        Venue::Ephemeral => &state.ephemeral,
    }
}

impl Transport for SimulatedCluster {
    fn send(&self, venue: Venue, instructions: &[Instruction]) -> Result<String, TransportError> {
        let latency = *self.latency.lock();
        if !latency.is_zero() {
            sleep(latency);
        }

        let mut state = self.state.lock();
        for instruction in instructions {
            let parsed = AgentInstruction::unpack(&instruction.data).ok_or_else(|| TransportError::Failed {
                logs: vec!["Error: InstructionFallbackNotFound".to_string()],
            })?;
            let name = parsed.name();
            *state.sent.entry(name).or_default() += 1;

            let fault = state.faults.get_mut(name).and_then(VecDeque::pop_front);
            match fault {
                Some(Fault::NetworkDown) => {
                    return Err(TransportError::Network("connection refused".to_string()))
                }
                Some(Fault::Reject(log)) => return Err(TransportError::Failed { logs: vec![log] }),
                Some(Fault::LandLate) => {
                    state.deferred.push((venue, instruction.clone()));
                    return Err(TransportError::Timeout(format!("{name} not confirmed")));
                }
                Some(Fault::LostInFlight) => {
                    return Err(TransportError::Timeout(format!("{name} not confirmed")))
                }
                Some(Fault::DropConfirmation) => {
                    let _ = self.execute(&mut state, venue, instruction, &parsed);
                    return Err(TransportError::Timeout(format!("{name} not confirmed")));
                }
                None => self
                    .execute(&mut state, venue, instruction, &parsed)
                    .map_err(|logs| TransportError::Failed { logs })?,
            }
        }
        state.slot += 1;
        Ok(format!("sig-{}", state.slot))
    }

    fn get_account(
        &self,
        venue: Venue,
        address: &Pubkey,
    ) -> Result<Option<AccountSnapshot>, TransportError> {
        let state = self.state.lock();
        if state.reads_down {
            return Err(TransportError::Network("rpc unreachable".to_string()));
        }
        Ok(accounts(&state, venue).get(address).cloned())
    }
}

/// Attestation service returning a fixed measurement, switchable at runtime.
pub struct StaticAttestation {
    measurement: [u8; 32],
    valid: AtomicBool,
    available: AtomicBool,
    calls: AtomicUsize,
}

impl StaticAttestation {
    pub fn new(measurement: [u8; 32]) -> Self {
        Self {
            measurement,
            valid: AtomicBool::new(true),
            available: AtomicBool::new(true),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_valid(&self, valid: bool) {
        self.valid.store(valid, Ordering::SeqCst);
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AttestationService for StaticAttestation {
    fn check_quote(&self) -> Result<QuoteVerdict, AttestationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.available.load(Ordering::SeqCst) {
            return Err(AttestationError::Unavailable("quote endpoint down".to_string()));
        }
        if self.valid.load(Ordering::SeqCst) {
            Ok(QuoteVerdict::Valid {
                measurement: self.measurement,
            })
        } else {
            Ok(QuoteVerdict::Invalid {
                reason: "quote signature mismatch".to_string(),
            })
        }
    }
}

/// Log store that keeps pushed envelopes in memory.
#[derive(Default)]
pub struct MemorySink {
    entries: Mutex<Vec<(Pubkey, AuditEnvelope)>>,
    down: AtomicBool,
}

impl MemorySink {
    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    pub fn entries(&self) -> Vec<(Pubkey, AuditEnvelope)> {
        self.entries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl LogSink for MemorySink {
    fn push(&self, agent_id: &Pubkey, envelope: &AuditEnvelope) -> Result<(), SinkError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(SinkError::Unavailable("log store offline".to_string()));
        }
        self.entries.lock().push((*agent_id, envelope.clone()));
        Ok(())
    }
}
