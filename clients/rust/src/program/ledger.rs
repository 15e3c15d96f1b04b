use std::sync::Arc;

use solana_instruction::Instruction;
use solana_pubkey::Pubkey;
use tracing::debug;

use crate::ledger::{LedgerClient, LedgerError, Ownership};
use crate::program::{
    AccountSnapshot, AgentInstructions, Transport, TransportError, Venue, DELEGATION_PROGRAM_ID,
};
use crate::state::AgentState;

/// [`LedgerClient`] backed by the deployed agent program.
///
/// Creation and delegation go to L1; actions and the commit go to the
/// rollup. Ownership is read from L1: a delegated account stays visible there
/// but its owning program becomes the delegation program.
pub struct ProgramLedger {
    instructions: AgentInstructions,
    payer: Pubkey,
    transport: Arc<dyn Transport>,
}

impl ProgramLedger {
    /// `payer` signs delegation, action and commit transactions.
    pub fn new(program_id: Pubkey, payer: Pubkey, transport: Arc<dyn Transport>) -> Self {
        Self {
            instructions: AgentInstructions::new(program_id),
            payer,
            transport,
        }
    }

    pub fn program_id(&self) -> &Pubkey {
        &self.instructions.program_id
    }

    pub fn agent_address(&self, owner: &Pubkey) -> Pubkey {
        self.instructions.agent_address(owner)
    }

    fn send(&self, venue: Venue, instruction: Instruction) -> Result<(), LedgerError> {
        let signature = self
            .transport
            .send(venue, &[instruction])
            .map_err(into_ledger_error)?;
        debug!(%venue, %signature, "Transaction confirmed");
        Ok(())
    }

    fn account(&self, venue: Venue, address: &Pubkey) -> Result<Option<AccountSnapshot>, LedgerError> {
        self.transport
            .get_account(venue, address)
            .map_err(into_ledger_error)
    }

    fn classify(&self, account: Option<&AccountSnapshot>) -> Ownership {
        match account {
            None => Ownership::Absent,
            Some(account) if account.owner == DELEGATION_PROGRAM_ID => Ownership::OwnedByER,
            Some(account) if &account.owner == self.program_id() => Ownership::OwnedByL1,
            Some(_) => Ownership::Absent,
        }
    }
}

impl LedgerClient for ProgramLedger {
    fn create_record(&self, owner: &Pubkey, tee_node: &Pubkey) -> Result<Pubkey, LedgerError> {
        self.send(Venue::Base, self.instructions.initialize_agent(owner, tee_node))?;
        Ok(self.agent_address(owner))
    }

    fn delegate(&self, record: &Pubkey, target_validator: &Pubkey) -> Result<(), LedgerError> {
        let account = self.account(Venue::Base, record)?.ok_or(LedgerError::NotFound)?;
        let state = decode(&account)?;
        self.send(
            Venue::Base,
            self.instructions
                .delegate_agent(&self.payer, &state.owner, target_validator),
        )
    }

    fn submit_action(&self, record: &Pubkey, action_hash: &[u8; 32]) -> Result<(), LedgerError> {
        self.send(
            Venue::Ephemeral,
            self.instructions
                .record_action(record, &self.payer, *action_hash),
        )
    }

    fn commit_and_release(&self, record: &Pubkey) -> Result<(), LedgerError> {
        self.send(
            Venue::Ephemeral,
            self.instructions.commit_and_undelegate(record, &self.payer),
        )
    }

    fn read_ownership(&self, record: &Pubkey) -> Result<Ownership, LedgerError> {
        let account = self.account(Venue::Base, record)?;
        Ok(self.classify(account.as_ref()))
    }

    fn read_record(&self, record: &Pubkey) -> Result<Option<AgentState>, LedgerError> {
        let venue = match self.read_ownership(record)? {
            Ownership::Absent => return Ok(None),
            Ownership::OwnedByL1 => Venue::Base,
            Ownership::OwnedByER => Venue::Ephemeral,
        };
        match self.account(venue, record)? {
            Some(account) => decode(&account).map(Some),
            None => Ok(None),
        }
    }
}

fn decode(account: &AccountSnapshot) -> Result<AgentState, LedgerError> {
    AgentState::try_from_account_data(&account.data)
        .map_err(|e| LedgerError::Rejected(format!("undecodable agent account: {e}")))
}

fn into_ledger_error(err: TransportError) -> LedgerError {
    match err {
        TransportError::Network(reason) => LedgerError::Transient(reason),
        TransportError::Timeout(reason) => LedgerError::Unconfirmed(reason),
        TransportError::Failed { logs } if logs.iter().any(|l| l.contains("already in use")) => {
            LedgerError::AlreadyExists
        }
        TransportError::Failed { logs } => LedgerError::Rejected(logs.join("; ")),
    }
}
