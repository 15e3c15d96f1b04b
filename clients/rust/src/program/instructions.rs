use borsh::BorshDeserialize;
use solana_instruction::{AccountMeta, Instruction};
use solana_pubkey::Pubkey;

use crate::program::{
    DELEGATION_PROGRAM_ID, MAGIC_CONTEXT_ID, MAGIC_PROGRAM_ID, SYSTEM_PROGRAM_ID,
};
use crate::utils::find_agent_pda;

pub const INITIALIZE_AGENT_DISCRIMINATOR: [u8; 8] = [212, 81, 156, 211, 212, 110, 21, 28];
pub const DELEGATE_AGENT_DISCRIMINATOR: [u8; 8] = [32, 179, 196, 108, 101, 41, 23, 100];
pub const RECORD_ACTION_DISCRIMINATOR: [u8; 8] = [153, 153, 235, 171, 52, 54, 196, 145];
pub const COMMIT_AND_UNDELEGATE_DISCRIMINATOR: [u8; 8] = [9, 108, 132, 87, 184, 76, 98, 84];

pub const BUFFER_SEED: &[u8] = b"buffer";
pub const DELEGATION_SEED: &[u8] = b"delegation";
pub const DELEGATION_METADATA_SEED: &[u8] = b"delegation-metadata";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AgentInstruction {
    InitializeAgent { tee_node: Pubkey },
    DelegateAgent { owner: Pubkey },
    RecordAction { action_hash: [u8; 32] },
    CommitAndUndelegate,
}

impl AgentInstruction {
    pub fn name(&self) -> &'static str {
        match self {
            Self::InitializeAgent { .. } => "initialize_agent",
            Self::DelegateAgent { .. } => "delegate_agent",
            Self::RecordAction { .. } => "record_action",
            Self::CommitAndUndelegate => "commit_and_undelegate",
        }
    }

    pub fn pack(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(8 + 32);
        match self {
            Self::InitializeAgent { tee_node } => {
                data.extend_from_slice(&INITIALIZE_AGENT_DISCRIMINATOR);
                data.extend_from_slice(tee_node.as_ref());
            }
            Self::DelegateAgent { owner } => {
                data.extend_from_slice(&DELEGATE_AGENT_DISCRIMINATOR);
                data.extend_from_slice(owner.as_ref());
            }
            Self::RecordAction { action_hash } => {
                data.extend_from_slice(&RECORD_ACTION_DISCRIMINATOR);
                data.extend_from_slice(action_hash);
            }
            Self::CommitAndUndelegate => {
                data.extend_from_slice(&COMMIT_AND_UNDELEGATE_DISCRIMINATOR);
            }
        }
        data
    }

    pub fn unpack(data: &[u8]) -> Option<Self> {
        if data.len() < 8 {
            return None;
        }
        let (discriminator, mut args) = data.split_at(8);
        let instruction = match discriminator {
            d if d == INITIALIZE_AGENT_DISCRIMINATOR => Self::InitializeAgent {
                tee_node: Pubkey::deserialize(&mut args).ok()?,
            },
            d if d == DELEGATE_AGENT_DISCRIMINATOR => Self::DelegateAgent {
                owner: Pubkey::deserialize(&mut args).ok()?,
            },
            d if d == RECORD_ACTION_DISCRIMINATOR => Self::RecordAction {
                action_hash: <[u8; 32]>::deserialize(&mut args).ok()?,
            },
            d if d == COMMIT_AND_UNDELEGATE_DISCRIMINATOR => Self::CommitAndUndelegate,
            _ => return None,
        };
        Some(instruction)
    }
}

/// Builds instructions for one deployment of the agent program.
#[derive(Clone, Copy, Debug)]
pub struct AgentInstructions {
    pub program_id: Pubkey,
}

impl AgentInstructions {
    pub fn new(program_id: Pubkey) -> Self {
        Self { program_id }
    }

    pub fn agent_address(&self, owner: &Pubkey) -> Pubkey {
        find_agent_pda(&self.program_id, owner).0
    }

    pub fn initialize_agent(&self, owner: &Pubkey, tee_node: &Pubkey) -> Instruction {
        Instruction {
            program_id: self.program_id,
            accounts: vec![
                AccountMeta::new(self.agent_address(owner), false),
                AccountMeta::new(*owner, true),
                AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false),
            ],
            data: AgentInstruction::InitializeAgent {
                tee_node: *tee_node,
            }
            .pack(),
        }
    }

    /// `validator` is passed as the remaining account that names the rollup
    /// validator taking over the account.
    pub fn delegate_agent(&self, payer: &Pubkey, owner: &Pubkey, validator: &Pubkey) -> Instruction {
        let agent = self.agent_address(owner);
        let buffer = Pubkey::find_program_address(&[BUFFER_SEED, agent.as_ref()], &self.program_id).0;
        let delegation_record = Pubkey::find_program_address(
            &[DELEGATION_SEED, agent.as_ref()],
            &DELEGATION_PROGRAM_ID,
        )
        .0;
        let delegation_metadata = Pubkey::find_program_address(
            &[DELEGATION_METADATA_SEED, agent.as_ref()],
            &DELEGATION_PROGRAM_ID,
        )
        .0;

        Instruction {
            program_id: self.program_id,
            accounts: vec![
                AccountMeta::new_readonly(*payer, true),
                AccountMeta::new(buffer, false),
                AccountMeta::new(delegation_record, false),
                AccountMeta::new(delegation_metadata, false),
                AccountMeta::new(agent, false),
                AccountMeta::new_readonly(self.program_id, false),
                AccountMeta::new_readonly(DELEGATION_PROGRAM_ID, false),
                AccountMeta::new_readonly(SYSTEM_PROGRAM_ID, false),
                AccountMeta::new_readonly(*validator, false),
            ],
            data: AgentInstruction::DelegateAgent { owner: *owner }.pack(),
        }
    }

    pub fn record_action(&self, agent: &Pubkey, signer: &Pubkey, action_hash: [u8; 32]) -> Instruction {
        Instruction {
            program_id: self.program_id,
            accounts: vec![
                AccountMeta::new(*agent, false),
                AccountMeta::new_readonly(*signer, true),
            ],
            data: AgentInstruction::RecordAction { action_hash }.pack(),
        }
    }

    pub fn commit_and_undelegate(&self, agent: &Pubkey, payer: &Pubkey) -> Instruction {
        Instruction {
            program_id: self.program_id,
            accounts: vec![
                AccountMeta::new(*agent, false),
                AccountMeta::new(*payer, true),
                AccountMeta::new_readonly(MAGIC_PROGRAM_ID, false),
                AccountMeta::new(MAGIC_CONTEXT_ID, false),
            ],
            data: AgentInstruction::CommitAndUndelegate.pack(),
        }
    }
}
