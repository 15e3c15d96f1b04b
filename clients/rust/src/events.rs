use solana_pubkey::Pubkey;

/// A completed lifecycle transition. Carries no action payloads, so events
/// can go to ordinary logs outside the enclave.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LifecycleEvent {
    AgentInitialized {
        owner: Pubkey,
        record_id: Pubkey,
        tee_node: Pubkey,
    },
    AgentDelegated {
        owner: Pubkey,
        record_id: Pubkey,
        validator: Pubkey,
    },
    ActionRecorded {
        owner: Pubkey,
        record_id: Pubkey,
        action_count: u64,
        action_hash: [u8; 32],
    },
    AgentCommitted {
        owner: Pubkey,
        record_id: Pubkey,
        action_count: u64,
        last_action_hash: [u8; 32],
    },
}

impl LifecycleEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::AgentInitialized { .. } => "agent_initialized",
            Self::AgentDelegated { .. } => "agent_delegated",
            Self::ActionRecorded { .. } => "action_recorded",
            Self::AgentCommitted { .. } => "agent_committed",
        }
    }

    pub fn owner(&self) -> &Pubkey {
        match self {
            Self::AgentInitialized { owner, .. }
            | Self::AgentDelegated { owner, .. }
            | Self::ActionRecorded { owner, .. }
            | Self::AgentCommitted { owner, .. } => owner,
        }
    }

    pub fn record_id(&self) -> &Pubkey {
        match self {
            Self::AgentInitialized { record_id, .. }
            | Self::AgentDelegated { record_id, .. }
            | Self::ActionRecorded { record_id, .. }
            | Self::AgentCommitted { record_id, .. } => record_id,
        }
    }

    /// Line written to the owner's sealed audit log.
    pub fn audit_text(&self) -> String {
        match self {
            Self::AgentInitialized { tee_node, .. } => {
                format!("Agent initialized on L1 with TEE node {tee_node}.")
            }
            Self::AgentDelegated { validator, .. } => {
                format!("Agent delegated to Private Ephemeral Rollup (validator {validator}).")
            }
            Self::ActionRecorded {
                action_count,
                action_hash,
                ..
            } => format!(
                "Action #{action_count} recorded on the rollup, chain tip {}.",
                hex::encode(action_hash)
            ),
            Self::AgentCommitted {
                action_count,
                last_action_hash,
                ..
            } => format!(
                "Agent undelegated. State committed to L1 after {action_count} actions, chain tip {}.",
                hex::encode(last_action_hash)
            ),
        }
    }
}
