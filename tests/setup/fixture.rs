use std::sync::Arc;

use ed25519_dalek::SigningKey;
use solana_pubkey::Pubkey;
use spectre_client::program::ProgramLedger;
use spectre_client::utils::find_agent_pda;
use spectre_client::{AgentRecord, ControllerConfig, DelegationController, InMemoryRecordStore};
use utils::{new_keypair, MemorySink, SimulatedCluster, StaticAttestation};

use crate::setup::test_data::*;

pub struct TestFixture {
    pub config: ControllerConfig,
    pub cluster: Arc<SimulatedCluster>,
    pub attestation: Arc<StaticAttestation>,
    pub sink: Arc<MemorySink>,
    pub store: Arc<InMemoryRecordStore>,
    pub controller: DelegationController,

    pub owner_key: SigningKey,
    pub owner: Pubkey,
    /// Also pays for and signs rollup transactions.
    pub tee_node: Pubkey,
    pub stranger: Pubkey,
}

impl TestFixture {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: ControllerConfig) -> Self {
        let cluster = Arc::new(SimulatedCluster::new(config.program_id));
        let attestation = Arc::new(StaticAttestation::new(APPROVED_MEASUREMENT));
        let sink = Arc::new(MemorySink::default());
        let store = Arc::new(InMemoryRecordStore::new());

        let (owner_key, owner) = new_keypair();
        let (_, tee_node) = new_keypair();
        let (_, stranger) = new_keypair();

        let controller = DelegationController::new(
            config.clone(),
            Arc::new(ProgramLedger::new(config.program_id, tee_node, cluster.clone())),
            store.clone(),
            attestation.clone(),
            sink.clone(),
        );

        Self {
            config,
            cluster,
            attestation,
            sink,
            store,
            controller,
            owner_key,
            owner,
            tee_node,
            stranger,
        }
    }

    /// Another controller process sharing this fixture's store and cluster.
    pub fn second_controller(&self, config: ControllerConfig) -> DelegationController {
        DelegationController::new(
            config.clone(),
            Arc::new(ProgramLedger::new(config.program_id, self.tee_node, self.cluster.clone())),
            self.store.clone(),
            self.attestation.clone(),
            self.sink.clone(),
        )
    }

    pub fn record_id(&self) -> Pubkey {
        find_agent_pda(&self.config.program_id, &self.owner).0
    }

    pub fn record(&self) -> AgentRecord {
        self.controller
            .record(&self.owner)
            .expect("Failed to load record")
            .expect("Record not found")
    }

    pub fn with_initialize(self) -> Self {
        let result = self.controller.initialize(&self.owner, &self.owner, &self.tee_node);
        assert!(result.is_ok(), "Failed to initialize agent: {:?}", result.err());
        self
    }

    pub fn with_delegate(self) -> Self {
        let result = self.controller.delegate(&self.owner, &self.owner);
        assert!(result.is_ok(), "Failed to delegate agent: {:?}", result.err());
        self
    }

    pub fn with_actions(self, payloads: &[&[u8]]) -> Self {
        for payload in payloads {
            let result = self.controller.record_action(&self.tee_node, &self.owner, payload);
            assert!(result.is_ok(), "Failed to record action: {:?}", result.err());
        }
        self
    }
}
