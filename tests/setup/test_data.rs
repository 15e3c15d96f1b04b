use spectre_client::utils::SemanticVersion;
use spectre_client::{CodeMeasurement, ControllerConfig, LeaseConfig, RetryPolicy};

pub const APPROVED_MEASUREMENT: [u8; 32] = [1u8; 32];
pub const UNAPPROVED_MEASUREMENT: [u8; 32] = [9u8; 32];
pub const DEFAULT_APPROVED_CODE_MEASUREMENTS: [CodeMeasurement; 1] = [CodeMeasurement {
    measurement: APPROVED_MEASUREMENT,
    version: SemanticVersion {
        major: 0,
        minor: 1,
        patch: 0,
    },
}];

// Action payloads and their chain links from the genesis tip
pub const FIRST_ACTION: &[u8] = b"swap 10 USDC";
pub const SECOND_ACTION: &[u8] = b"swap 5 SOL";
pub const FIRST_ACTION_HASH: &str = "bb239c309e68703360bcecf80026f1d82c3b5a0e5cec5b4a657106ed87e04dc4";
pub const SECOND_ACTION_HASH: &str = "d8e75d9b84ef98032f2a174cfdce3cd466a21d3f4e3fee716df94b81c0737822";

pub const DEFAULT_LEASE_TTL_MS: u64 = 5_000;
pub const SHORT_LEASE_TTL_MS: u64 = 300;

pub fn test_config() -> ControllerConfig {
    ControllerConfig {
        lease: LeaseConfig {
            ttl_ms: DEFAULT_LEASE_TTL_MS,
            wait_ms: 0,
            poll_interval_ms: 5,
        },
        retry: RetryPolicy {
            max_retries: 2,
            base_delay_ms: 1,
            max_delay_ms: 5,
            exponential_base: 2.0,
        },
        approved_code_measurements: DEFAULT_APPROVED_CODE_MEASUREMENTS.to_vec(),
        ..ControllerConfig::default()
    }
}
