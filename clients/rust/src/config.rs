use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use solana_pubkey::Pubkey;
use thiserror::Error;

use crate::attestation::{CodeMeasurement, MAX_APPROVED_MEASUREMENTS};
use crate::program::{DEFAULT_ER_VALIDATOR, PROGRAM_ID};
use crate::retry::RetryPolicy;
use crate::sink::DEFAULT_OUTBOX_CAPACITY;
use crate::utils::serde_text;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Need at least one code measurement")]
    NeedAtLeastOneCodeMeasurement,
    #[error("At most 10 code measurements are allowed")]
    TooManyCodeMeasurements,
    #[error("Invalid lease settings: {0}")]
    InvalidLease(&'static str),
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LeaseConfig {
    /// How long a transition may hold the lease before others may reclaim it.
    pub ttl_ms: u64,
    /// How long a caller waits for a busy lease. Zero fails fast with `Busy`.
    pub wait_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for LeaseConfig {
    fn default() -> Self {
        Self {
            ttl_ms: 30_000,
            wait_ms: 0,
            poll_interval_ms: 50,
        }
    }
}

impl LeaseConfig {
    pub fn wait(&self) -> Duration {
        Duration::from_millis(self.wait_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ControllerConfig {
    #[serde(deserialize_with = "serde_text::pubkey")]
    pub program_id: Pubkey,
    #[serde(deserialize_with = "serde_text::pubkey")]
    pub er_validator: Pubkey,
    pub lease: LeaseConfig,
    pub retry: RetryPolicy,
    /// Newest first.
    pub approved_code_measurements: Vec<CodeMeasurement>,
    pub audit_outbox_capacity: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            program_id: PROGRAM_ID,
            er_validator: DEFAULT_ER_VALIDATOR,
            lease: LeaseConfig::default(),
            retry: RetryPolicy::default(),
            approved_code_measurements: Vec::new(),
            audit_outbox_capacity: DEFAULT_OUTBOX_CAPACITY,
        }
    }
}

impl ControllerConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.approved_code_measurements.is_empty() {
            return Err(ConfigError::NeedAtLeastOneCodeMeasurement);
        }
        if self.approved_code_measurements.len() > MAX_APPROVED_MEASUREMENTS {
            return Err(ConfigError::TooManyCodeMeasurements);
        }
        if self.lease.ttl_ms == 0 {
            return Err(ConfigError::InvalidLease("ttl_ms must be positive"));
        }
        if self.lease.wait_ms > 0 && self.lease.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidLease(
                "poll_interval_ms must be positive when wait_ms is set",
            ));
        }
        Ok(())
    }
}
