//! Enclave attestation gate.
//!
//! The quote check itself belongs to an external attestation service. The
//! gate only decides whether the service's verdict names a code measurement
//! this deployment approved, and it asks again on every call.

use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error};

use crate::errors::DelegationError;
use crate::utils::{serde_text, SemanticVersion};

pub const MAX_APPROVED_MEASUREMENTS: usize = 10;

#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct CodeMeasurement {
    #[serde(deserialize_with = "serde_text::hex32")]
    pub measurement: [u8; 32],
    pub version: SemanticVersion,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QuoteVerdict {
    Valid { measurement: [u8; 32] },
    Invalid { reason: String },
}

#[derive(Error, Debug)]
pub enum AttestationError {
    #[error("Attestation service unavailable: {0}")]
    Unavailable(String),
}

pub trait AttestationService: Send + Sync {
    fn check_quote(&self) -> Result<QuoteVerdict, AttestationError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AttestationReport {
    pub measurement: [u8; 32],
    pub version: SemanticVersion,
}

pub struct AttestationGate {
    service: Arc<dyn AttestationService>,
    approved_measurements: Vec<CodeMeasurement>,
}

impl AttestationGate {
    /// `approved_measurements` is ordered newest first; entries past
    /// [`MAX_APPROVED_MEASUREMENTS`] are dropped.
    pub fn new(
        service: Arc<dyn AttestationService>,
        mut approved_measurements: Vec<CodeMeasurement>,
    ) -> Self {
        approved_measurements.truncate(MAX_APPROVED_MEASUREMENTS);
        Self {
            service,
            approved_measurements,
        }
    }

    pub fn is_measurement_approved(&self, measurement: &[u8; 32]) -> bool {
        self.approved_version(measurement).is_some()
    }

    pub fn approved_version(&self, measurement: &[u8; 32]) -> Option<SemanticVersion> {
        self.approved_measurements
            .iter()
            .find(|m| &m.measurement == measurement)
            .map(|m| m.version)
    }

    pub fn latest_measurement(&self) -> Option<&CodeMeasurement> {
        self.approved_measurements.first()
    }

    pub fn verify(&self) -> bool {
        self.attest().is_ok()
    }

    /// Queries the service and checks the reported measurement.
    pub fn attest(&self) -> Result<AttestationReport, DelegationError> {
        let reason = match self.service.check_quote() {
            Ok(QuoteVerdict::Valid { measurement }) => match self.approved_version(&measurement) {
                Some(version) => {
                    debug!(measurement = %hex::encode(measurement), %version, "Enclave attestation verified");
                    return Ok(AttestationReport {
                        measurement,
                        version,
                    });
                }
                None => format!(
                    "code measurement {} is not approved",
                    hex::encode(measurement)
                ),
            },
            Ok(QuoteVerdict::Invalid { reason }) => format!("invalid hardware quote: {reason}"),
            Err(err) => err.to_string(),
        };

        error!(%reason, "Enclave attestation failed; blocking sensitive operations");
        Err(DelegationError::AttestationFailure(reason))
    }
}
