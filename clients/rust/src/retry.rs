//! Exponential backoff for idempotent venue calls.

use std::thread::sleep;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::ledger::LedgerError;

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub exponential_base: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_ms: 200,
            max_delay_ms: 5_000,
            exponential_base: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            base_delay_ms: 0,
            max_delay_ms: 0,
            exponential_base: 2.0,
        }
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let delay = self.base_delay_ms as f64 * self.exponential_base.powi(attempt as i32 - 1);
        Duration::from_millis(delay.min(self.max_delay_ms as f64) as u64)
    }

    /// Runs `call`, retrying only [`LedgerError::Transient`] failures.
    pub fn run<T>(
        &self,
        operation: &str,
        mut call: impl FnMut() -> Result<T, LedgerError>,
    ) -> Result<T, LedgerError> {
        let mut attempt = 0;
        loop {
            match call() {
                Err(err) if err.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = self.delay_for_attempt(attempt);
                    warn!(operation, attempt, delay_ms = delay.as_millis() as u64, error = %err, "Retrying venue call");
                    sleep(delay);
                }
                result => return result,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delays_grow_and_cap() {
        let policy = RetryPolicy {
            max_retries: 5,
            base_delay_ms: 100,
            max_delay_ms: 350,
            exponential_base: 2.0,
        };
        assert_eq!(policy.delay_for_attempt(0), Duration::ZERO);
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for_attempt(3), Duration::from_millis(350));
    }

    #[test]
    fn only_transient_errors_are_retried() {
        let policy = RetryPolicy {
            max_retries: 2,
            base_delay_ms: 1,
            max_delay_ms: 1,
            exponential_base: 1.0,
        };

        let mut calls = 0;
        let result: Result<(), _> = policy.run("test", || {
            calls += 1;
            Err(LedgerError::Transient("refused".to_string()))
        });
        assert!(result.is_err());
        assert_eq!(calls, 3);

        let mut calls = 0;
        let result: Result<(), _> = policy.run("test", || {
            calls += 1;
            Err(LedgerError::Unconfirmed("timeout".to_string()))
        });
        assert_eq!(result, Err(LedgerError::Unconfirmed("timeout".to_string())));
        assert_eq!(calls, 1);

        let mut calls = 0;
        let result = policy.run("test", || {
            calls += 1;
            if calls < 2 {
                Err(LedgerError::Transient("refused".to_string()))
            } else {
                Ok(calls)
            }
        });
        assert_eq!(result, Ok(2));
    }
}
