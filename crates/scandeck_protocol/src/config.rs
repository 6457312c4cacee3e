//! Session configuration shared by the coordinator and the launcher.

use crate::defaults::{DEFAULT_FAILURE_RECOVERY_MS, DEFAULT_HISTORY_CAPACITY};
use crate::types::RecoveryPolicy;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("History capacity must be at least 1")]
    ZeroHistoryCapacity,
}

/// Canonical coordinator configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Maximum number of records kept in the scan history
    pub history_capacity: usize,
    /// How long status stays at ScanFailed before returning to Ready
    pub failure_recovery: Duration,
    /// How recovery timers react to later events
    pub recovery_policy: RecoveryPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            failure_recovery: Duration::from_millis(DEFAULT_FAILURE_RECOVERY_MS),
            recovery_policy: RecoveryPolicy::default(),
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_capacity == 0 {
            return Err(ConfigError::ZeroHistoryCapacity);
        }
        Ok(())
    }
}
