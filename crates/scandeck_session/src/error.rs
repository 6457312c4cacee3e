//! Error types for the session coordinator.

use scandeck_protocol::{ConfigError, GatewayError};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Session operation result type.
pub type Result<T> = std::result::Result<T, SessionError>;

/// Which gateway call of the start sequence was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InitStage {
    Initialize,
    Enable,
}

impl fmt::Display for InitStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitStage::Initialize => write!(f, "initialize"),
            InitStage::Enable => write!(f, "enable"),
        }
    }
}

/// Session errors, classified by how they reach the user.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    /// Initialize or enable rejected. Status stays Error until the user retries.
    #[error("Scanner {stage} failed: {source}")]
    Initialization {
        stage: InitStage,
        #[source]
        source: GatewayError,
    },

    /// Trigger pull failed. Status recovers on its own.
    #[error("Scan failed: {detail}")]
    TransientScan { detail: String },

    /// Disable rejected during teardown. Logged only.
    #[error("Scanner disable failed: {0}")]
    Teardown(#[source] GatewayError),

    /// Invalid coordinator configuration
    #[error("Invalid session config: {0}")]
    Config(#[from] ConfigError),

    /// The coordinator has been torn down
    #[error("Scan session stopped")]
    Stopped,
}

impl SessionError {
    /// Only initialization failures warrant an actionable alert.
    pub fn is_user_actionable(&self) -> bool {
        matches!(self, SessionError::Initialization { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scandeck_protocol::GatewayErrorCode;

    #[test]
    fn test_only_initialization_is_actionable() {
        let init = SessionError::Initialization {
            stage: InitStage::Enable,
            source: GatewayError::not_initialized(),
        };
        assert!(init.is_user_actionable());
        assert!(!SessionError::TransientScan { detail: "Scan failed".into() }.is_user_actionable());
        assert!(!SessionError::Teardown(GatewayError::not_initialized()).is_user_actionable());
        assert!(!SessionError::Stopped.is_user_actionable());
    }

    #[test]
    fn test_initialization_message_names_stage() {
        let err = SessionError::Initialization {
            stage: InitStage::Initialize,
            source: GatewayError::new(GatewayErrorCode::ScannerUnavailable, "claimed by another app"),
        };
        assert_eq!(
            err.to_string(),
            "Scanner initialize failed: SCANNER_UNAVAILABLE: claimed by another app"
        );
    }
}
