//! Error types for the scan engine boundary.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Protocol result type.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors raised while decoding raw bridge events.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Event name is neither the success nor the failure channel.
    #[error("Unknown engine event: {0}")]
    UnknownEvent(String),

    /// Success payload did not carry the expected fields.
    #[error("Malformed payload for {event}: {source}")]
    MalformedPayload {
        event: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Rejection codes reported by the scan engine module.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum GatewayErrorCode {
    /// The reader could not be claimed (another app holds it, or it is powered down)
    ScannerUnavailable,
    /// Reader missing or in the wrong state for the call
    ScannerError,
    /// The requested reader name does not exist on the device
    InvalidScanner,
    /// Manager creation failed
    InitError,
    /// Trigger-control property could not be applied
    EnableError,
    /// Reader release failed
    DisableError,
    /// Any code this crate does not know about
    Other(String),
}

impl GatewayErrorCode {
    pub fn as_str(&self) -> &str {
        match self {
            GatewayErrorCode::ScannerUnavailable => "SCANNER_UNAVAILABLE",
            GatewayErrorCode::ScannerError => "SCANNER_ERROR",
            GatewayErrorCode::InvalidScanner => "INVALID_SCANNER",
            GatewayErrorCode::InitError => "INIT_ERROR",
            GatewayErrorCode::EnableError => "ENABLE_ERROR",
            GatewayErrorCode::DisableError => "DISABLE_ERROR",
            GatewayErrorCode::Other(code) => code,
        }
    }
}

impl fmt::Display for GatewayErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<String> for GatewayErrorCode {
    fn from(code: String) -> Self {
        match code.to_uppercase().as_str() {
            "SCANNER_UNAVAILABLE" => GatewayErrorCode::ScannerUnavailable,
            "SCANNER_ERROR" => GatewayErrorCode::ScannerError,
            "INVALID_SCANNER" => GatewayErrorCode::InvalidScanner,
            "INIT_ERROR" => GatewayErrorCode::InitError,
            "ENABLE_ERROR" => GatewayErrorCode::EnableError,
            "DISABLE_ERROR" => GatewayErrorCode::DisableError,
            _ => GatewayErrorCode::Other(code),
        }
    }
}

impl From<GatewayErrorCode> for String {
    fn from(code: GatewayErrorCode) -> Self {
        code.as_str().to_string()
    }
}

/// A rejected gateway call.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct GatewayError {
    pub code: GatewayErrorCode,
    pub message: String,
}

impl GatewayError {
    pub fn new(code: GatewayErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Reader missing or in the wrong state.
    pub fn not_initialized() -> Self {
        Self::new(GatewayErrorCode::ScannerError, "Scanner not initialized")
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::ScannerUnavailable, message)
    }
}
