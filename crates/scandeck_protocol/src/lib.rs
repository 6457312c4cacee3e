//! Scan engine contracts for Scandeck.
//!
//! Shared by the session coordinator and the launcher:
//!
//! - engine event names and payloads (`onBarcodeScanned`, `onBarcodeScanFailed`)
//! - [`ScanRecord`] and [`SessionStatus`]
//! - [`GatewayError`] with the device module's rejection codes
//! - [`SessionConfig`] and its defaults

pub mod config;
pub mod defaults;
pub mod error;
pub mod types;

pub use config::{ConfigError, SessionConfig};
pub use error::{GatewayError, GatewayErrorCode, ProtocolError, Result};
pub use types::{
    EngineEvent, EventChannel, RecoveryPolicy, ScanFailurePayload, ScanRecord, ScanSuccessPayload,
    SessionStatus,
};
