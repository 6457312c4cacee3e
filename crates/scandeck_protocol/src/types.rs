//! Engine event payloads and session types.

use crate::defaults::{SCAN_FAILURE_EVENT, SCAN_SUCCESS_EVENT};
use crate::error::{ProtocolError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Event Channels
// ============================================================================

/// The two named channels the scan engine emits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventChannel {
    ScanSuccess,
    ScanFailure,
}

impl EventChannel {
    pub const ALL: [EventChannel; 2] = [EventChannel::ScanSuccess, EventChannel::ScanFailure];

    /// Wire name of the channel as emitted by the device.
    pub fn event_name(&self) -> &'static str {
        match self {
            EventChannel::ScanSuccess => SCAN_SUCCESS_EVENT,
            EventChannel::ScanFailure => SCAN_FAILURE_EVENT,
        }
    }

    pub fn from_event_name(name: &str) -> Option<Self> {
        match name {
            SCAN_SUCCESS_EVENT => Some(EventChannel::ScanSuccess),
            SCAN_FAILURE_EVENT => Some(EventChannel::ScanFailure),
            _ => None,
        }
    }
}

impl fmt::Display for EventChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.event_name())
    }
}

// ============================================================================
// Event Payloads
// ============================================================================

/// Payload of a scan-success event.
///
/// The gateway is trusted: missing fields decode as empty text and nothing
/// is validated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSuccessPayload {
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub symbology: String,
    /// Epoch milliseconds as decimal text
    #[serde(default)]
    pub timestamp: String,
}

/// Payload of a scan-failure event. Opaque to the coordinator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScanFailurePayload(pub serde_json::Value);

impl ScanFailurePayload {
    /// The `error` field the device attaches, when present.
    pub fn detail(&self) -> Option<&str> {
        self.0.get("error").and_then(|v| v.as_str())
    }
}

/// An event delivered by the scan engine.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    ScanSucceeded(ScanSuccessPayload),
    ScanFailed(ScanFailurePayload),
}

impl EngineEvent {
    pub fn channel(&self) -> EventChannel {
        match self {
            EngineEvent::ScanSucceeded(_) => EventChannel::ScanSuccess,
            EngineEvent::ScanFailed(_) => EventChannel::ScanFailure,
        }
    }

    /// Decode a raw named event as delivered by the bridge.
    pub fn decode(name: &str, payload: serde_json::Value) -> Result<Self> {
        match EventChannel::from_event_name(name) {
            Some(EventChannel::ScanSuccess) => serde_json::from_value(payload)
                .map(EngineEvent::ScanSucceeded)
                .map_err(|source| ProtocolError::MalformedPayload {
                    event: SCAN_SUCCESS_EVENT,
                    source,
                }),
            Some(EventChannel::ScanFailure) => {
                Ok(EngineEvent::ScanFailed(ScanFailurePayload(payload)))
            }
            None => Err(ProtocolError::UnknownEvent(name.to_string())),
        }
    }
}

// ============================================================================
// Scan Records
// ============================================================================

/// One successful decode, immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRecord {
    pub payload: String,
    pub symbology: String,
    /// Capture time as delivered by the gateway (epoch millis text)
    pub captured_at: String,
}

impl ScanRecord {
    pub fn new(
        payload: impl Into<String>,
        symbology: impl Into<String>,
        captured_at: impl Into<String>,
    ) -> Self {
        Self {
            payload: payload.into(),
            symbology: symbology.into(),
            captured_at: captured_at.into(),
        }
    }

    /// Capture time in epoch milliseconds, `None` if the gateway sent junk.
    pub fn captured_at_millis(&self) -> Option<i64> {
        self.captured_at.trim().parse().ok()
    }

    pub fn captured_at(&self) -> Option<DateTime<Utc>> {
        self.captured_at_millis()
            .and_then(DateTime::from_timestamp_millis)
    }

    /// One-shot notification text shown after a successful scan.
    pub fn summary(&self) -> String {
        format!("Data: {}\nType: {}", self.payload, self.symbology)
    }
}

impl From<ScanSuccessPayload> for ScanRecord {
    fn from(payload: ScanSuccessPayload) -> Self {
        Self {
            payload: payload.data,
            symbology: payload.symbology,
            captured_at: payload.timestamp,
        }
    }
}

// ============================================================================
// Session Status
// ============================================================================

/// Coordinator status. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Engine bring-up in progress (initial state, re-entered on retry)
    #[default]
    Initializing,
    /// Engine armed, waiting for a trigger pull
    Ready,
    /// Last trigger pull failed; returns to Ready after the recovery delay
    ScanFailed,
    /// Initialize or enable was rejected; left only by retry
    Error,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Initializing => "initializing",
            SessionStatus::Ready => "ready",
            SessionStatus::ScanFailed => "scan_failed",
            SessionStatus::Error => "error",
        }
    }

    /// User-facing status line.
    pub fn label(&self) -> &'static str {
        match self {
            SessionStatus::Initializing => "Initializing...",
            SessionStatus::Ready => "Scanner Ready - Pull trigger to scan",
            SessionStatus::ScanFailed => "Scan Failed - Try again",
            SessionStatus::Error => "Scanner Error - Check device",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Recovery Policy
// ============================================================================

/// How the ScanFailed recovery timer interacts with later events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RecoveryPolicy {
    /// Every failure schedules its own timer and every timer returns status
    /// to Ready when it fires, regardless of later events.
    #[default]
    FixedDeadline,
    /// A successful scan ends the failure window immediately. A repeated
    /// failure restarts it. Superseded timers do nothing.
    ResumeOnScan,
}

impl RecoveryPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecoveryPolicy::FixedDeadline => "fixed-deadline",
            RecoveryPolicy::ResumeOnScan => "resume-on-scan",
        }
    }
}

impl fmt::Display for RecoveryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RecoveryPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "fixed-deadline" | "fixed" => Ok(RecoveryPolicy::FixedDeadline),
            "resume-on-scan" | "resume" => Ok(RecoveryPolicy::ResumeOnScan),
            _ => Err(format!(
                "Invalid recovery policy: '{}'. Expected: fixed-deadline or resume-on-scan",
                s
            )),
        }
    }
}
