//! Outward notification requests for presentation.
//!
//! The coordinator decides when a notification is raised and what it says.
//! Presentation decides how to render it (modal, toast, log line).

use crate::coordinator::{request_start, Command};
use crate::error::{Result, SessionError};
use scandeck_protocol::{ScanRecord, SessionStatus};
use std::fmt;
use tokio::sync::mpsc;

/// A one-shot notification raised by the coordinator.
#[derive(Debug)]
pub enum Notification {
    /// Initialize or enable was rejected. Offers a retry.
    InitializationFailed {
        error: SessionError,
        retry: RetryAction,
    },
    /// A scan was recorded.
    ScanRecorded(ScanRecord),
}

impl Notification {
    pub fn title(&self) -> &'static str {
        match self {
            Notification::InitializationFailed { .. } => "Scanner Error",
            Notification::ScanRecorded(_) => "Barcode Scanned Successfully",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Notification::InitializationFailed { error, .. } => {
                format!("Failed to initialize barcode scanner: {}", error)
            }
            Notification::ScanRecorded(record) => record.summary(),
        }
    }
}

/// Retry/dismiss choice attached to an initialization failure.
///
/// Holding an undecided action keeps the session alive.
pub struct RetryAction {
    command_tx: mpsc::UnboundedSender<Command>,
}

impl RetryAction {
    pub(crate) fn new(command_tx: mpsc::UnboundedSender<Command>) -> Self {
        Self { command_tx }
    }

    /// Run the start sequence again from the beginning.
    pub async fn retry(self) -> Result<SessionStatus> {
        request_start(&self.command_tx).await
    }

    /// Leave the session in the Error status.
    pub fn dismiss(self) {}

    /// Whether the session this action belongs to is still running.
    pub fn is_live(&self) -> bool {
        !self.command_tx.is_closed()
    }
}

impl fmt::Debug for RetryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryAction")
            .field("live", &self.is_live())
            .finish()
    }
}
