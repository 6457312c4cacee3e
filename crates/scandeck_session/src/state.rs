//! Coordinator state exposed to presentation.

use crate::history::ScanHistory;
use scandeck_protocol::{ScanRecord, SessionStatus};
use serde::Serialize;

/// Snapshot of a scan session.
///
/// Only the coordinator mutates it. Presentation receives clones through the
/// session's watch channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoordinatorState {
    status: SessionStatus,
    last_scan: Option<ScanRecord>,
    history: ScanHistory,
}

impl Default for CoordinatorState {
    fn default() -> Self {
        Self::new(ScanHistory::default())
    }
}

impl CoordinatorState {
    pub(crate) fn new(history: ScanHistory) -> Self {
        Self {
            status: SessionStatus::Initializing,
            last_scan: None,
            history,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn last_scan(&self) -> Option<&ScanRecord> {
        self.last_scan.as_ref()
    }

    pub fn history(&self) -> &ScanHistory {
        &self.history
    }

    /// Returns the previous status.
    pub(crate) fn set_status(&mut self, status: SessionStatus) -> SessionStatus {
        std::mem::replace(&mut self.status, status)
    }

    pub(crate) fn record_scan(&mut self, record: ScanRecord) -> Option<ScanRecord> {
        self.last_scan = Some(record.clone());
        self.history.push(record)
    }
}
