//! Per-session counters.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free counters updated by the coordinator task.
#[derive(Debug, Default)]
pub struct SessionMetrics {
    start_attempts: AtomicU64,
    initialization_failures: AtomicU64,
    scans_recorded: AtomicU64,
    scan_failures: AtomicU64,
    recoveries: AtomicU64,
    teardown_failures: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct MetricsSnapshot {
    pub start_attempts: u64,
    pub initialization_failures: u64,
    pub scans_recorded: u64,
    pub scan_failures: u64,
    pub recoveries: u64,
    pub teardown_failures: u64,
}

impl SessionMetrics {
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            start_attempts: self.start_attempts.load(Ordering::Relaxed),
            initialization_failures: self.initialization_failures.load(Ordering::Relaxed),
            scans_recorded: self.scans_recorded.load(Ordering::Relaxed),
            scan_failures: self.scan_failures.load(Ordering::Relaxed),
            recoveries: self.recoveries.load(Ordering::Relaxed),
            teardown_failures: self.teardown_failures.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn inc_start_attempts(&self) {
        self.start_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_initialization_failures(&self) {
        self.initialization_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_scans_recorded(&self) {
        self.scans_recorded.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_scan_failures(&self) {
        self.scan_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_recoveries(&self) {
        self.recoveries.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn inc_teardown_failures(&self) {
        self.teardown_failures.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_increments() {
        let metrics = SessionMetrics::default();
        metrics.inc_start_attempts();
        metrics.inc_start_attempts();
        metrics.inc_scans_recorded();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.start_attempts, 2);
        assert_eq!(snapshot.scans_recorded, 1);
        assert_eq!(snapshot.teardown_failures, 0);
    }
}
