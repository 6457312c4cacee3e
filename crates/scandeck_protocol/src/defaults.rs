//! Canonical default values shared by the coordinator and the launcher.

/// Event name the scan engine uses for a successful decode.
pub const SCAN_SUCCESS_EVENT: &str = "onBarcodeScanned";
/// Event name the scan engine uses for a failed trigger pull.
pub const SCAN_FAILURE_EVENT: &str = "onBarcodeScanFailed";

pub const DEFAULT_HISTORY_CAPACITY: usize = 10;
pub const DEFAULT_FAILURE_RECOVERY_MS: u64 = 2000;

/// Failure detail the device attaches to every scan-failure event.
pub const SCAN_FAILED_DETAIL: &str = "Scan failed";
