//! Scan engine implementations usable without hardware.

mod simulated;

pub use simulated::{CallCounts, FaultPlan, ReaderState, SimulatedScanEngine};
