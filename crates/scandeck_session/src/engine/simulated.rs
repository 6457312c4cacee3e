//! Simulated handheld scan engine.
//!
//! Mirrors the device module's reader lifecycle: `initialize` claims the
//! reader, `enable` switches it to automatic trigger control, `disable`
//! releases it. Rejections use the module's error codes. Failures can be
//! scripted with a [`FaultPlan`].

use crate::bridge::EventBridge;
use crate::gateway::ScanEngineGateway;
use async_trait::async_trait;
use scandeck_protocol::defaults::SCAN_FAILED_DETAIL;
use scandeck_protocol::{EngineEvent, GatewayError, ScanFailurePayload, ScanSuccessPayload};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::debug;

/// Lifecycle of the simulated reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReaderState {
    /// No reader claimed (initial, and after disable)
    #[default]
    Released,
    /// Reader claimed, trigger not armed
    Claimed,
    /// Trigger armed, scans are delivered
    Enabled,
}

/// Scripted gateway rejections, consumed one per call in order.
#[derive(Debug, Clone, Default)]
pub struct FaultPlan {
    initialize: VecDeque<GatewayError>,
    enable: VecDeque<GatewayError>,
    disable: VecDeque<GatewayError>,
}

impl FaultPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the next `times` initialize calls with `error`.
    pub fn fail_initialize(mut self, times: usize, error: GatewayError) -> Self {
        self.initialize.extend(std::iter::repeat(error).take(times));
        self
    }

    /// Reject the next `times` enable calls with `error`.
    pub fn fail_enable(mut self, times: usize, error: GatewayError) -> Self {
        self.enable.extend(std::iter::repeat(error).take(times));
        self
    }

    /// Reject the next `times` disable calls with `error`.
    pub fn fail_disable(mut self, times: usize, error: GatewayError) -> Self {
        self.disable.extend(std::iter::repeat(error).take(times));
        self
    }
}

/// How often each gateway call was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CallCounts {
    pub initialize: usize,
    pub enable: usize,
    pub disable: usize,
}

#[derive(Default)]
struct EngineState {
    reader: ReaderState,
    faults: FaultPlan,
    calls: CallCounts,
}

/// Gateway backed by an in-memory reader that emits through an [`EventBridge`].
pub struct SimulatedScanEngine {
    bridge: EventBridge,
    latency: Duration,
    state: Mutex<EngineState>,
}

impl std::fmt::Debug for SimulatedScanEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("SimulatedScanEngine")
            .field("reader", &state.reader)
            .field("calls", &state.calls)
            .finish()
    }
}

impl SimulatedScanEngine {
    pub fn new(bridge: EventBridge) -> Self {
        Self {
            bridge,
            latency: Duration::ZERO,
            state: Mutex::new(EngineState::default()),
        }
    }

    pub fn with_faults(mut self, faults: FaultPlan) -> Self {
        self.state.get_mut().unwrap_or_else(PoisonError::into_inner).faults = faults;
        self
    }

    /// Delay every gateway call by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Append more scripted rejections.
    pub fn inject(&self, faults: FaultPlan) {
        let mut state = self.lock();
        state.faults.initialize.extend(faults.initialize);
        state.faults.enable.extend(faults.enable);
        state.faults.disable.extend(faults.disable);
    }

    pub fn reader_state(&self) -> ReaderState {
        self.lock().reader
    }

    pub fn calls(&self) -> CallCounts {
        self.lock().calls
    }

    /// Simulate a successful decode. Ignored unless the trigger is armed.
    ///
    /// Returns whether the event was emitted.
    pub fn trigger_scan(&self, data: &str, symbology: &str) -> bool {
        let timestamp = chrono::Utc::now().timestamp_millis().to_string();
        self.trigger_scan_at(data, symbology, &timestamp)
    }

    /// Like [`trigger_scan`](Self::trigger_scan) with an explicit capture time.
    pub fn trigger_scan_at(&self, data: &str, symbology: &str, timestamp: &str) -> bool {
        if !self.is_armed() {
            return false;
        }
        self.bridge.emit(EngineEvent::ScanSucceeded(ScanSuccessPayload {
            data: data.to_string(),
            symbology: symbology.to_string(),
            timestamp: timestamp.to_string(),
        }));
        true
    }

    /// Simulate a trigger pull that decoded nothing.
    pub fn trigger_failure(&self) -> bool {
        if !self.is_armed() {
            return false;
        }
        self.bridge.emit(EngineEvent::ScanFailed(ScanFailurePayload(
            serde_json::json!({ "error": SCAN_FAILED_DETAIL }),
        )));
        true
    }

    fn is_armed(&self) -> bool {
        let reader = self.lock().reader;
        if reader != ReaderState::Enabled {
            debug!(?reader, "Trigger pull ignored, reader not enabled");
            return false;
        }
        true
    }

    async fn settle(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn lock(&self) -> MutexGuard<'_, EngineState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl ScanEngineGateway for SimulatedScanEngine {
    async fn initialize(&self) -> Result<(), GatewayError> {
        self.settle().await;
        let mut state = self.lock();
        state.calls.initialize += 1;
        if let Some(error) = state.faults.initialize.pop_front() {
            return Err(error);
        }
        state.reader = ReaderState::Claimed;
        debug!("Simulated reader claimed");
        Ok(())
    }

    async fn enable(&self) -> Result<(), GatewayError> {
        self.settle().await;
        let mut state = self.lock();
        state.calls.enable += 1;
        if state.reader == ReaderState::Released {
            return Err(GatewayError::not_initialized());
        }
        if let Some(error) = state.faults.enable.pop_front() {
            return Err(error);
        }
        state.reader = ReaderState::Enabled;
        debug!("Simulated trigger armed");
        Ok(())
    }

    async fn disable(&self) -> Result<(), GatewayError> {
        self.settle().await;
        let mut state = self.lock();
        state.calls.disable += 1;
        if state.reader == ReaderState::Released {
            return Err(GatewayError::not_initialized());
        }
        if let Some(error) = state.faults.disable.pop_front() {
            return Err(error);
        }
        state.reader = ReaderState::Released;
        debug!("Simulated reader released");
        Ok(())
    }
}
