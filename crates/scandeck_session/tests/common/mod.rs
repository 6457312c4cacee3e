#![allow(dead_code)]

use anyhow::Result;
use scandeck_protocol::{SessionConfig, SessionStatus};
use scandeck_session::{
    Coordinator, CoordinatorState, EventBridge, FaultPlan, Notification, SessionHandle,
    SimulatedScanEngine,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;

const WAIT_LIMIT: Duration = Duration::from_secs(30);

/// A coordinator wired to a simulated engine.
pub struct Harness {
    pub bridge: EventBridge,
    pub engine: Arc<SimulatedScanEngine>,
    pub session: SessionHandle,
    pub notifications: mpsc::UnboundedReceiver<Notification>,
}

impl Harness {
    pub fn new() -> Result<Self> {
        Self::build(SessionConfig::default(), FaultPlan::new(), Duration::ZERO)
    }

    pub fn with_config(config: SessionConfig) -> Result<Self> {
        Self::build(config, FaultPlan::new(), Duration::ZERO)
    }

    pub fn with_faults(faults: FaultPlan) -> Result<Self> {
        Self::build(SessionConfig::default(), faults, Duration::ZERO)
    }

    pub fn build(config: SessionConfig, faults: FaultPlan, latency: Duration) -> Result<Self> {
        let bridge = EventBridge::new();
        let engine = Arc::new(
            SimulatedScanEngine::new(bridge.clone())
                .with_faults(faults)
                .with_latency(latency),
        );
        let (session, notifications) = Coordinator::spawn(engine.clone(), bridge.clone(), config)?;
        Ok(Self {
            bridge,
            engine,
            session,
            notifications,
        })
    }

    /// Start and assert the engine came up.
    pub async fn start_ready(&self) -> Result<()> {
        let status = self.session.start().await?;
        anyhow::ensure!(status == SessionStatus::Ready, "expected Ready, got {:?}", status);
        Ok(())
    }

    /// Wait until the published state satisfies `predicate`.
    pub async fn wait_for(
        &self,
        predicate: impl FnMut(&CoordinatorState) -> bool,
    ) -> Result<CoordinatorState> {
        let mut rx = self.session.state();
        let state = timeout(WAIT_LIMIT, rx.wait_for(predicate)).await??.clone();
        Ok(state)
    }

    pub async fn wait_for_status(&self, status: SessionStatus) -> Result<CoordinatorState> {
        self.wait_for(|s| s.status() == status).await
    }

    pub async fn next_notification(&mut self) -> Result<Notification> {
        timeout(WAIT_LIMIT, self.notifications.recv())
            .await?
            .ok_or_else(|| anyhow::anyhow!("notification stream closed"))
    }
}

/// Yield to the coordinator task until `condition` holds.
pub async fn settle_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..10_000 {
        if condition() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached while yielding to the coordinator");
}
