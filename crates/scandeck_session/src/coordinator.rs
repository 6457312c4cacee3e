//! Scan-session coordinator.
//!
//! Design principles:
//! - One task owns the state; commands, bridge events and recovery timers are
//!   serialized through a single select loop
//! - Gateway calls are awaited in the loop; events arriving meanwhile queue up
//! - Subscriptions are acquired on the first start and released on every exit
//!   path (explicit stop, or the last handle being dropped)
//! - Recovery timers live in a JoinSet owned by the loop, so teardown aborts them

use crate::bridge::{EventBridge, Subscription};
use crate::error::{InitStage, Result, SessionError};
use crate::gateway::ScanEngineGateway;
use crate::history::ScanHistory;
use crate::metrics::{MetricsSnapshot, SessionMetrics};
use crate::notify::{Notification, RetryAction};
use crate::state::CoordinatorState;
use scandeck_protocol::defaults::SCAN_FAILED_DETAIL;
use scandeck_protocol::{
    EngineEvent, EventChannel, RecoveryPolicy, ScanFailurePayload, ScanRecord, SessionConfig,
    SessionStatus,
};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Requests sent from handles and retry actions to the coordinator task.
pub(crate) enum Command {
    Start {
        reply: oneshot::Sender<Result<SessionStatus>>,
    },
    Stop {
        reply: oneshot::Sender<()>,
    },
}

/// Send a start request and wait for the sequence to finish.
pub(crate) async fn request_start(
    command_tx: &mpsc::UnboundedSender<Command>,
) -> Result<SessionStatus> {
    let (reply, outcome) = oneshot::channel();
    command_tx
        .send(Command::Start { reply })
        .map_err(|_| SessionError::Stopped)?;
    outcome.await.map_err(|_| SessionError::Stopped)?
}

/// Handle for controlling a running session.
///
/// Cheap to clone. When every handle and every pending [`RetryAction`] is
/// gone the session tears itself down.
#[derive(Clone)]
pub struct SessionHandle {
    command_tx: mpsc::UnboundedSender<Command>,
    state_rx: watch::Receiver<CoordinatorState>,
    metrics: Arc<SessionMetrics>,
}

impl std::fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("status", &self.state_rx.borrow().status())
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

impl SessionHandle {
    /// Run the start sequence: Initializing, then initialize and enable.
    ///
    /// Resolves with `Ready` or `Error`. Initialization failures are not
    /// returned as errors; they are published as
    /// [`Notification::InitializationFailed`].
    pub async fn start(&self) -> Result<SessionStatus> {
        request_start(&self.command_tx).await
    }

    /// Release subscriptions and disable the engine.
    ///
    /// Never fails. Calling it on a stopped session does nothing.
    pub async fn stop(&self) {
        let (reply, done) = oneshot::channel();
        if self.command_tx.send(Command::Stop { reply }).is_err() {
            return;
        }
        let _ = done.await;
    }

    /// Live view of the session state.
    pub fn state(&self) -> watch::Receiver<CoordinatorState> {
        self.state_rx.clone()
    }

    /// Latest published state.
    pub fn snapshot(&self) -> CoordinatorState {
        self.state_rx.borrow().clone()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn is_stopped(&self) -> bool {
        self.command_tx.is_closed()
    }
}

/// Session coordinator task state.
pub struct Coordinator {
    gateway: Arc<dyn ScanEngineGateway>,
    bridge: EventBridge,
    config: SessionConfig,
    state: CoordinatorState,
    state_tx: watch::Sender<CoordinatorState>,
    notify_tx: mpsc::UnboundedSender<Notification>,
    command_rx: mpsc::UnboundedReceiver<Command>,
    // Weak so that dropping every handle closes the command channel.
    retry_tx: mpsc::WeakUnboundedSender<Command>,
    scan_sub: Option<Subscription>,
    failure_sub: Option<Subscription>,
    recovery_timers: JoinSet<u64>,
    recovery_generation: u64,
    metrics: Arc<SessionMetrics>,
}

impl Coordinator {
    /// Spawn the coordinator on the current tokio runtime.
    ///
    /// Returns the control handle and the notification stream. The session
    /// starts idle in `Initializing`; call [`SessionHandle::start`] to bring
    /// the engine up.
    pub fn spawn(
        gateway: Arc<dyn ScanEngineGateway>,
        bridge: EventBridge,
        config: SessionConfig,
    ) -> Result<(SessionHandle, mpsc::UnboundedReceiver<Notification>)> {
        config.validate()?;

        let state = CoordinatorState::new(ScanHistory::with_capacity(config.history_capacity));
        let (state_tx, state_rx) = watch::channel(state.clone());
        let (notify_tx, notify_rx) = mpsc::unbounded_channel();
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let metrics = Arc::new(SessionMetrics::default());

        let coordinator = Coordinator {
            gateway,
            bridge,
            config,
            state,
            state_tx,
            notify_tx,
            command_rx,
            retry_tx: command_tx.downgrade(),
            scan_sub: None,
            failure_sub: None,
            recovery_timers: JoinSet::new(),
            recovery_generation: 0,
            metrics: Arc::clone(&metrics),
        };
        tokio::spawn(coordinator.run());

        let handle = SessionHandle {
            command_tx,
            state_rx,
            metrics,
        };
        Ok((handle, notify_rx))
    }

    /// Main event loop - consumes self
    async fn run(mut self) {
        debug!("Scan session coordinator running");

        loop {
            tokio::select! {
                biased;

                command = self.command_rx.recv() => match command {
                    Some(Command::Start { reply }) => {
                        let outcome = self.start().await;
                        let _ = reply.send(outcome);
                    }
                    Some(Command::Stop { reply }) => {
                        self.teardown().await;
                        // Closed before replying so callers observe is_stopped().
                        self.command_rx.close();
                        let _ = reply.send(());
                        break;
                    }
                    None => {
                        debug!("All session handles dropped");
                        self.teardown().await;
                        break;
                    }
                },

                Some(event) = next_event(&mut self.scan_sub) => self.handle_event(event),

                Some(event) = next_event(&mut self.failure_sub) => self.handle_event(event),

                Some(joined) = self.recovery_timers.join_next(), if !self.recovery_timers.is_empty() => {
                    match joined {
                        Ok(generation) => self.recover(generation),
                        Err(e) if e.is_cancelled() => {}
                        Err(e) => warn!("Recovery timer failed: {}", e),
                    }
                }
            }
        }
    }

    async fn start(&mut self) -> Result<SessionStatus> {
        self.metrics.inc_start_attempts();
        self.ensure_subscribed();

        // A restart begins a fresh failure window.
        self.recovery_timers.abort_all();
        self.recovery_generation += 1;

        self.transition(SessionStatus::Initializing);
        info!("Initializing scan engine");

        let outcome = match self.gateway.initialize().await {
            Ok(()) => self
                .gateway
                .enable()
                .await
                .map_err(|source| SessionError::Initialization {
                    stage: InitStage::Enable,
                    source,
                }),
            Err(source) => Err(SessionError::Initialization {
                stage: InitStage::Initialize,
                source,
            }),
        };

        match outcome {
            Ok(()) => {
                self.transition(SessionStatus::Ready);
                info!("Scan engine ready");
                Ok(SessionStatus::Ready)
            }
            Err(error) => {
                warn!(%error, "Scan engine initialization failed");
                self.metrics.inc_initialization_failures();
                self.transition(SessionStatus::Error);
                self.offer_retry(error);
                Ok(SessionStatus::Error)
            }
        }
    }

    fn ensure_subscribed(&mut self) {
        if self.scan_sub.is_none() {
            self.scan_sub = Some(self.bridge.subscribe(EventChannel::ScanSuccess));
        }
        if self.failure_sub.is_none() {
            self.failure_sub = Some(self.bridge.subscribe(EventChannel::ScanFailure));
        }
    }

    fn offer_retry(&mut self, error: SessionError) {
        let Some(command_tx) = self.retry_tx.upgrade() else {
            debug!("Session is shutting down, retry not offered");
            return;
        };
        self.notify(Notification::InitializationFailed {
            error,
            retry: RetryAction::new(command_tx),
        });
    }

    fn handle_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::ScanSucceeded(payload) => self.on_scan(ScanRecord::from(payload)),
            EngineEvent::ScanFailed(payload) => self.on_scan_failure(payload),
        }
    }

    fn on_scan(&mut self, record: ScanRecord) {
        debug!(payload = %record.payload, symbology = %record.symbology, "Barcode scanned");
        self.metrics.inc_scans_recorded();

        if let Some(evicted) = self.state.record_scan(record.clone()) {
            debug!(payload = %evicted.payload, "History full, oldest scan evicted");
        }

        if self.config.recovery_policy == RecoveryPolicy::ResumeOnScan
            && self.state.status() == SessionStatus::ScanFailed
        {
            self.recovery_generation += 1;
            self.state.set_status(SessionStatus::Ready);
            debug!("Successful scan ended the failure window");
        }

        self.publish();
        self.notify(Notification::ScanRecorded(record));
    }

    fn on_scan_failure(&mut self, payload: ScanFailurePayload) {
        // ScanFailed is only entered from an armed engine.
        let status = self.state.status();
        if !matches!(status, SessionStatus::Ready | SessionStatus::ScanFailed) {
            debug!(%status, "Scan failure ignored, engine not ready");
            return;
        }

        let error = SessionError::TransientScan {
            detail: payload.detail().unwrap_or(SCAN_FAILED_DETAIL).to_string(),
        };
        info!(%error, "Trigger pull failed");
        self.metrics.inc_scan_failures();

        self.recovery_generation += 1;
        let generation = self.recovery_generation;
        let delay = self.config.failure_recovery;
        self.recovery_timers.spawn(async move {
            tokio::time::sleep(delay).await;
            generation
        });

        self.transition(SessionStatus::ScanFailed);
    }

    fn recover(&mut self, generation: u64) {
        let status = self.state.status();
        if matches!(status, SessionStatus::Initializing | SessionStatus::Error) {
            debug!(generation, %status, "Recovery timer ignored, only a retry leaves this status");
            return;
        }
        match self.config.recovery_policy {
            RecoveryPolicy::FixedDeadline => {}
            RecoveryPolicy::ResumeOnScan => {
                if generation != self.recovery_generation
                    || self.state.status() != SessionStatus::ScanFailed
                {
                    debug!(generation, "Stale recovery timer ignored");
                    return;
                }
            }
        }
        debug!(generation, "Failure window elapsed");
        self.metrics.inc_recoveries();
        self.transition(SessionStatus::Ready);
    }

    fn transition(&mut self, status: SessionStatus) {
        let previous = self.state.set_status(status);
        if previous != status {
            debug!(from = %previous, to = %status, "Session status changed");
        }
        self.publish();
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.state.clone());
    }

    fn notify(&self, notification: Notification) {
        if self.notify_tx.send(notification).is_err() {
            debug!("Notification dropped, no presenter listening");
        }
    }

    async fn teardown(&mut self) {
        self.recovery_timers.abort_all();

        if let Some(sub) = self.scan_sub.take() {
            sub.remove();
        }
        if let Some(sub) = self.failure_sub.take() {
            sub.remove();
        }

        if let Err(source) = self.gateway.disable().await {
            let error = SessionError::Teardown(source);
            warn!(%error, "Ignoring scanner disable failure");
            self.metrics.inc_teardown_failures();
        }

        info!("Scan session stopped");
    }
}

async fn next_event(subscription: &mut Option<Subscription>) -> Option<EngineEvent> {
    match subscription {
        Some(sub) => sub.recv().await,
        None => std::future::pending().await,
    }
}
