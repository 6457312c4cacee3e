//! `scandeck demo`: scripted session against the simulated engine
//!
//! Starts a session, accepts Retry offers up to a budget, pulls the trigger
//! for each `--scan` and optionally injects one failed pull. The view is
//! re-rendered after every transition.

use crate::cli::config::SessionArgs;
use crate::cli::error::HelpfulError;
use crate::cli::output::{render_notification, render_state, SessionReport};
use anyhow::{Context, Result};
use clap::Args;
use scandeck_protocol::{GatewayError, GatewayErrorCode, SessionStatus};
use scandeck_session::{
    Coordinator, CoordinatorState, EventBridge, FaultPlan, Notification, SessionHandle,
    SimulatedScanEngine,
};
use std::io::Write;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, info};

const DEFAULT_SYMBOLOGY: &str = "CODE128";
const EVENT_WAIT: Duration = Duration::from_secs(5);

/// One scripted trigger pull: `DATA` or `DATA:SYMBOLOGY`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptedScan {
    pub data: String,
    pub symbology: String,
}

impl FromStr for ScriptedScan {
    type Err = String;

    /// The symbology is the text after the last `:` when it looks like a
    /// symbology name. Otherwise the whole argument is data, so
    /// `https://example.com` stays intact.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.is_empty() {
            return Err("Scan data cannot be empty".to_string());
        }
        let (data, symbology) = match s.rsplit_once(':') {
            Some((data, sym)) if !data.is_empty() && is_symbology_name(sym) => (data, sym),
            _ => (s, DEFAULT_SYMBOLOGY),
        };
        Ok(Self {
            data: data.to_string(),
            symbology: symbology.to_string(),
        })
    }
}

/// Symbology names start with a letter: `CODE128`, `QR`, `EAN13`.
fn is_symbology_name(s: &str) -> bool {
    s.starts_with(|c: char| c.is_ascii_alphabetic())
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

#[derive(Args, Debug, Clone)]
pub struct DemoArgs {
    /// Barcode to scan, as DATA or DATA:SYMBOLOGY (repeatable)
    #[arg(long = "scan", value_name = "DATA:SYMBOLOGY")]
    pub scans: Vec<ScriptedScan>,

    /// Inject a failed trigger pull after this many scans
    #[arg(long, value_name = "N")]
    pub fail_scan_after: Option<usize>,

    /// Reject the first N initialize calls
    #[arg(long, value_name = "N", default_value_t = 0)]
    pub fail_initialize: usize,

    /// Reject the first N enable calls
    #[arg(long, value_name = "N", default_value_t = 0)]
    pub fail_enable: usize,

    /// Reject the disable call at shutdown
    #[arg(long)]
    pub fail_disable: bool,

    /// How many Retry offers to accept before giving up
    #[arg(long, value_name = "N", default_value_t = 3)]
    pub retry_limit: u32,

    /// Simulated engine latency per call, in milliseconds
    #[arg(long, value_name = "MS", default_value_t = 0)]
    pub latency_ms: u64,

    /// Print only the final state as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub session: SessionArgs,
}

impl DemoArgs {
    fn fault_plan(&self) -> FaultPlan {
        let mut plan = FaultPlan::new();
        if self.fail_initialize > 0 {
            plan = plan.fail_initialize(
                self.fail_initialize,
                GatewayError::unavailable("No scanner reader available"),
            );
        }
        if self.fail_enable > 0 {
            plan = plan.fail_enable(
                self.fail_enable,
                GatewayError::new(GatewayErrorCode::EnableError, "Failed to enable scanner"),
            );
        }
        if self.fail_disable {
            plan = plan.fail_disable(
                1,
                GatewayError::new(GatewayErrorCode::DisableError, "Failed to disable scanner"),
            );
        }
        plan
    }

    /// Scripted scans, defaulting to a single CODE128 pull.
    fn script(&self) -> Vec<ScriptedScan> {
        if self.scans.is_empty() {
            vec![ScriptedScan {
                data: "12345".to_string(),
                symbology: DEFAULT_SYMBOLOGY.to_string(),
            }]
        } else {
            self.scans.clone()
        }
    }
}

/// Execute the demo command
pub fn run(args: DemoArgs) -> Result<()> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let mut stdout = std::io::stdout();
    let outcome = rt.block_on(async { run_session(&args, &mut stdout).await })?;
    debug!(
        retries = outcome.retries,
        status = %outcome.state.status(),
        history = outcome.state.history().len(),
        "Demo complete"
    );
    Ok(())
}

/// What a finished demo left behind.
#[derive(Debug)]
pub struct DemoOutcome {
    pub state: CoordinatorState,
    pub retries: u32,
}

/// Drive one session and write the rendered view to `out`.
pub async fn run_session<W: Write>(args: &DemoArgs, out: &mut W) -> Result<DemoOutcome> {
    let config = args.session.to_config()?;
    let recovery = config.failure_recovery;

    let bridge = EventBridge::new();
    let engine = Arc::new(
        SimulatedScanEngine::new(bridge.clone())
            .with_faults(args.fault_plan())
            .with_latency(Duration::from_millis(args.latency_ms)),
    );
    let (session, notifications) = Coordinator::spawn(engine.clone(), bridge, config)?;
    let mut presenter = Presenter {
        out,
        json: args.json,
        notifications,
    };

    presenter.view(&session.snapshot())?;
    let (status, retries, last_error) = bring_up(&session, &mut presenter, args.retry_limit).await?;

    if status == SessionStatus::Ready {
        let script = args.script();
        for (index, scan) in script.iter().enumerate() {
            if args.fail_scan_after == Some(index) {
                fail_and_recover(&session, &engine, &mut presenter, recovery).await?;
            }
            scan_once(&session, &engine, &mut presenter, scan).await?;
        }
        if args.fail_scan_after.is_some_and(|n| n >= script.len()) {
            fail_and_recover(&session, &engine, &mut presenter, recovery).await?;
        }
    }

    session.stop().await;
    let state = session.snapshot();
    let metrics = session.metrics();
    info!(
        scans = metrics.scans_recorded,
        failures = metrics.scan_failures,
        "Demo session finished"
    );

    if presenter.json {
        let report = SessionReport {
            state: &state,
            metrics,
            retries,
        };
        writeln!(presenter.out, "{}", report.to_json()?)?;
    }

    if status != SessionStatus::Ready {
        return Err(HelpfulError::scanner_unavailable(retries, last_error.as_deref()).into());
    }
    Ok(DemoOutcome { state, retries })
}

/// Start the session, accepting Retry offers until Ready or out of budget.
async fn bring_up<W: Write>(
    session: &SessionHandle,
    presenter: &mut Presenter<'_, W>,
    retry_limit: u32,
) -> Result<(SessionStatus, u32, Option<String>)> {
    let mut status = session.start().await?;
    let mut retries = 0;
    let mut last_error = None;
    presenter.view(&session.snapshot())?;

    while status == SessionStatus::Error {
        let notification = presenter.next_notification().await?;
        presenter.alert(&notification)?;
        let Notification::InitializationFailed { error, retry } = notification else {
            continue;
        };
        last_error = Some(error.to_string());

        if retries >= retry_limit {
            info!(retries, "Retry budget spent, dismissing");
            retry.dismiss();
            break;
        }
        retries += 1;
        info!(attempt = retries, "Retrying scanner initialization");
        status = retry.retry().await?;
        presenter.view(&session.snapshot())?;
    }
    Ok((status, retries, last_error))
}

async fn scan_once<W: Write>(
    session: &SessionHandle,
    engine: &SimulatedScanEngine,
    presenter: &mut Presenter<'_, W>,
    scan: &ScriptedScan,
) -> Result<()> {
    debug!(data = %scan.data, symbology = %scan.symbology, "Pulling trigger");
    anyhow::ensure!(
        engine.trigger_scan(&scan.data, &scan.symbology),
        "engine is not armed"
    );

    loop {
        let notification = presenter.next_notification().await?;
        presenter.alert(&notification)?;
        if let Notification::ScanRecorded(record) = &notification {
            if record.payload == scan.data {
                break;
            }
        }
    }
    presenter.view(&session.snapshot())
}

async fn fail_and_recover<W: Write>(
    session: &SessionHandle,
    engine: &SimulatedScanEngine,
    presenter: &mut Presenter<'_, W>,
    recovery: Duration,
) -> Result<()> {
    debug!("Pulling trigger with nothing in view");
    anyhow::ensure!(engine.trigger_failure(), "engine is not armed");

    let failed = wait_for_status(session, SessionStatus::ScanFailed, EVENT_WAIT).await?;
    presenter.view(&failed)?;

    let ready = wait_for_status(session, SessionStatus::Ready, recovery + EVENT_WAIT).await?;
    presenter.view(&ready)
}

async fn wait_for_status(
    session: &SessionHandle,
    status: SessionStatus,
    limit: Duration,
) -> Result<CoordinatorState> {
    let mut rx = session.state();
    let waited = timeout(limit, rx.wait_for(|s| s.status() == status)).await;
    match waited {
        Ok(Ok(state)) => Ok(state.clone()),
        Ok(Err(_)) => Err(scandeck_session::SessionError::Stopped.into()),
        Err(_) => Err(HelpfulError::session_stalled(status.label(), limit).into()),
    }
}

/// Console side of the session: renders views and alerts.
struct Presenter<'a, W: Write> {
    out: &'a mut W,
    json: bool,
    notifications: mpsc::UnboundedReceiver<Notification>,
}

impl<W: Write> Presenter<'_, W> {
    async fn next_notification(&mut self) -> Result<Notification> {
        timeout(EVENT_WAIT, self.notifications.recv())
            .await
            .map_err(|_| HelpfulError::session_stalled("a notification", EVENT_WAIT))?
            .context("Session closed its notification stream")
    }

    fn view(&mut self, state: &CoordinatorState) -> Result<()> {
        if self.json {
            return Ok(());
        }
        writeln!(self.out, "{}", render_state(state, &chrono::Local))?;
        Ok(())
    }

    fn alert(&mut self, notification: &Notification) -> Result<()> {
        if self.json {
            return Ok(());
        }
        writeln!(self.out, "{}\n", render_notification(notification))?;
        Ok(())
    }
}
