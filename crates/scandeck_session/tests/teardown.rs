mod common;

use anyhow::Result;
use common::{settle_until, Harness};
use scandeck_protocol::{
    EngineEvent, EventChannel, GatewayError, GatewayErrorCode, ScanSuccessPayload, SessionStatus,
};
use scandeck_session::{FaultPlan, ReaderState};
use std::time::Duration;

#[tokio::test]
async fn test_stop_releases_listeners_and_disables_engine() -> Result<()> {
    let harness = Harness::new()?;
    harness.start_ready().await?;
    assert_eq!(harness.bridge.listener_count(EventChannel::ScanSuccess), 1);

    harness.session.stop().await;

    assert_eq!(harness.bridge.listener_count(EventChannel::ScanSuccess), 0);
    assert_eq!(harness.bridge.listener_count(EventChannel::ScanFailure), 0);
    assert_eq!(harness.engine.calls().disable, 1);
    assert_eq!(harness.engine.reader_state(), ReaderState::Released);
    assert!(harness.session.is_stopped());
    Ok(())
}

#[tokio::test]
async fn test_second_stop_is_a_no_op() -> Result<()> {
    let harness = Harness::new()?;
    harness.start_ready().await?;
    harness.engine.trigger_scan_at("12345", "CODE128", "1700000000000");
    harness.wait_for(|s| s.last_scan().is_some()).await?;

    harness.session.stop().await;
    let after_first = harness.session.snapshot();

    harness.session.stop().await;
    assert_eq!(harness.session.snapshot(), after_first);
    assert_eq!(harness.engine.calls().disable, 1);
    Ok(())
}

#[tokio::test]
async fn test_stop_before_start_is_safe() -> Result<()> {
    let harness = Harness::new()?;

    // The engine rejects disable when no reader was claimed; that is swallowed.
    harness.session.stop().await;

    assert_eq!(harness.engine.calls().disable, 1);
    assert_eq!(harness.session.metrics().teardown_failures, 1);
    assert_eq!(harness.session.snapshot().status(), SessionStatus::Initializing);
    Ok(())
}

#[tokio::test]
async fn test_stop_after_failed_start_releases_listeners() -> Result<()> {
    let harness = Harness::with_faults(
        FaultPlan::new().fail_initialize(1, GatewayError::unavailable("powered down")),
    )?;
    assert_eq!(harness.session.start().await?, SessionStatus::Error);
    assert_eq!(harness.bridge.listener_count(EventChannel::ScanFailure), 1);

    harness.session.stop().await;
    assert_eq!(harness.bridge.listener_count(EventChannel::ScanSuccess), 0);
    assert_eq!(harness.bridge.listener_count(EventChannel::ScanFailure), 0);
    Ok(())
}

#[tokio::test]
async fn test_disable_failure_is_swallowed() -> Result<()> {
    let harness = Harness::with_faults(FaultPlan::new().fail_disable(
        1,
        GatewayError::new(GatewayErrorCode::DisableError, "release failed"),
    ))?;
    harness.start_ready().await?;

    harness.session.stop().await;

    assert!(harness.session.is_stopped());
    assert_eq!(harness.session.metrics().teardown_failures, 1);
    assert_eq!(harness.bridge.listener_count(EventChannel::ScanSuccess), 0);
    Ok(())
}

#[tokio::test]
async fn test_events_after_stop_are_not_recorded() -> Result<()> {
    let harness = Harness::new()?;
    harness.start_ready().await?;
    harness.session.stop().await;

    let delivered = harness.bridge.emit(EngineEvent::ScanSucceeded(ScanSuccessPayload {
        data: "late".to_string(),
        symbology: "QR".to_string(),
        timestamp: "1700000000000".to_string(),
    }));
    assert_eq!(delivered, 0);
    assert!(harness.session.snapshot().last_scan().is_none());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_stop_cancels_pending_recovery() -> Result<()> {
    let harness = Harness::new()?;
    harness.start_ready().await?;
    harness.engine.trigger_failure();
    harness.wait_for_status(SessionStatus::ScanFailed).await?;

    harness.session.stop().await;
    tokio::time::sleep(Duration::from_secs(5)).await;

    assert_eq!(harness.session.snapshot().status(), SessionStatus::ScanFailed);
    assert_eq!(harness.session.metrics().recoveries, 0);
    Ok(())
}

#[tokio::test]
async fn test_dropping_every_handle_tears_down() -> Result<()> {
    let Harness {
        bridge,
        engine,
        session,
        notifications,
    } = Harness::new()?;
    session.start().await?;
    assert_eq!(bridge.listener_count(EventChannel::ScanSuccess), 1);

    drop(session);
    drop(notifications);

    settle_until(|| engine.calls().disable == 1).await;
    settle_until(|| bridge.listener_count(EventChannel::ScanSuccess) == 0).await;
    assert_eq!(engine.reader_state(), ReaderState::Released);
    Ok(())
}
