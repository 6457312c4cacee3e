//! Payloads exactly as the handheld's scanner module emits them.

use anyhow::Result;
use scandeck_protocol::defaults::{SCAN_FAILED_DETAIL, SCAN_FAILURE_EVENT, SCAN_SUCCESS_EVENT};
use scandeck_protocol::{EngineEvent, GatewayError, GatewayErrorCode, ScanRecord};

#[test]
fn test_device_success_payload() -> Result<()> {
    let raw = r#"{"data":"0012345678905","symbology":"d","timestamp":"1700000123456"}"#;
    let event = EngineEvent::decode(SCAN_SUCCESS_EVENT, serde_json::from_str(raw)?)?;

    let EngineEvent::ScanSucceeded(payload) = event else {
        anyhow::bail!("expected a success event");
    };
    let record = ScanRecord::from(payload);
    assert_eq!(record.payload, "0012345678905");
    assert_eq!(record.symbology, "d");
    assert_eq!(record.captured_at_millis(), Some(1_700_000_123_456));
    Ok(())
}

#[test]
fn test_device_failure_payload() -> Result<()> {
    let raw = format!(r#"{{"error":"{}"}}"#, SCAN_FAILED_DETAIL);
    let event = EngineEvent::decode(SCAN_FAILURE_EVENT, serde_json::from_str(&raw)?)?;

    let EngineEvent::ScanFailed(payload) = event else {
        anyhow::bail!("expected a failure event");
    };
    assert_eq!(payload.detail(), Some(SCAN_FAILED_DETAIL));
    Ok(())
}

#[test]
fn test_gateway_rejection_serializes_with_wire_code() -> Result<()> {
    let err = GatewayError::new(GatewayErrorCode::EnableError, "trigger mode rejected");
    let value = serde_json::to_value(&err)?;
    assert_eq!(value["code"], "ENABLE_ERROR");

    let back: GatewayError = serde_json::from_value(value)?;
    assert_eq!(back, err);
    Ok(())
}
