//! Console rendering for scan sessions
//!
//! Mirrors the handheld screen: a status line, the last scan and the history
//! list. Timestamps that are not epoch milliseconds are shown as received.

use chrono::TimeZone;
use scandeck_protocol::ScanRecord;
use scandeck_session::{CoordinatorState, MetricsSnapshot, Notification};
use serde::Serialize;
use std::fmt::{Display, Write};

const NO_SCAN_YET: &str = "No barcode scanned yet. Pull the trigger to scan.";

/// Format a capture time as a full date and time in `tz`
pub fn format_captured_at<Tz>(record: &ScanRecord, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    match record.captured_at() {
        Some(at) => at.with_timezone(tz).format("%Y-%m-%d %H:%M:%S").to_string(),
        None => record.captured_at.clone(),
    }
}

/// Format a capture time as time of day in `tz`
pub fn format_time_of_day<Tz>(record: &ScanRecord, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    match record.captured_at() {
        Some(at) => at.with_timezone(tz).format("%H:%M:%S").to_string(),
        None => record.captured_at.clone(),
    }
}

/// Render the session view
pub fn render_state<Tz>(state: &CoordinatorState, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut out = String::new();
    let _ = writeln!(out, "Status: {}", state.status().label());
    out.push('\n');

    match state.last_scan() {
        Some(scan) => {
            let _ = writeln!(out, "Last Scanned:");
            let _ = writeln!(out, "  Data:      {}", scan.payload);
            let _ = writeln!(out, "  Symbology: {}", scan.symbology);
            let _ = writeln!(out, "  Timestamp: {}", format_captured_at(scan, tz));
        }
        None => {
            let _ = writeln!(out, "{}", NO_SCAN_YET);
        }
    }

    if !state.history().is_empty() {
        out.push('\n');
        let _ = writeln!(out, "Scan History:");
        let width = state.history().iter().map(|r| r.payload.len()).max().unwrap_or(0);
        for record in state.history().iter() {
            let _ = writeln!(
                out,
                "  {:<width$}  {}",
                record.payload,
                format_time_of_day(record, tz),
                width = width
            );
        }
    }

    out
}

/// Render a notification the way a modal alert reads
pub fn render_notification(notification: &Notification) -> String {
    let title = notification.title();
    format!(
        "{}\n{}\n{}",
        title,
        "-".repeat(title.len()),
        notification.message()
    )
}

/// Final summary printed by `--json`
#[derive(Debug, Serialize)]
pub struct SessionReport<'a> {
    pub state: &'a CoordinatorState,
    pub metrics: MetricsSnapshot,
    pub retries: u32,
}

impl SessionReport<'_> {
    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_format_captured_at() {
        let record = ScanRecord::new("12345", "CODE128", "1700000000000");
        assert_eq!(format_captured_at(&record, &Utc), "2023-11-14 22:13:20");
        assert_eq!(format_time_of_day(&record, &Utc), "22:13:20");
    }

    #[test]
    fn test_format_unparseable_timestamp_passes_through() {
        let record = ScanRecord::new("x", "", "not-a-number");
        assert_eq!(format_captured_at(&record, &Utc), "not-a-number");
        assert_eq!(format_time_of_day(&record, &Utc), "not-a-number");
    }

    #[test]
    fn test_render_initial_state() {
        let rendered = render_state(&CoordinatorState::default(), &Utc);
        assert!(rendered.starts_with("Status: Initializing...\n"));
        assert!(rendered.contains(NO_SCAN_YET));
        assert!(!rendered.contains("Scan History:"));
    }

    #[test]
    fn test_render_report_json() {
        let state = CoordinatorState::default();
        let report = SessionReport {
            state: &state,
            metrics: MetricsSnapshot::default(),
            retries: 2,
        };
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(json["retries"], 2);
        assert_eq!(json["metrics"]["scans_recorded"], 0);
        assert!(json["state"]["last_scan"].is_null());
    }
}
