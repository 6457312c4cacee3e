//! Session settings shared by CLI commands

use clap::Args;
use scandeck_protocol::defaults::{DEFAULT_FAILURE_RECOVERY_MS, DEFAULT_HISTORY_CAPACITY};
use scandeck_protocol::{RecoveryPolicy, SessionConfig};
use serde::Serialize;
use std::time::Duration;

#[derive(Args, Debug, Clone)]
pub struct SessionArgs {
    /// Number of scans kept in the history list
    #[arg(long, env = "SCANDECK_HISTORY_CAPACITY", default_value_t = DEFAULT_HISTORY_CAPACITY)]
    pub history_capacity: usize,

    /// Milliseconds a failed scan stays on screen before returning to Ready
    #[arg(long, env = "SCANDECK_RECOVERY_MS", default_value_t = DEFAULT_FAILURE_RECOVERY_MS)]
    pub recovery_ms: u64,

    /// Recovery policy: `fixed-deadline` or `resume-on-scan`
    #[arg(long, env = "SCANDECK_RECOVERY_POLICY", default_value_t = RecoveryPolicy::default())]
    pub recovery_policy: RecoveryPolicy,
}

impl SessionArgs {
    /// Build and validate a session configuration.
    pub fn to_config(&self) -> anyhow::Result<SessionConfig> {
        let config = SessionConfig {
            history_capacity: self.history_capacity,
            failure_recovery: Duration::from_millis(self.recovery_ms),
            recovery_policy: self.recovery_policy,
        };
        config.validate()?;
        Ok(config)
    }
}

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[command(flatten)]
    pub session: SessionArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct ConfigView {
    history_capacity: usize,
    recovery_ms: u64,
    recovery_policy: String,
}

/// Print the effective session configuration
pub fn run(args: ConfigArgs) -> anyhow::Result<()> {
    let config = args.session.to_config()?;
    let view = ConfigView {
        history_capacity: config.history_capacity,
        recovery_ms: config.failure_recovery.as_millis() as u64,
        recovery_policy: config.recovery_policy.to_string(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        println!("history_capacity = {}", view.history_capacity);
        println!("recovery_ms      = {}", view.recovery_ms);
        println!("recovery_policy  = {}", view.recovery_policy);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        session: SessionArgs,
    }

    #[test]
    fn test_defaults_match_session_config() {
        let cli = TestCli::parse_from(["scandeck"]);
        assert_eq!(cli.session.to_config().unwrap(), SessionConfig::default());
    }

    #[test]
    fn test_overrides() {
        let cli = TestCli::parse_from([
            "scandeck",
            "--history-capacity",
            "3",
            "--recovery-ms",
            "500",
            "--recovery-policy",
            "resume-on-scan",
        ]);
        let config = cli.session.to_config().unwrap();
        assert_eq!(config.history_capacity, 3);
        assert_eq!(config.failure_recovery, Duration::from_millis(500));
        assert_eq!(config.recovery_policy, RecoveryPolicy::ResumeOnScan);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let cli = TestCli::parse_from(["scandeck", "--history-capacity", "0"]);
        assert!(cli.session.to_config().is_err());
    }
}
