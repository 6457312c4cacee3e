//! Shared logging utilities for Scandeck binaries.

use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_LOG_FILTER: &str = "scandeck=info,scandeck_session=info";
const QUIET_CONSOLE_FILTER: &str = "warn";

/// Logging configuration shared by Scandeck binaries.
pub struct LogConfig<'a> {
    pub app_name: &'a str,
    pub verbose: bool,
    /// Emit console records as JSON lines
    pub json: bool,
    /// Also append every record to `<dir>/<app_name>.log`
    pub log_dir: Option<PathBuf>,
}

/// Initialize tracing with stderr output and an optional log file.
///
/// `RUST_LOG` overrides the default filter. Without `verbose` the console
/// only shows warnings and errors.
pub fn init_logging(config: LogConfig<'_>) -> Result<()> {
    let file_filter = base_filter();
    let console_filter = console_filter(config.verbose);

    let console_layer = if config.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_filter(console_filter)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_filter(console_filter)
            .boxed()
    };

    let file_layer = match config.log_dir.as_deref() {
        Some(dir) => {
            let file = open_log_file(dir, config.app_name)?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_filter(file_filter),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}

fn base_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn console_filter(verbose: bool) -> EnvFilter {
    if verbose {
        base_filter()
    } else {
        EnvFilter::new(QUIET_CONSOLE_FILTER)
    }
}

/// Path of the log file for `app_name` inside `dir`.
pub fn log_file_path(dir: &Path, app_name: &str) -> PathBuf {
    dir.join(format!("{}.log", sanitize_name(app_name)))
}

fn open_log_file(dir: &Path, app_name: &str) -> Result<File> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create logs directory: {}", dir.display()))?;
    let path = log_file_path(dir, app_name);
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))
}

fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|ch| if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' { ch } else { '_' })
        .collect()
}
