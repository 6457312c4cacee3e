//! Scandeck launcher
//!
//! Runs scan sessions against the simulated engine and prints the screen a
//! handheld would show.

mod cli;

use clap::{Parser, Subcommand};
use scandeck_logging::{init_logging, LogConfig};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "scandeck", about = "Barcode scan-session coordinator", version)]
struct Cli {
    /// Show coordinator logs on the console
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Emit console logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Also write logs to <DIR>/scandeck.log
    #[arg(long, global = true, value_name = "DIR", env = "SCANDECK_LOG_DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a scripted scan session
    Demo(cli::demo::DemoArgs),

    /// Show the effective session configuration
    Config(cli::config::ConfigArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = init_logging(LogConfig {
        app_name: "scandeck",
        verbose: cli.verbose,
        json: cli.json_logs,
        log_dir: cli.log_dir.clone(),
    }) {
        eprintln!("Warning: failed to initialize logging: {:?}", err);
    }

    let result = match cli.command {
        Commands::Demo(args) => cli::demo::run(args),
        Commands::Config(args) => cli::config::run(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let Some(helpful) = err.downcast_ref::<cli::error::HelpfulError>() {
                eprint!("{}", helpful);
            } else {
                eprintln!("{:?}", err);
            }
            ExitCode::from(1)
        }
    }
}
