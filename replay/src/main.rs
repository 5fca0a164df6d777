//! engage-replay
//!
//! Runs a scripted engagement scenario against a fresh ledger and prints a
//! JSON snapshot line for every `report` step.

mod runner;
mod scenario;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use engage_core::config;
use tracing_subscriber::filter::EnvFilter;

use crate::runner::Replay;
use crate::scenario::Scenario;

#[derive(Debug, Parser)]
#[command(name = "engage-replay", about = "Replay an engagement scenario")]
struct Args {
    /// Scenario TOML file
    scenario: PathBuf,

    /// Ledger config file (defaults to the user config directory)
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Initialize logging, writing to ENGAGE_LOG_PATH if set, otherwise stderr.
fn init_logging() {
    let filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .from_env_lossy();

    if let Ok(path) = std::env::var("ENGAGE_LOG_PATH")
        && let Ok(file) = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
    {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_ansi(false)
            .with_writer(file)
            .init();
        return;
    }

    // Fallback to stderr
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    init_logging();
    let args = Args::parse();

    let config_path = args.config.or_else(config::default_config_path);
    let ledger_config = match config_path {
        Some(path) => match config::load_or_default(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load ledger config");
                return ExitCode::FAILURE;
            }
        },
        None => config::LedgerConfig::default(),
    };

    let scenario = match Scenario::load(&args.scenario) {
        Ok(scenario) => scenario,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load scenario");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(
        path = %args.scenario.display(),
        steps = scenario.steps.len(),
        "Loaded scenario"
    );

    let mut replay = Replay::new(ledger_config, chrono::Utc::now());
    let stdout = std::io::stdout();
    match replay.run(&scenario, &mut stdout.lock()) {
        Ok(summary) if summary.rejected > 0 => {
            tracing::warn!(rejected = summary.rejected, "Some tags were rejected");
            ExitCode::SUCCESS
        }
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Failed to write report");
            ExitCode::FAILURE
        }
    }
}
