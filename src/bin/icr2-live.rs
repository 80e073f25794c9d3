//! Console telemetry for a running IndyCar Racing II.
//!
//! Prints the telemetry block every tick and keeps the JSON export file current.
//! Type `r` + Enter to reset split timing, `e` + Enter to toggle the JSON export.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use futures::StreamExt;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use icr2_telemetry::sink::{ConsoleDisplay, DisplaySink, ExportSink};
use icr2_telemetry::{Config, Session, UpdateRate};

/// Live telemetry and split times from IndyCar Racing II
#[derive(Parser, Debug)]
#[command(name = "icr2-live")]
#[command(version)]
struct Args {
    /// YAML configuration file
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Limit console redraws to this many per second
    #[arg(long, value_name = "HZ")]
    max_hz: Option<u32>,

    /// Do not write the JSON export file
    #[arg(long)]
    no_export: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => Config::default(),
    };
    if args.no_export {
        config.export.enabled = false;
    }
    let rate = args.max_hz.map_or(UpdateRate::Native, UpdateRate::Max);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start the async runtime")?;
    let result = runtime.block_on(run(config, rate));

    // Stdin is read on a blocking thread that would otherwise hold up exit
    runtime.shutdown_background();
    result
}

async fn run(config: Config, rate: UpdateRate) -> Result<()> {
    let session = match Session::attach(&config) {
        Ok(session) => session,
        Err(e) => {
            for suggestion in e.recovery_suggestions() {
                eprintln!("  - {}", suggestion);
            }
            return Err(e).context("Failed to attach to the game");
        }
    };

    let mut display = ConsoleDisplay::stdout();
    let mut export = config.export.sink();
    info!(
        export = export.is_enabled(),
        path = %export.path().display(),
        "Streaming telemetry; r + Enter resets splits, e + Enter toggles export"
    );

    let mut reports = session.reports(rate);
    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut input_open = true;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                info!("Interrupted, shutting down");
                break;
            }
            line = input.next_line(), if input_open => match line {
                Ok(Some(line)) => match line.trim() {
                    "r" => {
                        if session.reset_splits() {
                            display.reset()?;
                        }
                    }
                    "e" => {
                        let enabled = export.toggle();
                        info!(enabled, "JSON export toggled");
                    }
                    _ => {}
                },
                Ok(None) => input_open = false,
                Err(e) => {
                    warn!("Stopped reading commands: {}", e);
                    input_open = false;
                }
            },
            report = reports.next() => {
                let Some(report) = report else {
                    warn!("Telemetry stopped");
                    break;
                };
                display.show(&report)?;
                if let Some(record) = report.export_record() {
                    if let Err(e) = export.export(&record) {
                        warn!("Export failed: {}", e);
                    }
                }
            }
        }
    }

    // Closes the process handle before returning
    session.shutdown().await;
    Ok(())
}
