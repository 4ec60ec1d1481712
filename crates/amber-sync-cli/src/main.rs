//! amber-sync - terminal client for the tournament-records API.
//!
//! A thin surface over `amber-sync-core`: every subcommand reads through
//! the sync cache or sends one version-checked write, then prints a table
//! or JSON.

mod cli;
mod commands;
mod output;

use std::io;
use std::path::Path;

use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use amber_sync_core::Config;

use cli::Cli;

/// Log file name inside the log directory
const LOG_FILE_NAME: &str = "amber-sync.log";

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr, filtered by `RUST_LOG` (default `warn`). With a log
/// directory, a daily-rotated file gets the same events; keep the returned
/// guard alive until exit so buffered lines are flushed.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_NAME);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = Config::load()?;

    let log_dir = cli.global.log_dir.clone().or_else(|| config.log_dir.clone());
    let _log_guard = init_tracing(log_dir.as_deref());
    debug!(api_url = %config.api_url, locale = %config.locale, "Configuration loaded");

    commands::run(cli.command, &cli.global, config).await
}
