//! CLI tool for closing overdue bookings
//!
//! Confirmed bookings whose period has ended become `missed`; checked-in
//! bookings that never checked out become `no-checkout`. Meant to be run by
//! cron.
//!
//! Usage:
//!   sweep-bookings [--config <path>] [--dry-run] [--verbose]
//!
//! Example cron entry (every 15 minutes):
//!   */15 * * * * /usr/local/bin/sweep-bookings --config /etc/seatdesk/config.yaml

use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{FixedOffset, Utc};
use seatdesk::{
    db,
    services::{BroadcastNotifier, NoopNotifier, StatusSweeper},
    AppConfig, AppState,
};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

struct Options {
    config_path: Option<PathBuf>,
    dry_run: bool,
    verbose: bool,
}

/// `None` when help was requested
fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Option<Options>> {
    let mut options = Options {
        config_path: None,
        dry_run: false,
        verbose: false,
    };

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let path = args.next().context("--config needs a path")?;
                options.config_path = Some(PathBuf::from(path));
            }
            "--dry-run" => options.dry_run = true,
            "--verbose" | "-v" => options.verbose = true,
            "--help" | "-h" => return Ok(None),
            other => bail!("Unknown argument: {other}"),
        }
    }
    Ok(Some(options))
}

#[tokio::main]
async fn main() -> Result<()> {
    let options = match parse_args(env::args().skip(1)) {
        Ok(Some(options)) => options,
        Ok(None) => {
            print_help();
            return Ok(());
        }
        Err(e) => {
            eprintln!("{e}");
            print_help();
            std::process::exit(2);
        }
    };
    let Options {
        config_path,
        dry_run,
        verbose,
    } = options;

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("SeatDesk - Booking Status Sweep");

    let config = match config_path {
        Some(ref path) => {
            info!("Config file: {}", path.display());
            AppConfig::load_from(Some(path.as_path()))?
        }
        None => {
            info!("Using default configuration paths");
            AppConfig::load()?
        }
    };

    let offset_minutes = config.booking.timezone_offset_minutes;
    let offset = FixedOffset::east_opt(offset_minutes * 60)
        .with_context(|| format!("Invalid timezone offset: {} minutes", offset_minutes))?;

    let pool = db::init_pool(&config.database).await?;
    info!("Connected to database: {}", config.database.url);

    // Nobody subscribes to events in a one-shot run
    let state = AppState::with_notifier(
        config,
        pool,
        BroadcastNotifier::new(),
        Arc::new(NoopNotifier),
    );
    let sweeper = StatusSweeper::new(state.db.clone(), state.ledger.clone(), offset);

    if dry_run {
        info!("Dry run mode - no booking will be changed");
    }

    let report = sweeper.sweep(Utc::now(), dry_run).await?;

    info!(
        "Examined {} bookings: {} missed, {} no-checkout, {} skipped, {} failed",
        report.examined, report.missed, report.no_checkout, report.skipped, report.failed
    );

    if report.failed > 0 {
        error!("{} bookings could not be transitioned", report.failed);
        std::process::exit(1);
    }

    Ok(())
}

fn print_help() {
    println!("SeatDesk - Booking Status Sweep");
    println!();
    println!("Usage:");
    println!("  sweep-bookings [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --config <path>   Path to configuration file");
    println!("  --dry-run         Report what would change without changing it");
    println!("  -v, --verbose     Enable verbose output");
    println!("  -h, --help        Show this help message");
    println!();
    println!("Example cron entry:");
    println!("  */15 * * * * /usr/local/bin/sweep-bookings --config /etc/seatdesk/config.yaml");
}
