//! SeatDesk - seat and booking service for libraries
//!
//! Serves the seat, time slot, booking and statistics API over HTTP.

use std::env;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use axum::{http::HeaderValue, Router};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::{info, warn, Level};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, fmt::MakeWriter, prelude::*, EnvFilter, Layer, Registry};

use seatdesk::config::{LogFormat, LogTarget, LoggingConfig};
use seatdesk::{api, db, AppConfig, AppState};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        print_help();
        return Ok(());
    }

    if args.iter().any(|arg| arg == "--version" || arg == "-V") {
        println!("SeatDesk {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    if let Some(pos) = args.iter().position(|arg| arg == "--init-config") {
        let path = args
            .get(pos + 1)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("config.yaml"));
        AppConfig::create_default_config(&path)
            .with_context(|| format!("Failed to write configuration to {:?}", path))?;
        println!("Wrote default configuration to {}", path.display());
        return Ok(());
    }

    // Configuration decides the log format, so it loads before logging
    let config = AppConfig::load().context("Failed to load configuration")?;

    // Dropping the guard flushes buffered file output
    let _log_guard = init_logging(&config.logging);

    info!(version = env!("CARGO_PKG_VERSION"), "SeatDesk starting up");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.server.workers.max(1))
        .enable_all()
        .build()
        .context("Failed to build async runtime")?;

    runtime.block_on(serve(config))
}

async fn serve(config: AppConfig) -> Result<()> {
    ensure_data_directory(&config.database.url)?;

    info!("Initializing database connection");
    let db = db::init_pool(&config.database)
        .await
        .context("Failed to initialize database")?;

    let state = AppState::new(config.clone(), db);
    let app = create_router(state, &config);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address configuration")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("SeatDesk stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

/// Install the global subscriber. Returns the file writer guard, if any.
fn init_logging(log: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.level));

    let mut layers: Vec<BoxedLayer> = Vec::new();
    let mut guard = None;

    if matches!(log.target, LogTarget::Console | LogTarget::Both) {
        layers.push(format_layer(log.format, std::io::stdout, true));
    }
    if matches!(log.target, LogTarget::File | LogTarget::Both) {
        let (writer, file_guard) = file_writer(log);
        layers.push(format_layer(log.format, writer, false));
        guard = Some(file_guard);
    }

    tracing_subscriber::registry().with(layers).with(filter).init();
    guard
}

fn format_layer<W>(format: LogFormat, writer: W, ansi: bool) -> BoxedLayer
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = fmt::layer().with_writer(writer).with_ansi(ansi);
    match format {
        LogFormat::Json => layer.json().with_target(true).boxed(),
        LogFormat::Compact => layer.compact().with_target(false).boxed(),
        LogFormat::Pretty => layer.with_target(true).with_line_number(false).boxed(),
    }
}

/// Non-blocking writer over a (optionally daily) rolling log file
fn file_writer(log: &LoggingConfig) -> (NonBlocking, WorkerGuard) {
    if let Err(e) = std::fs::create_dir_all(&log.log_dir) {
        eprintln!("Warning: Failed to create log directory {:?}: {}", log.log_dir, e);
    }

    let rotation = if log.daily_rotation {
        Rotation::DAILY
    } else {
        Rotation::NEVER
    };

    let mut builder = RollingFileAppender::builder()
        .rotation(rotation)
        .filename_prefix(&log.log_prefix);
    if log.max_log_files > 0 {
        builder = builder.max_log_files(log.max_log_files);
    }

    let appender = builder.build(&log.log_dir).unwrap_or_else(|e| {
        eprintln!("Warning: Failed to configure log rotation: {}", e);
        tracing_appender::rolling::never(&log.log_dir, &log.log_prefix)
    });

    tracing_appender::non_blocking(appender)
}

/// Create the parent directory of a file-backed SQLite database
fn ensure_data_directory(database_url: &str) -> Result<()> {
    let Some(path) = database_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let path = path.split('?').next().unwrap_or(path);

    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).context("Failed to create data directory")?;
            info!("Created data directory: {:?}", parent);
        }
    }
    Ok(())
}

/// CORS for the configured origins; an empty list allows any origin
fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.is_empty() {
        return cors.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();
    cors.allow_origin(allowed)
}

fn create_router(state: AppState, config: &AppConfig) -> Router {
    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    api::router(state)
        .layer(CompressionLayer::new())
        .layer(trace_layer)
        .layer(cors_layer(&config.server.cors_origins))
}

fn print_help() {
    println!(
        r#"SeatDesk {}

USAGE:
    seatdesk [OPTIONS]

OPTIONS:
    -h, --help              Print this help message
    -V, --version           Print version information
    --init-config [PATH]    Write a default configuration file
                            (default: ./config.yaml) and exit

ENVIRONMENT:
    SEATDESK_CONFIG                   Path to configuration file
    SEATDESK_HOST, SEATDESK_PORT      Listen address
    SEATDESK_WORKERS                  Async worker threads
    DATABASE_URL                      SQLite database URL
    JWT_SECRET                        Token signing secret
    RUST_LOG                          Log filter
    SEATDESK_LOG_FORMAT               pretty, json or compact
    SEATDESK_LOG_TARGET               console, file or both
    SEATDESK_LOG_DIR                  Directory for log files
    SEATDESK_MAX_BULK_SEATS           Largest seat batch accepted
    SEATDESK_TIMEZONE_OFFSET_MINUTES  Library wall clock offset from UTC

CONFIGURATION FILES (first match wins):
    $SEATDESK_CONFIG
    ./config.yaml
    ./config/config.yaml
    /etc/seatdesk/config.yaml
    ~/.config/seatdesk/config.yaml"#,
        env!("CARGO_PKG_VERSION")
    );
}
