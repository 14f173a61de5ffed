//! Logging setup: structured JSON file output with daily rotation plus a
//! human-readable stdout layer. `log`-facade records are bridged into
//! `tracing` so both macro families land in the same sinks.

use log::LevelFilter;
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_log::LogTracer;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Layer, Registry};

static LOG_DIR: OnceLock<PathBuf> = OnceLock::new();
static LOGGER_READY: OnceLock<()> = OnceLock::new();
static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Initialize the logging system. Safe to call more than once; later calls
/// are no-ops.
pub fn init_logger(log_dir: PathBuf) -> anyhow::Result<()> {
    if LOGGER_READY.get().is_some() {
        return Ok(());
    }

    std::fs::create_dir_all(&log_dir)?;
    let _ = LOG_DIR.set(log_dir.clone());

    // Forward log-crate records into tracing.
    let _ = LogTracer::builder()
        .with_max_level(LevelFilter::Trace)
        .init();

    let file_appender = rolling::daily(&log_dir, "rewardloop.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let _ = FILE_GUARD.set(guard);

    let json_layer = fmt::layer()
        .with_writer(non_blocking)
        .json()
        .with_current_span(false)
        .with_span_list(false)
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .with_filter(file_filter());

    let stdout_layer = fmt::layer()
        .with_target(true)
        .with_line_number(true)
        .with_ansi(true)
        .with_filter(stdout_filter());

    let subscriber = Registry::default().with(json_layer).with(stdout_layer);

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set global subscriber: {}", e))?;

    let _ = LOGGER_READY.set(());

    tracing::info!(
        target: "rewardloop::logging",
        log_dir = %log_dir.display(),
        version = env!("CARGO_PKG_VERSION"),
        "Logger initialized successfully"
    );

    Ok(())
}

fn file_filter() -> EnvFilter {
    let default_level = if cfg!(debug_assertions) {
        "debug,rewardloop=trace"
    } else {
        "info,rewardloop=info"
    };

    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

fn stdout_filter() -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info,rewardloop=debug"))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Log directory chosen at init time.
pub fn get_log_dir() -> Option<PathBuf> {
    LOG_DIR.get().cloned()
}
