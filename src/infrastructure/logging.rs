//! Centralized file-based logging system
//!
//! Writes logs to files under the configured directory, separated by log type:
//! - main/   - General application logs (JSON lines unless disabled)
//! - error/  - Error and warning logs only
//! - stream/ - Feed connection, decoding and admission logs
//! - api/    - API server logs

use std::fs;
use std::io;
use std::path::Path;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    filter::{filter_fn, LevelFilter},
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::infrastructure::config::LoggingConfig;

const LOG_TYPES: [&str; 4] = ["main", "error", "stream", "api"];

/// Initialize centralized file logging
///
/// Creates the log directory tree and sets up file appenders for each log type.
/// Returns WorkerGuards which must be kept alive for the duration of the program.
pub fn init_logging(config: &LoggingConfig) -> io::Result<Vec<WorkerGuard>> {
    let logs_dir = config.directory.as_path();
    for log_type in LOG_TYPES {
        fs::create_dir_all(logs_dir.join(log_type))?;
    }

    let mut guards = Vec::with_capacity(LOG_TYPES.len());

    let (main_appender, guard) = create_appender(logs_dir, "main");
    guards.push(guard);
    let (error_appender, guard) = create_appender(logs_dir, "error");
    guards.push(guard);
    let (stream_appender, guard) = create_appender(logs_dir, "stream");
    guards.push(guard);
    let (api_appender, guard) = create_appender(logs_dir, "api");
    guards.push(guard);

    // Main log - all logs
    let main_layer = tracing_subscriber::fmt::layer()
        .with_writer(main_appender)
        .with_ansi(false)
        .with_target(true)
        .with_thread_names(true);
    let main_layer = if config.json {
        main_layer.json().boxed()
    } else {
        main_layer.boxed()
    };

    let error_layer = tracing_subscriber::fmt::layer()
        .with_writer(error_appender)
        .with_ansi(false)
        .with_target(true)
        .with_filter(LevelFilter::WARN);

    let stream_layer = tracing_subscriber::fmt::layer()
        .with_writer(stream_appender)
        .with_ansi(false)
        .with_target(true)
        .with_filter(filter_fn(|metadata| is_stream_target(metadata.target())));

    let api_layer = tracing_subscriber::fmt::layer()
        .with_writer(api_appender)
        .with_ansi(false)
        .with_target(true)
        .with_filter(filter_fn(|metadata| is_api_target(metadata.target())));

    // Console layer for development
    let console_layer = tracing_subscriber::fmt::layer().with_target(true);

    // RUST_LOG wins over the configured level
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(main_layer)
        .with(error_layer)
        .with(stream_layer)
        .with(api_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

    tracing::info!(
        directory = %logs_dir.display(),
        "Logging system initialized"
    );

    Ok(guards)
}

fn is_stream_target(target: &str) -> bool {
    target == "stream"
        || target.contains("::feed")
        || target.contains("::ws")
        || target.contains("::decode")
        || target.contains("tungstenite")
}

fn is_api_target(target: &str) -> bool {
    target == "api" || target.contains("::infrastructure::api") || target.starts_with("tower_http")
}

/// Create a daily rolling file appender under `<dir>/<name>/`
fn create_appender(dir: &Path, name: &str) -> (NonBlocking, WorkerGuard) {
    let appender = RollingFileAppender::new(Rotation::DAILY, dir.join(name), name);
    tracing_appender::non_blocking(appender)
}

/// Log macro helpers for specific log types
#[macro_export]
macro_rules! log_stream {
    ($level:expr, $($arg:tt)+) => {
        tracing::event!(target: "stream", $level, $($arg)+)
    };
}

#[macro_export]
macro_rules! log_api {
    ($level:expr, $($arg:tt)+) => {
        tracing::event!(target: "api", $level, $($arg)+)
    };
}
