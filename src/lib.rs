//! Real-time scored-transaction monitor
//!
//! Ingestion client for a fraud-scoring feed: decodes snapshot/tick frames,
//! keeps the latest aggregate metrics and a bounded, paced, deduplicated
//! window of recent events, and reconnects on a backoff schedule.

pub mod core;
pub mod decode;
pub mod engine;
pub mod feed;
pub mod infrastructure;
pub mod ws;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types
pub use engine::{MonitorEngine, MonitorView};
pub use infrastructure::config::{ApiConfig, Config, LoggingConfig, StreamConfig};

use thiserror::Error;

/// Main error type for the monitor
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Configuration error: {0}")]
    Config(#[from] infrastructure::config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("API server error: {0}")]
    Api(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, MonitorError>;
