//! Infrastructure - cold path only
//!
//! This module contains non-latency-critical code:
//! - Logging and feed statistics
//! - Configuration management
//! - Status API server

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;

pub use api::{router, start_server, ApiState};
pub use config::{ApiConfig, Config, ConfigError, LoggingConfig, StreamConfig};
pub use metrics::{FeedStats, FeedStatsSnapshot};
