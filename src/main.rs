//! Real-time transaction monitor
//!
//! # Architecture
//! - **core**: Canonical event, metrics and message types
//! - **decode**: Lenient wire decoder
//! - **feed**: Connection manager, admission throttle, event buffer
//! - **ws**: WebSocket transport
//! - **infrastructure**: Cold path (logging, stats, config, api)

use anyhow::Context;
use std::sync::Arc;
use txn_monitor::core::ActionOverlay;
use txn_monitor::infrastructure::{logging::init_logging, start_server, ApiState};
use txn_monitor::ws::WsConnector;
use txn_monitor::{Config, MonitorEngine};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;

    // Guards flush the file appenders on drop
    let _guards = init_logging(&config.logging).context("failed to initialize logging")?;

    config.validate()?;
    tracing::info!("Starting transaction monitor...");

    let mut engine = MonitorEngine::spawn(
        &config.stream,
        WsConnector::new(config.stream.connect_timeout()),
    );

    if config.api.enabled {
        let state = ApiState {
            view: engine.view(),
            overlay: Arc::new(ActionOverlay::new()),
        };
        let api_config = config.api.clone();
        tokio::spawn(async move {
            if let Err(e) = start_server(state, &api_config).await {
                tracing::error!("API Server failed: {}", e);
            }
        });
    }

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;

    tracing::info!("Shutdown requested");
    engine.shutdown().await;
    tracing::info!("Transaction monitor stopped");

    Ok(())
}
