//! Monitor engine
//!
//! Lifecycle owner for the ingestion subsystem. Spawns the connection manager
//! and the admission worker, hands out read-only views, and tears both down
//! through one cancellation token.

use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::{AggregateMetrics, CanonicalEvent};
use crate::feed::{
    AdmissionThrottle, AdmissionWorker, ConnectionManager, ConnectionState, Connector, EventBuffer,
    LinkState, MetricsStore,
};
use crate::infrastructure::config::StreamConfig;
use crate::infrastructure::metrics::{FeedStats, FeedStatsSnapshot};

/// Read-only handle on the monitor's published state. Cheap to clone.
#[derive(Clone)]
pub struct MonitorView {
    state: watch::Receiver<ConnectionState>,
    metrics: watch::Receiver<AggregateMetrics>,
    events: watch::Receiver<Arc<Vec<CanonicalEvent>>>,
    stats: Arc<FeedStats>,
}

impl MonitorView {
    pub fn connection_state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Connectivity indicator: `Connected` vs everything else
    pub fn is_connected(&self) -> bool {
        self.connection_state().is_connected()
    }

    pub fn metrics(&self) -> AggregateMetrics {
        *self.metrics.borrow()
    }

    /// Visible events, newest first
    pub fn events(&self) -> Arc<Vec<CanonicalEvent>> {
        self.events.borrow().clone()
    }

    pub fn stats(&self) -> FeedStatsSnapshot {
        self.stats.snapshot()
    }

    /// Receiver for awaiting connection state changes
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }
}

/// Running ingestion subsystem
pub struct MonitorEngine {
    view: MonitorView,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl MonitorEngine {
    /// Start the connection manager and admission worker.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<C: Connector>(config: &StreamConfig, connector: C) -> Self {
        let cancel = CancellationToken::new();
        let stats = Arc::new(FeedStats::new());

        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        let (events_tx, events_rx) = watch::channel(Arc::new(Vec::new()));
        let (cmd_tx, cmd_rx) = mpsc::channel(config.command_queue.max(1));
        let metrics = MetricsStore::new();

        let view = MonitorView {
            state: state_rx,
            metrics: metrics.subscribe(),
            events: events_rx,
            stats: stats.clone(),
        };

        let worker = AdmissionWorker::new(
            AdmissionThrottle::new(config.throttle_interval()),
            EventBuffer::new(config.buffer_capacity),
            cmd_rx,
            events_tx,
            stats.clone(),
            cancel.clone(),
        );

        let manager = ConnectionManager::new(
            connector,
            config.url.clone(),
            LinkState::new(config.backoff_schedule()),
            state_tx,
            metrics,
            cmd_tx,
            stats,
            cancel.clone(),
        );

        tracing::info!(
            url = %config.url,
            capacity = config.buffer_capacity,
            cadence_ms = config.throttle_interval_ms,
            "starting monitor engine"
        );

        let tasks = vec![tokio::spawn(worker.run()), tokio::spawn(manager.run())];

        Self { view, cancel, tasks }
    }

    pub fn view(&self) -> MonitorView {
        self.view.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.tasks.is_empty()
    }

    /// Close the socket, cancel any pending reconnect and stop the cadence.
    ///
    /// Idempotent; later calls return immediately.
    pub async fn shutdown(&mut self) {
        self.cancel.cancel();

        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                tracing::error!("monitor task failed: {}", e);
            }
        }
    }
}

impl Drop for MonitorEngine {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::EventId;
    use crate::test_utils::{snapshot_frame, tick_frame, MockConnector};
    use std::time::Duration;
    use tokio::time::sleep;

    fn config() -> StreamConfig {
        StreamConfig {
            url: "ws://feed.test/ws".to_string(),
            ..StreamConfig::default()
        }
    }

    fn ids(view: &MonitorView) -> Vec<String> {
        view.events().iter().map(|e| e.id.to_string()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_fill_buffer_newest_first() {
        let connector = MockConnector::new();
        let server = connector.accept_next();
        let mut engine = MonitorEngine::spawn(&config(), connector);
        let view = engine.view();

        for i in 0..3 {
            server.send_text(&tick_frame(&format!("e{}", i), 10.0));
        }
        sleep(Duration::from_millis(4600)).await;

        assert_eq!(ids(&view), vec!["e2", "e1", "e0"]);
        assert!(view.is_connected());
        assert_eq!(view.metrics().txn_per_min, 10.0);

        engine.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_admission_per_cadence() {
        let connector = MockConnector::new();
        let server = connector.accept_next();
        let mut engine = MonitorEngine::spawn(&config(), connector);
        let view = engine.view();

        for i in 0..10 {
            server.send_text(&tick_frame(&format!("e{}", i), 1.0));
        }

        sleep(Duration::from_millis(1400)).await;
        assert!(view.events().is_empty());

        // three cadence ticks: 1500, 3000, 4500
        sleep(Duration::from_millis(3200)).await;
        assert_eq!(view.events().len(), 3);
        assert_eq!(view.stats().pending_depth, 7);

        engine.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_capacity_bounds_buffer() {
        let connector = MockConnector::new();
        let server = connector.accept_next();
        let config = StreamConfig {
            buffer_capacity: 4,
            throttle_interval_ms: 100,
            ..config()
        };
        let mut engine = MonitorEngine::spawn(&config, connector);
        let view = engine.view();

        for i in 0..9 {
            server.send_text(&tick_frame(&format!("e{}", i), 1.0));
        }
        sleep(Duration::from_millis(2000)).await;

        assert_eq!(ids(&view), vec!["e8", "e7", "e6", "e5"]);
        assert_eq!(view.stats().events_admitted, 9);

        engine.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_tick_is_noop() {
        let connector = MockConnector::new();
        let server = connector.accept_next();
        let mut engine = MonitorEngine::spawn(&config(), connector);
        let view = engine.view();

        server.send_text(&tick_frame("e1", 1.0));
        server.send_text(
            r#"{"type":"tick","kpis":{},"event":{"event_id":"e1","risk_band":"LOW","fraud_probability":0.01}}"#,
        );
        sleep(Duration::from_millis(3100)).await;

        let events = view.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].fraud_probability, 0.9);
        assert_eq!(view.stats().duplicates_dropped, 1);
        // metrics still replaced wholesale by the duplicate's frame
        assert_eq!(view.metrics(), AggregateMetrics::ZERO);

        engine.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_is_immediate_and_clears_backlog() {
        let connector = MockConnector::new();
        let server = connector.accept_next();
        let mut engine = MonitorEngine::spawn(&config(), connector);
        let view = engine.view();

        for i in 0..5 {
            server.send_text(&tick_frame(&format!("t{}", i), 1.0));
        }
        sleep(Duration::from_millis(1600)).await;
        assert_eq!(ids(&view), vec!["t0"]);

        server.send_text(&snapshot_frame(&["s1", "s2", "s3"], 42.0));
        sleep(Duration::from_millis(10)).await;
        assert_eq!(ids(&view), vec!["s1", "s2", "s3"]);
        assert_eq!(view.metrics().txn_per_min, 42.0);

        // t1..t4 were pending when the snapshot arrived
        sleep(Duration::from_secs(20)).await;
        assert_eq!(ids(&view), vec!["s1", "s2", "s3"]);
        assert_eq!(view.stats().pending_discarded, 4);

        // later ticks flow again
        server.send_text(&tick_frame("t9", 1.0));
        sleep(Duration::from_millis(1600)).await;
        assert_eq!(view.events()[0].id, EventId::from("t9"));

        engine.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_resync_after_reconnect() {
        let connector = MockConnector::new();
        let first = connector.accept_next();
        let second = connector.accept_next();
        let mut engine = MonitorEngine::spawn(&config(), connector.clone());
        let view = engine.view();
        let mut state = view.subscribe_state();

        first.send_text(&snapshot_frame(&["a"], 1.0));
        sleep(Duration::from_millis(10)).await;
        first.hang_up();

        state.wait_for(|s| !s.is_connected()).await.unwrap();
        assert!(!view.is_connected());

        second.send_text(&snapshot_frame(&["b", "c"], 2.0));
        state.wait_for(|s| s.is_connected()).await.unwrap();
        sleep(Duration::from_millis(10)).await;

        assert_eq!(ids(&view), vec!["b", "c"]);
        assert_eq!(connector.attempts().len(), 2);
        assert_eq!(view.stats().snapshots, 2);

        engine.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_is_idempotent_and_final() {
        let connector = MockConnector::new();
        let server = connector.accept_next();
        let mut engine = MonitorEngine::spawn(&config(), connector.clone());
        let view = engine.view();

        sleep(Duration::from_millis(10)).await;
        assert!(view.is_connected());
        server.send_text(&tick_frame("late", 1.0));

        engine.shutdown().await;
        assert!(server.is_closed());
        assert!(!engine.is_running());
        assert_eq!(view.connection_state(), ConnectionState::Disconnected);

        engine.shutdown().await;

        // no reconnect and no cadence after teardown
        sleep(Duration::from_secs(60)).await;
        assert_eq!(connector.attempts().len(), 1);
        assert!(view.events().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_while_disconnected() {
        let connector = MockConnector::new();
        let mut engine = MonitorEngine::spawn(&config(), connector.clone());

        // first attempt refused, manager waiting in backoff
        sleep(Duration::from_millis(500)).await;
        engine.shutdown().await;

        sleep(Duration::from_secs(30)).await;
        assert_eq!(connector.attempts().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_tasks() {
        let connector = MockConnector::new();
        let engine = MonitorEngine::spawn(&config(), connector.clone());
        sleep(Duration::from_millis(10)).await;
        drop(engine);

        sleep(Duration::from_secs(30)).await;
        assert_eq!(connector.attempts().len(), 1);
    }
}
