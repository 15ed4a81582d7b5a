//! Test utilities: event builders, wire frame builders and a scripted
//! in-memory transport.
//!
//! `MockConnector` hands out connections in the order they were scripted;
//! once the script runs out every further attempt is refused.

use parking_lot::Mutex;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::core::{CanonicalEvent, EventId, RiskBand, Timestamp};
use crate::feed::transport::{Connector, Frame, FrameStream, TransportError};

/// Event with fixed, recognisable field values
pub fn event(id: &str) -> CanonicalEvent {
    CanonicalEvent {
        id: EventId::from(id),
        timestamp: Timestamp::from_unix_millis(1_700_000_000_000).unwrap(),
        risk_band: RiskBand::High,
        decision: "BLOCK".to_string(),
        fraud_probability: 0.9,
        latency_ms: 4.0,
        source: "INTERNET".to_string(),
        device_os: "linux".to_string(),
        payment_type: "AA".to_string(),
        analyst_action: None,
    }
}

fn raw_event(id: &str) -> serde_json::Value {
    json!({
        "event_id": id,
        "ts": 1700000000,
        "risk_band": "HIGH",
        "decision": "BLOCK",
        "fraud_probability": 0.9,
        "latency_ms": 4.0,
        "source": "INTERNET",
        "device_os": "linux",
        "payment_type": "AA",
    })
}

fn kpis(txn_per_min: f64) -> serde_json::Value {
    json!({
        "txn_per_min": txn_per_min,
        "alerts_per_min": 1.0,
        "high_risk_pct": 10.0,
        "avg_latency_ms": 4.0,
    })
}

/// `tick` frame carrying one event
pub fn tick_frame(id: &str, txn_per_min: f64) -> String {
    json!({"type": "tick", "kpis": kpis(txn_per_min), "event": raw_event(id)}).to_string()
}

/// `snapshot` frame carrying `ids` in order
pub fn snapshot_frame(ids: &[&str], txn_per_min: f64) -> String {
    let events: Vec<_> = ids.iter().map(|id| raw_event(id)).collect();
    json!({"type": "snapshot", "kpis": kpis(txn_per_min), "recent_events": events}).to_string()
}

enum Incoming {
    Frame(Frame),
    Error(String),
}

enum Outcome {
    Accept(MockStream),
    Refuse,
}

#[derive(Default)]
struct Script {
    outcomes: VecDeque<Outcome>,
    attempts: Vec<Instant>,
}

/// Scripted connector. Clones share the same script.
#[derive(Clone, Default)]
pub struct MockConnector {
    script: Arc<Mutex<Script>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next attempt succeeds; the returned handle plays the server side
    pub fn accept_next(&self) -> MockServer {
        let (tx, rx) = mpsc::unbounded_channel();
        let closed = Arc::new(AtomicBool::new(false));
        self.script.lock().outcomes.push_back(Outcome::Accept(MockStream {
            rx,
            closed: closed.clone(),
        }));
        MockServer { tx, closed }
    }

    /// Next attempt fails
    pub fn refuse_next(&self) {
        self.script.lock().outcomes.push_back(Outcome::Refuse);
    }

    /// Time of every connect attempt so far
    pub fn attempts(&self) -> Vec<Instant> {
        self.script.lock().attempts.clone()
    }

    /// Milliseconds between consecutive attempts
    pub fn attempt_gaps_ms(&self) -> Vec<u64> {
        self.attempts()
            .windows(2)
            .map(|w| (w[1] - w[0]).as_millis() as u64)
            .collect()
    }
}

impl Connector for MockConnector {
    type Stream = MockStream;

    async fn connect(&self, _url: &str) -> Result<MockStream, TransportError> {
        let mut script = self.script.lock();
        script.attempts.push(Instant::now());
        match script.outcomes.pop_front() {
            Some(Outcome::Accept(stream)) => Ok(stream),
            Some(Outcome::Refuse) | None => Err(TransportError::Connect("refused".to_string())),
        }
    }
}

/// Client side of a scripted connection
pub struct MockStream {
    rx: mpsc::UnboundedReceiver<Incoming>,
    closed: Arc<AtomicBool>,
}

impl FrameStream for MockStream {
    async fn next_frame(&mut self) -> Option<Result<Frame, TransportError>> {
        match self.rx.recv().await? {
            Incoming::Frame(frame) => Some(Ok(frame)),
            Incoming::Error(msg) => Some(Err(TransportError::Receive(msg))),
        }
    }

    async fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
        self.rx.close();
    }
}

/// Server side of a scripted connection
pub struct MockServer {
    tx: mpsc::UnboundedSender<Incoming>,
    closed: Arc<AtomicBool>,
}

impl MockServer {
    pub fn send_text(&self, text: &str) {
        let _ = self.tx.send(Incoming::Frame(Frame::Text(text.to_string())));
    }

    pub fn send_binary(&self, bytes: Vec<u8>) {
        let _ = self.tx.send(Incoming::Frame(Frame::Binary(bytes)));
    }

    /// Deliver a transport error to the client
    pub fn send_error(&self, msg: &str) {
        let _ = self.tx.send(Incoming::Error(msg.to_string()));
    }

    /// Close from the server side
    pub fn hang_up(self) {
        drop(self.tx);
    }

    /// Whether the client closed its end
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
