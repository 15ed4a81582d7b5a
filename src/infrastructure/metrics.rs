//! Ingestion health counters
//!
//! Lock-free counters using atomic operations.
//! Updated by the feed tasks, exported via API as a snapshot.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Instant, SystemTime};

/// Feed statistics collector
///
/// Shared between the connection manager and the admission worker.
pub struct FeedStats {
    /// Frames read from the socket
    frames_received: AtomicU64,
    /// Frames dropped by the decoder
    decode_failures: AtomicU64,
    /// Snapshot messages applied
    snapshots: AtomicU64,
    /// Tick messages applied
    ticks: AtomicU64,
    /// Events queued for admission
    events_enqueued: AtomicU64,
    /// Events moved into the buffer
    events_admitted: AtomicU64,
    /// Admissions skipped because the id was already buffered
    duplicates_dropped: AtomicU64,
    /// Pending events discarded by a snapshot
    pending_discarded: AtomicU64,
    /// Current pending queue depth
    pending_depth: AtomicU64,
    /// Open attempts, successful or not
    connect_attempts: AtomicU64,
    /// Successful opens
    connections_opened: AtomicU64,
    /// Last frame timestamp (Unix millis, 0 = never)
    last_frame_time: AtomicU64,
    /// Start time for uptime calculation
    start_time: Instant,
}

/// Stats snapshot for API export
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedStatsSnapshot {
    pub frames_received: u64,
    pub decode_failures: u64,
    pub snapshots: u64,
    pub ticks: u64,
    pub events_enqueued: u64,
    pub events_admitted: u64,
    pub duplicates_dropped: u64,
    pub pending_discarded: u64,
    pub pending_depth: u64,
    pub connect_attempts: u64,
    pub connections_opened: u64,
    /// Frames per second since start
    pub frame_rate: f64,
    pub uptime_seconds: u64,
    /// Milliseconds since the last frame, `None` if nothing arrived yet
    pub idle_ms: Option<u64>,
}

impl FeedStats {
    pub fn new() -> Self {
        Self {
            frames_received: AtomicU64::new(0),
            decode_failures: AtomicU64::new(0),
            snapshots: AtomicU64::new(0),
            ticks: AtomicU64::new(0),
            events_enqueued: AtomicU64::new(0),
            events_admitted: AtomicU64::new(0),
            duplicates_dropped: AtomicU64::new(0),
            pending_discarded: AtomicU64::new(0),
            pending_depth: AtomicU64::new(0),
            connect_attempts: AtomicU64::new(0),
            connections_opened: AtomicU64::new(0),
            last_frame_time: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    #[inline]
    pub fn record_frame(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
        self.last_frame_time.store(unix_millis(), Ordering::Relaxed);
    }

    #[inline]
    pub fn record_decode_failure(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_snapshot(&self) {
        self.snapshots.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_tick(&self) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_enqueued(&self) {
        self.events_enqueued.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_admitted(&self) {
        self.events_admitted.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_duplicate(&self) {
        self.duplicates_dropped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_pending_discarded(&self, count: u64) {
        self.pending_discarded.fetch_add(count, Ordering::Relaxed);
    }

    #[inline]
    pub fn set_pending_depth(&self, depth: u64) {
        self.pending_depth.store(depth, Ordering::Relaxed);
    }

    pub fn record_connect_attempt(&self) {
        self.connect_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_connection_opened(&self) {
        self.connections_opened.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current snapshot of stats
    pub fn snapshot(&self) -> FeedStatsSnapshot {
        let frames = self.frames_received.load(Ordering::Relaxed);
        let uptime = self.start_time.elapsed().as_secs();
        let rate = if uptime > 0 {
            frames as f64 / uptime as f64
        } else {
            0.0
        };

        let last = self.last_frame_time.load(Ordering::Relaxed);
        let idle_ms = (last != 0).then(|| unix_millis().saturating_sub(last));

        FeedStatsSnapshot {
            frames_received: frames,
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            snapshots: self.snapshots.load(Ordering::Relaxed),
            ticks: self.ticks.load(Ordering::Relaxed),
            events_enqueued: self.events_enqueued.load(Ordering::Relaxed),
            events_admitted: self.events_admitted.load(Ordering::Relaxed),
            duplicates_dropped: self.duplicates_dropped.load(Ordering::Relaxed),
            pending_discarded: self.pending_discarded.load(Ordering::Relaxed),
            pending_depth: self.pending_depth.load(Ordering::Relaxed),
            connect_attempts: self.connect_attempts.load(Ordering::Relaxed),
            connections_opened: self.connections_opened.load(Ordering::Relaxed),
            frame_rate: rate,
            uptime_seconds: uptime,
            idle_ms,
        }
    }
}

impl Default for FeedStats {
    fn default() -> Self {
        Self::new()
    }
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
