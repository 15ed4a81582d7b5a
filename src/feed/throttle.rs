//! Paced admission of pending events into the visible buffer
//!
//! Events arriving on ticks wait in a FIFO queue. A fixed cadence moves at
//! most one of them into the `EventBuffer` per interval, so consumers see a
//! steady rate of change regardless of how bursty the feed is.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::buffer::{Admission, EventBuffer};
use crate::core::CanonicalEvent;
use crate::infrastructure::metrics::FeedStats;

/// Default cadence between admissions
pub const DEFAULT_CADENCE: Duration = Duration::from_millis(1500);

/// Pending FIFO plus the admission step
#[derive(Debug)]
pub struct AdmissionThrottle {
    pending: VecDeque<CanonicalEvent>,
    cadence: Duration,
}

impl AdmissionThrottle {
    pub fn new(cadence: Duration) -> Self {
        Self {
            pending: VecDeque::new(),
            cadence,
        }
    }

    #[inline]
    pub fn enqueue(&mut self, event: CanonicalEvent) {
        self.pending.push_back(event);
    }

    /// Drop everything still waiting. Returns how many were discarded.
    pub fn clear(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }

    /// Pop the oldest pending event into `buffer`. `None` if nothing was pending.
    pub fn drain_one(&mut self, buffer: &mut EventBuffer) -> Option<Admission> {
        let event = self.pending.pop_front()?;
        Some(buffer.admit_one(event))
    }

    #[inline]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    #[inline]
    pub fn cadence(&self) -> Duration {
        self.cadence
    }
}

impl Default for AdmissionThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_CADENCE)
    }
}

/// Instructions from the connection manager to the admission worker.
///
/// Both kinds share one ordered channel so a snapshot is never overtaken by
/// ticks sent before it.
#[derive(Debug)]
pub enum AdmissionCommand {
    /// Queue a tick's event for paced admission
    Enqueue(CanonicalEvent),
    /// Snapshot: clear pending and replace the buffer immediately
    Replace(Vec<CanonicalEvent>),
}

/// Owns the pending queue, the buffer and the cadence timer
pub struct AdmissionWorker {
    throttle: AdmissionThrottle,
    buffer: EventBuffer,
    commands: mpsc::Receiver<AdmissionCommand>,
    events_tx: watch::Sender<Arc<Vec<CanonicalEvent>>>,
    stats: Arc<FeedStats>,
    cancel: CancellationToken,
}

impl AdmissionWorker {
    pub fn new(
        throttle: AdmissionThrottle,
        buffer: EventBuffer,
        commands: mpsc::Receiver<AdmissionCommand>,
        events_tx: watch::Sender<Arc<Vec<CanonicalEvent>>>,
        stats: Arc<FeedStats>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            throttle,
            buffer,
            commands,
            events_tx,
            stats,
            cancel,
        }
    }

    /// Run until cancelled or the command channel closes
    pub async fn run(mut self) {
        let cadence = self.throttle.cadence();
        let mut ticker = interval_at(Instant::now() + cadence, cadence);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                cmd = self.commands.recv() => match cmd {
                    Some(cmd) => self.apply(cmd),
                    None => break,
                },
                _ = ticker.tick() => self.admit_next(),
            }
        }

        tracing::debug!(pending = self.throttle.pending_len(), "admission worker stopped");
    }

    fn apply(&mut self, cmd: AdmissionCommand) {
        match cmd {
            AdmissionCommand::Enqueue(event) => {
                self.throttle.enqueue(event);
                self.stats.record_enqueued();
            }
            AdmissionCommand::Replace(events) => {
                let dropped = self.throttle.clear();
                if dropped > 0 {
                    tracing::debug!(dropped, "snapshot superseded pending events");
                    self.stats.record_pending_discarded(dropped as u64);
                }
                self.buffer.replace_all(events);
                self.publish();
            }
        }
        self.stats.set_pending_depth(self.throttle.pending_len() as u64);
    }

    fn admit_next(&mut self) {
        let Some(outcome) = self.throttle.drain_one(&mut self.buffer) else {
            return;
        };

        match outcome {
            Admission::Admitted => {
                self.stats.record_admitted();
                self.publish();
            }
            Admission::Duplicate => self.stats.record_duplicate(),
        }
        self.stats.set_pending_depth(self.throttle.pending_len() as u64);
    }

    fn publish(&self) {
        self.events_tx.send_replace(Arc::new(self.buffer.to_vec()));
    }
}
