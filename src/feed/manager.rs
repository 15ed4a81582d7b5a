//! Connection manager
//!
//! Owns the feed socket. Opens it, hands every frame to the decoder, routes
//! decoded messages (metrics to the `MetricsStore`, events to the admission
//! worker) and reconnects with backoff when the socket closes.
//!
//! Every suspension point also watches the cancellation token, so teardown
//! never leaves a socket open or a reconnect scheduled.

use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::Level;

use super::link::{ConnectionState, LinkState};
use super::metrics_store::MetricsStore;
use super::throttle::AdmissionCommand;
use super::transport::{Connector, Frame, FrameStream, TransportError};
use crate::core::StreamMessage;
use crate::decode::{DecodeError, MessageDecoder};
use crate::infrastructure::metrics::FeedStats;

/// Why a connected session ended
#[derive(Debug)]
enum SessionEnd {
    /// Peer closed (or sent a Close frame)
    Closed,
    /// Transport error; the socket still has to be closed
    Errored(TransportError),
    /// Teardown requested
    Cancelled,
}

pub struct ConnectionManager<C: Connector> {
    connector: C,
    url: String,
    link: LinkState,
    state_tx: watch::Sender<ConnectionState>,
    metrics: MetricsStore,
    admissions: mpsc::Sender<AdmissionCommand>,
    stats: Arc<FeedStats>,
    cancel: CancellationToken,
}

impl<C: Connector> ConnectionManager<C> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        connector: C,
        url: impl Into<String>,
        link: LinkState,
        state_tx: watch::Sender<ConnectionState>,
        metrics: MetricsStore,
        admissions: mpsc::Sender<AdmissionCommand>,
        stats: Arc<FeedStats>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            connector,
            url: url.into(),
            link,
            state_tx,
            metrics,
            admissions,
            stats,
            cancel,
        }
    }

    /// Connect / read / reconnect until cancelled
    pub async fn run(mut self) {
        loop {
            let state = self.link.connecting();
            self.publish(state);
            self.stats.record_connect_attempt();
            crate::log_stream!(
                Level::INFO,
                url = %self.url,
                retries = self.link.retries(),
                "connecting to feed"
            );

            let opened = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                res = self.connector.connect(&self.url) => res,
            };

            match opened {
                Ok(mut stream) => {
                    let state = self.link.opened();
                    self.publish(state);
                    self.stats.record_connection_opened();
                    crate::log_stream!(Level::INFO, url = %self.url, "feed connected");

                    let end = self.pump(&mut stream).await;
                    match end {
                        SessionEnd::Cancelled => {
                            stream.close().await;
                            break;
                        }
                        SessionEnd::Errored(err) => {
                            crate::log_stream!(Level::WARN, error = %err, "feed transport error");
                            let state = self.link.errored();
                            self.publish(state);
                            stream.close().await;
                        }
                        SessionEnd::Closed => {
                            crate::log_stream!(Level::WARN, "feed closed by peer");
                            stream.close().await;
                        }
                    }
                }
                Err(err) => {
                    // A failed open counts as error followed by close
                    crate::log_stream!(Level::WARN, error = %err, "feed connect failed");
                    let state = self.link.errored();
                    self.publish(state);
                }
            }

            let delay = self.link.closed();
            self.publish(ConnectionState::Closed);
            crate::log_stream!(
                Level::INFO,
                delay_ms = delay.as_millis() as u64,
                retries = self.link.retries(),
                "scheduling reconnect"
            );

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        let state = self.link.shut_down();
        self.publish(state);
        crate::log_stream!(Level::INFO, "connection manager stopped");
    }

    /// Read frames until the session ends
    async fn pump(&mut self, stream: &mut C::Stream) -> SessionEnd {
        loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return SessionEnd::Cancelled,
                frame = stream.next_frame() => match frame {
                    Some(Ok(frame)) => self.dispatch(frame).await,
                    Some(Err(err)) => return SessionEnd::Errored(err),
                    None => return SessionEnd::Closed,
                },
            }
        }
    }

    async fn dispatch(&mut self, frame: Frame) {
        self.stats.record_frame();

        let decoded = match &frame {
            Frame::Text(text) => MessageDecoder::decode(text),
            Frame::Binary(bytes) => MessageDecoder::decode_bytes(bytes),
        };

        match decoded {
            Ok(message) => self.apply(message).await,
            Err(DecodeError::UnknownType(kind)) => {
                self.stats.record_decode_failure();
                tracing::debug!(kind = %kind, "ignoring unrecognized message type");
            }
            Err(err) => {
                self.stats.record_decode_failure();
                tracing::warn!(error = %err, "dropping undecodable frame");
            }
        }
    }

    async fn apply(&mut self, message: StreamMessage) {
        // Every message replaces the metrics wholesale
        self.metrics.replace(*message.metrics());

        match message {
            StreamMessage::Snapshot { events, .. } => {
                self.stats.record_snapshot();
                tracing::debug!(events = events.len(), "snapshot received");
                // Bypasses the throttle: resync state must be immediate
                self.send(AdmissionCommand::Replace(events)).await;
            }
            StreamMessage::Tick { event, .. } => {
                self.stats.record_tick();
                if let Some(event) = event {
                    self.send(AdmissionCommand::Enqueue(event)).await;
                }
            }
        }
    }

    async fn send(&self, cmd: AdmissionCommand) {
        if self.admissions.send(cmd).await.is_err() {
            tracing::debug!("admission worker stopped; dropping command");
        }
    }

    fn publish(&self, state: ConnectionState) {
        self.state_tx.send_replace(state);
    }
}
