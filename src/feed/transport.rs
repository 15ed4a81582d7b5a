//! Transport abstraction for the feed connection
//!
//! The connection manager only needs "open a stream" and "read the next
//! frame", so the persistent connection sits behind two small traits. The
//! WebSocket client implements them for production; tests plug in a scripted
//! in-memory transport.

use std::future::Future;

/// Application-level frame delivered by a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
}

/// Socket-level failures. Never fatal: every one leads to a backoff reconnect.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("connect failed: {0}")]
    Connect(String),
    #[error("connect timed out")]
    Timeout,
    #[error("receive failed: {0}")]
    Receive(String),
}

/// Opens connections to a feed endpoint
pub trait Connector: Send + Sync + 'static {
    type Stream: FrameStream;

    /// Open a new connection to `url`
    fn connect(&self, url: &str) -> impl Future<Output = Result<Self::Stream, TransportError>> + Send;
}

/// An open connection
///
/// # Contract
/// - `next_frame` returns `None` once the peer closed the connection
/// - `next_frame` must be cancel-safe (it is polled inside `select!`)
/// - `close` is best-effort and may be called more than once
pub trait FrameStream: Send + 'static {
    fn next_frame(&mut self) -> impl Future<Output = Option<Result<Frame, TransportError>>> + Send;

    fn close(&mut self) -> impl Future<Output = ()> + Send;
}
