//! WebSocket transport for the feed
//!
//! tokio-tungstenite client implementing `Connector` / `FrameStream`.
//! - Connect bounded by a timeout
//! - TCP_NODELAY on plain sockets
//! - Ping/Pong answered by tungstenite; control frames never reach the manager

use futures_util::StreamExt;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::{
    connect_async,
    tungstenite::protocol::Message,
    MaybeTlsStream, WebSocketStream,
};

use crate::feed::transport::{Connector, Frame, FrameStream, TransportError};

/// Default time allowed for the WebSocket handshake
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Opens `WebSocketConnection`s
#[derive(Debug, Clone)]
pub struct WsConnector {
    connect_timeout: Duration,
}

impl WsConnector {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

impl Default for WsConnector {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECT_TIMEOUT)
    }
}

impl Connector for WsConnector {
    type Stream = WebSocketConnection;

    async fn connect(&self, url: &str) -> Result<WebSocketConnection, TransportError> {
        WebSocketConnection::connect(url, self.connect_timeout).await
    }
}

/// Open WebSocket connection to the feed
pub struct WebSocketConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    /// Set once a Close frame was seen or `close` ran
    closed: bool,
    url: String,
}

impl WebSocketConnection {
    /// Connect to a ws:// or wss:// endpoint
    pub async fn connect(url: &str, connect_timeout: Duration) -> Result<Self, TransportError> {
        let (ws_stream, _) = timeout(connect_timeout, connect_async(url))
            .await
            .map_err(|_| TransportError::Timeout)?
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        if let MaybeTlsStream::Plain(ref tcp) = ws_stream.get_ref() {
            tcp.set_nodelay(true)
                .map_err(|e| TransportError::Connect(e.to_string()))?;
        }

        Ok(Self {
            stream: ws_stream,
            closed: false,
            url: url.to_string(),
        })
    }
}

impl FrameStream for WebSocketConnection {
    async fn next_frame(&mut self) -> Option<Result<Frame, TransportError>> {
        if self.closed {
            return None;
        }

        loop {
            match self.stream.next().await {
                Some(Ok(msg)) => {
                    match msg {
                        Message::Text(text) => return Some(Ok(Frame::Text(text.as_str().to_owned()))),
                        Message::Binary(bytes) => return Some(Ok(Frame::Binary(bytes.to_vec()))),
                        Message::Close(_) => {
                            self.closed = true;
                            return None;
                        }
                        // Ping/Pong/raw frames are handled by tungstenite
                        _ => continue,
                    }
                }
                Some(Err(e)) => return Some(Err(TransportError::Receive(e.to_string()))),
                None => {
                    self.closed = true;
                    return None;
                }
            }
        }
    }

    async fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.stream.close(None).await {
            tracing::debug!(url = %self.url, error = %e, "websocket close failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_connect_timeout() {
        let connector = WsConnector::default();
        assert_eq!(connector.connect_timeout, Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_connect_refused_is_transport_error() {
        // Bind then drop to get a port with nothing listening
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let connector = WsConnector::new(Duration::from_secs(2));
        let result = connector.connect(&format!("ws://{}/ws", addr)).await;
        assert!(matches!(
            result,
            Err(TransportError::Connect(_)) | Err(TransportError::Timeout)
        ));
    }
}
