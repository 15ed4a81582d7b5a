//! WebSocket client for the transaction feed

pub mod connection;

pub use connection::{WebSocketConnection, WsConnector, DEFAULT_CONNECT_TIMEOUT};
