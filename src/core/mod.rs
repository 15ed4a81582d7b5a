//! Core types for the transaction feed

pub mod event;
pub mod message;
pub mod metrics;
pub mod overlay;
pub mod timestamp;

pub use event::{AnalystAction, CanonicalEvent, EventId, RiskBand, NOT_AVAILABLE, UNKNOWN};
pub use message::StreamMessage;
pub use metrics::AggregateMetrics;
pub use overlay::{ActionOverlay, DisplayEvent};
pub use timestamp::Timestamp;
