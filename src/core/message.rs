//! Decoded stream messages

use super::event::CanonicalEvent;
use super::metrics::AggregateMetrics;

/// One decoded frame from the feed
#[derive(Debug, Clone, PartialEq)]
pub enum StreamMessage {
    /// Authoritative full state, sent on (re)connect
    Snapshot {
        metrics: AggregateMetrics,
        events: Vec<CanonicalEvent>,
    },
    /// Incremental update; `event` is `None` for a metrics-only refresh
    Tick {
        metrics: AggregateMetrics,
        event: Option<CanonicalEvent>,
    },
}

impl StreamMessage {
    /// Metrics carried by either variant
    pub fn metrics(&self) -> &AggregateMetrics {
        match self {
            StreamMessage::Snapshot { metrics, .. } => metrics,
            StreamMessage::Tick { metrics, .. } => metrics,
        }
    }
}
