//! Latest aggregate metrics, replaced wholesale on every message

use tokio::sync::watch;

use crate::core::AggregateMetrics;

/// Single-writer holder of the most recent `AggregateMetrics`.
///
/// Readers get `watch` receivers; no history is kept.
#[derive(Debug)]
pub struct MetricsStore {
    tx: watch::Sender<AggregateMetrics>,
}

impl MetricsStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(AggregateMetrics::ZERO);
        Self { tx }
    }

    /// Replace the stored record. Never merges with the previous value.
    pub fn replace(&self, metrics: AggregateMetrics) {
        self.tx.send_replace(metrics);
    }

    pub fn current(&self) -> AggregateMetrics {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<AggregateMetrics> {
        self.tx.subscribe()
    }
}

impl Default for MetricsStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_is_wholesale() {
        let store = MetricsStore::new();
        let rx = store.subscribe();
        assert_eq!(store.current(), AggregateMetrics::ZERO);

        store.replace(AggregateMetrics {
            txn_per_min: 10.0,
            alerts_per_min: 2.0,
            high_risk_pct: 5.0,
            avg_latency_ms: 3.0,
        });
        store.replace(AggregateMetrics {
            txn_per_min: 11.0,
            ..AggregateMetrics::ZERO
        });

        let latest = *rx.borrow();
        assert_eq!(latest.txn_per_min, 11.0);
        assert_eq!(latest.alerts_per_min, 0.0);
        assert_eq!(latest.high_risk_pct, 0.0);
    }

    #[test]
    fn test_replace_without_readers() {
        let store = MetricsStore::default();
        store.replace(AggregateMetrics {
            avg_latency_ms: 9.5,
            ..AggregateMetrics::ZERO
        });
        assert_eq!(store.current().avg_latency_ms, 9.5);
    }
}
