//! Aggregate feed metrics (KPIs)

use serde::{Deserialize, Serialize};

/// Four independent gauges computed upstream over the last minute.
///
/// Each inbound message replaces the whole record; fields are never merged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateMetrics {
    pub txn_per_min: f64,
    pub alerts_per_min: f64,
    pub high_risk_pct: f64,
    pub avg_latency_ms: f64,
}

impl AggregateMetrics {
    pub const ZERO: Self = Self {
        txn_per_min: 0.0,
        alerts_per_min: 0.0,
        high_risk_pct: 0.0,
        avg_latency_ms: 0.0,
    };
}
