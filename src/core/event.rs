//! Canonical transaction event
//!
//! The normalized, fully-typed form of one scored transaction. Built only by
//! the decoder and never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::timestamp::Timestamp;

/// Fallback label for missing risk band / decision
pub const NOT_AVAILABLE: &str = "N/A";

/// Fallback label for missing channel/context fields
pub const UNKNOWN: &str = "Unknown";

/// Event identity, the sole de-duplication key
///
/// Serialized untagged so it keeps the shape the feed sent (string or number).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventId {
    Numeric(i64),
    Text(String),
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventId::Numeric(n) => write!(f, "{}", n),
            EventId::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for EventId {
    fn from(s: &str) -> Self {
        EventId::Text(s.to_string())
    }
}

impl From<String> for EventId {
    fn from(s: String) -> Self {
        EventId::Text(s)
    }
}

impl From<i64> for EventId {
    fn from(n: i64) -> Self {
        EventId::Numeric(n)
    }
}

/// Severity level assigned by the scoring service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskBand {
    #[serde(rename = "LOW")]
    Low,
    #[serde(rename = "MEDIUM")]
    Medium,
    #[serde(rename = "HIGH")]
    High,
    #[serde(rename = "N/A")]
    NotAvailable,
}

impl RiskBand {
    /// Parse a wire label, case-insensitive. Anything unrecognized is `NotAvailable`.
    pub fn parse(label: &str) -> Self {
        match label.trim().to_ascii_uppercase().as_str() {
            "LOW" => RiskBand::Low,
            "MEDIUM" => RiskBand::Medium,
            "HIGH" => RiskBand::High,
            _ => RiskBand::NotAvailable,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskBand::Low => "LOW",
            RiskBand::Medium => "MEDIUM",
            RiskBand::High => "HIGH",
            RiskBand::NotAvailable => NOT_AVAILABLE,
        }
    }
}

impl fmt::Display for RiskBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Human review outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalystAction {
    Approve,
    Escalate,
    Block,
}

impl AnalystAction {
    /// Parse a wire label, case-insensitive
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "approve" => Some(AnalystAction::Approve),
            "escalate" => Some(AnalystAction::Escalate),
            "block" => Some(AnalystAction::Block),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalystAction::Approve => "approve",
            AnalystAction::Escalate => "escalate",
            AnalystAction::Block => "block",
        }
    }
}

/// One scored transaction as shown to an operator
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalEvent {
    pub id: EventId,
    pub timestamp: Timestamp,
    pub risk_band: RiskBand,
    pub decision: String,
    /// Expected in [0, 1]; passed through unclamped
    pub fraud_probability: f64,
    pub latency_ms: f64,
    pub source: String,
    pub device_os: String,
    pub payment_type: String,
    pub analyst_action: Option<AnalystAction>,
}
