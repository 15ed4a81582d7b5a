//! Raw event → CanonicalEvent field mapping
//!
//! Every field falls back independently; a missing or mistyped field never
//! fails the event.

use serde_json::{Map, Value};

use crate::core::{AnalystAction, CanonicalEvent, EventId, RiskBand, Timestamp, NOT_AVAILABLE, UNKNOWN};

/// Map one raw event object onto the canonical model
///
/// `now` is used when the payload carries no usable timestamp.
pub fn map_event(raw: &Map<String, Value>, now: Timestamp) -> CanonicalEvent {
    CanonicalEvent {
        id: event_id(raw),
        timestamp: event_timestamp(raw, now),
        risk_band: text(raw, "risk_band")
            .map(|label| RiskBand::parse(&label))
            .unwrap_or(RiskBand::NotAvailable),
        decision: text(raw, "decision").unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        fraud_probability: number(raw, "fraud_probability"),
        latency_ms: number(raw, "latency_ms"),
        source: text(raw, "source").unwrap_or_else(|| UNKNOWN.to_string()),
        device_os: text(raw, "device_os").unwrap_or_else(|| UNKNOWN.to_string()),
        payment_type: text(raw, "payment_type").unwrap_or_else(|| UNKNOWN.to_string()),
        analyst_action: text(raw, "analyst_action").and_then(|label| AnalystAction::parse(&label)),
    }
}

/// `event_id`, else `id`, else the `{ts}-{source}-{device_os}` composite
fn event_id(raw: &Map<String, Value>) -> EventId {
    raw.get("event_id")
        .and_then(explicit_id)
        .or_else(|| raw.get("id").and_then(explicit_id))
        .unwrap_or_else(|| composite_id(raw))
}

/// Usable ids are non-empty strings and non-zero numbers
fn explicit_id(value: &Value) -> Option<EventId> {
    match value {
        Value::String(s) if !s.is_empty() => Some(EventId::Text(s.clone())),
        Value::Number(n) => match n.as_i64() {
            Some(0) => None,
            Some(i) => Some(EventId::Numeric(i)),
            None if n.as_f64().is_some_and(|f| f != 0.0) => Some(EventId::Text(n.to_string())),
            None => None,
        },
        _ => None,
    }
}

/// Synthesized key. The rendering must stay identical to what the feed's
/// other consumers produce, so absent keys render as `undefined`.
fn composite_id(raw: &Map<String, Value>) -> EventId {
    EventId::Text(format!(
        "{}-{}-{}",
        composite_part(raw.get("ts")),
        composite_part(raw.get("source")),
        composite_part(raw.get("device_os")),
    ))
}

fn composite_part(value: Option<&Value>) -> String {
    match value {
        None => "undefined".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// `ts` epoch seconds (non-zero number or numeric string) → millis, else the
/// `timestamp` string (ISO-8601, or kept verbatim), else `now`
fn event_timestamp(raw: &Map<String, Value>, now: Timestamp) -> Timestamp {
    let epoch_secs = match raw.get("ts") {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    let from_epoch = epoch_secs
        .filter(|secs| *secs != 0.0 && secs.is_finite())
        .and_then(|secs| Timestamp::from_unix_millis((secs * 1000.0).trunc() as i128));

    from_epoch
        .or_else(|| match raw.get("timestamp") {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(Timestamp::from_wire(s)),
            _ => None,
        })
        .unwrap_or(now)
}

/// Non-empty string (numbers rendered to text); `None` means use the fallback
fn text(raw: &Map<String, Value>, key: &str) -> Option<String> {
    match raw.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Number or numeric string; anything else is 0
fn number(raw: &Map<String, Value>, key: &str) -> f64 {
    match raw.get(key) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}
