//! Wire frame decoder
//!
//! The single boundary where loosely-typed JSON becomes `StreamMessage`.
//! Nothing downstream looks at raw JSON.
//!
//! Wire format:
//! ```text
//! { "type": "snapshot", "kpis": {...}, "recent_events": [RawEvent, ...] }
//! { "type": "tick",     "kpis": {...}, "event": RawEvent }   // event optional
//! ```

pub mod event;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::core::{AggregateMetrics, StreamMessage, Timestamp};

pub use event::map_event;

/// Whole-message decode failures. Missing fields inside an event are not errors.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("frame is not valid UTF-8")]
    InvalidUtf8,
    #[error("frame is not a JSON object")]
    NotAnObject,
    #[error("message has no type discriminant")]
    MissingType,
    #[error("unknown message type: {0}")]
    UnknownType(String),
    #[error("malformed message: {0}")]
    Malformed(&'static str),
}

/// Stateless decoder for feed frames
pub struct MessageDecoder;

impl MessageDecoder {
    /// Decode a text frame using the current time as the timestamp fallback
    pub fn decode(text: &str) -> Result<StreamMessage, DecodeError> {
        Self::decode_at(text, Timestamp::now())
    }

    /// Decode a binary frame carrying UTF-8 JSON
    pub fn decode_bytes(bytes: &[u8]) -> Result<StreamMessage, DecodeError> {
        let text = std::str::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8)?;
        Self::decode(text)
    }

    /// Decode with an explicit "now" for events without a timestamp
    pub fn decode_at(text: &str, now: Timestamp) -> Result<StreamMessage, DecodeError> {
        let value: Value = serde_json::from_str(text)?;
        Self::decode_value(&value, now)
    }

    /// Decode an already-parsed JSON value
    pub fn decode_value(value: &Value, now: Timestamp) -> Result<StreamMessage, DecodeError> {
        let root = value.as_object().ok_or(DecodeError::NotAnObject)?;

        let kind = match root.get("type") {
            Some(Value::String(kind)) => kind.as_str(),
            Some(Value::Null) | None => return Err(DecodeError::MissingType),
            Some(other) => return Err(DecodeError::UnknownType(other.to_string())),
        };

        match kind {
            "snapshot" => Self::decode_snapshot(root, now),
            "tick" => Ok(Self::decode_tick(root, now)),
            other => Err(DecodeError::UnknownType(other.to_string())),
        }
    }

    fn decode_snapshot(root: &Map<String, Value>, now: Timestamp) -> Result<StreamMessage, DecodeError> {
        let events = match root.get("recent_events") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(raw)) => raw
                .iter()
                .filter_map(Value::as_object)
                .map(|raw| map_event(raw, now.clone()))
                .collect(),
            Some(_) => return Err(DecodeError::Malformed("recent_events is not an array")),
        };

        Ok(StreamMessage::Snapshot {
            metrics: decode_metrics(root.get("kpis")),
            events,
        })
    }

    fn decode_tick(root: &Map<String, Value>, now: Timestamp) -> StreamMessage {
        StreamMessage::Tick {
            metrics: decode_metrics(root.get("kpis")),
            event: root
                .get("event")
                .and_then(Value::as_object)
                .map(|raw| map_event(raw, now)),
        }
    }
}

/// Absent, null or non-numeric gauges are 0
fn decode_metrics(kpis: Option<&Value>) -> AggregateMetrics {
    let Some(kpis) = kpis.and_then(Value::as_object) else {
        return AggregateMetrics::ZERO;
    };

    let gauge = |key: &str| {
        kpis.get(key)
            .and_then(Value::as_f64)
            .filter(|v| v.is_finite())
            .unwrap_or(0.0)
    };

    AggregateMetrics {
        txn_per_min: gauge("txn_per_min"),
        alerts_per_min: gauge("alerts_per_min"),
        high_risk_pct: gauge("high_risk_pct"),
        avg_latency_ms: gauge("avg_latency_ms"),
    }
}
