//! Event instant
//!
//! Held in UTC and rendered as ISO-8601 with millisecond precision,
//! e.g. `2023-11-14T22:13:20.000Z`. A timestamp string the feed sent that
//! is not ISO-8601 is kept verbatim instead of being replaced.

use serde::{Serialize, Serializer};
use std::fmt;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Timestamp {
    /// Resolved instant, UTC
    At(OffsetDateTime),
    /// Unparseable string from the feed, passed through as-is
    Literal(String),
}

impl Timestamp {
    /// Current wall-clock time
    pub fn now() -> Self {
        Self::At(OffsetDateTime::now_utc())
    }

    pub fn from_datetime(dt: OffsetDateTime) -> Self {
        Self::At(dt.to_offset(UtcOffset::UTC))
    }

    /// From milliseconds since the Unix epoch. `None` if out of range.
    pub fn from_unix_millis(ms: i128) -> Option<Self> {
        let nanos = ms.checked_mul(1_000_000)?;
        OffsetDateTime::from_unix_timestamp_nanos(nanos)
            .ok()
            .map(Self::At)
    }

    /// Parse an RFC 3339 string; the offset is normalized to UTC
    pub fn parse_rfc3339(s: &str) -> Option<Self> {
        OffsetDateTime::parse(s.trim(), &Rfc3339)
            .ok()
            .map(Self::from_datetime)
    }

    /// RFC 3339, or ISO-8601 without an offset (`T` or space separated,
    /// optional fraction), which is taken as UTC
    pub fn parse_iso8601(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::parse_rfc3339(s).or_else(|| {
            PrimitiveDateTime::parse(
                s,
                format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
            )
            .or_else(|_| {
                PrimitiveDateTime::parse(
                    s,
                    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
                )
            })
            .or_else(|_| {
                PrimitiveDateTime::parse(
                    s,
                    format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]"),
                )
            })
            .or_else(|_| {
                PrimitiveDateTime::parse(
                    s,
                    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
                )
            })
            .ok()
            .map(|naive| Self::At(naive.assume_utc()))
        })
    }

    /// ISO-8601 when parseable, otherwise the literal string
    pub fn from_wire(s: &str) -> Self {
        Self::parse_iso8601(s).unwrap_or_else(|| Self::Literal(s.to_string()))
    }

    /// Milliseconds since the Unix epoch; `None` for a literal
    pub fn unix_millis(&self) -> Option<i128> {
        match self {
            Self::At(dt) => Some(dt.unix_timestamp_nanos() / 1_000_000),
            Self::Literal(_) => None,
        }
    }

    /// ISO-8601 UTC rendering with millisecond precision
    pub fn to_iso(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::At(dt) => {
                let rendered = dt
                    .format(format_description!(
                        "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
                    ))
                    .map_err(|_| fmt::Error)?;
                f.write_str(&rendered)
            }
            Self::Literal(raw) => f.write_str(raw),
        }
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
