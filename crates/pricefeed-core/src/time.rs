use crate::error::{CoreError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Naive layouts accepted for stored and user-supplied timestamps, tried in order.
const FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Layout the ingestion jobs write: local wall-clock time, microseconds, no offset.
pub const STORE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Parse a timestamp as it appears in the raw store or in a query.
///
/// Offsets are dropped rather than converted; a bare date means midnight.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime> {
    let raw = raw.trim();

    for format in FORMATS {
        if let Ok(timestamp) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(timestamp);
        }
    }

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return Ok(timestamp.naive_local());
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| CoreError::MalformedTimestamp(raw.to_string()))
}

pub fn format_timestamp(timestamp: &NaiveDateTime) -> String {
    timestamp.format(STORE_FORMAT).to_string()
}
