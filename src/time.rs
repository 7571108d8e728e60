//! Timestamp helpers shared by the store core and its adapters.
//!
//! All timestamps are wall-clock instants at millisecond resolution,
//! represented as `chrono::DateTime<Utc>`. The WAL encodes them as base-10
//! signed epoch milliseconds.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::{ChronoError, ChronoResult};

/// Converts a timestamp to epoch milliseconds.
#[must_use]
pub fn epoch_ms(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

/// Converts epoch milliseconds back to a timestamp.
///
/// Returns `None` for values outside the representable range.
#[must_use]
pub fn from_epoch_ms(ms: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
}

/// Parses a timestamp token from an adapter.
///
/// Accepts either epoch milliseconds (`1717418096123`) or a human-readable
/// form (`YYYY-MM-DD HH:MM:SS` with optional `.mmm` fraction), interpreted
/// as UTC.
///
/// # Errors
///
/// Returns `InvalidArgument` when the token matches neither form.
pub fn parse_timestamp(token: &str) -> ChronoResult<DateTime<Utc>> {
    if let Ok(ms) = token.parse::<i64>() {
        return from_epoch_ms(ms).ok_or_else(|| {
            ChronoError::invalid_argument("timestamp", format!("epoch ms out of range: {ms}"))
        });
    }

    for format in ["%Y-%m-%d %H:%M:%S%.3f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(token, format) {
            return Ok(naive.and_utc());
        }
    }

    Err(ChronoError::invalid_argument(
        "timestamp",
        format!("expected epoch milliseconds or 'YYYY-MM-DD HH:MM:SS[.mmm]', got '{token}'"),
    ))
}
