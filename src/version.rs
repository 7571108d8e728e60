//! Versioned values.
//!
//! Every write records a new [`Version`]; a key's history is the ordered
//! sequence of its versions, oldest first.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single timestamped value in a key's history.
///
/// Versions are immutable once recorded. The value is an opaque string; in
/// practice a whitespace-free token, because the WAL encoding is
/// whitespace-delimited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    /// Wall-clock instant the version was written, millisecond resolution.
    pub timestamp: DateTime<Utc>,
    /// The recorded value.
    pub value: String,
}

impl Version {
    /// Creates a version with the given timestamp.
    #[must_use]
    pub fn new(timestamp: DateTime<Utc>, value: impl Into<String>) -> Self {
        Self {
            timestamp,
            value: value.into(),
        }
    }

    /// Creates a version stamped "now".
    #[must_use]
    pub fn now(value: impl Into<String>) -> Self {
        Self::new(Utc::now(), value)
    }
}
