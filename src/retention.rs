//! Retention policies bounding per-key history growth.
//!
//! Retention is enforced on write and on policy change. Reads never evict:
//! a `LastT` window that has drifted past old versions leaves them in place
//! until the next write touches the key.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::version::Version;

/// Rule bounding how many versions per key are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RetentionPolicy {
    /// Keep every version.
    Full,

    /// Keep only the `count` newest versions per key.
    LastN {
        /// Number of versions to keep. Zero disables eviction.
        count: usize,
    },

    /// Keep only versions written within the trailing window.
    LastT {
        /// Window length in seconds. Zero disables eviction.
        seconds: u64,
    },
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self::Full
    }
}

impl RetentionPolicy {
    /// Evicts versions from the front of a history according to this policy.
    ///
    /// Histories are ordered oldest-first, so eviction always drops a prefix.
    /// `now` is the instant retention is measured at; `LastT` keeps versions
    /// with `timestamp >= now - seconds`.
    pub fn evict(&self, versions: &mut Vec<Version>, now: DateTime<Utc>) {
        match *self {
            Self::Full => {}
            Self::LastN { count } => {
                if count > 0 && versions.len() > count {
                    versions.drain(..versions.len() - count);
                }
            }
            Self::LastT { seconds } => {
                if seconds > 0 {
                    let cutoff = now - Duration::seconds(i64::try_from(seconds).unwrap_or(i64::MAX));
                    let first_to_keep = versions
                        .iter()
                        .position(|v| v.timestamp >= cutoff)
                        .unwrap_or(versions.len());
                    if first_to_keep > 0 {
                        versions.drain(..first_to_keep);
                    }
                }
            }
        }
    }
}
