//! In-memory versioned storage.
//!
//! The version store keeps per-key ordered histories and enforces the
//! retention policy on write and on policy change. Durability lives in the
//! sibling [`wal`] module; the two are bound together by the store façade.

mod record;
mod wal;

pub use record::WalRecord;
pub use wal::{Wal, WalConfig};

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};

use crate::retention::RetentionPolicy;
use crate::version::Version;

/// Per-key ordered version histories with retention enforcement.
///
/// Input order is preserved exactly; live writes stamp "now" and replay
/// feeds logged timestamps in file order, so histories stay non-decreasing
/// for well-behaved callers.
#[derive(Debug, Default)]
pub struct VersionStore {
    entries: HashMap<String, Vec<Version>>,
    retention: RetentionPolicy,
}

impl VersionStore {
    /// Creates an empty store with `Full` retention.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a version to a key's history, then applies retention.
    pub fn append(&mut self, key: &str, value: impl Into<String>, timestamp: DateTime<Utc>) {
        self.entries
            .entry(key.to_string())
            .or_default()
            .push(Version::new(timestamp, value));
        self.apply_retention(key);
    }

    /// The latest value for a key, if present.
    #[must_use]
    pub fn latest(&self, key: &str) -> Option<&str> {
        self.entries
            .get(key)
            .and_then(|versions| versions.last())
            .map(|v| v.value.as_str())
    }

    /// The ordered history for a key; empty when absent.
    #[must_use]
    pub fn versions(&self, key: &str) -> &[Version] {
        self.entries.get(key).map_or(&[], Vec::as_slice)
    }

    /// Removes a key and its entire history.
    ///
    /// Returns true if the key was present.
    pub fn remove(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Returns true if the key is present.
    #[must_use]
    pub fn exists(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of live keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no keys are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The active retention policy.
    #[must_use]
    pub const fn retention(&self) -> RetentionPolicy {
        self.retention
    }

    /// Replaces the retention policy and re-applies it to every key.
    pub fn set_retention(&mut self, policy: RetentionPolicy) {
        self.retention = policy;
        self.apply_retention_all();
    }

    /// Applies the retention policy to one key.
    pub fn apply_retention(&mut self, key: &str) {
        if let Some(versions) = self.entries.get_mut(key) {
            self.retention.evict(versions, Utc::now());
        }
    }

    /// Applies the retention policy to every key.
    pub fn apply_retention_all(&mut self) {
        let now = Utc::now();
        for versions in self.entries.values_mut() {
            self.retention.evict(versions, now);
        }
    }

    /// The latest value of every key, sorted by key.
    ///
    /// Used to build snapshots; the sort keeps snapshot files deterministic.
    #[must_use]
    pub fn all_latest(&self) -> BTreeMap<String, String> {
        self.entries
            .iter()
            .filter_map(|(key, versions)| {
                versions
                    .last()
                    .map(|v| (key.clone(), v.value.clone()))
            })
            .collect()
    }
}
