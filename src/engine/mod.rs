//! Store façade.
//!
//! [`ChronoStore`] binds the version store, the guard registry, the decision
//! policy, and the WAL behind a single API, and owns the recovery protocol
//! that rebuilds state from snapshot plus log on startup.
//!
//! The façade is single-threaded: callers needing concurrent access wrap it
//! in an outer lock. The WAL append happens before the in-memory write so
//! log order always equals memory order.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::error::{ChronoError, ChronoResult};
use crate::evaluation::{apply_decision_policy, simulate_write, WriteEvaluation};
use crate::guard::{Guard, GuardRegistry};
use crate::policy::DecisionPolicy;
use crate::retention::RetentionPolicy;
use crate::storage::{VersionStore, Wal, WalConfig, WalRecord};
use crate::temporal::{explain, resolve_as_of, ExplainResult};
use crate::version::Version;

/// In-process temporal key-value store with policy-negotiated writes.
pub struct ChronoStore {
    versions: VersionStore,
    guards: GuardRegistry,
    policy: DecisionPolicy,
    wal: Option<Wal>,
    wal_logging: bool,
}

impl Default for ChronoStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ChronoStore {
    /// Creates an in-memory store with no durability.
    #[must_use]
    pub fn new() -> Self {
        Self {
            versions: VersionStore::new(),
            guards: GuardRegistry::new(),
            policy: DecisionPolicy::default(),
            wal: None,
            wal_logging: true,
        }
    }

    /// Creates a store backed by a WAL at `path`, without replaying.
    ///
    /// WAL initialization failure degrades durability but never fails store
    /// construction; the warning lands on stderr.
    #[must_use]
    pub fn with_wal(path: impl Into<PathBuf>, config: WalConfig) -> Self {
        let mut wal = Wal::new(path, config);
        // Non-fatal: the store runs non-durably when the log cannot open.
        let _ = wal.initialize();
        let mut store = Self::new();
        store.wal = Some(wal);
        store
    }

    /// Opens a durable store: binds the WAL and replays snapshot then log.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>, config: WalConfig) -> Self {
        let mut store = Self::with_wal(path, config);
        store.replay();
        store
    }

    // ---- writes ------------------------------------------------------

    /// Records a new version for `key` stamped "now".
    ///
    /// The record is appended to the WAL first; WAL failure is non-fatal
    /// and the in-memory write still proceeds.
    pub fn set(&mut self, key: &str, value: &str) {
        let timestamp = Utc::now();
        if self.wal_logging {
            if let Some(wal) = self.wal.as_mut() {
                if wal.is_enabled() {
                    // Warning already printed by the WAL.
                    let _ = wal.log_set(key, value, timestamp);
                }
            }
        }
        self.versions.append(key, value, timestamp);
    }

    /// Records a version with an explicit timestamp, bypassing the WAL.
    ///
    /// Used by replay; live writes go through [`set`](Self::set).
    pub fn set_at_time(&mut self, key: &str, value: &str, timestamp: DateTime<Utc>) {
        self.versions.append(key, value, timestamp);
    }

    /// Deletes a key and its entire history.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the key is absent.
    pub fn del(&mut self, key: &str) -> ChronoResult<()> {
        if !self.versions.exists(key) {
            return Err(ChronoError::not_found(key));
        }
        if self.wal_logging {
            if let Some(wal) = self.wal.as_mut() {
                if wal.is_enabled() {
                    let _ = wal.log_del(key);
                }
            }
        }
        self.versions.remove(key);
        Ok(())
    }

    // ---- reads -------------------------------------------------------

    /// The latest value for a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.versions.latest(key)
    }

    /// The value visible at `at`, or `None` when every version is newer.
    #[must_use]
    pub fn get_as_of(&self, key: &str, at: DateTime<Utc>) -> Option<&str> {
        resolve_as_of(self.versions.versions(key), at).map(|v| v.value.as_str())
    }

    /// The ordered version history for a key; empty when absent.
    #[must_use]
    pub fn history(&self, key: &str) -> &[Version] {
        self.versions.versions(key)
    }

    /// Explains how an as-of query resolves for `key` at `at`.
    #[must_use]
    pub fn explain(&self, key: &str, at: DateTime<Utc>) -> ExplainResult {
        explain(key, self.versions.versions(key), at)
    }

    /// Returns true if the key is present.
    #[must_use]
    pub fn exists(&self, key: &str) -> bool {
        self.versions.exists(key)
    }

    /// Number of live keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.versions.len()
    }

    /// Returns true if the store holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// The latest value of every key, sorted by key.
    #[must_use]
    pub fn all_latest(&self) -> BTreeMap<String, String> {
        self.versions.all_latest()
    }

    // ---- proposals ---------------------------------------------------

    /// Evaluates a proposed write against guards and the active policy.
    ///
    /// Never mutates anything: no version is appended and nothing is
    /// logged. The caller decides what to do with the verdict.
    #[must_use]
    pub fn propose(&self, key: &str, value: &str) -> WriteEvaluation {
        let mut evaluation = simulate_write(&self.guards, key, value);
        apply_decision_policy(self.policy, &mut evaluation);
        evaluation
    }

    /// Commits a write directly, bypassing guards entirely.
    ///
    /// Exists so callers may override after a counter-offer or reject.
    pub fn commit(&mut self, key: &str, value: &str) {
        self.set(key, value);
    }

    // ---- guards ------------------------------------------------------

    /// Registers a guard.
    pub fn add_guard(&mut self, guard: Guard) {
        self.guards.add(guard);
    }

    /// Removes the first guard with the given name.
    ///
    /// Returns true if a guard was removed.
    pub fn remove_guard(&mut self, name: &str) -> bool {
        self.guards.remove(name)
    }

    /// Returns true if any guard has the given name.
    #[must_use]
    pub fn has_guard(&self, name: &str) -> bool {
        self.guards.contains(name)
    }

    /// All registered guards, in registration order.
    #[must_use]
    pub fn guards(&self) -> &[Guard] {
        self.guards.list()
    }

    /// Enabled guards applicable to the given key.
    #[must_use]
    pub fn guards_for_key(&self, key: &str) -> Vec<&Guard> {
        self.guards.for_key(key)
    }

    /// Enables or disables the first guard with the given name.
    ///
    /// Returns true if such a guard exists.
    pub fn set_guard_enabled(&mut self, name: &str, enabled: bool) -> bool {
        match self.guards.get_mut(name) {
            Some(guard) => {
                guard.set_enabled(enabled);
                true
            }
            None => false,
        }
    }

    // ---- policy & retention ------------------------------------------

    /// The active decision policy.
    #[must_use]
    pub const fn policy(&self) -> DecisionPolicy {
        self.policy
    }

    /// Replaces the decision policy; the change is logged so it survives
    /// restarts.
    pub fn set_policy(&mut self, policy: DecisionPolicy) {
        self.policy = policy;
        if self.wal_logging {
            if let Some(wal) = self.wal.as_mut() {
                if wal.is_enabled() {
                    let _ = wal.log_policy(policy.wire_name());
                }
            }
        }
    }

    /// The active retention policy.
    #[must_use]
    pub const fn retention(&self) -> RetentionPolicy {
        self.versions.retention()
    }

    /// Replaces the retention policy and re-applies it to every key.
    pub fn set_retention(&mut self, policy: RetentionPolicy) {
        self.versions.set_retention(policy);
    }

    // ---- durability --------------------------------------------------

    /// Returns true if a WAL is bound and accepting records.
    #[must_use]
    pub fn wal_enabled(&self) -> bool {
        self.wal.as_ref().is_some_and(Wal::is_enabled)
    }

    /// Gates WAL logging on or off; replay uses this to suppress
    /// re-logging of replayed mutations.
    pub fn set_wal_logging(&mut self, enabled: bool) {
        self.wal_logging = enabled;
    }

    /// Writes a snapshot of the latest values and truncates the WAL.
    ///
    /// # Errors
    ///
    /// Returns `Durability` when no WAL is bound or the snapshot fails.
    pub fn snapshot(&mut self) -> ChronoResult<()> {
        let latest = self.versions.all_latest();
        let policy_name = self.policy.wire_name();
        match self.wal.as_mut() {
            Some(wal) => wal.create_snapshot(&latest, policy_name),
            None => Err(ChronoError::durability("no WAL configured")),
        }
    }

    // ---- recovery ----------------------------------------------------

    /// Rebuilds state by replaying the snapshot, then the WAL.
    ///
    /// Snapshot data lines are applied at a single load instant; the log's
    /// policy records are applied first (so the final policy reflects the
    /// last change), then its data records in file order with their logged
    /// timestamps. Unparseable lines warn and are skipped; recovery always
    /// completes.
    pub fn replay(&mut self) {
        if !self.wal_enabled() {
            return;
        }

        self.wal_logging = false;

        let snapshot_records = Self::parse_lines(
            &self.wal.as_ref().map(Wal::read_snapshot).unwrap_or_default(),
        );
        if !snapshot_records.is_empty() {
            let snapshot_time = Utc::now();
            for record in &snapshot_records {
                if let WalRecord::PolicySet { policy } = record {
                    self.set_policy(*policy);
                }
            }
            for record in &snapshot_records {
                if let WalRecord::Set { key, value, .. } = record {
                    // Snapshot lines carry no timestamps; use load time.
                    self.set_at_time(key, value, snapshot_time);
                }
            }
        }

        let log_records =
            Self::parse_lines(&self.wal.as_ref().map(Wal::read_log).unwrap_or_default());
        for record in &log_records {
            if let WalRecord::PolicySet { policy } = record {
                self.set_policy(*policy);
            }
        }
        for record in &log_records {
            match record {
                WalRecord::Set {
                    key,
                    value,
                    timestamp,
                } => {
                    let at = (*timestamp).unwrap_or_else(Utc::now);
                    self.set_at_time(key, value, at);
                }
                WalRecord::Del { key } => {
                    // Absent keys are fine; the delete may target a key the
                    // snapshot already compacted away.
                    let _ = self.del(key);
                }
                WalRecord::PolicySet { .. } | WalRecord::GuardAdd { .. } => {}
            }
        }

        self.wal_logging = true;
    }

    fn parse_lines(lines: &[String]) -> Vec<WalRecord> {
        let mut records = Vec::with_capacity(lines.len());
        for line in lines {
            match WalRecord::parse(line) {
                Ok(record) => records.push(record),
                Err(e) => eprintln!("WAL: skipping unrecognized record '{line}': {e}"),
            }
        }
        records
    }
}
