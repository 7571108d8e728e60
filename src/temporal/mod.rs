//! Temporal resolution over version histories.
//!
//! An as-of query selects the last version written at or before the query
//! timestamp. Histories are ordered oldest-first, so the resolver scans
//! forward, keeps updating its candidate while `timestamp <= t`, and stops
//! at the first later version. Ties on the query timestamp therefore
//! resolve to the later-inserted version.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::version::Version;

/// Resolves the version visible at `at`, or `None` when every version is
/// newer (or the history is empty).
#[must_use]
pub fn resolve_as_of(versions: &[Version], at: DateTime<Utc>) -> Option<&Version> {
    let mut selected = None;
    for version in versions {
        if version.timestamp <= at {
            selected = Some(version);
        } else {
            break;
        }
    }
    selected
}

/// Diagnostic result of an explained as-of query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplainResult {
    /// The queried key.
    pub key: String,
    /// The as-of instant.
    pub query_timestamp: DateTime<Utc>,
    /// Whether a version was selected.
    pub found: bool,
    /// Number of versions in the key's history.
    pub total_versions: usize,
    /// The selected version, when found.
    pub selected_version: Option<Version>,
    /// Human-readable account of the selection.
    pub reasoning: String,
    /// Older versions that also qualified but were superseded, in encounter
    /// order. Versions after the query time are counted in `reasoning` but
    /// never listed here.
    pub skipped_versions: Vec<Version>,
}

/// Explains how an as-of query over `versions` resolves at `at`.
#[must_use]
pub fn explain(key: &str, versions: &[Version], at: DateTime<Utc>) -> ExplainResult {
    let mut result = ExplainResult {
        key: key.to_string(),
        query_timestamp: at,
        found: false,
        total_versions: versions.len(),
        selected_version: None,
        reasoning: String::new(),
        skipped_versions: Vec::new(),
    };

    if versions.is_empty() {
        result.total_versions = 0;
        result.reasoning = "Key not found in database".to_string();
        return result;
    }

    let mut selected_index: Option<usize> = None;
    for (index, version) in versions.iter().enumerate() {
        if version.timestamp <= at {
            if let Some(previous) = selected_index {
                result.skipped_versions.push(versions[previous].clone());
            }
            selected_index = Some(index);
        } else {
            break;
        }
    }

    match selected_index {
        Some(index) => {
            result.found = true;
            result.selected_version = Some(versions[index].clone());

            let mut reasoning = format!(
                "Selected version at index {index} (0-based) out of {} total versions. \
                 This is the most recent version at or before the query timestamp.",
                result.total_versions
            );
            if !result.skipped_versions.is_empty() {
                reasoning.push_str(&format!(
                    " Skipped {} older version(s) that were also valid but superseded.",
                    result.skipped_versions.len()
                ));
            }
            let excluded_after = result.total_versions - index - 1;
            if excluded_after > 0 {
                reasoning.push_str(&format!(
                    " Excluded {excluded_after} version(s) that occurred after the query timestamp."
                ));
            }
            result.reasoning = reasoning;
        }
        None => {
            result.reasoning = format!(
                "No version found at or before the query timestamp. \
                 All {} version(s) occurred after the query time.",
                result.total_versions
            );
        }
    }

    result
}
