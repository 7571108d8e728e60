//! Decision policies arbitrating guard violations.
//!
//! A policy never touches accepted writes; it reshapes the evaluator's
//! verdict when guards object. Policies are pure so the same evaluation is
//! reproducible given the same guard set.

use serde::{Deserialize, Serialize};

use crate::error::{ChronoError, ChronoResult};

/// Arbitration strategy applied to a guard evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionPolicy {
    /// Always negotiate when possible; never escalate a counter-offer.
    DevFriendly,

    /// Negotiate when safe alternatives exist; reject otherwise.
    SafeDefault,

    /// Reject every guard violation outright.
    Strict,
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self::SafeDefault
    }
}

impl DecisionPolicy {
    /// Returns the name used on the wire and in WAL records.
    #[must_use]
    pub const fn wire_name(self) -> &'static str {
        match self {
            Self::DevFriendly => "DEV_FRIENDLY",
            Self::SafeDefault => "SAFE_DEFAULT",
            Self::Strict => "STRICT",
        }
    }

    /// Parses a wire/WAL policy name.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for unrecognized names.
    pub fn from_wire(name: &str) -> ChronoResult<Self> {
        match name {
            "DEV_FRIENDLY" => Ok(Self::DevFriendly),
            "SAFE_DEFAULT" => Ok(Self::SafeDefault),
            "STRICT" => Ok(Self::Strict),
            other => Err(ChronoError::invalid_argument(
                "policy",
                format!("unknown policy name '{other}'"),
            )),
        }
    }
}

impl std::fmt::Display for DecisionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_name())
    }
}
