//! WAL record grammar.
//!
//! Both the WAL and the snapshot file are newline-delimited text, one record
//! per line, tokens separated by whitespace:
//!
//! ```text
//! SET <key> <value> <epochMillis>      # epoch ms optional in legacy logs
//! DEL <key>
//! POLICY SET <DEV_FRIENDLY|SAFE_DEFAULT|STRICT>
//! GUARD ADD <TYPE> <name> <keyPattern> <params...>
//! ```
//!
//! Keys and values must therefore be whitespace-free; the log layer rejects
//! anything else before it reaches disk.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::error::{ChronoError, ChronoResult};
use crate::policy::DecisionPolicy;
use crate::time::{epoch_ms, from_epoch_ms};

/// A parsed WAL or snapshot record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalRecord {
    /// A write. `timestamp` is `None` for legacy records and snapshot lines,
    /// where replay substitutes its own load time.
    Set {
        /// The written key.
        key: String,
        /// The written value.
        value: String,
        /// Logged write instant, when present.
        timestamp: Option<DateTime<Utc>>,
    },

    /// A key deletion.
    Del {
        /// The deleted key.
        key: String,
    },

    /// A decision-policy change.
    PolicySet {
        /// The policy in force from this record on.
        policy: DecisionPolicy,
    },

    /// A guard registration. Reserved: emitted by adapters that choose to
    /// persist guards; replay currently skips these.
    GuardAdd {
        /// Guard type token (`RANGE_INT`, `ENUM`, `LENGTH`).
        guard_type: String,
        /// Guard name.
        name: String,
        /// Key pattern token.
        pattern: String,
        /// Remaining parameter tokens, verbatim.
        params: Vec<String>,
    },
}

impl WalRecord {
    /// Parses one non-empty log line.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for unknown record types or malformed
    /// fields; replay warns and skips such lines.
    pub fn parse(line: &str) -> ChronoResult<Self> {
        let mut tokens = line.split_whitespace();
        let Some(kind) = tokens.next() else {
            return Err(ChronoError::invalid_argument("record", "empty line"));
        };

        match kind {
            "SET" => {
                let key = next_token(&mut tokens, "SET key")?;
                let value = next_token(&mut tokens, "SET value")?;
                let timestamp = match tokens.next() {
                    None => None,
                    Some(raw) => {
                        let ms = raw.parse::<i64>().map_err(|_| {
                            ChronoError::invalid_argument(
                                "record",
                                format!("bad SET timestamp '{raw}'"),
                            )
                        })?;
                        Some(from_epoch_ms(ms).ok_or_else(|| {
                            ChronoError::invalid_argument(
                                "record",
                                format!("SET timestamp out of range: {ms}"),
                            )
                        })?)
                    }
                };
                Ok(Self::Set {
                    key,
                    value,
                    timestamp,
                })
            }
            "DEL" => {
                let key = next_token(&mut tokens, "DEL key")?;
                Ok(Self::Del { key })
            }
            "POLICY" => {
                let sub = next_token(&mut tokens, "POLICY subcommand")?;
                if sub != "SET" {
                    return Err(ChronoError::invalid_argument(
                        "record",
                        format!("unknown POLICY subcommand '{sub}'"),
                    ));
                }
                let name = next_token(&mut tokens, "POLICY name")?;
                Ok(Self::PolicySet {
                    policy: DecisionPolicy::from_wire(&name)?,
                })
            }
            "GUARD" => {
                let sub = next_token(&mut tokens, "GUARD subcommand")?;
                if sub != "ADD" {
                    return Err(ChronoError::invalid_argument(
                        "record",
                        format!("unknown GUARD subcommand '{sub}'"),
                    ));
                }
                let guard_type = next_token(&mut tokens, "GUARD type")?;
                let name = next_token(&mut tokens, "GUARD name")?;
                let pattern = next_token(&mut tokens, "GUARD pattern")?;
                let params = tokens.map(str::to_string).collect();
                Ok(Self::GuardAdd {
                    guard_type,
                    name,
                    pattern,
                    params,
                })
            }
            other => Err(ChronoError::invalid_argument(
                "record",
                format!("unknown record type '{other}'"),
            )),
        }
    }
}

fn next_token(
    tokens: &mut std::str::SplitWhitespace<'_>,
    what: &str,
) -> ChronoResult<String> {
    tokens
        .next()
        .map(str::to_string)
        .ok_or_else(|| ChronoError::invalid_argument("record", format!("missing {what}")))
}

impl fmt::Display for WalRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Set {
                key,
                value,
                timestamp: Some(at),
            } => write!(f, "SET {key} {value} {}", epoch_ms(*at)),
            Self::Set {
                key,
                value,
                timestamp: None,
            } => write!(f, "SET {key} {value}"),
            Self::Del { key } => write!(f, "DEL {key}"),
            Self::PolicySet { policy } => write!(f, "POLICY SET {}", policy.wire_name()),
            Self::GuardAdd {
                guard_type,
                name,
                pattern,
                params,
            } => {
                write!(f, "GUARD ADD {guard_type} {name} {pattern}")?;
                for param in params {
                    write!(f, " {param}")?;
                }
                Ok(())
            }
        }
    }
}

/// Rejects tokens that would corrupt the whitespace-delimited encoding.
pub(crate) fn check_token(field: &str, token: &str) -> ChronoResult<()> {
    if token.is_empty() {
        return Err(ChronoError::invalid_argument(field, "must not be empty"));
    }
    if token.chars().any(char::is_whitespace) {
        return Err(ChronoError::invalid_argument(
            field,
            format!("'{token}' contains whitespace, which the log encoding cannot represent"),
        ));
    }
    Ok(())
}
