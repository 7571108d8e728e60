//! Guard constraints gating proposed writes.
//!
//! A guard is a named validation constraint attached to a key pattern. On
//! evaluation it accepts the proposed value, rejects it outright, or
//! counter-offers with synthesized alternatives. The taxonomy is open: new
//! variants extend [`GuardBody`] and its dispatch below.

mod registry;

pub use registry::GuardRegistry;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ChronoError, ChronoResult};

/// Verdict of a single guard evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuardResult {
    /// The proposed value is acceptable as-is.
    Accept,
    /// The proposed value cannot be salvaged.
    Reject,
    /// The proposed value is unacceptable, but alternatives exist.
    CounterOffer,
}

/// A candidate value a guard proposes when it counter-offers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alternative {
    /// The suggested replacement value.
    pub value: String,
    /// Why this alternative is acceptable.
    pub explanation: String,
}

impl Alternative {
    /// Creates an alternative.
    #[must_use]
    pub fn new(value: impl Into<String>, explanation: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            explanation: explanation.into(),
        }
    }
}

/// Key pattern a guard applies to.
///
/// Three forms exist: `*` (any key), `prefix*` (prefix match), and a literal
/// key. No other wildcard positions are recognized; a `*` anywhere but the
/// end is matched literally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyPattern {
    /// Matches every key.
    Any,
    /// Matches keys starting with the stored prefix.
    Prefix(String),
    /// Matches exactly one key.
    Exact(String),
}

impl KeyPattern {
    /// Parses a pattern string.
    #[must_use]
    pub fn parse(pattern: &str) -> Self {
        if pattern == "*" {
            Self::Any
        } else if let Some(prefix) = pattern.strip_suffix('*') {
            Self::Prefix(prefix.to_string())
        } else {
            Self::Exact(pattern.to_string())
        }
    }

    /// Returns true if this pattern matches the given key.
    #[must_use]
    pub fn matches(&self, key: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Prefix(prefix) => key.starts_with(prefix.as_str()),
            Self::Exact(exact) => key == exact,
        }
    }
}

impl fmt::Display for KeyPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("*"),
            Self::Prefix(prefix) => write!(f, "{prefix}*"),
            Self::Exact(exact) => f.write_str(exact),
        }
    }
}

impl From<&str> for KeyPattern {
    fn from(pattern: &str) -> Self {
        Self::parse(pattern)
    }
}

impl Serialize for KeyPattern {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for KeyPattern {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// Variant-specific constraint body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GuardBody {
    /// Integer value must lie in `[min, max]`.
    RangeInt {
        /// Lower bound, inclusive.
        min: i64,
        /// Upper bound, inclusive.
        max: i64,
    },

    /// Value must equal one of the allowed values (case-sensitive).
    Enum {
        /// The allowed set, in declaration order.
        values: Vec<String>,
    },

    /// Value length in bytes must lie in `[min, max]`.
    Length {
        /// Minimum length, inclusive.
        min: usize,
        /// Maximum length, inclusive.
        max: usize,
    },
}

impl GuardBody {
    /// Returns the type name used by adapters and `GUARD ADD` records.
    #[must_use]
    pub const fn wire_type(&self) -> &'static str {
        match self {
            Self::RangeInt { .. } => "RANGE_INT",
            Self::Enum { .. } => "ENUM",
            Self::Length { .. } => "LENGTH",
        }
    }

    /// Renders the variant parameters the way `GUARD ADD` encodes them.
    #[must_use]
    pub fn wire_params(&self) -> String {
        match self {
            Self::RangeInt { min, max } => format!("{min} {max}"),
            Self::Enum { values } => values.join(","),
            Self::Length { min, max } => format!("{min} {max}"),
        }
    }

    /// Builds a body from adapter tokens.
    ///
    /// `guard_type` is matched case-insensitively; `RANGE` is accepted as an
    /// alias for `RANGE_INT`. Range and length bodies take two numeric
    /// parameter tokens; enum bodies take one comma-separated values token.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for unknown types, missing parameters, or
    /// unparseable numbers.
    pub fn from_wire(guard_type: &str, params: &[&str]) -> ChronoResult<Self> {
        let type_upper = guard_type.to_ascii_uppercase();
        match type_upper.as_str() {
            "RANGE_INT" | "RANGE" => {
                let (min, max) = Self::two_numeric(&type_upper, params)?;
                Ok(Self::RangeInt { min, max })
            }
            "ENUM" => {
                let raw = params.first().ok_or_else(|| {
                    ChronoError::invalid_argument("guard", "ENUM requires a values list")
                })?;
                let values: Vec<String> = raw.split(',').map(str::to_string).collect();
                Ok(Self::Enum { values })
            }
            "LENGTH" => {
                let (min, max) = Self::two_numeric(&type_upper, params)?;
                let (Ok(min), Ok(max)) = (usize::try_from(min), usize::try_from(max)) else {
                    return Err(ChronoError::invalid_argument(
                        "guard",
                        "LENGTH bounds must be non-negative",
                    ));
                };
                Ok(Self::Length { min, max })
            }
            other => Err(ChronoError::invalid_argument(
                "guard",
                format!("unknown guard type '{other}'"),
            )),
        }
    }

    fn two_numeric(guard_type: &str, params: &[&str]) -> ChronoResult<(i64, i64)> {
        let &[min, max] = params else {
            return Err(ChronoError::invalid_argument(
                "guard",
                format!("{guard_type} requires min and max parameters"),
            ));
        };
        let parse = |token: &str| {
            token.parse::<i64>().map_err(|_| {
                ChronoError::invalid_argument("guard", format!("not an integer: '{token}'"))
            })
        };
        Ok((parse(min)?, parse(max)?))
    }
}

/// A named validation constraint attached to a key pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guard {
    /// Name used for removal and for tagging triggered guards.
    pub name: String,
    /// Which keys this guard applies to.
    pub pattern: KeyPattern,
    /// Disabled guards are skipped during evaluation.
    pub enabled: bool,
    /// The constraint itself.
    pub body: GuardBody,
}

impl Guard {
    /// Creates an enabled guard.
    #[must_use]
    pub fn new(name: impl Into<String>, pattern: impl Into<KeyPattern>, body: GuardBody) -> Self {
        Self {
            name: name.into(),
            pattern: pattern.into(),
            enabled: true,
            body,
        }
    }

    /// Creates an integer range guard.
    #[must_use]
    pub fn range_int(
        name: impl Into<String>,
        pattern: impl Into<KeyPattern>,
        min: i64,
        max: i64,
    ) -> Self {
        Self::new(name, pattern, GuardBody::RangeInt { min, max })
    }

    /// Creates an enumeration guard.
    #[must_use]
    pub fn enumeration(
        name: impl Into<String>,
        pattern: impl Into<KeyPattern>,
        values: Vec<String>,
    ) -> Self {
        Self::new(name, pattern, GuardBody::Enum { values })
    }

    /// Creates a length guard. Bounds are bytes, inclusive.
    #[must_use]
    pub fn length(
        name: impl Into<String>,
        pattern: impl Into<KeyPattern>,
        min: usize,
        max: usize,
    ) -> Self {
        Self::new(name, pattern, GuardBody::Length { min, max })
    }

    /// Enables or disables this guard.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Returns true if this guard applies to the given key.
    #[must_use]
    pub fn applies_to(&self, key: &str) -> bool {
        self.pattern.matches(key)
    }

    /// Evaluates a proposed value, returning the verdict and its reason.
    #[must_use]
    pub fn evaluate(&self, proposed: &str) -> (GuardResult, String) {
        match &self.body {
            GuardBody::RangeInt { min, max } => match proposed.parse::<i64>() {
                Ok(value) if (*min..=*max).contains(&value) => (
                    GuardResult::Accept,
                    format!("Value within acceptable range [{min}, {max}]"),
                ),
                Ok(value) => (
                    GuardResult::CounterOffer,
                    format!("Value {value} outside acceptable range [{min}, {max}]"),
                ),
                Err(_) => (
                    GuardResult::Reject,
                    "Value is not a valid integer".to_string(),
                ),
            },
            GuardBody::Enum { values } => {
                if values.iter().any(|v| v == proposed) {
                    (GuardResult::Accept, "Value is in allowed set".to_string())
                } else {
                    let listed = values
                        .iter()
                        .map(|v| format!("'{v}'"))
                        .collect::<Vec<_>>()
                        .join(", ");
                    (
                        GuardResult::CounterOffer,
                        format!("Value '{proposed}' not in allowed set: {{{listed}}}"),
                    )
                }
            }
            GuardBody::Length { min, max } => {
                let len = proposed.len();
                if (*min..=*max).contains(&len) {
                    (
                        GuardResult::Accept,
                        format!("Length {len} within acceptable range [{min}, {max}]"),
                    )
                } else {
                    (
                        GuardResult::CounterOffer,
                        format!("Length {len} outside acceptable range [{min}, {max}]"),
                    )
                }
            }
        }
    }

    /// Synthesizes alternatives for a value this guard objected to.
    ///
    /// Returns an empty list when the value is acceptable or when no useful
    /// suggestion exists.
    #[must_use]
    pub fn alternatives(&self, proposed: &str) -> Vec<Alternative> {
        match &self.body {
            GuardBody::RangeInt { min, max } => range_alternatives(*min, *max, proposed),
            GuardBody::Enum { values } => enum_alternatives(values, proposed),
            GuardBody::Length { min, max } => length_alternatives(*min, *max, proposed),
        }
    }

    /// Human-readable one-line description of the constraint.
    #[must_use]
    pub fn describe(&self) -> String {
        match &self.body {
            GuardBody::RangeInt { min, max } => format!("Integer range: [{min}, {max}]"),
            GuardBody::Enum { values } => {
                let listed = values
                    .iter()
                    .map(|v| format!("'{v}'"))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("Allowed values: {{{listed}}}")
            }
            GuardBody::Length { min, max } => {
                format!("String length: [{min}, {max}] characters")
            }
        }
    }
}

fn range_alternatives(min: i64, max: i64, proposed: &str) -> Vec<Alternative> {
    let mut alternatives = Vec::new();

    match proposed.parse::<i64>() {
        Ok(value) if value < min => {
            alternatives.push(Alternative::new(
                min.to_string(),
                format!("Minimum allowed value (proposed {value} is too low)"),
            ));
            if max > min {
                let conservative = min + (max - min) / 4;
                alternatives.push(Alternative::new(
                    conservative.to_string(),
                    "Conservative value within range",
                ));
            }
        }
        Ok(value) if value > max => {
            alternatives.push(Alternative::new(
                max.to_string(),
                format!("Maximum allowed value (proposed {value} is too high)"),
            ));
            if max > min {
                let conservative = max - (max - min) / 4;
                alternatives.push(Alternative::new(
                    conservative.to_string(),
                    "Conservative value within range",
                ));
            }
        }
        Ok(_) => {}
        Err(_) => {
            alternatives.push(Alternative::new(min.to_string(), "Minimum allowed value"));
            alternatives.push(Alternative::new(
                ((min + max) / 2).to_string(),
                "Midpoint value",
            ));
            alternatives.push(Alternative::new(max.to_string(), "Maximum allowed value"));
        }
    }

    alternatives
}

fn enum_alternatives(values: &[String], proposed: &str) -> Vec<Alternative> {
    let mut alternatives: Vec<Alternative> = Vec::new();
    let lower_proposed = proposed.to_lowercase();

    // Exact case-insensitive matches first.
    for allowed in values {
        if allowed.to_lowercase() == lower_proposed {
            alternatives.push(Alternative::new(
                allowed.clone(),
                "Case-corrected version of proposed value",
            ));
        }
    }

    // Then partial matches in either direction.
    for allowed in values {
        let lower_allowed = allowed.to_lowercase();
        if lower_allowed.contains(&lower_proposed) || lower_proposed.contains(&lower_allowed) {
            if alternatives.iter().any(|alt| alt.value == *allowed) {
                continue;
            }
            alternatives.push(Alternative::new(allowed.clone(), "Similar to proposed value"));
        }
    }

    // Fall back to the first few allowed values.
    if alternatives.is_empty() {
        for allowed in values.iter().take(3) {
            alternatives.push(Alternative::new(allowed.clone(), "Allowed value"));
        }
    }

    alternatives
}

fn length_alternatives(min: usize, max: usize, proposed: &str) -> Vec<Alternative> {
    let mut alternatives = Vec::new();
    let len = proposed.len();

    if len < min {
        let mut padded = proposed.to_string();
        padded.push_str(&"*".repeat(min - len));
        alternatives.push(Alternative::new(
            padded,
            format!("Padded to minimum length {min}"),
        ));
    } else if len > max {
        alternatives.push(Alternative::new(
            truncate_to(proposed, max),
            format!("Truncated to maximum length {max}"),
        ));
        if max > 5 {
            let shorter = max * 4 / 5;
            alternatives.push(Alternative::new(
                truncate_to(proposed, shorter),
                format!("Truncated to {shorter} characters (safer margin)"),
            ));
        }
    }

    alternatives
}

// Clamp the cut to a char boundary so multi-byte values cannot split.
fn truncate_to(value: &str, max_bytes: usize) -> String {
    let mut end = max_bytes.min(value.len());
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    value[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_any_matches_everything() {
        let pattern = KeyPattern::parse("*");
        assert!(pattern.matches("anything"));
        assert!(pattern.matches(""));
    }

    #[test]
    fn test_pattern_prefix() {
        let pattern = KeyPattern::parse("price*");
        assert!(pattern.matches("price"));
        assert!(pattern.matches("price_usd"));
        assert!(!pattern.matches("cost_usd"));
    }

    #[test]
    fn test_pattern_exact() {
        let pattern = KeyPattern::parse("env");
        assert!(pattern.matches("env"));
        assert!(!pattern.matches("env_prod"));
    }

    #[test]
    fn test_pattern_display_round_trip() {
        for raw in ["*", "price*", "env"] {
            assert_eq!(KeyPattern::parse(raw).to_string(), raw);
        }
    }

    #[test]
    fn test_range_accept() {
        let guard = Guard::range_int("g", "*", 0, 100);
        let (result, reason) = guard.evaluate("50");
        assert_eq!(result, GuardResult::Accept);
        assert!(reason.contains("within acceptable range [0, 100]"));
    }

    #[test]
    fn test_range_counter_offer_above() {
        let guard = Guard::range_int("g", "*", 0, 1000);
        let (result, reason) = guard.evaluate("2000");
        assert_eq!(result, GuardResult::CounterOffer);
        assert!(reason.contains("2000 outside acceptable range"));

        let alts = guard.alternatives("2000");
        assert_eq!(alts.len(), 2);
        assert_eq!(alts[0].value, "1000");
        assert_eq!(alts[1].value, "750");
        assert_eq!(alts[1].explanation, "Conservative value within range");
    }

    #[test]
    fn test_range_counter_offer_below() {
        let guard = Guard::range_int("g", "*", 100, 200);
        let alts = guard.alternatives("5");
        assert_eq!(alts[0].value, "100");
        assert!(alts[0].explanation.contains("proposed 5 is too low"));
        assert_eq!(alts[1].value, "125");
    }

    #[test]
    fn test_range_reject_non_integer() {
        let guard = Guard::range_int("g", "*", 0, 10);
        let (result, reason) = guard.evaluate("fast");
        assert_eq!(result, GuardResult::Reject);
        assert_eq!(reason, "Value is not a valid integer");

        let alts = guard.alternatives("fast");
        assert_eq!(alts.len(), 3);
        assert_eq!(alts[0].value, "0");
        assert_eq!(alts[1].value, "5");
        assert_eq!(alts[2].value, "10");
    }

    #[test]
    fn test_range_degenerate_bounds_single_alternative() {
        let guard = Guard::range_int("g", "*", 7, 7);
        let alts = guard.alternatives("9");
        assert_eq!(alts.len(), 1);
        assert_eq!(alts[0].value, "7");
    }

    #[test]
    fn test_enum_accept_is_case_sensitive() {
        let guard = Guard::enumeration("g", "env", vec!["dev".into(), "prod".into()]);
        assert_eq!(guard.evaluate("dev").0, GuardResult::Accept);
        assert_eq!(guard.evaluate("Dev").0, GuardResult::CounterOffer);
    }

    #[test]
    fn test_enum_case_corrected_alternative_first() {
        let guard = Guard::enumeration(
            "g",
            "env",
            vec!["dev".into(), "staging".into(), "prod".into()],
        );
        let alts = guard.alternatives("Prod");
        assert_eq!(alts[0].value, "prod");
        assert_eq!(alts[0].explanation, "Case-corrected version of proposed value");
        // The partial-match pass must not duplicate the corrected entry.
        assert_eq!(alts.iter().filter(|a| a.value == "prod").count(), 1);
    }

    #[test]
    fn test_enum_similar_alternatives() {
        let guard = Guard::enumeration("g", "env", vec!["staging".into(), "prod".into()]);
        let alts = guard.alternatives("stag");
        assert_eq!(alts[0].value, "staging");
        assert_eq!(alts[0].explanation, "Similar to proposed value");
    }

    #[test]
    fn test_enum_fallback_suggests_first_three() {
        let guard = Guard::enumeration(
            "g",
            "env",
            vec!["a".into(), "b".into(), "c".into(), "d".into()],
        );
        let alts = guard.alternatives("zzz");
        assert_eq!(alts.len(), 3);
        assert!(alts.iter().all(|a| a.explanation == "Allowed value"));
    }

    #[test]
    fn test_length_accept() {
        let guard = Guard::length("g", "*", 2, 5);
        let (result, reason) = guard.evaluate("abc");
        assert_eq!(result, GuardResult::Accept);
        assert!(reason.contains("Length 3 within"));
    }

    #[test]
    fn test_length_pad_short_value() {
        let guard = Guard::length("g", "*", 5, 10);
        let alts = guard.alternatives("ab");
        assert_eq!(alts.len(), 1);
        assert_eq!(alts[0].value, "ab***");
        assert_eq!(alts[0].explanation, "Padded to minimum length 5");
    }

    #[test]
    fn test_length_truncate_long_value() {
        let guard = Guard::length("g", "*", 0, 10);
        let alts = guard.alternatives("abcdefghijklmno");
        assert_eq!(alts.len(), 2);
        assert_eq!(alts[0].value, "abcdefghij");
        assert_eq!(alts[1].value, "abcdefgh");
        assert!(alts[1].explanation.contains("safer margin"));
    }

    #[test]
    fn test_length_small_max_no_safer_margin() {
        let guard = Guard::length("g", "*", 0, 4);
        let alts = guard.alternatives("abcdefgh");
        assert_eq!(alts.len(), 1);
        assert_eq!(alts[0].value, "abcd");
    }

    #[test]
    fn test_describe() {
        assert_eq!(
            Guard::range_int("g", "*", 0, 9).describe(),
            "Integer range: [0, 9]"
        );
        assert_eq!(
            Guard::enumeration("g", "*", vec!["a".into(), "b".into()]).describe(),
            "Allowed values: {'a', 'b'}"
        );
        assert_eq!(
            Guard::length("g", "*", 1, 8).describe(),
            "String length: [1, 8] characters"
        );
    }

    #[test]
    fn test_from_wire_range_alias() {
        let body = GuardBody::from_wire("range", &["0", "100"]).unwrap();
        assert_eq!(body, GuardBody::RangeInt { min: 0, max: 100 });
        assert_eq!(body.wire_type(), "RANGE_INT");
        assert_eq!(body.wire_params(), "0 100");
    }

    #[test]
    fn test_from_wire_enum() {
        let body = GuardBody::from_wire("ENUM", &["dev,staging,prod"]).unwrap();
        let GuardBody::Enum { values } = &body else {
            panic!("expected enum body");
        };
        assert_eq!(values.len(), 3);
        assert_eq!(body.wire_params(), "dev,staging,prod");
    }

    #[test]
    fn test_from_wire_errors() {
        assert!(GuardBody::from_wire("REGEX", &["a.*"]).is_err());
        assert!(GuardBody::from_wire("RANGE_INT", &["1"]).is_err());
        assert!(GuardBody::from_wire("LENGTH", &["-1", "5"]).is_err());
        assert!(GuardBody::from_wire("RANGE_INT", &["low", "high"]).is_err());
    }

    #[test]
    fn test_guard_serialization() {
        let guard = Guard::range_int("price_range", "price*", 0, 1000);
        let json = serde_json::to_string(&guard).unwrap();
        let back: Guard = serde_json::from_str(&json).unwrap();
        assert_eq!(guard, back);
        assert!(json.contains("\"price*\""));
    }
}
