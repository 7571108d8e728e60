//! Error types for chronokv.
//!
//! All errors are strongly typed using thiserror. Guard violations never
//! travel through this type; they are carried inside a
//! [`WriteEvaluation`](crate::evaluation::WriteEvaluation).

use thiserror::Error;

/// Top-level error type for store operations.
///
/// Durability problems are deliberately non-fatal: a store whose WAL has
/// degraded keeps serving reads and writes from memory.
#[derive(Debug, Error)]
pub enum ChronoError {
    /// The requested key is not present in the store.
    #[error("Key not found: {key}")]
    NotFound {
        /// The missing key.
        key: String,
    },

    /// Malformed input at an adapter boundary.
    #[error("Invalid {field}: {reason}")]
    InvalidArgument {
        /// Name of the offending field or token.
        field: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The WAL could not be opened, written, flushed, or truncated.
    #[error("Durability degraded: {message}")]
    Durability {
        /// Error details.
        message: String,
    },
}

impl ChronoError {
    /// Creates a `NotFound` error for a key.
    #[must_use]
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Creates an `InvalidArgument` error.
    #[must_use]
    pub fn invalid_argument(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Creates a `Durability` error.
    #[must_use]
    pub fn durability(message: impl Into<String>) -> Self {
        Self::Durability {
            message: message.into(),
        }
    }

    /// Returns true if this is a `NotFound` error.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true if this is a durability error.
    #[must_use]
    pub const fn is_durability(&self) -> bool {
        matches!(self, Self::Durability { .. })
    }
}

/// Result type alias for store operations.
pub type ChronoResult<T> = Result<T, ChronoError>;
