//! # chronokv - Temporal Key-Value Store with Policy-Negotiated Writes
//!
//! chronokv is an in-process, append-only store: every set records a new
//! timestamped version, and reads can resolve the latest value, the value
//! as-of any past instant, the full history, or an explanation of how a
//! temporal read resolved. Writes may be gated by guards whose violations
//! are mediated by a decision policy that accepts, rejects, or returns a
//! counter-offer. Durability comes from a write-ahead log with a
//! snapshot-based compaction path; on startup the store replays snapshot
//! then log.
//!
//! ## Core Concepts
//!
//! - **Version**: a single (timestamp, value) tuple in a key's history
//! - **Guard**: a named validation constraint attached to a key pattern
//! - **Decision policy**: arbitration strategy shaping the final verdict
//! - **Write evaluation**: structured result of guards + policy, no commit
//!
//! ## Usage
//!
//! ```rust,ignore
//! use chronokv::{ChronoStore, DecisionPolicy, Guard, WalConfig};
//!
//! let mut store = ChronoStore::open("data/wal.log", WalConfig::default());
//! store.add_guard(Guard::range_int("price_range", "price*", 0, 1000));
//! store.set_policy(DecisionPolicy::SafeDefault);
//!
//! let evaluation = store.propose("price_usd", "2000");
//! for alternative in &evaluation.alternatives {
//!     println!("{} ({})", alternative.value, alternative.explanation);
//! }
//! store.commit("price_usd", "1000");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Core types
pub mod error;
pub mod policy;
pub mod retention;
pub mod time;
pub mod version;

// Guards, evaluation, and temporal resolution
pub mod evaluation;
pub mod guard;
pub mod temporal;

// Storage and the store façade
pub mod engine;
pub mod storage;

// Re-export primary types at crate root for convenience
pub use engine::ChronoStore;
pub use error::{ChronoError, ChronoResult};
pub use evaluation::WriteEvaluation;
pub use guard::{Alternative, Guard, GuardBody, GuardRegistry, GuardResult, KeyPattern};
pub use policy::DecisionPolicy;
pub use retention::RetentionPolicy;
pub use storage::{VersionStore, Wal, WalConfig, WalRecord};
pub use temporal::ExplainResult;
pub use version::Version;
