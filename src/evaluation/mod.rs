//! Write evaluation: guards plus decision-policy arbitration.
//!
//! A proposed write is simulated against every applicable guard, aggregated
//! into a [`WriteEvaluation`], then arbitrated by the active
//! [`DecisionPolicy`](crate::policy::DecisionPolicy). Nothing here mutates
//! the store.

mod evaluator;

pub use evaluator::{apply_decision_policy, simulate_write};

use serde::{Deserialize, Serialize};

use crate::guard::{Alternative, GuardResult};
use crate::policy::DecisionPolicy;

/// Structured result of evaluating a proposed write.
///
/// This is the only channel through which guard violations travel; they are
/// never raised as errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteEvaluation {
    /// The key the write was proposed for.
    pub key: String,
    /// The proposed value.
    pub proposed_value: String,
    /// Final verdict after policy arbitration.
    pub result: GuardResult,
    /// Guard-level reasons, joined with `"; "` when several objected.
    pub reason: String,
    /// Deduplicated alternatives collected from counter-offering guards.
    pub alternatives: Vec<Alternative>,
    /// Names of the guards that objected, in evaluation order.
    pub triggered_guards: Vec<String>,
    /// The policy that arbitrated this evaluation.
    pub applied_policy: DecisionPolicy,
    /// Why the policy settled on the final verdict.
    pub policy_reasoning: String,
}

impl WriteEvaluation {
    /// Creates an evaluation pre-set to `Accept` for the given proposal.
    #[must_use]
    pub fn accept(key: impl Into<String>, proposed_value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            proposed_value: proposed_value.into(),
            result: GuardResult::Accept,
            reason: String::new(),
            alternatives: Vec::new(),
            triggered_guards: Vec::new(),
            applied_policy: DecisionPolicy::default(),
            policy_reasoning: String::new(),
        }
    }

    /// Returns true if the write may be applied as proposed.
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(self.result, GuardResult::Accept)
    }
}
