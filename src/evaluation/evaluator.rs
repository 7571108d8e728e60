//! Guard evaluation and policy arbitration.

use crate::guard::{GuardRegistry, GuardResult};
use crate::policy::DecisionPolicy;

use super::WriteEvaluation;

/// Simulates a write against every applicable guard without mutating state.
///
/// Guards run in registration order. The first `Reject` short-circuits:
/// pending counter-offers are discarded and `triggered_guards` holds exactly
/// the rejecting guard. Counter-offering guards accumulate; their reasons
/// are joined with `"; "` and their alternatives merged, first occurrence of
/// a value winning.
#[must_use]
pub fn simulate_write(registry: &GuardRegistry, key: &str, value: &str) -> WriteEvaluation {
    let mut evaluation = WriteEvaluation::accept(key, value);

    let applicable = registry.for_key(key);
    if applicable.is_empty() {
        evaluation.reason = "No guards defined for this key".to_string();
        return evaluation;
    }

    let mut all_accepted = true;
    let mut collected = Vec::new();

    for guard in applicable {
        let (result, reason) = guard.evaluate(value);
        match result {
            GuardResult::Reject => {
                // A reject discards any pending counter-offers.
                evaluation.result = GuardResult::Reject;
                evaluation.triggered_guards.push(guard.name.clone());
                evaluation.reason = reason;
                return evaluation;
            }
            GuardResult::CounterOffer => {
                all_accepted = false;
                evaluation.triggered_guards.push(guard.name.clone());

                for alternative in guard.alternatives(value) {
                    if collected
                        .iter()
                        .any(|existing: &crate::guard::Alternative| {
                            existing.value == alternative.value
                        })
                    {
                        continue;
                    }
                    collected.push(alternative);
                }

                if evaluation.reason.is_empty() {
                    evaluation.reason = reason;
                } else {
                    evaluation.reason.push_str("; ");
                    evaluation.reason.push_str(&reason);
                }
            }
            GuardResult::Accept => {}
        }
    }

    if all_accepted {
        evaluation.reason = "All guards passed".to_string();
    } else {
        evaluation.result = GuardResult::CounterOffer;
        evaluation.alternatives = collected;
    }

    evaluation
}

/// Applies the active decision policy to a guard evaluation.
///
/// Accepted writes pass through untouched. `Strict` escalates every
/// counter-offer to a reject and clears alternatives; `SafeDefault` rejects
/// counter-offers that carry no alternatives; `DevFriendly` never escalates.
pub fn apply_decision_policy(policy: DecisionPolicy, evaluation: &mut WriteEvaluation) {
    evaluation.applied_policy = policy;

    if evaluation.result == GuardResult::Accept {
        evaluation.policy_reasoning = "No policy applied - all guards passed".to_string();
        return;
    }

    match policy {
        DecisionPolicy::Strict => {
            if evaluation.result == GuardResult::CounterOffer {
                evaluation.result = GuardResult::Reject;
                evaluation.alternatives.clear();
            }
            evaluation.policy_reasoning =
                "Rejected under STRICT policy due to guard violation".to_string();
        }
        DecisionPolicy::DevFriendly => {
            evaluation.policy_reasoning = match evaluation.result {
                GuardResult::Reject => {
                    "Rejected under DEV_FRIENDLY policy - value cannot be salvaged".to_string()
                }
                _ => "Counter-offer under DEV_FRIENDLY policy - showing alternatives".to_string(),
            };
        }
        DecisionPolicy::SafeDefault => match evaluation.result {
            GuardResult::CounterOffer if evaluation.alternatives.is_empty() => {
                evaluation.result = GuardResult::Reject;
                evaluation.policy_reasoning =
                    "Rejected under SAFE_DEFAULT policy - no safe alternatives available"
                        .to_string();
            }
            GuardResult::CounterOffer => {
                evaluation.policy_reasoning =
                    "Counter-offer under SAFE_DEFAULT policy - safe alternatives available"
                        .to_string();
            }
            _ => {
                evaluation.policy_reasoning =
                    "Rejected under SAFE_DEFAULT policy - critical violation".to_string();
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use crate::guard::Guard;

    use super::*;

    fn registry_with(guards: Vec<Guard>) -> GuardRegistry {
        let mut registry = GuardRegistry::new();
        for guard in guards {
            registry.add(guard);
        }
        registry
    }

    #[test]
    fn test_no_guards_accepts() {
        let registry = GuardRegistry::new();
        let ev = simulate_write(&registry, "k", "v");
        assert_eq!(ev.result, GuardResult::Accept);
        assert_eq!(ev.reason, "No guards defined for this key");
    }

    #[test]
    fn test_all_guards_pass() {
        let registry = registry_with(vec![
            Guard::range_int("range", "*", 0, 100),
            Guard::length("len", "*", 1, 4),
        ]);
        let ev = simulate_write(&registry, "k", "42");
        assert_eq!(ev.result, GuardResult::Accept);
        assert_eq!(ev.reason, "All guards passed");
        assert!(ev.triggered_guards.is_empty());
    }

    #[test]
    fn test_counter_offers_accumulate() {
        let registry = registry_with(vec![
            Guard::range_int("range", "*", 0, 9),
            Guard::length("len", "*", 0, 1),
        ]);
        let ev = simulate_write(&registry, "k", "99");
        assert_eq!(ev.result, GuardResult::CounterOffer);
        assert_eq!(ev.triggered_guards, ["range", "len"]);
        assert!(ev.reason.contains("; "));
        // Both guards propose "9" (range maximum, length truncation); the
        // first occurrence wins and no duplicate appears.
        let values: Vec<_> = ev.alternatives.iter().map(|a| a.value.as_str()).collect();
        assert_eq!(values, ["9", "7"]);
    }

    #[test]
    fn test_reject_short_circuits() {
        let registry = registry_with(vec![
            Guard::length("len", "*", 0, 2),
            Guard::range_int("range", "*", 0, 10),
            Guard::length("never_reached", "*", 0, 1),
        ]);
        // "abc" trips the length counter-offer, then fails integer parsing.
        let ev = simulate_write(&registry, "k", "abc");
        assert_eq!(ev.result, GuardResult::Reject);
        // Short-circuit discards the pending counter-offer state.
        assert_eq!(ev.reason, "Value is not a valid integer");
        assert!(ev.alternatives.is_empty());
        assert_eq!(ev.triggered_guards, ["len", "range"]);
    }

    #[test]
    fn test_policy_noop_on_accept() {
        let mut ev = WriteEvaluation::accept("k", "v");
        apply_decision_policy(DecisionPolicy::Strict, &mut ev);
        assert_eq!(ev.result, GuardResult::Accept);
        assert_eq!(ev.policy_reasoning, "No policy applied - all guards passed");
        assert_eq!(ev.applied_policy, DecisionPolicy::Strict);
    }

    #[test]
    fn test_strict_escalates_counter_offer() {
        let registry = registry_with(vec![Guard::range_int("range", "*", 0, 10)]);
        let mut ev = simulate_write(&registry, "k", "50");
        assert_eq!(ev.result, GuardResult::CounterOffer);

        apply_decision_policy(DecisionPolicy::Strict, &mut ev);
        assert_eq!(ev.result, GuardResult::Reject);
        assert!(ev.alternatives.is_empty());
        assert!(ev.policy_reasoning.contains("STRICT"));
    }

    #[test]
    fn test_safe_default_keeps_counter_offer_with_alternatives() {
        let registry = registry_with(vec![Guard::range_int("range", "*", 0, 10)]);
        let mut ev = simulate_write(&registry, "k", "50");
        apply_decision_policy(DecisionPolicy::SafeDefault, &mut ev);
        assert_eq!(ev.result, GuardResult::CounterOffer);
        assert!(ev.policy_reasoning.contains("safe alternatives available"));
    }

    #[test]
    fn test_safe_default_rejects_without_alternatives() {
        let mut ev = WriteEvaluation::accept("k", "v");
        ev.result = GuardResult::CounterOffer;
        apply_decision_policy(DecisionPolicy::SafeDefault, &mut ev);
        assert_eq!(ev.result, GuardResult::Reject);
        assert!(ev.policy_reasoning.contains("no safe alternatives"));
    }

    #[test]
    fn test_safe_default_labels_critical_reject() {
        let registry = registry_with(vec![Guard::range_int("range", "*", 0, 10)]);
        let mut ev = simulate_write(&registry, "k", "oops");
        apply_decision_policy(DecisionPolicy::SafeDefault, &mut ev);
        assert_eq!(ev.result, GuardResult::Reject);
        assert!(ev.policy_reasoning.contains("critical violation"));
    }

    #[test]
    fn test_dev_friendly_never_escalates() {
        let registry = registry_with(vec![Guard::range_int("range", "*", 0, 10)]);
        let mut ev = simulate_write(&registry, "k", "50");
        apply_decision_policy(DecisionPolicy::DevFriendly, &mut ev);
        assert_eq!(ev.result, GuardResult::CounterOffer);
        assert!(!ev.alternatives.is_empty());
        assert!(ev.policy_reasoning.contains("showing alternatives"));
    }

    #[test]
    fn test_dev_friendly_keeps_reject() {
        let registry = registry_with(vec![Guard::range_int("range", "*", 0, 10)]);
        let mut ev = simulate_write(&registry, "k", "oops");
        apply_decision_policy(DecisionPolicy::DevFriendly, &mut ev);
        assert_eq!(ev.result, GuardResult::Reject);
        assert!(ev.policy_reasoning.contains("cannot be salvaged"));
    }
}
