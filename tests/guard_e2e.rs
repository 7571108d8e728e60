//! End-to-end guard negotiation scenarios.

use chronokv::{ChronoStore, DecisionPolicy, Guard, GuardResult};

#[test]
fn safe_default_counter_offers_range_violation() {
    let mut store = ChronoStore::new();
    store.add_guard(Guard::range_int("price_range", "price*", 0, 1000));
    store.set_policy(DecisionPolicy::SafeDefault);

    let evaluation = store.propose("price_usd", "2000");
    assert_eq!(evaluation.result, GuardResult::CounterOffer);
    assert_eq!(evaluation.triggered_guards, ["price_range"]);

    let values: Vec<_> = evaluation
        .alternatives
        .iter()
        .map(|a| a.value.as_str())
        .collect();
    assert!(values.contains(&"1000"));
    assert!(values.contains(&"750"));

    let accepted = store.propose("price_usd", "50");
    assert_eq!(accepted.result, GuardResult::Accept);
    assert_eq!(accepted.reason, "All guards passed");
}

#[test]
fn strict_rejects_and_clears_alternatives() {
    let mut store = ChronoStore::new();
    store.add_guard(Guard::range_int("price_range", "price*", 0, 1000));
    store.set_policy(DecisionPolicy::Strict);

    let evaluation = store.propose("price_usd", "2000");
    assert_eq!(evaluation.result, GuardResult::Reject);
    assert!(evaluation.alternatives.is_empty());
    assert_eq!(evaluation.applied_policy, DecisionPolicy::Strict);
}

#[test]
fn enum_guard_case_corrects_first() {
    let mut store = ChronoStore::new();
    store.add_guard(Guard::enumeration(
        "env",
        "env",
        vec!["dev".into(), "staging".into(), "prod".into()],
    ));
    store.set_policy(DecisionPolicy::SafeDefault);

    let evaluation = store.propose("env", "Prod");
    assert_eq!(evaluation.result, GuardResult::CounterOffer);
    assert_eq!(evaluation.alternatives[0].value, "prod");
    assert_eq!(
        evaluation.alternatives[0].explanation,
        "Case-corrected version of proposed value"
    );
}

// P4: propose never changes observable state.
#[test]
fn propose_is_pure() {
    let mut store = ChronoStore::new();
    store.add_guard(Guard::length("len", "*", 0, 3));
    store.set("k", "abc");

    let history_before = store.history("k").to_vec();
    let latest_before = store.all_latest();
    let guards_before = store.guards().len();

    let _ = store.propose("k", "much_too_long");
    let _ = store.propose("other", "xy");

    assert_eq!(store.history("k"), history_before.as_slice());
    assert_eq!(store.all_latest(), latest_before);
    assert_eq!(store.guards().len(), guards_before);
    assert!(!store.exists("other"));
}

// P5: accept iff every applicable, enabled guard accepts.
#[test]
fn accept_requires_every_guard_to_pass() {
    let mut store = ChronoStore::new();
    store.add_guard(Guard::range_int("range", "n", 0, 100));
    store.add_guard(Guard::length("len", "n", 1, 2));

    assert_eq!(store.propose("n", "42").result, GuardResult::Accept);
    // In range but three bytes long.
    assert_eq!(store.propose("n", "100").result, GuardResult::CounterOffer);

    // Disabling the objecting guard restores acceptance.
    assert!(store.set_guard_enabled("len", false));
    assert_eq!(store.propose("n", "100").result, GuardResult::Accept);
}

// P6: under Strict the result is never CounterOffer, and a reject never
// carries alternatives.
#[test]
fn strict_never_counter_offers() {
    let mut store = ChronoStore::new();
    store.add_guard(Guard::range_int("range", "*", 0, 10));
    store.add_guard(Guard::enumeration("set", "choice", vec!["a".into()]));
    store.set_policy(DecisionPolicy::Strict);

    for (key, value) in [("k", "999"), ("k", "junk"), ("choice", "b"), ("k", "5")] {
        let evaluation = store.propose(key, value);
        assert_ne!(evaluation.result, GuardResult::CounterOffer);
        if evaluation.result == GuardResult::Reject {
            assert!(evaluation.alternatives.is_empty());
        }
    }
}

// P8: remove_guard returns true iff the guard existed, and it stops
// applying immediately.
#[test]
fn remove_guard_semantics() {
    let mut store = ChronoStore::new();
    assert!(!store.remove_guard("absent"));

    store.add_guard(Guard::range_int("r", "*", 0, 1));
    assert!(store.remove_guard("r"));
    assert!(store.guards_for_key("anything").is_empty());
    assert!(!store.remove_guard("r"));

    let evaluation = store.propose("anything", "totally-invalid");
    assert_eq!(evaluation.result, GuardResult::Accept);
    assert_eq!(evaluation.reason, "No guards defined for this key");
}

#[test]
fn reject_discards_pending_counter_offers() {
    let mut store = ChronoStore::new();
    store.add_guard(Guard::length("len", "*", 0, 2));
    store.add_guard(Guard::range_int("range", "*", 0, 10));

    // Trips the length guard first, then fails integer parsing.
    let evaluation = store.propose("k", "abc");
    assert_eq!(evaluation.result, GuardResult::Reject);
    assert_eq!(evaluation.reason, "Value is not a valid integer");
    assert!(evaluation.alternatives.is_empty());
    assert_eq!(evaluation.triggered_guards, ["len", "range"]);
}

#[test]
fn dev_friendly_shows_alternatives_for_multiple_guards() {
    let mut store = ChronoStore::new();
    store.add_guard(Guard::range_int("range", "*", 0, 10));
    store.add_guard(Guard::length("len", "*", 0, 1));
    store.set_policy(DecisionPolicy::DevFriendly);

    let evaluation = store.propose("k", "55");
    assert_eq!(evaluation.result, GuardResult::CounterOffer);
    assert_eq!(evaluation.triggered_guards, ["range", "len"]);
    assert!(evaluation.reason.contains("; "));
    assert!(evaluation
        .policy_reasoning
        .contains("showing alternatives"));
}
