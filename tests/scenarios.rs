//! End-to-end scenarios: a minimal feasible transaction, an infeasible one,
//! warm-start reuse, path explosion, a regulatory forbidden pattern, and
//! sequence independence across disjoint transactions.

use flowgate_core::config::ValidationConfig;
use flowgate_core::dag::InMemoryDag;
use flowgate_core::nfa::NfaBuilder;
use flowgate_core::orchestrator::Orchestrator;
use flowgate_core::transaction::Transaction;
use rust_decimal_macros::dec;

fn empty_base_nfa() -> flowgate_core::nfa::FrozenNfa {
    NfaBuilder::new(ValidationConfig::new().alphabet).freeze(flowgate_core::config::FinalStateTiebreak::SmallestStateId)
}

#[test]
fn scenario_1_minimal_feasible() {
    let dag = InMemoryDag::new().add_edge("alice", "bob");
    let mut orchestrator = Orchestrator::new(empty_base_nfa(), ValidationConfig::new());

    let tx = Transaction::builder("alice", "bob")
        .with_source_measure("src", "A.*", dec!(1), dec!(150))
        .with_target_measure("tgt", ".*B", dec!(0.9), dec!(100))
        .build();

    assert!(orchestrator.validate(&dag, &tx));
    assert_eq!(orchestrator.statistics().transactions_validated, 1);
    let pivot = orchestrator.retained_pivot().expect("feasible call retains a pivot");
    let flow: rust_decimal::Decimal = pivot.values().copied().sum();
    assert!(flow * dec!(0.9) >= dec!(100) - dec!(0.0000000001));
    assert!(flow <= dec!(150));
}

#[test]
fn scenario_2_infeasible_at_target() {
    let dag = InMemoryDag::new().add_edge("alice", "bob");
    let mut orchestrator = Orchestrator::new(empty_base_nfa(), ValidationConfig::new());

    let tx = Transaction::builder("alice", "bob")
        .with_source_measure("src", "A.*", dec!(1), dec!(150))
        .with_target_measure("tgt", ".*B", dec!(0.9), dec!(200))
        .build();

    assert!(!orchestrator.validate(&dag, &tx));
    assert_eq!(orchestrator.statistics().transactions_rejected, 1);
    assert!(orchestrator.retained_pivot().is_none());
}

#[test]
fn scenario_3_warm_start_reuse_on_a_looser_second_transaction() {
    let dag = InMemoryDag::new().add_edge("alice", "bob");
    let mut orchestrator = Orchestrator::new(empty_base_nfa(), ValidationConfig::new());

    let first = Transaction::builder("alice", "bob")
        .with_source_measure("src", "A.*", dec!(1), dec!(150))
        .with_target_measure("tgt", ".*B", dec!(0.9), dec!(100))
        .build();
    assert!(orchestrator.validate(&dag, &first));
    assert_eq!(orchestrator.statistics().cold_starts, 1);

    let second = Transaction::builder("alice", "bob")
        .with_source_measure("src", "A.*", dec!(1), dec!(150))
        .with_target_measure("tgt", ".*B", dec!(0.9), dec!(90))
        .build();
    assert!(orchestrator.validate(&dag, &second));
    assert_eq!(orchestrator.statistics().warm_starts, 1);
}

#[test]
fn scenario_4_path_explosion_is_rejected_and_counted() {
    let dag = InMemoryDag::new()
        .add_edge("a1", "sink")
        .add_edge("a2", "sink")
        .add_edge("a3", "sink");
    let config = ValidationConfig::new().with_max_paths(2);
    let mut orchestrator = Orchestrator::new(empty_base_nfa(), config);

    let tx = Transaction::builder("a1", "sink")
        .with_target_measure("tgt", ".*", dec!(1), dec!(1))
        .build();

    assert!(!orchestrator.validate(&dag, &tx));
    assert_eq!(orchestrator.statistics().path_explosions, 1);
    assert_eq!(orchestrator.statistics().transactions_validated, 0);
}

#[test]
fn scenario_5_forbidden_pattern_matching_nothing_is_vacuous() {
    // Every path through alice->bob spells "AB", which the target measure's
    // ".*B" pattern accepts; a regulatory secondary that matches no path at
    // all contributes the vacuous constraint `0 ≤ 0` and must not block an
    // otherwise-satisfiable transaction.
    let dag = InMemoryDag::new().add_edge("alice", "bob");
    let mut orchestrator = Orchestrator::new(empty_base_nfa(), ValidationConfig::new());

    let tx = Transaction::builder("alice", "bob")
        .with_target_measure("tgt", ".*B", dec!(1), dec!(10))
        .with_target_secondary(".*ZZZ.*", dec!(1))
        .unwrap()
        .build();

    assert!(orchestrator.validate(&dag, &tx));
}

#[test]
fn scenario_5b_forbidden_pattern_zeroes_only_its_own_class() {
    // A regulatory secondary that matches paths the target measure does
    // not must zero out only its own equivalence class, leaving the
    // target measure's own class free to satisfy the positive requirement.
    let dag = InMemoryDag::new().add_edge("alice", "bob");
    let mut orchestrator = Orchestrator::new(empty_base_nfa(), ValidationConfig::new());

    let tx = Transaction::builder("alice", "bob")
        .with_target_measure("tgt", ".*B", dec!(1), dec!(10))
        .with_target_secondary("ZZZ", dec!(1))
        .unwrap()
        .build();

    assert!(orchestrator.validate(&dag, &tx));
}

#[test]
fn scenario_6_sequence_independence_across_disjoint_transactions() {
    let dag = InMemoryDag::new()
        .add_edge("alice", "bob")
        .add_edge("carol", "dave");

    let tx_a = Transaction::builder("alice", "bob")
        .with_target_measure("tgt", ".*", dec!(1), dec!(1))
        .build();
    let tx_c = Transaction::builder("carol", "dave")
        .with_target_measure("tgt", ".*", dec!(1), dec!(1))
        .build();

    let mut forward = Orchestrator::new(empty_base_nfa(), ValidationConfig::new());
    let a_then_c = (forward.validate(&dag, &tx_a), forward.validate(&dag, &tx_c));

    let mut reversed = Orchestrator::new(empty_base_nfa(), ValidationConfig::new());
    let c_then_a = (reversed.validate(&dag, &tx_c), reversed.validate(&dag, &tx_a));

    assert_eq!(a_then_c.0, c_then_a.1);
    assert_eq!(a_then_c.1, c_then_a.0);
}

#[test]
fn boundary_max_paths_zero_rejects_any_non_trivial_transaction() {
    let dag = InMemoryDag::new().add_edge("alice", "bob");
    let config = ValidationConfig::new().with_max_paths(0);
    let mut orchestrator = Orchestrator::new(empty_base_nfa(), config);

    let tx = Transaction::builder("alice", "bob")
        .with_target_measure("tgt", ".*", dec!(1), dec!(1))
        .build();

    assert!(!orchestrator.validate(&dag, &tx));
    assert_eq!(orchestrator.statistics().path_explosions, 1);
}

#[test]
fn boundary_empty_transaction_is_trivially_accepted() {
    let dag = InMemoryDag::new().add_edge("alice", "bob");
    let mut orchestrator = Orchestrator::new(empty_base_nfa(), ValidationConfig::new());
    let tx = Transaction::builder("alice", "bob").build();
    assert!(orchestrator.validate(&dag, &tx));
}

#[test]
fn diamond_dag_with_two_distinct_paths_still_validates() {
    // alice and carol both reach bob via distinct middle hops; both paths
    // are enumerated and classified independently before the LP is built.
    let dag = InMemoryDag::new()
        .add_edge("alice", "mid1")
        .add_edge("carol", "mid2")
        .add_edge("mid1", "bob")
        .add_edge("mid2", "bob");
    let mut orchestrator = Orchestrator::new(empty_base_nfa(), ValidationConfig::new());
    // carol, mid1 and mid2 are not transaction endpoints, so they must
    // already be known to the taxonomy the way a prior accepted
    // transaction would have made them known.
    orchestrator
        .seed_taxonomy(&[
            flowgate_core::taxonomy::AccountMapping::auto("carol"),
            flowgate_core::taxonomy::AccountMapping::auto("mid1"),
            flowgate_core::taxonomy::AccountMapping::auto("mid2"),
        ])
        .unwrap();

    let tx = Transaction::builder("alice", "bob")
        .with_source_measure("src", ".*", dec!(1), dec!(1_000))
        .with_target_measure("tgt", ".*", dec!(1), dec!(1))
        .build();

    assert!(orchestrator.validate(&dag, &tx));
}
