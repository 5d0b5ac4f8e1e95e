//! Pattern-weighted flow validation for DAG transactions.
//!
//! A proposed transaction is admitted only if the flow-counting problem
//! derived from it — a set of non-negative variables, one per NFA
//! equivalence class reachable by walking the transaction's DAG paths,
//! constrained by source/target/regulatory bounds drawn from a weighted
//! regex table — is linearly feasible under Phase-1 simplex. See
//! [`orchestrator::Orchestrator`] for the single entry point.
//!
//! ```
//! use flowgate_core::config::{FinalStateTiebreak, ValidationConfig};
//! use flowgate_core::dag::InMemoryDag;
//! use flowgate_core::nfa::NfaBuilder;
//! use flowgate_core::orchestrator::Orchestrator;
//! use flowgate_core::transaction::Transaction;
//! use rust_decimal_macros::dec;
//!
//! let _ = env_logger::try_init();
//!
//! let config = ValidationConfig::new();
//! let base_nfa = NfaBuilder::new(config.alphabet.clone()).freeze(FinalStateTiebreak::SmallestStateId);
//! let mut orchestrator = Orchestrator::new(base_nfa, config);
//! let dag = InMemoryDag::new().add_edge("alice", "bob");
//!
//! let transaction = Transaction::builder("alice", "bob")
//!     .with_source_measure("src", "A.*", dec!(1), dec!(150))
//!     .with_target_measure("tgt", ".*B", dec!(0.9), dec!(100))
//!     .build();
//!
//! assert!(orchestrator.validate(&dag, &transaction));
//! ```

pub mod config;
pub mod dag;
pub mod enumerator;
pub mod error;
pub mod lp;
pub mod nfa;
pub mod orchestrator;
pub mod pattern;
pub mod pivot;
pub mod simplex;
pub mod stats;
pub mod taxonomy;
pub mod transaction;

/// Arbitrary-precision signed decimal used throughout: weights, bounds,
/// tolerances, and flow-variable values.
pub type Num = rust_decimal::Decimal;
