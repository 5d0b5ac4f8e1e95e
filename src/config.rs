//! Tunable options for a validation session.
//!
//! Defaults use a feasibility tolerance of 1e-10, a geometric tolerance of
//! 1e-12, and stability cutoffs of 0.9 / 0.5.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Ordering used by `AnchoredWeightedNFA::evaluate` to pick a single final
/// state when more than one final state is reachable at end-of-input.
///
/// `SmallestStateId` is the only order this crate implements; the variant
/// exists to make the tie-break an explicit, documented part of
/// `ValidationConfig` rather than an implicit detail of `nfa.rs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FinalStateTiebreak {
    #[default]
    SmallestStateId,
}

/// The stability-score cutoffs used by `PivotValidator::classify`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StabilityThresholds {
    pub highly_stable: Decimal,
    pub moderately_stable: Decimal,
}

impl Default for StabilityThresholds {
    fn default() -> Self {
        Self {
            highly_stable: dec!(0.9),
            moderately_stable: dec!(0.5),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationConfig {
    /// Input symbols the taxonomy may assign, in ordinal order.
    pub alphabet: Vec<char>,
    /// Enumeration explosion cap; exceeding it fails the whole `validate` call.
    pub max_paths: usize,
    /// Throughput-only batching hint for the path enumerator; no semantic effect.
    pub batch_size: usize,
    /// Simplex iteration cap before an ERROR status is raised.
    pub max_iterations: u32,
    /// Feasibility slack (tau_f) applied to constraint satisfaction checks.
    pub tolerance_feasibility: Decimal,
    /// Geometric tolerance (tau_g) applied to pivot stability scoring.
    pub tolerance_geometric: Decimal,
    /// Significant digits carried by `Num` (`rust_decimal::Decimal`) arithmetic.
    pub decimal_precision: u32,
    /// HIGHLY_STABLE / MODERATELY_STABLE cutoffs for pivot classification.
    pub stability_thresholds: StabilityThresholds,
    /// Tie-break order among simultaneously reachable NFA final states.
    pub final_state_tiebreak: FinalStateTiebreak,
    /// Cap on the absolute value of any LP coefficient or bound.
    pub coefficient_magnitude_cap: Decimal,
}

/// Upper-case letters first, then lower-case, then digits, then the
/// remaining 7-bit printable range — so that auto-assignment (the lowest
/// unused ordinal in the alphabet, in this fixed order) hands out 'A',
/// 'B', 'C', ... to the first accounts seen, rather than starting at
/// space/punctuation as a raw ASCII-ordinal walk would.
fn default_alphabet() -> Vec<char> {
    let upper = 'A'..='Z';
    let lower = 'a'..='z';
    let digits = '0'..='9';
    let rest = (0x20u32..=0x7eu32).filter_map(char::from_u32).filter(|c| !c.is_ascii_alphanumeric());
    upper.chain(lower).chain(digits).chain(rest).collect()
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            alphabet: default_alphabet(),
            max_paths: 10_000,
            batch_size: 256,
            max_iterations: 10_000,
            tolerance_feasibility: dec!(0.0000000001),
            tolerance_geometric: dec!(0.000000000001),
            decimal_precision: 28,
            stability_thresholds: StabilityThresholds::default(),
            final_state_tiebreak: FinalStateTiebreak::default(),
            coefficient_magnitude_cap: dec!(1000000000000),
        }
    }
}

impl ValidationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_alphabet(mut self, alphabet: Vec<char>) -> Self {
        self.alphabet = alphabet;
        self
    }

    pub fn with_max_paths(mut self, max_paths: usize) -> Self {
        self.max_paths = max_paths;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_tolerances(mut self, feasibility: Decimal, geometric: Decimal) -> Self {
        self.tolerance_feasibility = feasibility;
        self.tolerance_geometric = geometric;
        self
    }

    pub fn with_stability_thresholds(mut self, thresholds: StabilityThresholds) -> Self {
        self.stability_thresholds = thresholds;
        self
    }
}
