//! Error taxonomy for every fallible boundary in the core.
//!
//! Each component gets its own small enum so call sites can match on the
//! exact failure mode; [`CoreError`] aggregates them for the orchestrator,
//! which ultimately collapses every variant to `false` at its public
//! boundary (see `orchestrator.rs`).

#[derive(thiserror::Error, Debug)]
pub enum TaxonomyError {
    #[error("account {account_id:?} is already mapped to a symbol at version {version}")]
    TaxonomyConflict { account_id: String, version: u64 },
    #[error("no unused symbol remains in the alphabet")]
    AlphabetExhausted,
    #[error("account {0:?} has no mapping at or before the requested version")]
    UnmappedAccount(String),
    #[error("update version {requested} precedes current_version {current}")]
    VersionRegression { requested: u64, current: u64 },
}

#[derive(thiserror::Error, Debug)]
pub enum NfaError {
    #[error("pattern {pattern:?} failed to compile: {reason}")]
    InvalidPattern { pattern: String, reason: String },
    #[error("structural mutation attempted on a frozen NFA")]
    FrozenNfa,
    #[error("freeze() called on an already-frozen NFA")]
    AlreadyFrozen,
    #[error("measure {measure_id:?} already has a weighted regex in final state {state_id}")]
    DuplicateMeasureWeight { measure_id: String, state_id: u32 },
}

#[derive(thiserror::Error, Debug)]
pub enum EnumerationError {
    #[error("enumeration exceeded max_paths ({max_paths}); reached {reached}")]
    EnumerationExplosion { max_paths: usize, reached: usize },
    #[error("taxonomy lookup failed while converting a path to a word: {0}")]
    Taxonomy(#[from] TaxonomyError),
}

#[derive(thiserror::Error, Debug)]
pub enum LpError {
    #[error("constraint {name:?} references undefined variable {variable_id}")]
    UndefinedVariable { name: String, variable_id: u32 },
    #[error("coefficient magnitude {magnitude} exceeds the configured cap {cap}")]
    CoefficientOverflow { magnitude: String, cap: String },
    #[error("constraint {name:?} contains a non-finite coefficient or bound")]
    NonFiniteValue { name: String },
}

#[derive(thiserror::Error, Debug)]
pub enum SimplexError {
    #[error("division by a quantity with magnitude below the singularity floor")]
    NumericalSingularity,
    #[error("iteration cap {max_iterations} exceeded without reaching an optimum")]
    IterationCapExceeded { max_iterations: u32 },
    #[error("tableau invariant violated: {0}")]
    TableauInvariantBroken(String),
}

/// Aggregate error returned by the lower-level, non-boolean component APIs.
///
/// `Orchestrator::validate` never surfaces this directly — the only
/// user-visible signal it gives is the boolean decision plus the
/// statistics record; this type is consumed internally and by
/// `validate_detailed`, the diagnostic escape hatch used by this crate's
/// own tests.
#[derive(thiserror::Error, Debug)]
pub enum CoreError {
    #[error(transparent)]
    Taxonomy(#[from] TaxonomyError),
    #[error(transparent)]
    Nfa(#[from] NfaError),
    #[error(transparent)]
    Enumeration(#[from] EnumerationError),
    #[error(transparent)]
    Lp(#[from] LpError),
    #[error(transparent)]
    Simplex(#[from] SimplexError),
}
