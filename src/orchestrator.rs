//! Glues the taxonomy, NFA, path enumerator, LP builder, and triple-validation
//! simplex into the single per-transaction `validate` call described by the
//! S0-S6 state table.
//!
//! The orchestrator exclusively owns the base NFA, the taxonomy, the
//! retained pivot, and the transaction counter; everything else is
//! ephemeral per call.

use std::collections::HashMap;

use log::{debug, info, trace, warn};
use rust_decimal::Decimal;

use crate::config::ValidationConfig;
use crate::dag::DagView;
use crate::enumerator::{Path, PathEnumerator};
use crate::error::{CoreError, EnumerationError};
use crate::lp::{build_secondary, build_source_primary, build_target_primary, FluxVariable, LinearProgram, MeasureCoefficients};
use crate::nfa::{FrozenNfa, StateId};
use crate::simplex::{SimplexStatus, TripleValidationSimplex};
use crate::stats::Statistics;
use crate::taxonomy::{AccountMapping, AccountTaxonomy};
use crate::transaction::Transaction;

/// Owns the long-lived validation state for a single logical validator:
/// one frozen base NFA, one append-only taxonomy, and the pivot retained
/// across calls for warm-starting. Not `Sync` by itself — callers wanting
/// concurrent validation give each thread its own `Orchestrator`, sharing
/// only the (already `Send + Sync`) base NFA construction inputs.
pub struct Orchestrator {
    base_nfa: FrozenNfa,
    taxonomy: AccountTaxonomy,
    retained_pivot: Option<HashMap<StateId, Decimal>>,
    transaction_counter: u64,
    stats: Statistics,
    config: ValidationConfig,
}

impl Orchestrator {
    pub fn new(base_nfa: FrozenNfa, config: ValidationConfig) -> Self {
        let taxonomy = AccountTaxonomy::new(config.alphabet.clone());
        Self {
            base_nfa,
            taxonomy,
            retained_pivot: None,
            transaction_counter: 0,
            stats: Statistics::new(),
            config,
        }
    }

    pub fn statistics(&self) -> Statistics {
        self.stats
    }

    pub fn transaction_counter(&self) -> u64 {
        self.transaction_counter
    }

    pub fn retained_pivot(&self) -> Option<&HashMap<StateId, Decimal>> {
        self.retained_pivot.as_ref()
    }

    pub fn taxonomy(&self) -> &AccountTaxonomy {
        &self.taxonomy
    }

    /// Bootstraps the taxonomy with accounts that did not arrive through a
    /// `validate` call — e.g. DAG nodes made known by previously accepted
    /// transactions outside this core's scope. Records at the taxonomy's
    /// own next version, so a fresh `Orchestrator` can be seeded before its
    /// first `validate` call without racing S0/S1's own extension logic.
    pub fn seed_taxonomy(&mut self, mapping_delta: &[AccountMapping]) -> Result<(), crate::error::TaxonomyError> {
        let version = self.taxonomy.next_version();
        self.taxonomy.update(mapping_delta, version)
    }

    /// Public boundary: collapses every non-successful outcome to `false`
    /// (fail-closed). Use [`Self::validate_detailed`] to see why a
    /// rejection happened; that method is a diagnostic escape hatch, not
    /// part of the contract external callers depend on.
    pub fn validate<D: DagView>(&mut self, dag: &D, transaction: &Transaction) -> bool {
        self.validate_detailed(dag, transaction).unwrap_or(false)
    }

    /// Runs the full S0-S6 state table and returns the real outcome,
    /// including the error that caused a rejection. `transaction_counter`
    /// always increments, win or lose; the taxonomy extension performed in
    /// S1 is only committed when the call ultimately returns `Ok(true)`
    /// (see DESIGN.md's resolution of the rollback open question).
    pub fn validate_detailed<D: DagView>(
        &mut self,
        dag: &D,
        transaction: &Transaction,
    ) -> Result<bool, CoreError> {
        self.transaction_counter += 1;

        // S0 + S1, on a scratch clone: a failed call never needs to undo
        // partial taxonomy mutation because nothing was mutated in place.
        let mut taxonomy = self.taxonomy.clone();
        let mut new_accounts = Vec::new();
        for account in [&transaction.source_account_id, &transaction.target_account_id] {
            if !taxonomy.is_known(account)
                && !new_accounts.iter().any(|m: &AccountMapping| &m.account_id == account)
            {
                new_accounts.push(AccountMapping::auto(account.clone()));
            }
        }
        let version = if new_accounts.is_empty() {
            taxonomy.current_version()
        } else {
            taxonomy.next_version()
        };
        if !new_accounts.is_empty() {
            taxonomy.update(&new_accounts, version)?;
            debug!(
                "taxonomy extended to version {version} with {} new account(s)",
                new_accounts.len()
            );
        }

        let outcome = self.run_validation(dag, transaction, &taxonomy, version);

        match &outcome {
            Ok(true) => {
                self.taxonomy = taxonomy;
                self.stats.record_accept();
                info!("transaction {} accepted", self.transaction_counter);
            }
            Ok(false) => {
                self.stats.record_reject();
                info!("transaction {} rejected", self.transaction_counter);
            }
            Err(err) => {
                self.stats.record_reject();
                warn!("transaction {} errored: {err}", self.transaction_counter);
            }
        }
        outcome
    }

    /// S2 through S6: everything downstream of the taxonomy extension.
    /// `taxonomy`/`version` are the (possibly extended) scratch values from
    /// S0/S1; `self` is only touched for the base NFA, retained pivot,
    /// config, and statistics.
    fn run_validation<D: DagView>(
        &mut self,
        dag: &D,
        transaction: &Transaction,
        taxonomy: &AccountTaxonomy,
        version: u64,
    ) -> Result<bool, CoreError> {
        // S2: transaction-scoped NFA clone, frozen by clone_with itself.
        let tx_nfa = self.base_nfa.clone_with(&transaction.extra_patterns())?;

        // S3: enumerate the candidate edge's paths and classify each one.
        let enumerator = PathEnumerator::new(dag, self.config.max_paths);
        let paths = match enumerator.enumerate(&transaction.target_account_id) {
            Ok(paths) => paths,
            Err(EnumerationError::EnumerationExplosion { max_paths, reached }) => {
                self.stats.record_path_explosion();
                warn!("enumeration explosion: reached {reached} paths against a cap of {max_paths}");
                return Ok(false);
            }
            Err(other) => return Err(other.into()),
        };

        let classes = classify_paths(&enumerator, &paths, taxonomy, version, &tx_nfa)?;

        // S4: build the LP, or resolve the empty-classes case directly.
        if classes.is_empty() {
            return Ok(trivially_feasible_with_no_flow(transaction));
        }

        let lp = build_lp(&tx_nfa, transaction, &classes);
        lp.validate(self.config.coefficient_magnitude_cap)?;
        debug!(
            "built LP with {} variable(s) and {} constraint(s)",
            lp.variables.len(),
            lp.constraints.len()
        );

        // S5: solve, warm-starting from the retained pivot when present.
        let simplex = TripleValidationSimplex::new(
            self.config.tolerance_feasibility,
            self.config.tolerance_geometric,
            self.config.max_iterations,
            self.config.stability_thresholds,
        );
        let solution = simplex.solve(&lp, self.retained_pivot.as_ref())?;
        self.stats.record_solve_path(solution.path_taken);
        info!(
            "simplex status={:?} path={:?} iterations={}",
            solution.status, solution.path_taken, solution.iterations
        );

        // S6: decide.
        match solution.status {
            SimplexStatus::Feasible => {
                self.retained_pivot = Some(solution.variables);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// S3's per-path classification step: converts each path to a word under
/// the (possibly-extended) taxonomy and classifies it with the
/// transaction-scoped frozen NFA, accumulating a final-state-id -> count
/// map (an equivalence-class partition of the enumerated paths). Paths the
/// NFA does not accept fall into an implicit rejection class and are
/// simply not counted anywhere.
fn classify_paths(
    enumerator: &PathEnumerator<'_, impl DagView>,
    paths: &[Path],
    taxonomy: &AccountTaxonomy,
    version: u64,
    tx_nfa: &FrozenNfa,
) -> Result<HashMap<StateId, u64>, CoreError> {
    let mut classes: HashMap<StateId, u64> = HashMap::new();
    for path in paths {
        let word = enumerator.path_to_word(path, taxonomy, version)?;
        if let Some(state_id) = tx_nfa.evaluate(&word) {
            trace!("path {:?} -> word {word:?} -> final state {state_id}", path.nodes);
            *classes.entry(state_id).or_insert(0) += 1;
        } else {
            trace!("path {:?} -> word {word:?} -> no accepting final state", path.nodes);
        }
    }
    Ok(classes)
}

/// S4's empty-classes branch: with zero flow variables every constraint
/// collapses to `0 OP b`. Secondary constraints (`0 ≤ 0`) always hold;
/// source-primary constraints (`0 ≤ acceptable_value`) and target-primary
/// constraints (`0 ≥ required_value`) hold only when their bound is on
/// the right side of zero. An empty transaction (no measures at all) is
/// vacuously covered by the same rule.
fn trivially_feasible_with_no_flow(transaction: &Transaction) -> bool {
    transaction
        .source_measures
        .iter()
        .all(|measure| measure.acceptable_value >= Decimal::ZERO)
        && transaction
            .target_measures
            .iter()
            .all(|measure| measure.required_value <= Decimal::ZERO)
}

/// S4's build-lp branch: one `FluxVariable` per non-empty equivalence
/// class, plus source-primary/secondary and target-primary/secondary
/// constraints built from each measure's coefficient table.
fn build_lp(tx_nfa: &FrozenNfa, transaction: &Transaction, classes: &HashMap<StateId, u64>) -> LinearProgram {
    let mut lp = LinearProgram::new();
    for &state_id in classes.keys() {
        lp = lp.with_variable(FluxVariable::new(state_id));
    }

    for measure in &transaction.source_measures {
        let coeffs = coefficients_for(tx_nfa, classes, &measure.measure_id);
        lp = lp.with_constraint(build_source_primary(
            format!("source:{}", measure.measure_id),
            &coeffs,
            measure.acceptable_value,
        ));
        for secondary in &measure.secondary_patterns {
            let sec_coeffs = coefficients_for(tx_nfa, classes, &secondary.measure_id);
            lp = lp.with_constraint(build_secondary(
                format!("source-secondary:{}", secondary.measure_id),
                &sec_coeffs,
            ));
        }
    }

    for measure in &transaction.target_measures {
        let coeffs = coefficients_for(tx_nfa, classes, &measure.measure_id);
        lp = lp.with_constraint(build_target_primary(
            format!("target:{}", measure.measure_id),
            &coeffs,
            measure.required_value,
        ));
        for secondary in &measure.secondary_patterns {
            let sec_coeffs = coefficients_for(tx_nfa, classes, &secondary.measure_id);
            lp = lp.with_constraint(build_secondary(
                format!("target-secondary:{}", secondary.measure_id),
                &sec_coeffs,
            ));
        }
    }

    lp
}

/// `Cᵢ,m` for every class currently active: the weight of the
/// `WeightedRegex` in class `i`'s final state tagged `measure_id`, absent
/// (== 0 downstream) if that class carries no such weight. The "one
/// weight, one use" guard (enforced in `NfaBuilder::add_weighted_regex`)
/// means at most one weight can match per `(state, measure_id)` pair.
fn coefficients_for(tx_nfa: &FrozenNfa, classes: &HashMap<StateId, u64>, measure_id: &str) -> MeasureCoefficients {
    let mut coefficients = MeasureCoefficients::new();
    for &state_id in classes.keys() {
        if let Some(weighted) = tx_nfa.weights_at(state_id).iter().find(|w| w.measure_id == measure_id) {
            coefficients.insert(state_id, weighted.weight);
        }
    }
    coefficients
}
