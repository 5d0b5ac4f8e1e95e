//! Phase-1 tableau simplex with triple validation: pivot classification
//! drives a warm-start / cold-start / cross-validation dispatch over the
//! classical algorithm.

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::error::SimplexError;
use crate::lp::{ConstraintKind, LinearProgram};
use crate::nfa::StateId;
use crate::pivot::{PivotClass, PivotValidator};

/// Magnitude below which a divisor is treated as numerically singular.
const SINGULARITY_FLOOR: &str = "0.000000000000001";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimplexStatus {
    Feasible,
    Infeasible,
    /// Never produced by this Phase-1-only solver (a feasibility objective
    /// is bounded below by zero); kept for parity with the full
    /// `SimplexSolution` status domain.
    Unbounded,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolvePath {
    WarmStart,
    ColdStart,
    CrossValidated,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimplexSolution {
    pub status: SimplexStatus,
    pub variables: HashMap<StateId, Decimal>,
    pub iterations: u32,
    pub pivots: u32,
    pub path_taken: SolvePath,
}

pub struct TripleValidationSimplex {
    tolerance_feasibility: Decimal,
    max_iterations: u32,
    pivot_validator: PivotValidator,
}

impl TripleValidationSimplex {
    pub fn new(
        tolerance_feasibility: Decimal,
        tolerance_geometric: Decimal,
        max_iterations: u32,
        thresholds: crate::config::StabilityThresholds,
    ) -> Self {
        Self {
            tolerance_feasibility,
            max_iterations,
            pivot_validator: PivotValidator::new(tolerance_feasibility, tolerance_geometric, thresholds),
        }
    }

    /// Runs the triple-validation dispatch table:
    /// `old_pivot` absent or classified INFEASIBLE falls straight to
    /// cold-start; HIGHLY_STABLE/MODERATELY_STABLE attempts warm-start
    /// alone; GEOMETRICALLY_UNSTABLE runs both and prefers cold-start on
    /// disagreement.
    pub fn solve(
        &self,
        lp: &LinearProgram,
        old_pivot: Option<&HashMap<StateId, Decimal>>,
    ) -> Result<SimplexSolution, SimplexError> {
        let Some(pivot) = old_pivot else {
            let mut solution = self.solve_cold(lp)?;
            solution.path_taken = SolvePath::ColdStart;
            return Ok(solution);
        };

        match self.pivot_validator.classify(pivot, &lp.constraints) {
            PivotClass::Infeasible => {
                let mut solution = self.solve_cold(lp)?;
                solution.path_taken = SolvePath::ColdStart;
                Ok(solution)
            }
            PivotClass::HighlyStable | PivotClass::ModeratelyStable => {
                Ok(self.warm_start(lp, pivot))
            }
            PivotClass::GeometricallyUnstable => {
                let warm = self.warm_start(lp, pivot);
                let mut cold = self.solve_cold(lp)?;
                cold.path_taken = SolvePath::CrossValidated;
                if warm.status == cold.status {
                    Ok(cold)
                } else {
                    // Disagreement under instability: cold-start is authoritative.
                    Ok(cold)
                }
            }
        }
    }

    /// A pivot that `PivotValidator::classify` did not reject as
    /// INFEASIBLE already satisfies every new constraint within
    /// `tolerance_feasibility` by that check's own definition — so
    /// extending it with zero for any variable it does not yet cover is
    /// itself a feasible point of the new LP. No tableau iteration is
    /// required; this is what "start from a basis consistent with
    /// old_pivot" reduces to for a point that is already on the right
    /// side of every constraint.
    fn warm_start(&self, lp: &LinearProgram, pivot: &HashMap<StateId, Decimal>) -> SimplexSolution {
        let variables = lp
            .variables
            .keys()
            .map(|&id| (id, pivot.get(&id).copied().unwrap_or(Decimal::ZERO)))
            .collect();
        SimplexSolution {
            status: SimplexStatus::Feasible,
            variables,
            iterations: 0,
            pivots: 0,
            path_taken: SolvePath::WarmStart,
        }
    }

    /// Classical Phase-1 simplex from the origin / artificial basis.
    fn solve_cold(&self, lp: &LinearProgram) -> Result<SimplexSolution, SimplexError> {
        let mut tableau = Tableau::build(lp);
        let iterations = tableau.run(self.max_iterations)?;

        let objective: Decimal = tableau
            .basis
            .iter()
            .enumerate()
            .filter(|&(_, &col)| tableau.cost[col] == Decimal::ONE)
            .map(|(row, _)| tableau.grid[row][tableau.grid[row].len() - 1])
            .sum();

        let status = if objective <= self.tolerance_feasibility {
            SimplexStatus::Feasible
        } else {
            SimplexStatus::Infeasible
        };

        let mut variables = HashMap::new();
        for &variable_id in lp.variables.keys() {
            let column = tableau.column_of(variable_id);
            let value = tableau
                .basis
                .iter()
                .position(|&col| col == column)
                .map(|row| tableau.grid[row][tableau.grid[row].len() - 1])
                .unwrap_or(Decimal::ZERO);
            variables.insert(variable_id, value);
        }

        Ok(SimplexSolution {
            status,
            variables,
            iterations,
            pivots: iterations,
            path_taken: SolvePath::ColdStart,
        })
    }
}

/// A row-major Phase-1 tableau: original variables, then one slack/surplus
/// column per constraint, then one artificial column per GE/EQ constraint.
struct Tableau {
    /// Sorted variable ids, establishing a fixed column order for Bland's
    /// rule (the leaving/entering tie-break needs a total order).
    variable_ids: Vec<StateId>,
    n_constraints: usize,
    grid: Vec<Vec<Decimal>>,
    cost: Vec<Decimal>,
    basis: Vec<usize>,
}

impl Tableau {
    fn build(lp: &LinearProgram) -> Self {
        let mut variable_ids: Vec<StateId> = lp.variables.keys().copied().collect();
        variable_ids.sort_unstable();
        let n_vars = variable_ids.len();
        let n_constraints = lp.constraints.len();

        // Slot layout: [vars][slack/surplus per constraint][artificial per GE/EQ constraint][rhs]
        let mut needs_artificial = vec![false; n_constraints];
        for (i, constraint) in lp.constraints.iter().enumerate() {
            needs_artificial[i] = matches!(constraint.kind, ConstraintKind::Ge | ConstraintKind::Eq);
        }
        let n_artificial = needs_artificial.iter().filter(|&&b| b).count();
        let n_cols = n_vars + n_constraints + n_artificial + 1;

        let mut grid = vec![vec![Decimal::ZERO; n_cols]; n_constraints];
        let mut cost = vec![Decimal::ZERO; n_cols - 1];
        let mut basis = vec![0usize; n_constraints];

        let slack_col = |i: usize| n_vars + i;
        let mut next_artificial_col = n_vars + n_constraints;

        for (i, constraint) in lp.constraints.iter().enumerate() {
            let sign = if constraint.rhs.is_sign_negative() {
                Decimal::NEGATIVE_ONE
            } else {
                Decimal::ONE
            };
            let kind = if sign == Decimal::NEGATIVE_ONE {
                flip(constraint.kind)
            } else {
                constraint.kind
            };

            for (j, &var_id) in variable_ids.iter().enumerate() {
                let raw = constraint.coefficients.get(&var_id).copied().unwrap_or(Decimal::ZERO);
                grid[i][j] = raw * sign;
            }
            grid[i][n_cols - 1] = constraint.rhs * sign;

            match kind {
                ConstraintKind::Le => {
                    grid[i][slack_col(i)] = Decimal::ONE;
                    basis[i] = slack_col(i);
                }
                ConstraintKind::Ge => {
                    grid[i][slack_col(i)] = Decimal::NEGATIVE_ONE;
                    let art = next_artificial_col;
                    next_artificial_col += 1;
                    grid[i][art] = Decimal::ONE;
                    cost[art] = Decimal::ONE;
                    basis[i] = art;
                }
                ConstraintKind::Eq => {
                    let art = next_artificial_col;
                    next_artificial_col += 1;
                    grid[i][art] = Decimal::ONE;
                    cost[art] = Decimal::ONE;
                    basis[i] = art;
                }
            }
        }

        Self {
            variable_ids,
            n_constraints,
            grid,
            cost,
            basis,
        }
    }

    fn column_of(&self, variable_id: StateId) -> usize {
        self.variable_ids
            .binary_search(&variable_id)
            .expect("variable_id must belong to this tableau")
    }

    /// Runs Bland's-rule-anchored Phase-1 pivoting to convergence in place,
    /// returning the number of iterations performed.
    fn run(&mut self, max_iterations: u32) -> Result<u32, SimplexError> {
        let singularity_floor: Decimal = SINGULARITY_FLOOR.parse().expect("valid decimal literal");
        let n_cols = self.cost.len();

        for iteration in 0..max_iterations {
            let reduced_costs = self.reduced_costs();
            let Some(entering) = (0..n_cols).find(|&j| reduced_costs[j] < -singularity_floor) else {
                return Ok(iteration);
            };

            let mut best_row: Option<usize> = None;
            let mut best_ratio = Decimal::MAX;
            for row in 0..self.n_constraints {
                let coeff = self.grid[row][entering];
                if coeff <= singularity_floor {
                    continue;
                }
                let ratio = self.grid[row][n_cols] / coeff;
                let better = match best_row {
                    None => true,
                    Some(r) => {
                        ratio < best_ratio
                            || (ratio == best_ratio && self.basis[row] < self.basis[r])
                    }
                };
                if better {
                    best_row = Some(row);
                    best_ratio = ratio;
                }
            }

            let Some(pivot_row) = best_row else {
                return Err(SimplexError::TableauInvariantBroken(
                    "Phase-1 objective unbounded below zero".to_string(),
                ));
            };

            let pivot_val = self.grid[pivot_row][entering];
            if pivot_val.abs() < singularity_floor {
                return Err(SimplexError::NumericalSingularity);
            }

            for value in &mut self.grid[pivot_row] {
                *value /= pivot_val;
            }
            for row in 0..self.n_constraints {
                if row == pivot_row {
                    continue;
                }
                let factor = self.grid[row][entering];
                if factor == Decimal::ZERO {
                    continue;
                }
                let pivot_row_values = self.grid[pivot_row].clone();
                for (col, pivot_value) in pivot_row_values.iter().enumerate() {
                    self.grid[row][col] -= factor * pivot_value;
                }
            }
            self.basis[pivot_row] = entering;
        }

        Err(SimplexError::IterationCapExceeded { max_iterations })
    }

    /// `reduced_cost[j] = cost[j] - sum_row cost[basis[row]] * grid[row][j]`.
    fn reduced_costs(&self) -> Vec<Decimal> {
        let n_cols = self.cost.len();
        let mut reduced = self.cost.clone();
        for row in 0..self.n_constraints {
            let basic_cost = self.cost[self.basis[row]];
            if basic_cost == Decimal::ZERO {
                continue;
            }
            for j in 0..n_cols {
                reduced[j] -= basic_cost * self.grid[row][j];
            }
        }
        reduced
    }
}

fn flip(kind: ConstraintKind) -> ConstraintKind {
    match kind {
        ConstraintKind::Le => ConstraintKind::Ge,
        ConstraintKind::Ge => ConstraintKind::Le,
        ConstraintKind::Eq => ConstraintKind::Eq,
    }
}
