//! Geometric/feasibility classification of a candidate pivot against a new
//! set of constraints — the first of the three checks in
//! `TripleValidationSimplex`'s dispatch.

use std::collections::HashMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::config::StabilityThresholds;
use crate::lp::{ConstraintKind, LinearConstraint};
use crate::nfa::StateId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PivotClass {
    HighlyStable,
    ModeratelyStable,
    GeometricallyUnstable,
    Infeasible,
}

pub struct PivotValidator {
    pub tolerance_feasibility: Decimal,
    pub tolerance_geometric: Decimal,
    pub thresholds: StabilityThresholds,
}

impl PivotValidator {
    pub fn new(
        tolerance_feasibility: Decimal,
        tolerance_geometric: Decimal,
        thresholds: StabilityThresholds,
    ) -> Self {
        Self {
            tolerance_feasibility,
            tolerance_geometric,
            thresholds,
        }
    }

    /// Classifies `old_pivot` against `new_constraints`.
    pub fn classify(
        &self,
        old_pivot: &HashMap<StateId, Decimal>,
        new_constraints: &[LinearConstraint],
    ) -> PivotClass {
        let mut distances = Vec::with_capacity(new_constraints.len());
        for constraint in new_constraints {
            let activation = constraint
                .coefficients
                .iter()
                .map(|(var, coeff)| *coeff * old_pivot.get(var).copied().unwrap_or(Decimal::ZERO))
                .sum::<Decimal>();
            let violation = match constraint.kind {
                ConstraintKind::Le => activation - constraint.rhs,
                ConstraintKind::Ge => constraint.rhs - activation,
                ConstraintKind::Eq => (activation - constraint.rhs).abs(),
            };
            if violation > self.tolerance_feasibility {
                return PivotClass::Infeasible;
            }

            let norm = sq_norm(&constraint.coefficients).sqrt().unwrap_or(Decimal::ZERO);
            if norm <= dec!(0.0000000001) {
                continue;
            }
            let signed_distance = (constraint.rhs - activation) / norm;
            distances.push(signed_distance.abs());
        }

        if distances.is_empty() {
            return PivotClass::HighlyStable;
        }

        let min_d = distances.iter().copied().fold(Decimal::MAX, Decimal::min);
        let sum_d: Decimal = distances.iter().copied().sum();
        let avg_d = sum_d / Decimal::from(distances.len() as u64);

        let score = dec!(0.7) * clip01(min_d / self.tolerance_geometric)
            + dec!(0.3) * clip01(avg_d / self.tolerance_geometric);

        if score > self.thresholds.highly_stable {
            PivotClass::HighlyStable
        } else if score > self.thresholds.moderately_stable {
            PivotClass::ModeratelyStable
        } else {
            PivotClass::GeometricallyUnstable
        }
    }
}

fn sq_norm(coefficients: &HashMap<StateId, Decimal>) -> Decimal {
    coefficients.values().map(|c| *c * *c).sum()
}

fn clip01(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO).min(Decimal::ONE)
}
