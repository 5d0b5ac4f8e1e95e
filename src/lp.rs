//! Linear program data model and the constraint builders used to turn a
//! classified set of equivalence classes into an LP.

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::error::LpError;
use crate::nfa::StateId;

/// A non-negative flow variable. `variable_id` equals the final-state id
/// of the equivalence class it represents.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FluxVariable {
    pub variable_id: StateId,
    pub lower_bound: Decimal,
    pub upper_bound: Option<Decimal>,
}

impl FluxVariable {
    pub fn new(variable_id: StateId) -> Self {
        Self {
            variable_id,
            lower_bound: Decimal::ZERO,
            upper_bound: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    Le,
    Ge,
    Eq,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinearConstraint {
    pub name: String,
    pub coefficients: HashMap<StateId, Decimal>,
    pub rhs: Decimal,
    pub kind: ConstraintKind,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearProgram {
    pub variables: HashMap<StateId, FluxVariable>,
    pub constraints: Vec<LinearConstraint>,
}

impl LinearProgram {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_variable(mut self, variable: FluxVariable) -> Self {
        self.variables.insert(variable.variable_id, variable);
        self
    }

    pub fn with_constraint(mut self, constraint: LinearConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Checks every constraint references a defined variable, carries no
    /// non-finite coefficient, and stays within `coefficient_magnitude_cap`.
    pub fn validate(&self, coefficient_magnitude_cap: Decimal) -> Result<(), LpError> {
        for constraint in &self.constraints {
            for (&variable_id, coefficient) in &constraint.coefficients {
                if !self.variables.contains_key(&variable_id) {
                    return Err(LpError::UndefinedVariable {
                        name: constraint.name.clone(),
                        variable_id,
                    });
                }
                if coefficient.abs() > coefficient_magnitude_cap {
                    return Err(LpError::CoefficientOverflow {
                        magnitude: coefficient.abs().to_string(),
                        cap: coefficient_magnitude_cap.to_string(),
                    });
                }
            }
            if constraint.rhs.abs() > coefficient_magnitude_cap {
                return Err(LpError::CoefficientOverflow {
                    magnitude: constraint.rhs.abs().to_string(),
                    cap: coefficient_magnitude_cap.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Coefficient of class `variable_id` for measure `m`: the weight of the
/// `WeightedRegex` in that class's final state whose `measure_id == m`, or
/// zero if absent. Built by the orchestrator from `FrozenNfa::weights_at`.
pub type MeasureCoefficients = HashMap<StateId, Decimal>;

/// `∑ᵢ Cᵢ,m · fᵢ ≤ required_value`.
pub fn build_source_primary(
    name: impl Into<String>,
    coefficients: &MeasureCoefficients,
    required_value: Decimal,
) -> LinearConstraint {
    LinearConstraint {
        name: name.into(),
        coefficients: coefficients.clone(),
        rhs: required_value,
        kind: ConstraintKind::Le,
    }
}

/// `∑ᵢ Cᵢ,m · fᵢ ≥ required_value`.
pub fn build_target_primary(
    name: impl Into<String>,
    coefficients: &MeasureCoefficients,
    required_value: Decimal,
) -> LinearConstraint {
    LinearConstraint {
        name: name.into(),
        coefficients: coefficients.clone(),
        rhs: required_value,
        kind: ConstraintKind::Ge,
    }
}

/// `∑ᵢ Cᵢ,m · fᵢ ≤ 0` — a regulatory forbidden-pattern constraint.
pub fn build_secondary(name: impl Into<String>, coefficients: &MeasureCoefficients) -> LinearConstraint {
    LinearConstraint {
        name: name.into(),
        coefficients: coefficients.clone(),
        rhs: Decimal::ZERO,
        kind: ConstraintKind::Le,
    }
}
