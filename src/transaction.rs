//! Input records supplied to [`crate::orchestrator::Orchestrator::validate`]:
//! the transaction itself plus the source- and target-side measure specs
//! that drive constraint construction.
//!
//! An owned-`self` builder assembles optional fields, and a finishing
//! `build()` call turns the builder into the finished record.

use rust_decimal::Decimal;

use crate::error::LpError;

/// A single secondary (regulatory/forbidden-pattern) pattern attached to a
/// measure, turned into a `∑ᵢ Cᵢ,m · fᵢ ≤ 0` constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct SecondaryPattern {
    pub measure_id: String,
    pub pattern: String,
    pub weight: Decimal,
}

impl SecondaryPattern {
    pub fn new(measure_id: impl Into<String>, pattern: impl Into<String>, weight: Decimal) -> Self {
        Self {
            measure_id: measure_id.into(),
            pattern: pattern.into(),
            weight,
        }
    }
}

/// A source-side measure: caps the weighted flow reaching classes tagged
/// with `measure_id` at `acceptable_value`, plus zero or more secondary
/// regulatory patterns sharing the same primary weight table.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceMeasure {
    pub measure_id: String,
    pub primary_pattern: String,
    pub primary_weight: Decimal,
    pub acceptable_value: Decimal,
    pub secondary_patterns: Vec<SecondaryPattern>,
}

/// A target-side measure: requires the weighted flow reaching classes
/// tagged with `measure_id` to reach at least `required_value`.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetMeasure {
    pub measure_id: String,
    pub primary_pattern: String,
    pub primary_weight: Decimal,
    pub required_value: Decimal,
    pub secondary_patterns: Vec<SecondaryPattern>,
}

/// A proposed transaction: the source/target endpoints the DAG reader keys
/// on, plus the measures whose primary and secondary patterns become
/// additional NFA patterns and LP constraints for this one call.
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub source_account_id: String,
    pub target_account_id: String,
    pub source_measures: Vec<SourceMeasure>,
    pub target_measures: Vec<TargetMeasure>,
}

impl Transaction {
    pub fn builder(source_account_id: impl Into<String>, target_account_id: impl Into<String>) -> TransactionBuilder {
        TransactionBuilder {
            source_account_id: source_account_id.into(),
            target_account_id: target_account_id.into(),
            source_measures: Vec::new(),
            target_measures: Vec::new(),
        }
    }

    /// Every `(measure_id, pattern, weight)` triple this transaction
    /// contributes to a transaction-scoped NFA clone — primary patterns
    /// from every measure plus every secondary pattern they carry.
    pub fn extra_patterns(&self) -> Vec<(String, String, Decimal)> {
        let mut patterns = Vec::new();
        for measure in &self.source_measures {
            patterns.push((measure.measure_id.clone(), measure.primary_pattern.clone(), measure.primary_weight));
            for secondary in &measure.secondary_patterns {
                patterns.push((secondary.measure_id.clone(), secondary.pattern.clone(), secondary.weight));
            }
        }
        for measure in &self.target_measures {
            patterns.push((measure.measure_id.clone(), measure.primary_pattern.clone(), measure.primary_weight));
            for secondary in &measure.secondary_patterns {
                patterns.push((secondary.measure_id.clone(), secondary.pattern.clone(), secondary.weight));
            }
        }
        patterns
    }

    pub fn is_empty(&self) -> bool {
        self.source_measures.is_empty() && self.target_measures.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct TransactionBuilder {
    source_account_id: String,
    target_account_id: String,
    source_measures: Vec<SourceMeasure>,
    target_measures: Vec<TargetMeasure>,
}

impl TransactionBuilder {
    pub fn with_source_measure(
        mut self,
        measure_id: impl Into<String>,
        primary_pattern: impl Into<String>,
        primary_weight: Decimal,
        acceptable_value: Decimal,
    ) -> Self {
        self.source_measures.push(SourceMeasure {
            measure_id: measure_id.into(),
            primary_pattern: primary_pattern.into(),
            primary_weight,
            acceptable_value,
            secondary_patterns: Vec::new(),
        });
        self
    }

    pub fn with_target_measure(
        mut self,
        measure_id: impl Into<String>,
        primary_pattern: impl Into<String>,
        primary_weight: Decimal,
        required_value: Decimal,
    ) -> Self {
        self.target_measures.push(TargetMeasure {
            measure_id: measure_id.into(),
            primary_pattern: primary_pattern.into(),
            primary_weight,
            required_value,
            secondary_patterns: Vec::new(),
        });
        self
    }

    /// Attaches a secondary pattern to the most recently added source
    /// measure. Fails at `build()` time (via `LpError`-shaped caller
    /// validation) if called before any source measure exists.
    ///
    /// Each secondary gets its own `measure_id`, distinct from its parent
    /// measure's: the coefficient table a secondary's constraint is built
    /// from is keyed by `measure_id`, so sharing the parent's id would pull
    /// the parent's own legitimate flow into the forbidden-pattern
    /// constraint instead of only the classes the secondary itself matches.
    pub fn with_source_secondary(
        mut self,
        pattern: impl Into<String>,
        weight: Decimal,
    ) -> Result<Self, LpError> {
        let measure = self.source_measures.last_mut().ok_or_else(|| LpError::UndefinedVariable {
            name: "source_secondary".to_string(),
            variable_id: 0,
        })?;
        let secondary_id = format!("{}#secondary{}", measure.measure_id, measure.secondary_patterns.len());
        let pattern = SecondaryPattern::new(secondary_id, pattern, weight);
        measure.secondary_patterns.push(pattern);
        Ok(self)
    }

    pub fn with_target_secondary(
        mut self,
        pattern: impl Into<String>,
        weight: Decimal,
    ) -> Result<Self, LpError> {
        let measure = self.target_measures.last_mut().ok_or_else(|| LpError::UndefinedVariable {
            name: "target_secondary".to_string(),
            variable_id: 0,
        })?;
        let secondary_id = format!("{}#secondary{}", measure.measure_id, measure.secondary_patterns.len());
        let pattern = SecondaryPattern::new(secondary_id, pattern, weight);
        measure.secondary_patterns.push(pattern);
        Ok(self)
    }

    pub fn build(self) -> Transaction {
        Transaction {
            source_account_id: self.source_account_id,
            target_account_id: self.target_account_id,
            source_measures: self.source_measures,
            target_measures: self.target_measures,
        }
    }
}
