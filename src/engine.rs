//! Rule evaluation engine
//!
//! Applies every rule in a catalog to one record. A rule whose inputs are
//! absent, or whose arithmetic is undefined for the record, is treated as
//! not violated. Any other predicate fault aborts the evaluation.

use crate::error::EvaluationError;
use crate::rules::{Catalog, Violation};
use crate::types::record::Record;
use tracing::{debug, trace};

/// Evaluates records against an immutable rule catalog.
///
/// Holds no mutable state; a single engine can be shared across threads and
/// used for any number of records concurrently.
#[derive(Debug, Clone)]
pub struct EvaluationEngine {
    catalog: Catalog,
}

impl EvaluationEngine {
    pub fn new(catalog: Catalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Return the violated rules in catalog order.
    pub fn evaluate(&self, record: &Record) -> Result<Vec<Violation>, EvaluationError> {
        let mut violations = Vec::new();

        for rule in self.catalog.iter() {
            match rule.check(record) {
                Ok(true) => violations.push(Violation::from(rule)),
                Ok(false) => {}
                Err(fault) if fault.is_data_absence() => {
                    trace!(rule = %rule.id, fault = %fault, "Rule not applicable");
                }
                Err(fault) => {
                    return Err(EvaluationError::RuleFailed {
                        rule: rule.id,
                        source: fault,
                    });
                }
            }
        }

        debug!(
            rules = self.catalog.len(),
            violations = violations.len(),
            "Record evaluated"
        );

        Ok(violations)
    }
}
