//! Error types for rule evaluation, scoring and training

use crate::rules::RuleId;
use thiserror::Error;

/// Fault raised by a single rule predicate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuleFault {
    /// A field the predicate reads is absent from the record
    #[error("field `{0}` is missing")]
    MissingField(String),

    /// A numeric field holds NaN or an infinity
    #[error("field `{0}` is not a finite number")]
    NonFinite(String),

    /// An arithmetic operation is undefined for the inputs (division by zero)
    #[error("undefined arithmetic: {0}")]
    UndefinedArithmetic(&'static str),

    /// A field is present but holds the wrong kind of value
    #[error("field `{field}` holds {found}, expected {expected}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        found: &'static str,
    },
}

impl RuleFault {
    /// Whether the fault means "rule not applicable to this record".
    ///
    /// Only missing data, non-finite numbers and undefined arithmetic
    /// qualify; everything else
    /// points at a broken rule or a malformed record.
    pub fn is_data_absence(&self) -> bool {
        matches!(
            self,
            RuleFault::MissingField(_)
                | RuleFault::NonFinite(_)
                | RuleFault::UndefinedArithmetic(_)
        )
    }
}

/// Evaluation of a record against the catalog failed
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluationError {
    /// A rule predicate failed for a reason other than absent data
    #[error("rule {rule} failed: {source}")]
    RuleFailed {
        rule: RuleId,
        #[source]
        source: RuleFault,
    },
}

/// Catalog integrity violation, detected when the catalog is built
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// Catalog contains no rules
    #[error("rule catalog is empty")]
    Empty,

    /// Two rules share an identifier
    #[error("duplicate rule id {0}")]
    DuplicateRuleId(RuleId),

    /// Severity outside 1..=10
    #[error("rule {rule} has invalid severity {severity} (expected 1-10)")]
    InvalidSeverity { rule: RuleId, severity: u8 },

    /// Ordinal outside 1..=99
    #[error("rule {rule} has invalid ordinal (expected 1-99)")]
    InvalidOrdinal { rule: RuleId },

    /// Description is blank
    #[error("rule {0} has an empty description")]
    EmptyDescription(RuleId),
}

/// Scoring is unavailable
#[derive(Debug, Error)]
pub enum ScoringError {
    /// No model artifact could be loaded
    #[error("scoring unavailable: {reason}")]
    ModelUnavailable { reason: String },

    /// Artifact exists but could not be parsed
    #[error("scoring unavailable: model artifact is corrupt: {0}")]
    CorruptArtifact(#[from] serde_json::Error),

    /// Artifact was written by an incompatible format version
    #[error("scoring unavailable: unsupported artifact format version {found} (expected {expected})")]
    UnsupportedFormat { found: u32, expected: u32 },

    /// Artifact does not match the current feature layout
    #[error("scoring unavailable: model artifact mismatch: {0}")]
    ArtifactMismatch(String),
}

impl ScoringError {
    /// The message without the common "scoring unavailable" prefix
    pub fn reason(&self) -> String {
        match self {
            ScoringError::ModelUnavailable { reason } => reason.clone(),
            ScoringError::CorruptArtifact(e) => format!("model artifact is corrupt: {}", e),
            ScoringError::UnsupportedFormat { found, expected } => format!(
                "unsupported artifact format version {} (expected {})",
                found, expected
            ),
            ScoringError::ArtifactMismatch(detail) => {
                format!("model artifact mismatch: {}", detail)
            }
        }
    }
}

/// Training run failed; no artifact is written when this is returned
#[derive(Debug, Error)]
pub enum TrainingError {
    /// Dataset has no rows
    #[error("training dataset is empty")]
    EmptyDataset,

    /// Header row lacks the label column
    #[error("training dataset has no `{0}` label column")]
    MissingLabelColumn(String),

    /// A label cell is not a binary value
    #[error("row {row}: label `{value}` is not 0 or 1")]
    InvalidLabel { row: usize, value: String },

    /// Feature rows and labels differ in length
    #[error("{rows} feature rows but {labels} labels")]
    LengthMismatch { rows: usize, labels: usize },

    /// Every row carries the same label
    #[error("training dataset contains only label {0}; both classes are required")]
    SingleClass(u8),

    /// Optimisation produced NaN or infinite parameters
    #[error("training diverged: model parameters are not finite")]
    Diverged,

    /// A record could not be evaluated
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    /// CSV read or write failure
    #[error("dataset error: {0}")]
    Csv(#[from] csv::Error),

    /// Artifact serialization failure
    #[error("artifact serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error returned by the detector facade
#[derive(Debug, Error)]
pub enum DetectionError {
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    #[error(transparent)]
    Scoring(#[from] ScoringError),
}

impl DetectionError {
    /// True when the failure is an operational "no model" condition rather
    /// than a record-level problem.
    pub fn is_scoring_unavailable(&self) -> bool {
        matches!(self, DetectionError::Scoring(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{Category, RuleId};

    #[test]
    fn test_data_absence_classification() {
        assert!(RuleFault::MissingField("votes_cast".into()).is_data_absence());
        assert!(RuleFault::UndefinedArithmetic("turnout ratio").is_data_absence());
        assert!(RuleFault::NonFinite("valid_votes".into()).is_data_absence());

        let mismatch = RuleFault::TypeMismatch {
            field: "votes_cast".into(),
            expected: "number",
            found: "text",
        };
        assert!(!mismatch.is_data_absence());
    }

    #[test]
    fn test_error_messages() {
        let err = EvaluationError::RuleFailed {
            rule: RuleId::new(Category::Turnout, 1),
            source: RuleFault::TypeMismatch {
                field: "votes_cast".into(),
                expected: "number",
                found: "text",
            },
        };
        assert_eq!(
            err.to_string(),
            "rule T01 failed: field `votes_cast` holds text, expected number"
        );

        let err = ScoringError::ModelUnavailable {
            reason: "no artifact".into(),
        };
        assert!(err.to_string().starts_with("scoring unavailable"));
        assert_eq!(err.reason(), "no artifact");
        assert!(DetectionError::from(err).is_scoring_unavailable());

        let err = ScoringError::ArtifactMismatch("width 6".into());
        assert_eq!(err.to_string(), format!("scoring unavailable: {}", err.reason()));
    }
}
