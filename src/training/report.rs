//! Held-out classification diagnostics

use serde::{Deserialize, Serialize};
use std::fmt;

/// Precision, recall and F1 for one class
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

impl ClassMetrics {
    fn from_counts(true_pos: usize, false_pos: usize, false_neg: usize) -> Self {
        let precision = safe_div(true_pos, true_pos + false_pos);
        let recall = safe_div(true_pos, true_pos + false_neg);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        Self {
            precision,
            recall,
            f1,
            support: true_pos + false_neg,
        }
    }
}

fn safe_div(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Classification report for a held-out split
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub legitimate: ClassMetrics,
    pub fraudulent: ClassMetrics,
    pub accuracy: f64,
    pub true_positives: usize,
    pub false_positives: usize,
    pub true_negatives: usize,
    pub false_negatives: usize,
}

impl EvaluationReport {
    /// Build from paired true labels and predicted labels.
    pub fn from_predictions(labels: &[u8], predictions: &[u8]) -> Self {
        let (mut tp, mut fp, mut tn, mut fn_) = (0, 0, 0, 0);
        for (&label, &predicted) in labels.iter().zip(predictions) {
            match (label, predicted) {
                (1, 1) => tp += 1,
                (0, 1) => fp += 1,
                (1, _) => fn_ += 1,
                _ => tn += 1,
            }
        }

        Self {
            legitimate: ClassMetrics::from_counts(tn, fn_, fp),
            fraudulent: ClassMetrics::from_counts(tp, fp, fn_),
            accuracy: safe_div(tp + tn, tp + fp + tn + fn_),
            true_positives: tp,
            false_positives: fp,
            true_negatives: tn,
            false_negatives: fn_,
        }
    }

    pub fn total(&self) -> usize {
        self.true_positives + self.false_positives + self.true_negatives + self.false_negatives
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:>12} {:>10} {:>10} {:>10} {:>10}",
            "", "precision", "recall", "f1-score", "support"
        )?;
        for (name, m) in [("legitimate", &self.legitimate), ("fraudulent", &self.fraudulent)] {
            writeln!(
                f,
                "{:>12} {:>10.2} {:>10.2} {:>10.2} {:>10}",
                name, m.precision, m.recall, m.f1, m.support
            )?;
        }
        write!(
            f,
            "{:>12} {:>10} {:>10} {:>10.2} {:>10}",
            "accuracy",
            "",
            "",
            self.accuracy,
            self.total()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts() {
        let labels = [1, 1, 1, 0, 0, 0, 0, 1];
        let predictions = [1, 1, 0, 0, 0, 1, 0, 1];

        let report = EvaluationReport::from_predictions(&labels, &predictions);

        assert_eq!(report.true_positives, 3);
        assert_eq!(report.false_negatives, 1);
        assert_eq!(report.false_positives, 1);
        assert_eq!(report.true_negatives, 3);
        assert_eq!(report.total(), 8);
        assert!((report.fraudulent.precision - 0.75).abs() < 1e-12);
        assert!((report.fraudulent.recall - 0.75).abs() < 1e-12);
        assert_eq!(report.fraudulent.support, 4);
        assert_eq!(report.legitimate.support, 4);
        assert!((report.accuracy - 0.75).abs() < 1e-12);
    }

    #[test]
    fn test_no_positive_predictions() {
        let report = EvaluationReport::from_predictions(&[1, 0], &[0, 0]);
        assert_eq!(report.fraudulent.precision, 0.0);
        assert_eq!(report.fraudulent.f1, 0.0);
        assert_eq!(report.legitimate.recall, 1.0);
    }

    #[test]
    fn test_display_lists_both_classes() {
        let report = EvaluationReport::from_predictions(&[1, 0], &[1, 0]);
        let text = report.to_string();
        assert!(text.contains("legitimate"));
        assert!(text.contains("fraudulent"));
        assert!(text.contains("accuracy"));
    }
}
