//! Monotone logistic regression
//!
//! Features are standardized with the training mean and standard deviation.
//! Weights are projected onto the non-negative orthant after every gradient
//! step, so the predicted probability never decreases when a feature grows.

use crate::error::TrainingError;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Optimiser settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitOptions {
    pub learning_rate: f64,
    pub epochs: usize,
    pub l2_penalty: f64,
    /// Weight each class by n / (2 * n_class)
    pub balance_classes: bool,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            epochs: 2000,
            l2_penalty: 1e-3,
            balance_classes: true,
        }
    }
}

/// Fitted logistic regression parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    pub weights: Vec<f64>,
    pub intercept: f64,
    pub feature_means: Vec<f64>,
    pub feature_scales: Vec<f64>,
}

fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

impl LogisticModel {
    /// Fit on rows of raw features and binary labels.
    pub fn fit<const N: usize>(
        rows: &[[f64; N]],
        labels: &[u8],
        options: &FitOptions,
    ) -> Result<Self, TrainingError> {
        if rows.is_empty() {
            return Err(TrainingError::EmptyDataset);
        }
        if rows.len() != labels.len() {
            return Err(TrainingError::LengthMismatch {
                rows: rows.len(),
                labels: labels.len(),
            });
        }

        let n = rows.len() as f64;

        let mut feature_means = vec![0.0; N];
        for row in rows {
            for (mean, value) in feature_means.iter_mut().zip(row) {
                *mean += value / n;
            }
        }

        let mut feature_scales = vec![0.0; N];
        for row in rows {
            for j in 0..N {
                feature_scales[j] += (row[j] - feature_means[j]).powi(2) / n;
            }
        }
        for scale in feature_scales.iter_mut() {
            *scale = scale.sqrt();
            // constant features carry no signal; keep them finite
            if *scale < 1e-12 {
                *scale = 1.0;
            }
        }

        let standardized: Vec<[f64; N]> = rows
            .iter()
            .map(|row| {
                let mut z = [0.0; N];
                for j in 0..N {
                    z[j] = (row[j] - feature_means[j]) / feature_scales[j];
                }
                z
            })
            .collect();

        let positives = labels.iter().filter(|&&label| label == 1).count();
        let negatives = labels.len() - positives;
        let (positive_weight, negative_weight) =
            if options.balance_classes && positives > 0 && negatives > 0 {
                (n / (2.0 * positives as f64), n / (2.0 * negatives as f64))
            } else {
                (1.0, 1.0)
            };
        let sample_weight = |label: u8| {
            if label == 1 {
                positive_weight
            } else {
                negative_weight
            }
        };
        let total_weight: f64 = labels.iter().map(|&label| sample_weight(label)).sum();

        let mut weights = vec![0.0; N];
        let mut intercept = 0.0;
        let mut loss = 0.0;

        for _ in 0..options.epochs {
            let mut grad_w = [0.0; N];
            let mut grad_b = 0.0;
            loss = 0.0;

            for (z, &label) in standardized.iter().zip(labels) {
                let logit = intercept + weights.iter().zip(z).map(|(w, x)| w * x).sum::<f64>();
                let p = sigmoid(logit);
                let y = f64::from(label);
                let w = sample_weight(label);
                let err = (p - y) * w;

                for j in 0..N {
                    grad_w[j] += err * z[j];
                }
                grad_b += err;
                loss -= w * (y * p.max(1e-15).ln() + (1.0 - y) * (1.0 - p).max(1e-15).ln());
            }

            for j in 0..N {
                let gradient = grad_w[j] / total_weight + options.l2_penalty * weights[j];
                weights[j] = (weights[j] - options.learning_rate * gradient).max(0.0);
            }
            intercept -= options.learning_rate * grad_b / total_weight;
        }

        if !intercept.is_finite() || weights.iter().any(|w| !w.is_finite()) {
            return Err(TrainingError::Diverged);
        }

        debug!(
            epochs = options.epochs,
            log_loss = loss / total_weight,
            intercept = intercept,
            "Logistic regression fitted"
        );

        Ok(Self {
            weights,
            intercept,
            feature_means,
            feature_scales,
        })
    }

    /// Number of input features
    pub fn width(&self) -> usize {
        self.weights.len()
    }

    /// Probability of the positive class.
    ///
    /// `features` must have [`LogisticModel::width`] elements.
    pub fn predict_probability(&self, features: &[f64]) -> f64 {
        let logit = self.intercept
            + features
                .iter()
                .zip(&self.weights)
                .zip(self.feature_means.iter().zip(&self.feature_scales))
                .map(|((x, w), (mean, scale))| w * (x - mean) / scale)
                .sum::<f64>();
        sigmoid(logit)
    }

    /// Check internal consistency against an expected width
    pub fn validate(&self, width: usize) -> Result<(), String> {
        if self.weights.len() != width
            || self.feature_means.len() != width
            || self.feature_scales.len() != width
        {
            return Err(format!(
                "expected {} parameters per feature array, found weights={} means={} scales={}",
                width,
                self.weights.len(),
                self.feature_means.len(),
                self.feature_scales.len()
            ));
        }

        let all_finite = self.intercept.is_finite()
            && self
                .weights
                .iter()
                .chain(&self.feature_means)
                .chain(&self.feature_scales)
                .all(|v| v.is_finite());
        if !all_finite {
            return Err("model parameters are not finite".to_string());
        }

        if self.feature_scales.iter().any(|&s| s <= 0.0) {
            return Err("feature scales must be positive".to_string());
        }

        Ok(())
    }
}
