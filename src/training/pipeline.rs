//! Training pipeline: evaluate, aggregate, split, fit, evaluate again

use crate::engine::EvaluationEngine;
use crate::error::{EvaluationError, TrainingError};
use crate::features::{self, FeatureVector};
use crate::models::artifact::TrainedModel;
use crate::models::logistic::{FitOptions, LogisticModel};
use crate::training::dataset::LabeledDataset;
use crate::training::report::EvaluationReport;
use crate::types::record::Record;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use std::time::Instant;
use tracing::{debug, info};

/// Decision threshold used for the held-out classification report
const REPORT_THRESHOLD: f64 = 0.5;

/// Row indices of a train/test split
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Split indices per class so both sides keep the label ratio.
///
/// Every class keeps at least one training row. Deterministic for a given
/// seed.
pub fn stratified_split(labels: &[u8], test_fraction: f64, seed: u64) -> Split {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut split = Split {
        train: Vec::with_capacity(labels.len()),
        test: Vec::new(),
    };

    for class in [0u8, 1u8] {
        let mut indices: Vec<usize> = labels
            .iter()
            .enumerate()
            .filter(|(_, label)| **label == class)
            .map(|(i, _)| i)
            .collect();
        if indices.is_empty() {
            continue;
        }
        indices.shuffle(&mut rng);

        let n_test = ((indices.len() as f64 * test_fraction).round() as usize)
            .min(indices.len() - 1);
        split.test.extend_from_slice(&indices[..n_test]);
        split.train.extend_from_slice(&indices[n_test..]);
    }

    split.train.sort_unstable();
    split.test.sort_unstable();
    split
}

/// Fits a risk model from labeled records.
///
/// Feature extraction goes through the same [`EvaluationEngine`] and
/// [`features::aggregate`] the scoring path uses.
#[derive(Debug, Clone)]
pub struct TrainingPipeline {
    engine: EvaluationEngine,
    fit_options: FitOptions,
    test_fraction: f64,
    seed: u64,
}

impl TrainingPipeline {
    pub fn new(engine: EvaluationEngine) -> Self {
        Self {
            engine,
            fit_options: FitOptions::default(),
            test_fraction: 0.25,
            seed: 42,
        }
    }

    pub fn with_fit_options(mut self, options: FitOptions) -> Self {
        self.fit_options = options;
        self
    }

    /// Held-out fraction and shuffle seed
    pub fn with_split(mut self, test_fraction: f64, seed: u64) -> Self {
        self.test_fraction = test_fraction;
        self.seed = seed;
        self
    }

    pub fn engine(&self) -> &EvaluationEngine {
        &self.engine
    }

    /// Evaluate and aggregate every record, in input order
    pub fn featurize(&self, records: &[Record]) -> Result<Vec<FeatureVector>, EvaluationError> {
        records
            .par_iter()
            .map(|record| {
                self.engine
                    .evaluate(record)
                    .map(|violations| features::aggregate(&violations))
            })
            .collect()
    }

    /// Fit a model. Nothing is persisted; the caller saves the result.
    pub fn fit(&self, dataset: &LabeledDataset) -> Result<TrainedModel, TrainingError> {
        if dataset.is_empty() {
            return Err(TrainingError::EmptyDataset);
        }

        let positives = dataset.positives();
        if positives == 0 {
            return Err(TrainingError::SingleClass(0));
        }
        if positives == dataset.len() {
            return Err(TrainingError::SingleClass(1));
        }

        let start = Instant::now();
        let feature_rows = self.featurize(&dataset.records)?;
        debug!(
            rows = feature_rows.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Records featurized"
        );

        let split = stratified_split(&dataset.labels, self.test_fraction, self.seed);

        let train_rows: Vec<[f64; FeatureVector::WIDTH]> = split
            .train
            .iter()
            .map(|&i| feature_rows[i].to_array())
            .collect();
        let train_labels: Vec<u8> = split.train.iter().map(|&i| dataset.labels[i]).collect();

        info!(
            train_rows = train_rows.len(),
            test_rows = split.test.len(),
            fraudulent = positives,
            "Fitting risk model"
        );

        let model = LogisticModel::fit(&train_rows, &train_labels, &self.fit_options)?;

        let evaluation = if split.test.is_empty() {
            None
        } else {
            let test_labels: Vec<u8> = split.test.iter().map(|&i| dataset.labels[i]).collect();
            let predictions: Vec<u8> = split
                .test
                .iter()
                .map(|&i| {
                    let p = model.predict_probability(&feature_rows[i].to_array());
                    u8::from(p > REPORT_THRESHOLD)
                })
                .collect();
            let report = EvaluationReport::from_predictions(&test_labels, &predictions);

            info!(
                accuracy = report.accuracy,
                precision = report.fraudulent.precision,
                recall = report.fraudulent.recall,
                f1 = report.fraudulent.f1,
                "Held-out evaluation"
            );
            Some(report)
        };

        let trained = TrainedModel::new(model, train_rows.len(), evaluation);
        info!(
            model_id = %trained.model_id,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Risk model trained"
        );

        Ok(trained)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Catalog;
    use crate::training::synthetic::SyntheticGenerator;
    use crate::types::record::field::*;

    fn pipeline() -> TrainingPipeline {
        TrainingPipeline::new(EvaluationEngine::new(Catalog::standard().unwrap()))
    }

    #[test]
    fn test_stratified_split_keeps_ratio() {
        let labels: Vec<u8> = (0..100).map(|i| u8::from(i % 4 == 0)).collect();
        let split = stratified_split(&labels, 0.25, 42);

        assert_eq!(split.train.len() + split.test.len(), 100);
        let test_positives = split.test.iter().filter(|&&i| labels[i] == 1).count();
        let test_negatives = split.test.len() - test_positives;
        assert_eq!(test_positives, 6);
        assert_eq!(test_negatives, 19);

        assert_eq!(split, stratified_split(&labels, 0.25, 42));
    }

    #[test]
    fn test_split_keeps_a_training_row_per_class() {
        let split = stratified_split(&[0, 1], 0.9, 1);
        assert_eq!(split.train, vec![0, 1]);
        assert!(split.test.is_empty());
    }

    #[test]
    fn test_single_class_rejected() {
        let mut dataset = LabeledDataset::new();
        dataset.push(Record::new().with(VOTES_CAST, 10), 1);
        dataset.push(Record::new().with(VOTES_CAST, 20), 1);

        assert!(matches!(
            pipeline().fit(&dataset),
            Err(TrainingError::SingleClass(1))
        ));
        assert!(matches!(
            pipeline().fit(&LabeledDataset::new()),
            Err(TrainingError::EmptyDataset)
        ));
    }

    #[test]
    fn test_bad_record_aborts_training() {
        let mut dataset = LabeledDataset::new();
        dataset.push(Record::new().with(VOTES_CAST, 10), 0);
        dataset.push(
            Record::new()
                .with(VOTES_CAST, "lots")
                .with(REGISTERED_VOTERS, 5),
            1,
        );

        assert!(matches!(
            pipeline().fit(&dataset),
            Err(TrainingError::Evaluation(_))
        ));
    }

    #[test]
    fn test_fit_on_synthetic_data() {
        let catalog = Catalog::standard().unwrap();
        let dataset = SyntheticGenerator::new(42).generate(150, &catalog);

        let trained = pipeline().fit(&dataset).unwrap();

        assert_eq!(trained.training_rows, 224);
        assert!(trained.model.weights.iter().all(|&w| w >= 0.0));
        let report = trained.evaluation.as_ref().unwrap();
        assert_eq!(report.total(), 76);
        assert!(report.accuracy > 0.7, "accuracy {}", report.accuracy);

        let quiet = trained.probability(&FeatureVector::default());
        let noisy = trained.probability(&FeatureVector {
            num_violations: 8,
            max_severity: 10,
            total_severity: 60,
            num_procedural_violations: 5,
            ..FeatureVector::default()
        });
        assert!(noisy > quiet);
    }
}
