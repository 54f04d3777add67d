//! Risk scorer: feature vector to probability and tier

use crate::error::ScoringError;
use crate::features::FeatureVector;
use crate::models::artifact::TrainedModel;
use crate::types::report::{RiskAssessment, RiskTier, TierThresholds};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Scores feature vectors with a loaded, read-only model.
///
/// A scorer only exists once a valid artifact has been loaded, so every
/// call returns a real model probability.
#[derive(Debug, Clone)]
pub struct RiskScorer {
    model: Arc<TrainedModel>,
    thresholds: TierThresholds,
}

impl RiskScorer {
    pub fn new(model: TrainedModel, thresholds: TierThresholds) -> Result<Self, ScoringError> {
        model.validate()?;
        Ok(Self {
            model: Arc::new(model),
            thresholds,
        })
    }

    /// Load the artifact at `path`
    pub fn load<P: AsRef<Path>>(path: P, thresholds: TierThresholds) -> Result<Self, ScoringError> {
        let model = TrainedModel::load(path)?;
        Ok(Self {
            model: Arc::new(model),
            thresholds,
        })
    }

    pub fn model(&self) -> &TrainedModel {
        &self.model
    }

    pub fn model_id(&self) -> Uuid {
        self.model.model_id
    }

    pub fn thresholds(&self) -> &TierThresholds {
        &self.thresholds
    }

    /// Fraud probability in [0, 1]
    pub fn score(&self, features: &FeatureVector) -> f64 {
        self.model.probability(features)
    }

    pub fn tier(&self, probability: f64) -> RiskTier {
        RiskTier::from_probability(probability, &self.thresholds)
    }

    /// Probability plus tier
    pub fn assess(&self, features: &FeatureVector) -> RiskAssessment {
        let probability = self.score(features);
        let tier = self.tier(probability);

        debug!(
            probability = probability,
            tier = ?tier,
            violations = features.num_violations,
            "Feature vector scored"
        );

        RiskAssessment { probability, tier }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::logistic::LogisticModel;

    fn scorer_with_intercept(intercept: f64) -> RiskScorer {
        let model = TrainedModel::new(
            LogisticModel {
                weights: vec![0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0],
                intercept,
                feature_means: vec![0.0; FeatureVector::WIDTH],
                feature_scales: vec![1.0; FeatureVector::WIDTH],
            },
            10,
            None,
        );
        RiskScorer::new(model, TierThresholds::default()).unwrap()
    }

    #[test]
    fn test_score_is_probability() {
        let scorer = scorer_with_intercept(-4.0);

        let none = scorer.score(&FeatureVector::default());
        let heavy = scorer.score(&FeatureVector {
            num_violations: 5,
            max_severity: 10,
            total_severity: 40,
            ..FeatureVector::default()
        });

        assert!((0.0..=1.0).contains(&none));
        assert!((0.0..=1.0).contains(&heavy));
        assert!(heavy > none);
    }

    #[test]
    fn test_assess_assigns_tier() {
        let scorer = scorer_with_intercept(-4.0);
        let assessment = scorer.assess(&FeatureVector::default());
        assert_eq!(assessment.tier, RiskTier::Low);

        let assessment = scorer.assess(&FeatureVector {
            total_severity: 30,
            ..FeatureVector::default()
        });
        assert_eq!(assessment.tier, RiskTier::High);
    }

    #[test]
    fn test_invalid_model_rejected() {
        let model = TrainedModel::new(
            LogisticModel {
                weights: vec![1.0; 3],
                intercept: 0.0,
                feature_means: vec![0.0; 3],
                feature_scales: vec![1.0; 3],
            },
            10,
            None,
        );
        assert!(RiskScorer::new(model, TierThresholds::default()).is_err());
    }
}
