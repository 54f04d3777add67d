//! Risk report data structures

use crate::features::FeatureVector;
use crate::rules::Violation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Risk tier classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Low,
    Moderate,
    High,
}

impl RiskTier {
    pub const ALL: [RiskTier; 3] = [RiskTier::Low, RiskTier::Moderate, RiskTier::High];

    /// Determine the tier from a fraud probability.
    ///
    /// Bands are exclusive on the low side: a probability equal to a
    /// threshold falls in the lower tier.
    pub fn from_probability(probability: f64, thresholds: &TierThresholds) -> Self {
        if probability > thresholds.high {
            RiskTier::High
        } else if probability > thresholds.moderate {
            RiskTier::Moderate
        } else {
            RiskTier::Low
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RiskTier::Low => "LOW RISK",
            RiskTier::Moderate => "MODERATE RISK",
            RiskTier::High => "HIGH RISK",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Configurable tier boundaries
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierThresholds {
    /// Probabilities above this are at least moderate
    pub moderate: f64,
    /// Probabilities above this are high
    pub high: f64,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            moderate: 0.40,
            high: 0.70,
        }
    }
}

/// Probability and tier for one feature vector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub probability: f64,
    pub tier: RiskTier,
}

/// Full analysis of one polling-unit record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FraudReport {
    /// Unique report identifier
    pub report_id: Uuid,

    /// Fraud probability (0.0 - 1.0)
    pub probability: f64,

    /// Risk tier derived from the probability
    pub tier: RiskTier,

    /// Violated rules in catalog order
    pub violations: Vec<Violation>,

    /// Model input derived from the violations
    pub features: FeatureVector,

    /// Identifier of the model that produced the probability
    pub model_id: Uuid,

    /// Report generation timestamp
    pub generated_at: DateTime<Utc>,
}

impl FraudReport {
    pub fn new(
        assessment: RiskAssessment,
        violations: Vec<Violation>,
        features: FeatureVector,
        model_id: Uuid,
    ) -> Self {
        Self {
            report_id: Uuid::new_v4(),
            probability: assessment.probability,
            tier: assessment.tier,
            violations,
            features,
            model_id,
            generated_at: Utc::now(),
        }
    }

    /// Zero violations is a valid, reportable outcome
    pub fn has_violations(&self) -> bool {
        !self.violations.is_empty()
    }
}
