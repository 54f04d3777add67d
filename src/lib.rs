//! Election Fraud Detection Library
//!
//! Evaluates polling-unit result records against a catalog of anomaly
//! rules, reduces the violations to a feature vector and maps that vector
//! to a fraud probability with a trained logistic model.

pub mod config;
pub mod detector;
pub mod engine;
pub mod error;
pub mod features;
pub mod metrics;
pub mod models;
pub mod rules;
pub mod training;
pub mod types;

pub use config::AppConfig;
pub use detector::FraudDetector;
pub use engine::EvaluationEngine;
pub use error::{
    CatalogError, DetectionError, EvaluationError, RuleFault, ScoringError, TrainingError,
};
pub use features::{aggregate, FeatureVector};
pub use models::{RiskScorer, TrainedModel};
pub use rules::{Catalog, Category, Rule, RuleId, Violation};
pub use training::{LabeledDataset, SyntheticGenerator, TrainingPipeline};
pub use types::{FieldValue, FraudReport, Record, RiskTier};
