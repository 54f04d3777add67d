//! Risk model: logistic regression, persisted artifact and scorer

pub mod artifact;
pub mod logistic;
pub mod scorer;

pub use artifact::TrainedModel;
pub use logistic::{FitOptions, LogisticModel};
pub use scorer::RiskScorer;
