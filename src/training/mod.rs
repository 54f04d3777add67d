//! Dataset handling, synthetic bootstrapping data and model fitting

pub mod dataset;
pub mod pipeline;
pub mod report;
pub mod synthetic;

pub use dataset::LabeledDataset;
pub use pipeline::TrainingPipeline;
pub use report::EvaluationReport;
pub use synthetic::SyntheticGenerator;
