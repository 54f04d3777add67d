//! Type definitions for records and risk reports

pub mod record;
pub mod report;

pub use record::{FieldValue, Record};
pub use report::{FraudReport, RiskAssessment, RiskTier, TierThresholds};
