//! Detection facade: record in, fraud report out

use crate::config::AppConfig;
use crate::engine::EvaluationEngine;
use crate::error::{CatalogError, DetectionError, EvaluationError, ScoringError};
use crate::features;
use crate::metrics::ScoringMetrics;
use crate::models::scorer::RiskScorer;
use crate::rules::{Catalog, RuleSummary, Violation};
use crate::types::record::Record;
use crate::types::report::FraudReport;
use rayon::prelude::*;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Owns the evaluation engine and, when a model was loaded, the scorer.
///
/// Rule evaluation never needs a model. Scoring without one fails with
/// [`ScoringError::ModelUnavailable`]; there is no fallback score.
#[derive(Debug, Clone)]
pub struct FraudDetector {
    engine: EvaluationEngine,
    scorer: Option<RiskScorer>,
    /// Why the model is missing, reported on every scoring attempt
    model_error: Option<String>,
}

impl FraudDetector {
    pub fn new(engine: EvaluationEngine, scorer: Option<RiskScorer>) -> Self {
        let model_error = scorer
            .is_none()
            .then(|| "no model artifact loaded".to_string());
        Self {
            engine,
            scorer,
            model_error,
        }
    }

    /// Build from configuration.
    ///
    /// Fails only when the rule catalog is malformed. A model that cannot be
    /// loaded is logged and leaves the detector in evaluation-only mode for
    /// its whole lifetime.
    pub fn from_config(config: &AppConfig) -> Result<Self, CatalogError> {
        let catalog = Catalog::standard()?;
        info!(rules = catalog.len(), "Rule catalog loaded");
        let engine = EvaluationEngine::new(catalog);

        match RiskScorer::load(&config.models.artifact_path, config.detection.thresholds()) {
            Ok(scorer) => Ok(Self::new(engine, Some(scorer))),
            Err(e) => {
                warn!(
                    path = %config.models.artifact_path.display(),
                    error = %e,
                    "Risk model not loaded; scoring disabled"
                );
                Ok(Self {
                    engine,
                    scorer: None,
                    model_error: Some(e.reason()),
                })
            }
        }
    }

    pub fn engine(&self) -> &EvaluationEngine {
        &self.engine
    }

    pub fn scorer(&self) -> Option<&RiskScorer> {
        self.scorer.as_ref()
    }

    pub fn has_model(&self) -> bool {
        self.scorer.is_some()
    }

    /// Catalog listing for display
    pub fn rule_listing(&self) -> Vec<RuleSummary> {
        self.engine.catalog().listing()
    }

    /// Violated rules only; no model required
    pub fn evaluate(&self, record: &Record) -> Result<Vec<Violation>, EvaluationError> {
        self.engine.evaluate(record)
    }

    fn require_scorer(&self) -> Result<&RiskScorer, ScoringError> {
        self.scorer.as_ref().ok_or_else(|| ScoringError::ModelUnavailable {
            reason: self
                .model_error
                .clone()
                .unwrap_or_else(|| "no model artifact loaded".to_string()),
        })
    }

    fn analyze_with(
        &self,
        scorer: &RiskScorer,
        record: &Record,
    ) -> Result<FraudReport, EvaluationError> {
        let violations = self.engine.evaluate(record)?;
        let features = features::aggregate(&violations);
        let assessment = scorer.assess(&features);

        let report = FraudReport::new(assessment, violations, features, scorer.model_id());
        debug!(
            report_id = %report.report_id,
            probability = report.probability,
            tier = %report.tier,
            violations = report.violations.len(),
            "Record analyzed"
        );

        Ok(report)
    }

    /// Evaluate, aggregate and score one record
    pub fn analyze(&self, record: &Record) -> Result<FraudReport, DetectionError> {
        let scorer = self.require_scorer()?;
        Ok(self.analyze_with(scorer, record)?)
    }

    /// Analyze records in parallel. Results keep input order; one failing
    /// record does not affect the others. Per-record timings and outcomes
    /// are recorded into `metrics`.
    pub fn analyze_batch(
        &self,
        records: &[Record],
        metrics: &ScoringMetrics,
    ) -> Result<Vec<Result<FraudReport, EvaluationError>>, ScoringError> {
        let scorer = self.require_scorer()?;

        Ok(records
            .par_iter()
            .enumerate()
            .map(|(row, record)| {
                let start = Instant::now();
                let result = self.analyze_with(scorer, record);
                match &result {
                    Ok(report) => metrics.record_report(start.elapsed(), report),
                    Err(e) => {
                        metrics.record_failure();
                        warn!(row = row + 1, error = %e, "Record could not be analyzed");
                    }
                }
                result
            })
            .collect())
    }
}
