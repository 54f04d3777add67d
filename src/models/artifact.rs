//! Persisted model artifact: load, validate, save

use crate::error::{ScoringError, TrainingError};
use crate::features::FeatureVector;
use crate::models::logistic::LogisticModel;
use crate::training::report::EvaluationReport;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::info;
use uuid::Uuid;

/// Artifact layout version written by this crate
pub const FORMAT_VERSION: u32 = 1;

/// Self-describing trained model.
///
/// Carries the feature names it was fitted on so a scorer can refuse an
/// artifact produced for a different feature layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedModel {
    pub format_version: u32,
    pub model_id: Uuid,
    pub trained_at: DateTime<Utc>,
    pub feature_names: Vec<String>,
    pub training_rows: usize,
    pub model: LogisticModel,
    /// Held-out diagnostics, absent when the split left no test rows
    pub evaluation: Option<EvaluationReport>,
}

impl TrainedModel {
    pub fn new(
        model: LogisticModel,
        training_rows: usize,
        evaluation: Option<EvaluationReport>,
    ) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            model_id: Uuid::new_v4(),
            trained_at: Utc::now(),
            feature_names: FeatureVector::NAMES.iter().map(|s| s.to_string()).collect(),
            training_rows,
            model,
            evaluation,
        }
    }

    /// Fraud probability for a feature vector
    pub fn probability(&self, features: &FeatureVector) -> f64 {
        self.model
            .predict_probability(&features.to_array())
            .clamp(0.0, 1.0)
    }

    /// Reject artifacts that do not match the current feature layout.
    pub fn validate(&self) -> Result<(), ScoringError> {
        if self.format_version != FORMAT_VERSION {
            return Err(ScoringError::UnsupportedFormat {
                found: self.format_version,
                expected: FORMAT_VERSION,
            });
        }

        if self.feature_names.len() != FeatureVector::WIDTH {
            return Err(ScoringError::ArtifactMismatch(format!(
                "artifact has {} features, scorer produces {}",
                self.feature_names.len(),
                FeatureVector::WIDTH
            )));
        }

        if let Some((expected, found)) = FeatureVector::NAMES
            .iter()
            .zip(&self.feature_names)
            .find(|(expected, found)| **expected != found.as_str())
        {
            return Err(ScoringError::ArtifactMismatch(format!(
                "feature `{}` found where `{}` was expected",
                found, expected
            )));
        }

        self.model
            .validate(FeatureVector::WIDTH)
            .map_err(ScoringError::ArtifactMismatch)
    }

    /// Load and validate an artifact.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScoringError> {
        let path = path.as_ref();

        info!(path = %path.display(), "Loading model artifact");

        let bytes = fs::read(path).map_err(|e| ScoringError::ModelUnavailable {
            reason: format!("cannot read model artifact {}: {}", path.display(), e),
        })?;
        let model: TrainedModel = serde_json::from_slice(&bytes)?;
        model.validate()?;

        info!(
            model_id = %model.model_id,
            trained_at = %model.trained_at,
            training_rows = model.training_rows,
            "Model loaded successfully"
        );

        Ok(model)
    }

    /// Write the artifact to a sibling temporary file, then rename it over
    /// `path`. Readers never observe a partially written artifact.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), TrainingError> {
        let path = path.as_ref();
        let json = serde_json::to_vec_pretty(self)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
        tmp_name.push(".tmp");
        let tmp_path = path.with_file_name(tmp_name);

        let written = fs::File::create(&tmp_path)
            .and_then(|mut file| {
                file.write_all(&json)?;
                file.sync_all()
            })
            .and_then(|()| fs::rename(&tmp_path, path));
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }

        info!(
            model_id = %self.model_id,
            path = %path.display(),
            "Model artifact written"
        );

        Ok(())
    }
}
