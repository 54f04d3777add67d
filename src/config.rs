//! Configuration management for the fraud detector

use crate::models::logistic::FitOptions;
use crate::types::report::TierThresholds;
use anyhow::{ensure, Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default configuration file, read when present
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub models: ModelsConfig,
    pub detection: DetectionConfig,
    pub training: TrainingConfig,
    pub generator: GeneratorConfig,
    pub logging: LoggingConfig,
}

/// Model artifact location
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Trained model artifact (JSON)
    pub artifact_path: PathBuf,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            artifact_path: PathBuf::from("models/fraud_model.json"),
        }
    }
}

/// Risk tier boundaries
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Probabilities above this are at least moderate risk
    pub moderate_threshold: f64,
    /// Probabilities above this are high risk
    pub high_threshold: f64,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        let thresholds = TierThresholds::default();
        Self {
            moderate_threshold: thresholds.moderate,
            high_threshold: thresholds.high,
        }
    }
}

impl DetectionConfig {
    pub fn thresholds(&self) -> TierThresholds {
        TierThresholds {
            moderate: self.moderate_threshold,
            high: self.high_threshold,
        }
    }
}

/// Training run settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Binary label column in the dataset
    pub label_column: String,
    /// Fraction of each class held out for evaluation
    pub test_fraction: f64,
    /// Split shuffle seed
    pub seed: u64,
    pub learning_rate: f64,
    pub epochs: usize,
    pub l2_penalty: f64,
    /// Reweight classes by inverse frequency
    pub balance_classes: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        let fit = FitOptions::default();
        Self {
            label_column: "is_fraudulent".to_string(),
            test_fraction: 0.25,
            seed: 42,
            learning_rate: fit.learning_rate,
            epochs: fit.epochs,
            l2_penalty: fit.l2_penalty,
            balance_classes: fit.balance_classes,
        }
    }
}

impl TrainingConfig {
    pub fn fit_options(&self) -> FitOptions {
        FitOptions {
            learning_rate: self.learning_rate,
            epochs: self.epochs,
            l2_penalty: self.l2_penalty,
            balance_classes: self.balance_classes,
        }
    }
}

/// Synthetic dataset settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Clean/fraudulent record pairs to generate
    pub pairs: usize,
    pub seed: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self { pairs: 500, seed: 42 }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// Load from the default file if it exists, then the environment
    pub fn load() -> Result<Self> {
        Self::build(File::with_name(DEFAULT_CONFIG_PATH).required(false))
    }

    /// Load from a specific file, which must exist, then the environment
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::build(File::from(path.as_ref()).required(true))
    }

    fn build(file: File<config::FileSourceFile, config::FileFormat>) -> Result<Self> {
        let config = Config::builder()
            .add_source(file)
            // EFD_DETECTION__HIGH_THRESHOLD=0.8 -> detection.high_threshold
            .add_source(
                Environment::with_prefix("EFD")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: AppConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings no run could use
    pub fn validate(&self) -> Result<()> {
        let detection = &self.detection;
        ensure!(
            detection.moderate_threshold > 0.0 && detection.moderate_threshold < 1.0,
            "detection.moderate_threshold must be in (0, 1), got {}",
            detection.moderate_threshold
        );
        ensure!(
            detection.high_threshold > 0.0 && detection.high_threshold < 1.0,
            "detection.high_threshold must be in (0, 1), got {}",
            detection.high_threshold
        );
        ensure!(
            detection.moderate_threshold < detection.high_threshold,
            "detection.moderate_threshold ({}) must be below detection.high_threshold ({})",
            detection.moderate_threshold,
            detection.high_threshold
        );

        let training = &self.training;
        ensure!(
            (0.0..1.0).contains(&training.test_fraction),
            "training.test_fraction must be in [0, 1), got {}",
            training.test_fraction
        );
        ensure!(training.epochs > 0, "training.epochs must be positive");
        ensure!(
            training.learning_rate > 0.0,
            "training.learning_rate must be positive, got {}",
            training.learning_rate
        );
        ensure!(
            training.l2_penalty >= 0.0,
            "training.l2_penalty must not be negative, got {}",
            training.l2_penalty
        );
        ensure!(
            !training.label_column.trim().is_empty(),
            "training.label_column must not be empty"
        );

        Ok(())
    }
}
