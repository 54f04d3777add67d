//! Election Fraud Detection - Command Line Entry Point
//!
//! Lists the rule catalog, generates synthetic training data, trains the
//! risk model and scores polling-unit records, one at a time or in batches.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use election_fraud_detection::{
    config::{AppConfig, LoggingConfig},
    metrics::ScoringMetrics,
    rules::{RuleSummary, Violation},
    training::dataset,
    Catalog, EvaluationEngine, FraudDetector, FraudReport, LabeledDataset, Record,
    SyntheticGenerator, TrainingPipeline,
};
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fraud-detect")]
#[command(version, about = "Polling-unit anomaly rules and fraud risk scoring", long_about = None)]
struct Cli {
    /// Configuration file (defaults to config/config.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the rule catalog
    Rules {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate a synthetic labeled dataset
    Generate {
        /// Output CSV file
        #[arg(short, long, default_value = "data/fraud_mock_data.csv")]
        output: PathBuf,

        /// Clean/fraudulent record pairs (overrides config)
        #[arg(short, long)]
        pairs: Option<usize>,

        /// Random seed (overrides config)
        #[arg(short, long)]
        seed: Option<u64>,
    },

    /// Train the risk model from a labeled CSV dataset
    Train {
        /// Labeled CSV dataset
        #[arg(short, long)]
        data: PathBuf,

        /// Artifact output path (overrides config)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Analyze one JSON record
    Analyze {
        /// JSON file holding the record (reads stdin when omitted)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Fill turnout_percentage and winning_margin_abs from raw counts
        #[arg(long)]
        derive: bool,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Score every record of a CSV file in parallel
    Batch {
        /// CSV file, one record per row
        #[arg(short, long)]
        input: PathBuf,

        /// Write one JSON report per line to this file
        #[arg(short, long)]
        reports: Option<PathBuf>,

        /// Fill derived fields before scoring
        #[arg(long)]
        derive: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from_path(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => AppConfig::load()?,
    };

    init_tracing(&config.logging, cli.verbose)?;
    info!("Configuration loaded successfully");

    match cli.command {
        Commands::Rules { json } => cmd_rules(json)?,
        Commands::Generate {
            output,
            pairs,
            seed,
        } => cmd_generate(&config, &output, pairs, seed)?,
        Commands::Train { data, output } => cmd_train(&config, &data, output)?,
        Commands::Analyze {
            input,
            derive,
            json,
        } => cmd_analyze(&config, input.as_deref(), derive, json)?,
        Commands::Batch {
            input,
            reports,
            derive,
        } => cmd_batch(&config, &input, reports.as_deref(), derive)?,
    }

    Ok(())
}

/// Logs go to stderr; stdout carries command output.
fn init_tracing(logging: &LoggingConfig, verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { logging.level.as_str() };
    let filter = EnvFilter::try_from_default_env().or_else(|_| {
        EnvFilter::try_new(format!(
            "election_fraud_detection={level},fraud_detect={level}"
        ))
    })?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);

    match logging.format.as_str() {
        "json" => builder.json().init(),
        _ => builder.init(),
    }

    Ok(())
}

fn cmd_rules(json: bool) -> Result<()> {
    let listing: Vec<RuleSummary> = Catalog::standard()?.listing();

    if json {
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    println!("{:<5} {:<16} {:>8}  DESCRIPTION", "ID", "CATEGORY", "SEVERITY");
    for rule in &listing {
        println!(
            "{:<5} {:<16} {:>8}  {}",
            rule.id.to_string(),
            rule.category.label(),
            rule.severity,
            rule.description
        );
    }
    println!("\n{} rules", listing.len());

    Ok(())
}

fn cmd_generate(
    config: &AppConfig,
    output: &Path,
    pairs: Option<usize>,
    seed: Option<u64>,
) -> Result<()> {
    let pairs = pairs.unwrap_or(config.generator.pairs);
    let seed = seed.unwrap_or(config.generator.seed);
    let catalog = Catalog::standard()?;

    info!(pairs = pairs, seed = seed, "Generating synthetic dataset");
    let dataset = SyntheticGenerator::new(seed).generate(pairs, &catalog);
    dataset
        .write_csv_path(output, &config.training.label_column)
        .with_context(|| format!("Failed to write dataset to {}", output.display()))?;

    println!(
        "Wrote {} records ({} fraudulent) to {}",
        dataset.len(),
        dataset.positives(),
        output.display()
    );
    Ok(())
}

fn cmd_train(config: &AppConfig, data: &Path, output: Option<PathBuf>) -> Result<()> {
    let training = &config.training;
    let dataset = LabeledDataset::from_csv_path(data, &training.label_column)
        .with_context(|| format!("Failed to read training data from {}", data.display()))?;

    let pipeline = TrainingPipeline::new(EvaluationEngine::new(Catalog::standard()?))
        .with_fit_options(training.fit_options())
        .with_split(training.test_fraction, training.seed);
    let trained = pipeline.fit(&dataset).context("Training failed")?;

    let output = output.unwrap_or_else(|| config.models.artifact_path.clone());
    trained
        .save(&output)
        .with_context(|| format!("Failed to write model artifact to {}", output.display()))?;

    if let Some(report) = &trained.evaluation {
        println!("Held-out evaluation ({} rows):\n{}\n", report.total(), report);
    }
    println!("Model {} saved to {}", trained.model_id, output.display());
    Ok(())
}

fn read_record(input: Option<&Path>) -> Result<Record> {
    let mut text = String::new();
    match input {
        Some(path) => {
            File::open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?
                .read_to_string(&mut text)?;
        }
        None => {
            io::stdin().read_to_string(&mut text)?;
        }
    }
    serde_json::from_str(&text).context("Input is not a JSON object of record fields")
}

fn print_violations(violations: &[Violation]) {
    if violations.is_empty() {
        println!("No rule violations detected.");
        return;
    }

    println!("Violations ({}):", violations.len());
    for v in violations {
        println!(
            "  {} [{}] severity {:>2}  {}",
            v.id,
            v.category.label(),
            v.severity,
            v.description
        );
    }
}

fn print_report(report: &FraudReport) {
    println!(
        "Fraud probability: {:.1}% ({})",
        report.probability * 100.0,
        report.tier
    );
    print_violations(&report.violations);
}

fn cmd_analyze(config: &AppConfig, input: Option<&Path>, derive: bool, json: bool) -> Result<()> {
    let mut record = read_record(input)?;
    if derive {
        record = record.with_derived_fields();
    }

    let detector = FraudDetector::from_config(config)?;

    match detector.analyze(&record) {
        Ok(report) if json => println!("{}", serde_json::to_string_pretty(&report)?),
        Ok(report) => print_report(&report),
        Err(e) if e.is_scoring_unavailable() => {
            // rules still run without a model; the risk score does not
            print_violations(&detector.evaluate(&record)?);
            return Err(anyhow::Error::new(e).context("Risk score not computed"));
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}

fn cmd_batch(config: &AppConfig, input: &Path, reports: Option<&Path>, derive: bool) -> Result<()> {
    let file = File::open(input).with_context(|| format!("Failed to open {}", input.display()))?;
    let mut records = dataset::read_records(file, &config.training.label_column)?;
    if derive {
        records = records.into_iter().map(Record::with_derived_fields).collect();
    }
    info!(records = records.len(), path = %input.display(), "Batch loaded");

    let detector = FraudDetector::from_config(config)?;
    let metrics = ScoringMetrics::new();
    let results = detector
        .analyze_batch(&records, &metrics)
        .context("Batch not scored")?;

    if let Some(path) = reports {
        let mut out = BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        );
        for report in results.iter().filter_map(|r| r.as_ref().ok()) {
            serde_json::to_writer(&mut out, report)?;
            writeln!(out)?;
        }
        out.flush()?;
        info!(path = %path.display(), "Reports written");
    }

    metrics.print_summary();
    Ok(())
}
