//! End-to-end tests: synthetic data, training, persistence and scoring

use election_fraud_detection::types::record::field::*;
use election_fraud_detection::{
    aggregate, AppConfig, Catalog, EvaluationEngine, FeatureVector, FraudDetector,
    LabeledDataset, Record, RiskScorer, RiskTier, SyntheticGenerator, TrainingPipeline,
};
use election_fraud_detection::metrics::ScoringMetrics;
use election_fraud_detection::training::dataset::read_records;
use election_fraud_detection::types::report::TierThresholds;
use tempfile::tempdir;

fn engine() -> EvaluationEngine {
    EvaluationEngine::new(Catalog::standard().unwrap())
}

fn synthetic(pairs: usize, seed: u64) -> LabeledDataset {
    SyntheticGenerator::new(seed).generate(pairs, &Catalog::standard().unwrap())
}

#[test]
fn training_and_scoring_share_feature_extraction() {
    let dataset = synthetic(60, 11);
    let pipeline = TrainingPipeline::new(engine());
    let trained = pipeline.fit(&dataset).unwrap();
    let scorer = RiskScorer::new(trained, TierThresholds::default()).unwrap();
    let detector = FraudDetector::new(engine(), Some(scorer));

    let training_features = pipeline.featurize(&dataset.records).unwrap();

    for (record, expected) in dataset.records.iter().zip(&training_features) {
        let report = detector.analyze(record).unwrap();
        assert_eq!(&report.features, expected);
        assert_eq!(report.features, aggregate(&report.violations));
    }
}

#[test]
fn generate_train_save_load_analyze() {
    let dir = tempdir().unwrap();
    let data_path = dir.path().join("data").join("fraud_mock_data.csv");
    let model_path = dir.path().join("models").join("fraud_model.json");

    synthetic(200, 42)
        .write_csv_path(&data_path, "is_fraudulent")
        .unwrap();
    let dataset = LabeledDataset::from_csv_path(&data_path, "is_fraudulent").unwrap();
    assert_eq!(dataset.len(), 400);
    assert_eq!(dataset.positives(), 200);

    let trained = TrainingPipeline::new(engine()).fit(&dataset).unwrap();
    let report = trained.evaluation.clone().unwrap();
    assert_eq!(report.total(), 100);
    assert!(report.fraudulent.recall > 0.6, "recall {}", report.fraudulent.recall);
    trained.save(&model_path).unwrap();

    let mut config = AppConfig::default();
    config.models.artifact_path = model_path;
    let detector = FraudDetector::from_config(&config).unwrap();
    assert!(detector.has_model());
    assert_eq!(detector.scorer().unwrap().model_id(), trained.model_id);

    let clean = Record::new()
        .with(REGISTERED_VOTERS, 550)
        .with(ACCREDITED_VOTERS, 302)
        .with(VOTES_CAST, 301)
        .with(VALID_VOTES, 295)
        .with(PDP_VOTES, 121)
        .with(APC_VOTES, 87)
        .with(LP_VOTES, 58)
        .with(OTHER_VOTES, 29)
        .with(SUBMISSION_DELAY_HOURS, 1.0)
        .with(RESULTS_PUBLICLY_POSTED, true)
        .with(OBSERVERS_PRESENT, true)
        .with(SECURITY_PERSONNEL_PRESENT, 2);
    let stuffed = clean
        .clone()
        .with(VOTES_CAST, 700)
        .with(ACCREDITED_VOTERS, 500)
        .with(FORM_EC8A_MISSING_OR_ALTERED, true)
        .with(BALLOT_BOX_SNATCHING, true)
        .with(REPORTS_OF_VIOLENCE, true)
        .with(OBSERVER_FLAGS_IRREGULARITY, true)
        .with(REPORTS_OF_VOTE_BUYING, true);

    let clean_report = detector.analyze(&clean).unwrap();
    let stuffed_report = detector.analyze(&stuffed).unwrap();

    assert!(!clean_report.has_violations());
    assert!(stuffed_report.violations.len() >= 7);
    assert!(stuffed_report.probability > clean_report.probability);
    assert_eq!(stuffed_report.tier, RiskTier::High);
}

#[test]
fn scoring_without_model_is_unavailable() {
    let dir = tempdir().unwrap();
    let mut config = AppConfig::default();
    config.models.artifact_path = dir.path().join("never_trained.json");

    let detector = FraudDetector::from_config(&config).unwrap();
    let record = Record::new().with(REGISTERED_VOTERS, 500).with(VOTES_CAST, 600);

    let err = detector.analyze(&record).unwrap_err();
    assert!(err.is_scoring_unavailable());
    assert!(detector
        .analyze_batch(&[record.clone()], &ScoringMetrics::new())
        .is_err());

    // distinct from a clean result: rules still evaluate
    assert_eq!(detector.evaluate(&record).unwrap().len(), 2);
}

#[test]
fn corrupt_artifact_disables_scoring() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("fraud_model.json");
    std::fs::write(&path, "{\"format_version\": 1}").unwrap();

    let mut config = AppConfig::default();
    config.models.artifact_path = path;
    let detector = FraudDetector::from_config(&config).unwrap();

    let err = detector.analyze(&Record::new()).unwrap_err();
    assert!(err.is_scoring_unavailable());
    assert!(err.to_string().contains("corrupt"));
}

#[test]
fn turnout_over_registration_fires_only_applicable_rules() {
    let record = Record::new().with(REGISTERED_VOTERS, 500).with(VOTES_CAST, 600);

    let ids: Vec<String> = engine()
        .evaluate(&record)
        .unwrap()
        .iter()
        .map(|v| v.id.to_string())
        .collect();

    assert!(ids.contains(&"T01".to_string()));
    assert!(ids.iter().all(|id| id == "T01" || id == "T03"));
}

#[test]
fn party_vote_sum_consistency() {
    let base = Record::new()
        .with(PDP_VOTES, 50)
        .with(APC_VOTES, 40)
        .with(LP_VOTES, 9)
        .with(OTHER_VOTES, 1)
        .with(VOTES_CAST, 100);

    let fired = |record: &Record| {
        engine()
            .evaluate(record)
            .unwrap()
            .iter()
            .any(|v| v.id.to_string() == "V02")
    };

    assert!(!fired(&base.clone().with(VALID_VOTES, 100)));
    assert!(fired(&base.with(VALID_VOTES, 90)));
}

#[test]
fn derived_fields_feed_margin_rules() {
    let record = Record::new()
        .with(REGISTERED_VOTERS, 600)
        .with(VOTES_CAST, 401)
        .with(PDP_VOTES, 150)
        .with(APC_VOTES, 149)
        .with(LP_VOTES, 60)
        .with(OTHER_VOTES, 30)
        .with_derived_fields();

    let violations = engine().evaluate(&record).unwrap();
    assert!(violations.iter().any(|v| v.id.to_string() == "V08"));

    let features: FeatureVector = aggregate(&violations);
    assert!(features.num_voting_violations >= 1);
}

#[test]
fn non_finite_cells_do_not_fire_rules() {
    let csv = "pdp_votes,apc_votes,lp_votes,other_votes,valid_votes\n50,40,9,1,NaN\n";
    let records = read_records(csv.as_bytes(), "is_fraudulent").unwrap();
    assert!(!records[0].contains(VALID_VOTES));

    let nan_record = records[0].clone().with(VALID_VOTES, f64::NAN);
    for record in [&records[0], &nan_record] {
        let violations = engine().evaluate(record).unwrap();
        assert!(violations.iter().all(|v| v.id.to_string() != "V02"));
    }
}
