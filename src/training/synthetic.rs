//! Synthetic polling-unit data
//!
//! Generates plausible clean records and fraudulent twins that carry a few
//! deliberately planted anomalies. Used to bootstrap a model before real
//! labeled results exist.

use crate::rules::{Catalog, Category, RuleId};
use crate::training::dataset::LabeledDataset;
use crate::types::record::field::*;
use crate::types::record::Record;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

/// Expected vote share of pdp, apc, lp and other
const VOTE_SHARES: [f64; 4] = [0.4, 0.3, 0.2, 0.1];

fn num(record: &Record, name: &str) -> f64 {
    record.number(name).unwrap_or(0.0)
}

/// Seeded record generator
pub struct SyntheticGenerator {
    rng: StdRng,
}

impl SyntheticGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    fn split_votes(&mut self, valid: u32) -> [f64; 4] {
        let mut votes = [0.0; 4];
        for _ in 0..valid {
            let mut draw: f64 = self.rng.gen();
            let mut slot = VOTE_SHARES.len() - 1;
            for (i, share) in VOTE_SHARES.iter().enumerate() {
                if draw < *share {
                    slot = i;
                    break;
                }
                draw -= share;
            }
            votes[slot] += 1.0;
        }
        votes
    }

    /// Generate a plausible-looking clean record
    pub fn clean_record(&mut self) -> Record {
        let registered: u32 = self.rng.gen_range(200..800);
        let turnout: f64 = self.rng.gen_range(0.35..0.75);
        let cast = (f64::from(registered) * turnout).floor() as u32;
        let accredited = cast + self.rng.gen_range(0..5);
        let max_invalid = ((f64::from(cast) * 0.05) as u32).max(1);
        let valid = cast - self.rng.gen_range(0..max_invalid);

        let votes = self.split_votes(valid);
        let mut ranked = votes;
        ranked.sort_by(|a, b| b.total_cmp(a));
        let margin = ranked[0] - ranked[1];
        let unit_margin = if valid > 0 {
            margin / f64::from(valid)
        } else {
            0.0
        };

        Record::new()
            .with(REGISTERED_VOTERS, registered)
            .with(ACCREDITED_VOTERS, accredited)
            .with(VOTES_CAST, cast)
            .with(VALID_VOTES, valid)
            .with(PDP_VOTES, votes[0])
            .with(APC_VOTES, votes[1])
            .with(LP_VOTES, votes[2])
            .with(OTHER_VOTES, votes[3])
            .with(TURNOUT_PERCENTAGE, turnout)
            .with(HISTORICAL_TURNOUT, turnout + self.rng.gen_range(-0.1..0.1))
            .with(
                ESTIMATED_POPULATION,
                i64::from(registered) * 2 + self.rng.gen_range(-50..50i64),
            )
            .with(UNIT_WIN_MARGIN, unit_margin)
            .with(
                NEIGHBOR_AVG_WIN_MARGIN,
                unit_margin + self.rng.gen_range(-0.1..0.1),
            )
            .with(WINNING_MARGIN_ABS, margin)
            .with(
                HISTORICAL_WIN_MARGIN_ABS,
                margin + f64::from(self.rng.gen_range(-10..10i32)),
            )
            .with(FAILS_BENFORDS_LAW, self.rng.gen_bool(0.5))
            .with(SUBMISSION_DELAY_HOURS, self.rng.gen_range(0.5..2.0))
            .with(FORM_EC8A_MISSING_OR_ALTERED, false)
            .with(BVAS_MALFUNCTION, false)
            .with(REPORTS_OF_VIOLENCE, false)
            .with(OPENING_DELAY_HOURS, self.rng.gen_range(0.0..1.5))
            .with(PARTY_AGENTS_ABSENT, false)
            .with(BALLOT_BOX_SNATCHING, false)
            .with(SECURITY_PERSONNEL_PRESENT, self.rng.gen_range(1..4u32))
            .with(RESULTS_PUBLICLY_POSTED, true)
            .with(MANUAL_ACCREDITATION_ALTERATION, false)
            .with(AGENTS_REFUSED_SIGNING, 0)
            .with(OBSERVER_FLAGS_IRREGULARITY, false)
            .with(OBSERVER_COUNTS_MISMATCH, false)
            .with(OBSERVERS_PRESENT, true)
            .with(REPORTS_OF_VOTE_BUYING, false)
            .with(
                NEIGHBOR_REGISTERED_VOTERS,
                i64::from(registered) + self.rng.gen_range(-20..20i64),
            )
    }

    /// Copy `base` and plant between 3 and 9 randomly chosen rule triggers
    pub fn fraudulent_from(&mut self, base: &Record, catalog: &Catalog) -> Record {
        let mut record = base.clone();
        let planted = self.rng.gen_range(3..10);

        for _ in 0..planted {
            if let Some(rule) = catalog.rules().choose(&mut self.rng) {
                let id = rule.id;
                if !self.apply_trigger(&mut record, id) {
                    debug!(rule = %id, "No synthetic trigger for rule");
                }
            }
        }

        record
    }

    /// Generate `pairs` clean records, each followed by its fraudulent twin
    pub fn generate(&mut self, pairs: usize, catalog: &Catalog) -> LabeledDataset {
        let mut dataset = LabeledDataset::new();
        for _ in 0..pairs {
            let clean = self.clean_record();
            let fraudulent = self.fraudulent_from(&clean, catalog);
            dataset.push(clean, 0);
            dataset.push(fraudulent, 1);
        }

        info!(
            pairs = pairs,
            rows = dataset.len(),
            "Synthetic dataset generated"
        );
        dataset
    }

    /// Modify `record` so that the standard rule `id` fires.
    ///
    /// Returns false for identifiers outside the standard catalog. A later
    /// trigger may undo an earlier one; only the last write wins.
    pub fn apply_trigger(&mut self, record: &mut Record, id: RuleId) -> bool {
        use Category::*;

        let registered = num(record, REGISTERED_VOTERS);
        let cast = num(record, VOTES_CAST);

        match (id.category(), id.ordinal()) {
            (Turnout, 1) => record.insert(VOTES_CAST, registered + 50.0),
            (Turnout, 2) => record.insert(VOTES_CAST, registered),
            (Turnout, 3) => record.insert(VOTES_CAST, (registered * 0.97).ceil()),
            (Turnout, 4) => record.insert(VOTES_CAST, (registered * 0.05).floor()),
            (Turnout, 5) => {
                let turnout = num(record, TURNOUT_PERCENTAGE);
                record.insert(HISTORICAL_TURNOUT, turnout + 0.45);
            }
            (Turnout, 6) => record.insert(ACCREDITED_VOTERS, (cast - 20.0).max(0.0)),
            (Turnout, 7) => record.insert(ESTIMATED_POPULATION, registered),
            (Turnout, 8) => record.insert(VOTES_CAST, 0),

            (VotingPattern, 1) => {
                record.insert(PDP_VOTES, cast);
                record.insert(APC_VOTES, 0);
                record.insert(LP_VOTES, 0);
                record.insert(OTHER_VOTES, 0);
                record.insert(VALID_VOTES, cast);
            }
            (VotingPattern, 2) => {
                let valid = num(record, VALID_VOTES);
                record.insert(VALID_VOTES, valid + 100.0);
            }
            (VotingPattern, 3) => record.insert(VALID_VOTES, (cast * 0.8).floor()),
            (VotingPattern, 4) => {
                for name in [PDP_VOTES, APC_VOTES, LP_VOTES] {
                    let rounded = (num(record, name) / 10.0).round() * 10.0;
                    record.insert(name, rounded);
                }
            }
            (VotingPattern, 5) => {
                let margin = num(record, UNIT_WIN_MARGIN);
                record.insert(NEIGHBOR_AVG_WIN_MARGIN, margin + 0.5);
            }
            (VotingPattern, 6) => {
                let weakest = [PDP_VOTES, APC_VOTES, LP_VOTES]
                    .iter()
                    .map(|name| num(record, name))
                    .fold(f64::MAX, f64::min);
                record.insert(OTHER_VOTES, weakest + 1.0);
                record.insert(VOTES_CAST, cast.max(101.0));
            }
            (VotingPattern, 7) => record.insert(VALID_VOTES, cast + 10.0),
            (VotingPattern, 8) => {
                record.insert(WINNING_MARGIN_ABS, 1);
                record.insert(VOTES_CAST, cast.max(201.0));
            }
            (VotingPattern, 9) => record.insert(FAILS_BENFORDS_LAW, true),
            (VotingPattern, 10) => {
                let pdp = num(record, PDP_VOTES);
                record.insert(APC_VOTES, pdp);
                record.insert(LP_VOTES, 0);
                record.insert(VOTES_CAST, cast.max(101.0));
            }
            (VotingPattern, 11) => record.insert(PDP_VOTES, registered + 10.0),

            (Procedural, 1) => record.insert(SUBMISSION_DELAY_HOURS, self.rng.gen_range(3.5..12.0)),
            (Procedural, 2) => record.insert(FORM_EC8A_MISSING_OR_ALTERED, true),
            (Procedural, 3) => record.insert(BVAS_MALFUNCTION, true),
            (Procedural, 4) => record.insert(REPORTS_OF_VIOLENCE, true),
            (Procedural, 5) => record.insert(OPENING_DELAY_HOURS, self.rng.gen_range(2.5..6.0)),
            (Procedural, 6) => record.insert(PARTY_AGENTS_ABSENT, true),
            (Procedural, 7) => record.insert(BALLOT_BOX_SNATCHING, true),
            (Procedural, 8) => record.insert(SECURITY_PERSONNEL_PRESENT, 0),
            (Procedural, 9) => record.insert(RESULTS_PUBLICLY_POSTED, false),
            (Procedural, 10) => record.insert(MANUAL_ACCREDITATION_ALTERATION, true),

            (AgentObserver, 1) => record.insert(AGENTS_REFUSED_SIGNING, self.rng.gen_range(2..5u32)),
            (AgentObserver, 2) => record.insert(OBSERVER_FLAGS_IRREGULARITY, true),
            (AgentObserver, 3) => record.insert(OBSERVER_COUNTS_MISMATCH, true),
            (AgentObserver, 4) => record.insert(OBSERVERS_PRESENT, false),
            (AgentObserver, 5) => record.insert(REPORTS_OF_VOTE_BUYING, true),

            (Statistical, 1) => record.insert(ACCREDITED_VOTERS, registered),
            (Statistical, 2) => {
                let digit = f64::from(self.rng.gen_range(1..10u8));
                for name in [PDP_VOTES, APC_VOTES, LP_VOTES] {
                    let tens = (num(record, name) / 10.0).floor() * 10.0;
                    record.insert(name, tens + digit);
                }
            }
            (Statistical, 3) => {
                let cast = cast.max(301.0);
                record.insert(VOTES_CAST, cast);
                record.insert(VALID_VOTES, cast);
            }
            (Statistical, 4) => {
                // whole-number turnout ratio: every registered voter cast a ballot
                let registered = registered.max(201.0);
                record.insert(REGISTERED_VOTERS, registered);
                record.insert(VOTES_CAST, registered);
            }
            (Statistical, 5) => {
                let margin = num(record, WINNING_MARGIN_ABS).max(1.0);
                record.insert(WINNING_MARGIN_ABS, margin);
                record.insert(HISTORICAL_WIN_MARGIN_ABS, margin);
            }
            (Statistical, 6) => {
                let population = num(record, ESTIMATED_POPULATION);
                record.insert(VOTES_CAST, population + 10.0);
            }
            (Statistical, 7) => {
                record.insert(LP_VOTES, 0);
                record.insert(VOTES_CAST, cast.max(101.0));
            }
            (Statistical, 8) => {
                let accredited = num(record, ACCREDITED_VOTERS);
                record.insert(ACCREDITED_VOTERS, ((accredited / 100.0).round() * 100.0).max(100.0));
            }
            (Statistical, 9) => record.insert(NEIGHBOR_REGISTERED_VOTERS, registered),
            (Statistical, 10) => {
                record.insert(PDP_VOTES, 300);
                record.insert(APC_VOTES, 200);
                record.insert(LP_VOTES, 100);
            }

            _ => return false,
        }

        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EvaluationEngine;

    #[test]
    fn test_clean_record_is_complete() {
        let mut generator = SyntheticGenerator::new(7);
        let record = generator.clean_record();

        assert_eq!(record.len(), 32);
        let registered = record.number(REGISTERED_VOTERS).unwrap();
        let cast = record.number(VOTES_CAST).unwrap();
        let valid = record.number(VALID_VOTES).unwrap();
        assert!((200.0..800.0).contains(&registered));
        assert!(cast <= registered);
        assert!(valid <= cast);

        let party_total: f64 = [PDP_VOTES, APC_VOTES, LP_VOTES, OTHER_VOTES]
            .iter()
            .map(|name| record.number(name).unwrap())
            .sum();
        assert_eq!(party_total, valid);
    }

    #[test]
    fn test_every_standard_rule_has_a_trigger() {
        let catalog = Catalog::standard().unwrap();
        let mut generator = SyntheticGenerator::new(42);

        for _ in 0..5 {
            let base = generator.clean_record();
            for rule in catalog.iter() {
                let mut record = base.clone();
                assert!(generator.apply_trigger(&mut record, rule.id), "{}", rule.id);
                assert_eq!(rule.check(&record), Ok(true), "trigger for {} did not fire", rule.id);
            }
        }
    }

    #[test]
    fn test_unknown_rule_has_no_trigger() {
        let mut generator = SyntheticGenerator::new(1);
        let mut record = generator.clean_record();
        let before = record.clone();

        assert!(!generator.apply_trigger(&mut record, RuleId::new(Category::Turnout, 42)));
        assert_eq!(record, before);
    }

    #[test]
    fn test_generate_is_seeded() {
        let catalog = Catalog::standard().unwrap();

        let first = SyntheticGenerator::new(99).generate(10, &catalog);
        let second = SyntheticGenerator::new(99).generate(10, &catalog);
        let other = SyntheticGenerator::new(100).generate(10, &catalog);

        assert_eq!(first.len(), 20);
        assert_eq!(first.positives(), 10);
        assert_eq!(&first.labels[..4], &[0, 1, 0, 1]);
        assert_eq!(first, second);
        assert_ne!(first, other);
    }

    #[test]
    fn test_fraudulent_twins_violate_more_rules() {
        let catalog = Catalog::standard().unwrap();
        let engine = EvaluationEngine::new(catalog.clone());
        let dataset = SyntheticGenerator::new(3).generate(40, &catalog);

        let mut clean = 0;
        let mut fraudulent = 0;
        for (record, label) in dataset.records.iter().zip(&dataset.labels) {
            let count = engine.evaluate(record).unwrap().len();
            if *label == 1 {
                fraudulent += count;
            } else {
                clean += count;
            }
        }

        assert!(fraudulent > clean);
    }
}
