//! Polling-unit result records

use crate::error::RuleFault;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Field names referenced by the standard rule catalog.
pub mod field {
    // Turnout and registration counts
    pub const REGISTERED_VOTERS: &str = "registered_voters";
    pub const ACCREDITED_VOTERS: &str = "accredited_voters";
    pub const VOTES_CAST: &str = "votes_cast";
    pub const VALID_VOTES: &str = "valid_votes";
    pub const TURNOUT_PERCENTAGE: &str = "turnout_percentage";
    pub const ESTIMATED_POPULATION: &str = "estimated_population";

    // Per-party vote counts
    pub const PDP_VOTES: &str = "pdp_votes";
    pub const APC_VOTES: &str = "apc_votes";
    pub const LP_VOTES: &str = "lp_votes";
    pub const OTHER_VOTES: &str = "other_votes";
    pub const WINNING_MARGIN_ABS: &str = "winning_margin_abs";
    pub const UNIT_WIN_MARGIN: &str = "unit_win_margin";
    pub const FAILS_BENFORDS_LAW: &str = "fails_benfords_law";

    // Procedural flags and durations
    pub const SUBMISSION_DELAY_HOURS: &str = "submission_delay_hours";
    pub const FORM_EC8A_MISSING_OR_ALTERED: &str = "form_ec8a_missing_or_altered";
    pub const BVAS_MALFUNCTION: &str = "bvas_malfunction";
    pub const REPORTS_OF_VIOLENCE: &str = "reports_of_violence";
    pub const OPENING_DELAY_HOURS: &str = "opening_delay_hours";
    pub const PARTY_AGENTS_ABSENT: &str = "party_agents_absent";
    pub const BALLOT_BOX_SNATCHING: &str = "ballot_box_snatching";
    pub const SECURITY_PERSONNEL_PRESENT: &str = "security_personnel_present";
    pub const RESULTS_PUBLICLY_POSTED: &str = "results_publicly_posted";
    pub const MANUAL_ACCREDITATION_ALTERATION: &str = "manual_accreditation_alteration";

    // Agent and observer reports
    pub const AGENTS_REFUSED_SIGNING: &str = "agents_refused_signing";
    pub const OBSERVER_FLAGS_IRREGULARITY: &str = "observer_flags_irregularity";
    pub const OBSERVER_COUNTS_MISMATCH: &str = "observer_counts_mismatch";
    pub const OBSERVERS_PRESENT: &str = "observers_present";
    pub const REPORTS_OF_VOTE_BUYING: &str = "reports_of_vote_buying";

    // Comparison baselines
    pub const HISTORICAL_TURNOUT: &str = "historical_turnout";
    pub const NEIGHBOR_AVG_WIN_MARGIN: &str = "neighbor_avg_win_margin";
    pub const HISTORICAL_WIN_MARGIN_ABS: &str = "historical_win_margin_abs";
    pub const NEIGHBOR_REGISTERED_VOTERS: &str = "neighbor_registered_voters";
}

/// A single field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Flag(bool),
    Number(f64),
    Text(String),
}

impl FieldValue {
    /// Parse a tabular cell. Empty cells and non-finite numbers (`NaN`,
    /// `inf`) are absent values.
    pub fn parse_cell(cell: &str) -> Option<Self> {
        let cell = cell.trim();
        if cell.is_empty() {
            return None;
        }
        if cell.eq_ignore_ascii_case("true") {
            return Some(FieldValue::Flag(true));
        }
        if cell.eq_ignore_ascii_case("false") {
            return Some(FieldValue::Flag(false));
        }
        match cell.parse::<f64>() {
            Ok(n) if n.is_finite() => Some(FieldValue::Number(n)),
            Ok(_) => None,
            Err(_) => Some(FieldValue::Text(cell.to_string())),
        }
    }

    /// Render as a tabular cell
    pub fn to_cell(&self) -> String {
        match self {
            FieldValue::Flag(b) => b.to_string(),
            FieldValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{:.0}", n),
            FieldValue::Number(n) => n.to_string(),
            FieldValue::Text(s) => s.clone(),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            FieldValue::Flag(_) => "flag",
            FieldValue::Number(_) => "number",
            FieldValue::Text(_) => "text",
        }
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Flag(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

macro_rules! impl_from_integer {
    ($($t:ty),*) => {
        $(impl From<$t> for FieldValue {
            fn from(value: $t) -> Self {
                FieldValue::Number(value as f64)
            }
        })*
    };
}

impl_from_integer!(i32, i64, u32, u64, usize);

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

/// One polling unit's observation.
///
/// Any subset of fields may be present. Rules that read an absent field are
/// simply not applicable to the record. JSON `null` values are treated as
/// absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, Option<FieldValue>>",
    into = "BTreeMap<String, FieldValue>"
)]
pub struct Record {
    fields: BTreeMap<String, FieldValue>,
}

impl From<Record> for BTreeMap<String, FieldValue> {
    fn from(record: Record) -> Self {
        record.fields
    }
}

impl From<BTreeMap<String, Option<FieldValue>>> for Record {
    fn from(raw: BTreeMap<String, Option<FieldValue>>) -> Self {
        Self {
            fields: raw
                .into_iter()
                .filter_map(|(name, value)| value.map(|v| (name, v)))
                .collect(),
        }
    }
}

impl Record {
    /// Create an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        self.fields.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate fields in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Read a numeric field. Flags read as 0 or 1.
    pub fn number(&self, name: &str) -> Result<f64, RuleFault> {
        match self.fields.get(name) {
            Some(FieldValue::Number(n)) if !n.is_finite() => {
                Err(RuleFault::NonFinite(name.to_string()))
            }
            Some(FieldValue::Number(n)) => Ok(*n),
            Some(FieldValue::Flag(b)) => Ok(if *b { 1.0 } else { 0.0 }),
            Some(other) => Err(RuleFault::TypeMismatch {
                field: name.to_string(),
                expected: "number",
                found: other.kind(),
            }),
            None => Err(RuleFault::MissingField(name.to_string())),
        }
    }

    /// Read a boolean field. Numbers read as true when non-zero.
    pub fn flag(&self, name: &str) -> Result<bool, RuleFault> {
        match self.fields.get(name) {
            Some(FieldValue::Flag(b)) => Ok(*b),
            Some(FieldValue::Number(n)) if !n.is_finite() => {
                Err(RuleFault::NonFinite(name.to_string()))
            }
            Some(FieldValue::Number(n)) => Ok(*n != 0.0),
            Some(other) => Err(RuleFault::TypeMismatch {
                field: name.to_string(),
                expected: "flag",
                found: other.kind(),
            }),
            None => Err(RuleFault::MissingField(name.to_string())),
        }
    }

    /// Fill derived fields the data-entry form computes from raw counts.
    ///
    /// Existing values are never overwritten. `turnout_percentage` is the
    /// cast/registered ratio (0 when nothing is registered) and
    /// `winning_margin_abs` is the gap between the top two vote counts.
    pub fn with_derived_fields(mut self) -> Self {
        use field::*;

        if !self.contains(TURNOUT_PERCENTAGE) {
            if let (Ok(cast), Ok(registered)) =
                (self.number(VOTES_CAST), self.number(REGISTERED_VOTERS))
            {
                let turnout = if registered > 0.0 { cast / registered } else { 0.0 };
                self.insert(TURNOUT_PERCENTAGE, turnout);
            }
        }

        if !self.contains(WINNING_MARGIN_ABS) {
            let votes: Result<Vec<f64>, _> = [PDP_VOTES, APC_VOTES, LP_VOTES, OTHER_VOTES]
                .iter()
                .map(|name| self.number(name))
                .collect();
            if let Ok(mut votes) = votes {
                votes.sort_by(|a, b| b.total_cmp(a));
                self.insert(WINNING_MARGIN_ABS, votes[0] - votes[1]);
            }
        }

        self
    }
}

#[cfg(test)]
mod tests {
    use super::field::*;
    use super::*;

    #[test]
    fn test_record_deserialization() {
        let json = r#"{"votes_cast": 600, "registered_voters": 500, "bvas_malfunction": true, "note": null}"#;
        let record: Record = serde_json::from_str(json).unwrap();

        assert_eq!(record.len(), 3);
        assert_eq!(record.number(VOTES_CAST), Ok(600.0));
        assert_eq!(record.flag(BVAS_MALFUNCTION), Ok(true));
        assert!(!record.contains("note"));
    }

    #[test]
    fn test_accessor_faults() {
        let record = Record::new().with(VOTES_CAST, "many");

        assert_eq!(
            record.number(REGISTERED_VOTERS),
            Err(RuleFault::MissingField(REGISTERED_VOTERS.to_string()))
        );
        assert!(matches!(
            record.number(VOTES_CAST),
            Err(RuleFault::TypeMismatch { expected: "number", found: "text", .. })
        ));
    }

    #[test]
    fn test_flag_number_coercion() {
        let record = Record::new()
            .with(SECURITY_PERSONNEL_PRESENT, 2)
            .with(OBSERVERS_PRESENT, true);

        assert_eq!(record.flag(SECURITY_PERSONNEL_PRESENT), Ok(true));
        assert_eq!(record.number(OBSERVERS_PRESENT), Ok(1.0));
    }

    #[test]
    fn test_non_finite_numbers_read_as_absent() {
        let record = Record::new()
            .with(VALID_VOTES, f64::NAN)
            .with(OBSERVERS_PRESENT, f64::INFINITY);

        let fault = record.number(VALID_VOTES).unwrap_err();
        assert_eq!(fault, RuleFault::NonFinite(VALID_VOTES.to_string()));
        assert!(fault.is_data_absence());
        assert!(record.flag(OBSERVERS_PRESENT).unwrap_err().is_data_absence());
    }

    #[test]
    fn test_parse_cell() {
        assert_eq!(FieldValue::parse_cell(""), None);
        assert_eq!(FieldValue::parse_cell("True"), Some(FieldValue::Flag(true)));
        assert_eq!(FieldValue::parse_cell("false"), Some(FieldValue::Flag(false)));
        assert_eq!(FieldValue::parse_cell(" 42 "), Some(FieldValue::Number(42.0)));
        assert_eq!(
            FieldValue::parse_cell("N/A"),
            Some(FieldValue::Text("N/A".to_string()))
        );
        assert_eq!(FieldValue::parse_cell("NaN"), None);
        assert_eq!(FieldValue::parse_cell("inf"), None);
        assert_eq!(FieldValue::parse_cell("-Infinity"), None);
        assert_eq!(FieldValue::Number(42.0).to_cell(), "42");
        assert_eq!(FieldValue::Number(0.5).to_cell(), "0.5");
    }

    #[test]
    fn test_derived_fields() {
        let record = Record::new()
            .with(REGISTERED_VOTERS, 550)
            .with(VOTES_CAST, 305)
            .with(PDP_VOTES, 150)
            .with(APC_VOTES, 100)
            .with(LP_VOTES, 45)
            .with(OTHER_VOTES, 5)
            .with_derived_fields();

        let turnout = record.number(TURNOUT_PERCENTAGE).unwrap();
        assert!((turnout - 305.0 / 550.0).abs() < 1e-12);
        assert_eq!(record.number(WINNING_MARGIN_ABS), Ok(50.0));
    }

    #[test]
    fn test_derived_fields_keep_existing_values() {
        let record = Record::new()
            .with(REGISTERED_VOTERS, 0)
            .with(VOTES_CAST, 10)
            .with(WINNING_MARGIN_ABS, 7)
            .with_derived_fields();

        assert_eq!(record.number(TURNOUT_PERCENTAGE), Ok(0.0));
        assert_eq!(record.number(WINNING_MARGIN_ABS), Ok(7.0));
    }
}
