//! Rule catalog: identifiers, categories and the immutable rule table

mod standard;

use crate::error::{CatalogError, RuleFault};
use crate::types::record::Record;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Rule category. The identifier prefix of every rule encodes its category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Turnout,
    VotingPattern,
    Procedural,
    AgentObserver,
    Statistical,
}

impl Category {
    /// All categories in feature-vector order
    pub const ALL: [Category; 5] = [
        Category::Turnout,
        Category::VotingPattern,
        Category::Procedural,
        Category::AgentObserver,
        Category::Statistical,
    ];

    /// Identifier prefix
    pub fn prefix(self) -> char {
        match self {
            Category::Turnout => 'T',
            Category::VotingPattern => 'V',
            Category::Procedural => 'P',
            Category::AgentObserver => 'A',
            Category::Statistical => 'S',
        }
    }

    pub fn from_prefix(prefix: char) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.prefix() == prefix)
    }

    /// Position in `Category::ALL`
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::Turnout => "Turnout",
            Category::VotingPattern => "Voting Pattern",
            Category::Procedural => "Procedural",
            Category::AgentObserver => "Agent/Observer",
            Category::Statistical => "Statistical",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Rule identifier: category prefix plus two-digit ordinal, e.g. `T01`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct RuleId {
    category: Category,
    ordinal: u8,
}

impl RuleId {
    pub const fn new(category: Category, ordinal: u8) -> Self {
        Self { category, ordinal }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn ordinal(&self) -> u8 {
        self.ordinal
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:02}", self.category.prefix(), self.ordinal)
    }
}

impl FromStr for RuleId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let category = chars
            .next()
            .and_then(Category::from_prefix)
            .ok_or_else(|| format!("unknown rule category in `{}`", s))?;
        let ordinal = chars
            .as_str()
            .parse::<u8>()
            .map_err(|_| format!("invalid rule ordinal in `{}`", s))?;
        Ok(Self::new(category, ordinal))
    }
}

impl From<RuleId> for String {
    fn from(id: RuleId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for RuleId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Rule predicate. Reads only the fields it needs and reports absent data as
/// a [`RuleFault`] rather than guessing.
pub type Predicate = fn(&Record) -> Result<bool, RuleFault>;

/// A named, severity-weighted predicate over a record
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub id: RuleId,
    pub severity: u8,
    pub description: &'static str,
    predicate: Predicate,
}

impl Rule {
    pub fn new(
        category: Category,
        ordinal: u8,
        severity: u8,
        description: &'static str,
        predicate: Predicate,
    ) -> Self {
        Self {
            id: RuleId::new(category, ordinal),
            severity,
            description,
            predicate,
        }
    }

    pub fn category(&self) -> Category {
        self.id.category()
    }

    /// Run the predicate against a record
    pub fn check(&self, record: &Record) -> Result<bool, RuleFault> {
        (self.predicate)(record)
    }

    pub fn summary(&self) -> RuleSummary {
        RuleSummary {
            id: self.id,
            category: self.category(),
            severity: self.severity,
            description: self.description.to_string(),
        }
    }
}

/// Display row for the catalog listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSummary {
    pub id: RuleId,
    pub category: Category,
    pub severity: u8,
    pub description: String,
}

/// A rule that fired for a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub id: RuleId,
    pub category: Category,
    pub severity: u8,
    pub description: String,
}

impl From<&Rule> for Violation {
    fn from(rule: &Rule) -> Self {
        Self {
            id: rule.id,
            category: rule.category(),
            severity: rule.severity,
            description: rule.description.to_string(),
        }
    }
}

/// Ordered, immutable set of rules.
///
/// Construction validates integrity; a catalog that exists is always
/// well-formed.
#[derive(Debug, Clone)]
pub struct Catalog {
    rules: Vec<Rule>,
}

impl Catalog {
    /// Build a catalog, rejecting duplicate ids, out-of-range severities or
    /// ordinals and blank descriptions.
    pub fn new(rules: Vec<Rule>) -> Result<Self, CatalogError> {
        if rules.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut seen = HashSet::with_capacity(rules.len());
        for rule in &rules {
            if !seen.insert(rule.id) {
                return Err(CatalogError::DuplicateRuleId(rule.id));
            }
            if !(1..=10).contains(&rule.severity) {
                return Err(CatalogError::InvalidSeverity {
                    rule: rule.id,
                    severity: rule.severity,
                });
            }
            if !(1..=99).contains(&rule.id.ordinal()) {
                return Err(CatalogError::InvalidOrdinal { rule: rule.id });
            }
            if rule.description.trim().is_empty() {
                return Err(CatalogError::EmptyDescription(rule.id));
            }
        }

        Ok(Self { rules })
    }

    /// The built-in catalog of polling-unit anomaly rules
    pub fn standard() -> Result<Self, CatalogError> {
        Self::new(standard::rules())
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn get(&self, id: RuleId) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == id)
    }

    /// Read-only listing for display
    pub fn listing(&self) -> Vec<RuleSummary> {
        self.rules.iter().map(Rule::summary).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn never(_: &Record) -> Result<bool, RuleFault> {
        Ok(false)
    }

    #[test]
    fn test_rule_id_format_and_parse() {
        let id = RuleId::new(Category::VotingPattern, 2);
        assert_eq!(id.to_string(), "V02");
        assert_eq!("V02".parse::<RuleId>(), Ok(id));
        assert_eq!("S10".parse::<RuleId>().unwrap().ordinal(), 10);
        assert!("X01".parse::<RuleId>().is_err());
        assert!("T".parse::<RuleId>().is_err());

        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"V02\"");
    }

    #[test]
    fn test_standard_catalog_is_valid() {
        let catalog = Catalog::standard().unwrap();
        assert_eq!(catalog.len(), 44);

        for category in Category::ALL {
            assert!(catalog.iter().any(|r| r.category() == category));
        }
    }

    #[test]
    fn test_catalog_rejects_duplicates() {
        let rules = vec![
            Rule::new(Category::Turnout, 1, 5, "first", never),
            Rule::new(Category::Turnout, 1, 5, "second", never),
        ];
        assert_eq!(
            Catalog::new(rules).unwrap_err(),
            CatalogError::DuplicateRuleId(RuleId::new(Category::Turnout, 1))
        );
    }

    #[test]
    fn test_catalog_rejects_bad_severity() {
        let rules = vec![Rule::new(Category::Procedural, 3, 11, "too severe", never)];
        assert!(matches!(
            Catalog::new(rules),
            Err(CatalogError::InvalidSeverity { severity: 11, .. })
        ));

        let rules = vec![Rule::new(Category::Procedural, 3, 0, "not severe", never)];
        assert!(matches!(
            Catalog::new(rules),
            Err(CatalogError::InvalidSeverity { severity: 0, .. })
        ));
    }

    #[test]
    fn test_catalog_rejects_blank_and_empty() {
        assert_eq!(Catalog::new(Vec::new()).unwrap_err(), CatalogError::Empty);

        let rules = vec![Rule::new(Category::Statistical, 1, 4, "  ", never)];
        assert!(matches!(
            Catalog::new(rules),
            Err(CatalogError::EmptyDescription(_))
        ));

        let rules = vec![Rule::new(Category::Statistical, 0, 4, "zero ordinal", never)];
        assert!(matches!(
            Catalog::new(rules),
            Err(CatalogError::InvalidOrdinal { .. })
        ));
    }

    #[test]
    fn test_listing_preserves_order() {
        let catalog = Catalog::standard().unwrap();
        let listing = catalog.listing();

        assert_eq!(listing.len(), catalog.len());
        assert_eq!(listing[0].id.to_string(), "T01");
        assert_eq!(listing[0].severity, 10);
        assert_eq!(listing.last().unwrap().id.to_string(), "S10");
    }
}
