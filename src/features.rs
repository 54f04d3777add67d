//! Feature aggregation for risk-model training and inference.
//!
//! [`aggregate`] is the only place a violation list becomes model input.
//! Both the training pipeline and the scoring path call it, so the feature
//! layout the model was fitted on is the layout it is scored with.

use crate::rules::{Category, Violation};
use serde::{Deserialize, Serialize};

/// Fixed-width numeric summary of a violation list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeatureVector {
    pub num_violations: u32,
    pub max_severity: u32,
    pub total_severity: u32,
    pub num_turnout_violations: u32,
    pub num_voting_violations: u32,
    pub num_procedural_violations: u32,
    pub num_agent_violations: u32,
    pub num_statistical_violations: u32,
}

impl FeatureVector {
    /// Number of features produced.
    pub const WIDTH: usize = 8;

    /// Feature names, in model input order.
    pub const NAMES: [&'static str; Self::WIDTH] = [
        "num_violations",
        "max_severity",
        "total_severity",
        "num_turnout_violations",
        "num_voting_violations",
        "num_procedural_violations",
        "num_agent_violations",
        "num_statistical_violations",
    ];

    /// Count for one category
    pub fn category_count(&self, category: Category) -> u32 {
        match category {
            Category::Turnout => self.num_turnout_violations,
            Category::VotingPattern => self.num_voting_violations,
            Category::Procedural => self.num_procedural_violations,
            Category::AgentObserver => self.num_agent_violations,
            Category::Statistical => self.num_statistical_violations,
        }
    }

    /// Model input, in the order of [`FeatureVector::NAMES`].
    pub fn to_array(&self) -> [f64; Self::WIDTH] {
        [
            self.num_violations as f64,
            self.max_severity as f64,
            self.total_severity as f64,
            self.num_turnout_violations as f64,
            self.num_voting_violations as f64,
            self.num_procedural_violations as f64,
            self.num_agent_violations as f64,
            self.num_statistical_violations as f64,
        ]
    }

    fn category_slot(&mut self, category: Category) -> &mut u32 {
        match category {
            Category::Turnout => &mut self.num_turnout_violations,
            Category::VotingPattern => &mut self.num_voting_violations,
            Category::Procedural => &mut self.num_procedural_violations,
            Category::AgentObserver => &mut self.num_agent_violations,
            Category::Statistical => &mut self.num_statistical_violations,
        }
    }
}

/// Reduce a violation list to its feature vector.
///
/// An empty list yields all zeros. Categories are taken from each
/// violation's identifier prefix.
pub fn aggregate(violations: &[Violation]) -> FeatureVector {
    let mut features = FeatureVector::default();

    for violation in violations {
        let severity = u32::from(violation.severity);
        features.num_violations += 1;
        features.max_severity = features.max_severity.max(severity);
        features.total_severity += severity;
        *features.category_slot(violation.id.category()) += 1;
    }

    features
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleId;

    fn violation(category: Category, ordinal: u8, severity: u8) -> Violation {
        Violation {
            id: RuleId::new(category, ordinal),
            category,
            severity,
            description: String::new(),
        }
    }

    #[test]
    fn test_empty_violations() {
        let features = aggregate(&[]);
        assert_eq!(features, FeatureVector::default());
        assert_eq!(features.to_array(), [0.0; FeatureVector::WIDTH]);
    }

    #[test]
    fn test_aggregation() {
        let violations = vec![
            violation(Category::Turnout, 1, 10),
            violation(Category::Turnout, 3, 8),
            violation(Category::VotingPattern, 2, 7),
            violation(Category::Procedural, 4, 8),
            violation(Category::Statistical, 9, 7),
        ];

        let features = aggregate(&violations);

        assert_eq!(features.num_violations, 5);
        assert_eq!(features.max_severity, 10);
        assert_eq!(features.total_severity, 40);
        assert_eq!(features.num_turnout_violations, 2);
        assert_eq!(features.num_voting_violations, 1);
        assert_eq!(features.num_procedural_violations, 1);
        assert_eq!(features.num_agent_violations, 0);
        assert_eq!(features.num_statistical_violations, 1);
    }

    #[test]
    fn test_feature_layout() {
        assert_eq!(FeatureVector::NAMES.len(), FeatureVector::WIDTH);

        let features = aggregate(&[violation(Category::AgentObserver, 2, 8)]);
        let array = features.to_array();
        assert_eq!(array[0], 1.0);
        assert_eq!(array[1], 8.0);
        assert_eq!(array[2], 8.0);
        assert_eq!(array[6], 1.0);

        for category in Category::ALL {
            assert_eq!(
                array[3 + category.index()],
                features.category_count(category) as f64
            );
        }
    }
}
