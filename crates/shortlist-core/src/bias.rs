//! Domain-specific score adjustments.
//!
//! A [`BiasDomain`] is detected from the request; each domain owns a
//! [`BiasPolicy`]: an ordered list of source-name rules whose multiplier is
//! applied to a passage's combined score. The first rule whose pattern occurs
//! in the lower-cased source id wins; no match leaves the score unchanged.

use crate::taxonomy::DINNER_MENU_REQUEST_ID;

/// Boost for sources dedicated to dinner.
pub const DINNER_SOURCE_BOOST: f64 = 1.15;
/// Penalty for sources about other meal times.
pub const OTHER_MEAL_PENALTY: f64 = 0.85;

/// Domains with a bias policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiasDomain {
    MealPlanning,
}

impl BiasDomain {
    /// Detect the active domain from the request id and task.
    pub fn detect(request_id: &str, task: &str) -> Option<Self> {
        if request_id == DINNER_MENU_REQUEST_ID || task.to_lowercase().contains("dinner") {
            return Some(BiasDomain::MealPlanning);
        }
        None
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BiasDomain::MealPlanning => "meal_planning",
        }
    }

    pub fn policy(self) -> BiasPolicy {
        match self {
            BiasDomain::MealPlanning => BiasPolicy {
                rules: vec![
                    SourceBias {
                        patterns: &["dinner ideas"],
                        factor: DINNER_SOURCE_BOOST,
                    },
                    SourceBias {
                        patterns: &["lunch", "breakfast"],
                        factor: OTHER_MEAL_PENALTY,
                    },
                ],
            },
        }
    }
}

/// Multiply by `factor` when any pattern occurs in the source id.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceBias {
    /// Lower-case substrings.
    pub patterns: &'static [&'static str],
    pub factor: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BiasPolicy {
    pub rules: Vec<SourceBias>,
}

impl BiasPolicy {
    /// A policy with no rules; every factor is `1.0`.
    pub fn neutral() -> Self {
        Self::default()
    }

    /// The policy for the request, or [`neutral`](Self::neutral).
    pub fn for_request(request_id: &str, task: &str) -> Self {
        BiasDomain::detect(request_id, task)
            .map(BiasDomain::policy)
            .unwrap_or_default()
    }

    /// The multiplier for passages from `source_id`.
    pub fn factor(&self, source_id: &str) -> f64 {
        let source = source_id.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.patterns.iter().any(|p| source.contains(*p)))
            .map(|rule| rule.factor)
            .unwrap_or(1.0)
    }

    pub fn apply(&self, source_id: &str, score: f64) -> f64 {
        score * self.factor(source_id)
    }
}
