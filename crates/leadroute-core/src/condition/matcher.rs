//! Weighted condition matching
//!
//! A rule full-matches a lead only when every condition it declares holds.
//! Missing lead attributes fail the rule outright; there is no partial credit.
//!
//! The score is lexicographic on the highest satisfied field:
//!
//! ```text
//! score = highest_weight * 1000 + sum(weights) + priority
//! ```
//!
//! so a rule that matches a higher-priority field always outranks one that
//! only matches lower-priority fields, however many of them.

use crate::condition::{FieldCondition, RuleConditions};
use crate::types::{AssignmentRule, Lead, LeadField, LeadValue};
use serde::Serialize;

/// Multiplier applied to the highest matched field weight
pub const SCORE_MULTIPLIER: i64 = 1000;

/// Result of evaluating one rule against one lead
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchOutcome {
    pub is_full_match: bool,
    pub score: i64,
    pub matched_fields: Vec<LeadField>,
}

impl MatchOutcome {
    fn no_match() -> Self {
        Self {
            is_full_match: false,
            score: 0,
            matched_fields: Vec::new(),
        }
    }
}

pub struct RuleConditionMatcher;

impl RuleConditionMatcher {
    /// Evaluate a rule against a normalized lead
    pub fn evaluate(lead: &Lead, rule: &AssignmentRule) -> MatchOutcome {
        let outcome = Self::evaluate_conditions(lead, &rule.conditions, rule.priority);
        log::debug!(
            "rule {} against lead: full_match={}, score={}, fields={:?}",
            rule.id,
            outcome.is_full_match,
            outcome.score,
            outcome.matched_fields
        );
        outcome
    }

    /// Evaluate a condition set; `priority` is folded into the score
    pub fn evaluate_conditions(
        lead: &Lead,
        conditions: &RuleConditions,
        priority: i64,
    ) -> MatchOutcome {
        let mut matched_fields = Vec::new();

        // applicable() yields fields in priority order
        for (field, condition) in conditions.applicable() {
            let Some(value) = lead.get(field) else {
                return MatchOutcome::no_match();
            };
            if !Self::field_matches(field, condition, value) {
                return MatchOutcome::no_match();
            }
            matched_fields.push(field);
        }

        let Some(highest) = matched_fields.first() else {
            // No applicable conditions: not a wildcard
            return MatchOutcome::no_match();
        };

        let sum: i64 = matched_fields.iter().map(LeadField::weight).sum();
        MatchOutcome {
            is_full_match: true,
            score: highest.weight() * SCORE_MULTIPLIER + sum + priority,
            matched_fields,
        }
    }

    /// Field-specific comparator
    pub fn field_matches(field: LeadField, condition: &FieldCondition, value: &LeadValue) -> bool {
        match condition {
            FieldCondition::Any => true,
            FieldCondition::Budget(bounds) => value
                .first()
                .map(|amount| bounds.iter().any(|bound| bound.accepts(amount)))
                .unwrap_or(false),
            FieldCondition::OneOf(accepted) => match field {
                LeadField::FirstSourceUrl => value.values().iter().any(|url| {
                    let url = url.to_lowercase();
                    accepted
                        .iter()
                        .any(|fragment| url.contains(&fragment.to_lowercase()))
                }),
                _ if field.compares_first_element() => value
                    .first()
                    .map(|first| accepted.iter().any(|a| a == first))
                    .unwrap_or(false),
                _ => value
                    .values()
                    .iter()
                    .any(|v| accepted.iter().any(|a| a == v)),
            },
        }
    }
}
