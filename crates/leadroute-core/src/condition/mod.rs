//! Typed rule conditions and the weighted condition matcher

mod matcher;
mod value;

pub use matcher::{MatchOutcome, RuleConditionMatcher, SCORE_MULTIPLIER};
pub use value::{BudgetBound, FieldCondition, RuleConditions, ANY_SENTINEL};
