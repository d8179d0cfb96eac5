//! Rule ranking

use crate::condition::{MatchOutcome, RuleConditionMatcher};
use crate::types::{AssignmentRule, Lead};

/// A fully matching rule with its outcome
#[derive(Debug, Clone)]
pub struct RankedRule<'a> {
    pub rule: &'a AssignmentRule,
    pub outcome: MatchOutcome,
}

pub struct RuleSelector;

impl RuleSelector {
    /// Full matches among the active rules, best score first
    ///
    /// The sort is stable, so rules with equal scores keep their input order.
    pub fn rank<'a>(lead: &Lead, rules: &'a [AssignmentRule]) -> Vec<RankedRule<'a>> {
        let mut ranked: Vec<RankedRule<'a>> = rules
            .iter()
            .filter(|rule| rule.is_active)
            .filter_map(|rule| {
                let outcome = RuleConditionMatcher::evaluate(lead, rule);
                outcome.is_full_match.then_some(RankedRule { rule, outcome })
            })
            .collect();

        ranked.sort_by(|a, b| b.outcome.score.cmp(&a.outcome.score));

        log::debug!(
            "{} of {} rules fully matched",
            ranked.len(),
            rules.len()
        );
        ranked
    }

    /// Highest-ranked full match, if any
    pub fn select<'a>(lead: &Lead, rules: &'a [AssignmentRule]) -> Option<RankedRule<'a>> {
        Self::rank(lead, rules).into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::RuleConditions;
    use crate::types::{LeadField, LeadIdentity, Tier};

    fn lead() -> Lead {
        Lead::new(LeadIdentity::new("Asha", "asha@example.com", "9999999999"))
            .with(LeadField::Source, "Google")
            .with(LeadField::Mode, "Online")
            .with(LeadField::PreferredCity, "Delhi")
    }

    fn rule(id: &str, conditions: RuleConditions) -> AssignmentRule {
        AssignmentRule::new(id, Tier::L2, conditions).with_counsellors(["c1"])
    }

    #[test]
    fn test_rank_orders_by_score_descending() {
        let rules = vec![
            rule("city", RuleConditions::new().with_values(LeadField::PreferredCity, ["Delhi"])),
            rule("source", RuleConditions::new().with_values(LeadField::Source, ["Google"])),
            rule("mode", RuleConditions::new().with_values(LeadField::Mode, ["Online"])),
            rule("miss", RuleConditions::new().with_values(LeadField::Mode, ["Offline"])),
        ];

        let ids: Vec<&str> = RuleSelector::rank(&lead(), &rules)
            .iter()
            .map(|r| r.rule.id.as_str())
            .collect();
        assert_eq!(ids, vec!["source", "mode", "city"]);
    }

    #[test]
    fn test_inactive_rules_are_skipped() {
        let rules = vec![
            rule("inactive", RuleConditions::new().with_values(LeadField::Source, ["Google"]))
                .inactive(),
        ];
        assert!(RuleSelector::select(&lead(), &rules).is_none());
    }

    #[test]
    fn test_equal_scores_keep_input_order() {
        let rules = vec![
            rule("first", RuleConditions::new().with_values(LeadField::Mode, ["Online"])),
            rule("second", RuleConditions::new().with_values(LeadField::Mode, ["Online"])),
        ];
        let ranked = RuleSelector::rank(&lead(), &rules);
        assert_eq!(ranked[0].rule.id, "first");
        assert_eq!(ranked[1].rule.id, "second");
    }

    #[test]
    fn test_priority_breaks_ties() {
        let rules = vec![
            rule("low", RuleConditions::new().with_values(LeadField::Mode, ["Online"])),
            rule("high", RuleConditions::new().with_values(LeadField::Mode, ["Online"]))
                .with_priority(1),
        ];
        assert_eq!(RuleSelector::select(&lead(), &rules).unwrap().rule.id, "high");
    }
}
