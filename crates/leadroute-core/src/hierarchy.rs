//! L3 hierarchical rule matching
//!
//! Two phases:
//!
//! 1. **Mandatory gate**: keep active rules whose university list contains the
//!    college name (case-insensitive) and whose source list contains the
//!    source. An empty list on the rule accepts anything.
//! 2. **Hierarchical narrowing**: walk `courseName → degree → specialization →
//!    stream → level`, keeping only the rules that declare and match each
//!    field, and stop at the first level that leaves exactly one rule.
//!
//! When no surviving rule declares any course condition the walk is skipped
//! and the highest-priority rule wins (`college-name-only`). When the walk
//! ends with several rules left, priority decides (`priority-based`).

use crate::types::{CourseField, L3Rule};
use serde::{Deserialize, Serialize};

/// Inputs of an L3 routing request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct L3Query {
    #[serde(rename = "collegeName", alias = "college_name")]
    pub college_name: String,
    #[serde(default)]
    pub source: String,
    #[serde(default, rename = "courseName", alias = "course_name")]
    pub course_name: Option<String>,
    #[serde(default)]
    pub degree: Option<String>,
    #[serde(default)]
    pub specialization: Option<String>,
    #[serde(default)]
    pub stream: Option<String>,
    #[serde(default)]
    pub level: Option<String>,
}

impl L3Query {
    pub fn new(college_name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            college_name: college_name.into(),
            source: source.into(),
            ..Default::default()
        }
    }

    pub fn with_course(mut self, field: CourseField, value: impl Into<String>) -> Self {
        let value = Some(value.into());
        match field {
            CourseField::CourseName => self.course_name = value,
            CourseField::Degree => self.degree = value,
            CourseField::Specialization => self.specialization = value,
            CourseField::Stream => self.stream = value,
            CourseField::Level => self.level = value,
        }
        self
    }

    /// Non-blank value supplied for a course field
    pub fn course_value(&self, field: CourseField) -> Option<&str> {
        let value = match field {
            CourseField::CourseName => &self.course_name,
            CourseField::Degree => &self.degree,
            CourseField::Specialization => &self.specialization,
            CourseField::Stream => &self.stream,
            CourseField::Level => &self.level,
        };
        value.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }
}

/// How the winning L3 rule was singled out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum L3Resolution {
    /// Decided by the mandatory gate and priority alone
    CollegeNameOnly,
    /// Narrowed to one rule at this course level
    Field(CourseField),
    /// Several rules survived every level; priority decided
    PriorityBased,
}

impl L3Resolution {
    /// Label reported as `matched_at_level`
    pub fn label(&self) -> &'static str {
        match self {
            L3Resolution::CollegeNameOnly => "college-name-only",
            L3Resolution::Field(field) => field.as_str(),
            L3Resolution::PriorityBased => "priority-based",
        }
    }
}

/// Outcome of [`HierarchicalMatcher::select`]
#[derive(Debug, Clone)]
pub enum L3Selection<'a> {
    /// No active rule passed the university/source gate
    NoMandatoryMatch,
    Matched {
        rule: &'a L3Rule,
        resolution: L3Resolution,
        /// Course levels actually compared, in order
        evaluated_levels: Vec<CourseField>,
    },
}

pub struct HierarchicalMatcher;

impl HierarchicalMatcher {
    pub fn select<'a>(query: &L3Query, rules: &'a [L3Rule]) -> L3Selection<'a> {
        let mut candidates: Vec<&'a L3Rule> = rules
            .iter()
            .filter(|rule| rule.is_active && Self::passes_gate(query, rule))
            .collect();

        log::debug!(
            "L3 gate: {} of {} rules match college '{}' / source '{}'",
            candidates.len(),
            rules.len(),
            query.college_name,
            query.source
        );

        let Some(first) = candidates.first().copied() else {
            return L3Selection::NoMandatoryMatch;
        };

        if candidates.len() == 1 {
            return L3Selection::Matched {
                rule: first,
                resolution: L3Resolution::CollegeNameOnly,
                evaluated_levels: Vec::new(),
            };
        }

        if !candidates.iter().any(|rule| rule.course_conditions.has_any()) {
            return L3Selection::Matched {
                rule: Self::highest_priority(&candidates),
                resolution: L3Resolution::CollegeNameOnly,
                evaluated_levels: Vec::new(),
            };
        }

        let mut evaluated_levels = Vec::new();
        for field in CourseField::HIERARCHY {
            let Some(value) = query.course_value(field) else {
                continue;
            };
            evaluated_levels.push(field);

            let narrowed: Vec<&'a L3Rule> = candidates
                .iter()
                .copied()
                .filter(|rule| Self::course_matches(rule, field, value))
                .collect();
            if !narrowed.is_empty() {
                candidates = narrowed;
            }

            if candidates.len() == 1 {
                return L3Selection::Matched {
                    rule: candidates[0],
                    resolution: L3Resolution::Field(field),
                    evaluated_levels,
                };
            }
        }

        L3Selection::Matched {
            rule: Self::highest_priority(&candidates),
            resolution: L3Resolution::PriorityBased,
            evaluated_levels,
        }
    }

    /// University (case-insensitive) and source (exact) gate
    pub fn passes_gate(query: &L3Query, rule: &L3Rule) -> bool {
        let college = query.college_name.trim();
        let universities: Vec<&str> = non_blank(&rule.university_name);
        let university_ok = universities.is_empty()
            || universities
                .iter()
                .any(|name| name.to_lowercase() == college.to_lowercase());

        let sources: Vec<&str> = non_blank(&rule.source);
        let source_ok = sources.is_empty() || sources.contains(&query.source.trim());

        university_ok && source_ok
    }

    /// Course name matches by substring either way; other levels by equality, ignoring case
    fn course_matches(rule: &L3Rule, field: CourseField, value: &str) -> bool {
        let value = value.to_lowercase();
        rule.course_conditions
            .values(field)
            .iter()
            .map(|declared| declared.to_lowercase())
            .any(|declared| match field {
                CourseField::CourseName => value.contains(&declared) || declared.contains(&value),
                _ => declared == value,
            })
    }

    /// First rule with the highest priority; `candidates` is never empty here
    fn highest_priority<'a>(candidates: &[&'a L3Rule]) -> &'a L3Rule {
        candidates[1..].iter().copied().fold(candidates[0], |best, rule| {
            if rule.priority > best.priority {
                rule
            } else {
                best
            }
        })
    }
}

fn non_blank(values: &[String]) -> Vec<&str> {
    values
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CourseConditions;

    fn rule(id: &str, priority: i64, course: CourseConditions) -> L3Rule {
        L3Rule {
            university_name: vec!["Amity University".to_string()],
            source: vec!["Google".to_string()],
            course_conditions: course,
            assigned_counsellor_ids: vec![format!("{}-agent", id)],
            priority,
            ..L3Rule::new(id)
        }
    }

    fn course(degree: &[&str], specialization: &[&str]) -> CourseConditions {
        CourseConditions {
            degree: degree.iter().map(|s| s.to_string()).collect(),
            specialization: specialization.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    fn matched<'a>(selection: L3Selection<'a>) -> (&'a L3Rule, L3Resolution, Vec<CourseField>) {
        match selection {
            L3Selection::Matched {
                rule,
                resolution,
                evaluated_levels,
            } => (rule, resolution, evaluated_levels),
            L3Selection::NoMandatoryMatch => panic!("expected a match"),
        }
    }

    #[test]
    fn test_gate_rejects_other_college_or_source() {
        let rules = vec![rule("a", 0, CourseConditions::default())];

        let other_college = L3Query::new("Manipal", "Google");
        assert!(matches!(
            HierarchicalMatcher::select(&other_college, &rules),
            L3Selection::NoMandatoryMatch
        ));

        let other_source = L3Query::new("Amity University", "Facebook");
        assert!(matches!(
            HierarchicalMatcher::select(&other_source, &rules),
            L3Selection::NoMandatoryMatch
        ));
    }

    #[test]
    fn test_gate_is_case_insensitive_for_college_and_open_when_empty() {
        let mut open = L3Rule::new("open");
        open.assigned_counsellor_ids = vec!["x".to_string()];
        let query = L3Query::new("AMITY university", "Anything");
        assert!(HierarchicalMatcher::passes_gate(&query, &open));

        let strict = rule("strict", 0, CourseConditions::default());
        assert!(HierarchicalMatcher::passes_gate(
            &L3Query::new("amity UNIVERSITY", "Google"),
            &strict
        ));
        assert!(!HierarchicalMatcher::passes_gate(
            &L3Query::new("Amity University", "google"),
            &strict
        ));
    }

    #[test]
    fn test_college_name_only_when_no_course_conditions() {
        let rules = vec![
            rule("low", 1, CourseConditions::default()),
            rule("high", 5, CourseConditions::default()),
            rule("also_high", 5, CourseConditions::default()),
        ];
        let query = L3Query::new("Amity University", "Google").with_course(CourseField::Degree, "MBA");

        let (winner, resolution, levels) = matched(HierarchicalMatcher::select(&query, &rules));
        assert_eq!(winner.id, "high");
        assert_eq!(resolution, L3Resolution::CollegeNameOnly);
        assert!(levels.is_empty());
    }

    #[test]
    fn test_narrowing_short_circuits_at_degree() {
        let rules = vec![
            rule("mba", 0, course(&["MBA"], &["Finance"])),
            rule("bba", 0, course(&["BBA"], &["Finance"])),
            rule("mca", 0, course(&["MCA"], &["Finance"])),
        ];
        let query = L3Query::new("Amity University", "Google")
            .with_course(CourseField::Degree, "mba")
            .with_course(CourseField::Specialization, "Finance")
            .with_course(CourseField::Stream, "Management")
            .with_course(CourseField::Level, "PG");

        let (winner, resolution, levels) = matched(HierarchicalMatcher::select(&query, &rules));
        assert_eq!(winner.id, "mba");
        assert_eq!(resolution, L3Resolution::Field(CourseField::Degree));
        assert_eq!(resolution.label(), "degree");
        assert_eq!(levels, vec![CourseField::Degree]);
    }

    #[test]
    fn test_course_name_matches_by_substring() {
        let rules = vec![
            rule(
                "online",
                0,
                CourseConditions {
                    course_name: vec!["Online MBA".to_string()],
                    ..Default::default()
                },
            ),
            rule("other", 0, course(&["BBA"], &[])),
        ];
        let query = L3Query::new("Amity University", "Google")
            .with_course(CourseField::CourseName, "Online MBA - Finance");

        let (winner, resolution, _) = matched(HierarchicalMatcher::select(&query, &rules));
        assert_eq!(winner.id, "online");
        assert_eq!(resolution, L3Resolution::Field(CourseField::CourseName));
    }

    #[test]
    fn test_non_narrowing_level_keeps_candidates() {
        let rules = vec![
            rule("a", 0, course(&["MBA"], &["Finance"])),
            rule("b", 0, course(&["MBA"], &["Marketing"])),
        ];
        let query = L3Query::new("Amity University", "Google")
            .with_course(CourseField::Degree, "PhD")
            .with_course(CourseField::Specialization, "Marketing");

        let (winner, resolution, levels) = matched(HierarchicalMatcher::select(&query, &rules));
        assert_eq!(winner.id, "b");
        assert_eq!(resolution, L3Resolution::Field(CourseField::Specialization));
        assert_eq!(levels, vec![CourseField::Degree, CourseField::Specialization]);
    }

    #[test]
    fn test_priority_breaks_tie_after_all_levels() {
        let rules = vec![
            rule("a", 1, course(&["MBA"], &[])),
            rule("b", 7, course(&["MBA"], &[])),
        ];
        let query = L3Query::new("Amity University", "Google").with_course(CourseField::Degree, "MBA");

        let (winner, resolution, _) = matched(HierarchicalMatcher::select(&query, &rules));
        assert_eq!(winner.id, "b");
        assert_eq!(resolution, L3Resolution::PriorityBased);
        assert_eq!(resolution.label(), "priority-based");
    }

    #[test]
    fn test_single_gate_survivor_skips_narrowing() {
        let rules = vec![rule("only", 0, course(&["MBA"], &[]))];
        let query = L3Query::new("Amity University", "Google").with_course(CourseField::Degree, "BBA");

        let (winner, resolution, levels) = matched(HierarchicalMatcher::select(&query, &rules));
        assert_eq!(winner.id, "only");
        assert_eq!(resolution, L3Resolution::CollegeNameOnly);
        assert!(levels.is_empty());
    }

    #[test]
    fn test_inactive_rules_never_pass_gate() {
        let mut inactive = rule("inactive", 0, CourseConditions::default());
        inactive.is_active = false;
        let query = L3Query::new("Amity University", "Google");
        assert!(matches!(
            HierarchicalMatcher::select(&query, &[inactive]),
            L3Selection::NoMandatoryMatch
        ));
    }
}
