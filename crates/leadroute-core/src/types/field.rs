//! Field catalogues used by the matchers
//!
//! [`LeadField`] lists the eleven lead attributes a rule may constrain. The
//! declaration order is the priority order: the first field weighs the most.
//! [`CourseField`] lists the L3 course attributes in hierarchy order.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A lead attribute that assignment rules can match on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LeadField {
    #[serde(rename = "utmCampaign")]
    UtmCampaign,
    #[serde(rename = "first_source_url")]
    FirstSourceUrl,
    #[serde(rename = "source")]
    Source,
    #[serde(rename = "mode")]
    Mode,
    #[serde(rename = "preferred_budget")]
    PreferredBudget,
    #[serde(rename = "current_profession")]
    CurrentProfession,
    #[serde(rename = "preferred_level")]
    PreferredLevel,
    #[serde(rename = "preferred_degree")]
    PreferredDegree,
    #[serde(rename = "preferred_specialization")]
    PreferredSpecialization,
    #[serde(rename = "preferred_city")]
    PreferredCity,
    #[serde(rename = "preferred_state")]
    PreferredState,
}

impl LeadField {
    /// All matching fields, highest priority first
    pub const PRIORITY_ORDER: [LeadField; 11] = [
        LeadField::UtmCampaign,
        LeadField::FirstSourceUrl,
        LeadField::Source,
        LeadField::Mode,
        LeadField::PreferredBudget,
        LeadField::CurrentProfession,
        LeadField::PreferredLevel,
        LeadField::PreferredDegree,
        LeadField::PreferredSpecialization,
        LeadField::PreferredCity,
        LeadField::PreferredState,
    ];

    /// Canonical attribute name
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadField::UtmCampaign => "utmCampaign",
            LeadField::FirstSourceUrl => "first_source_url",
            LeadField::Source => "source",
            LeadField::Mode => "mode",
            LeadField::PreferredBudget => "preferred_budget",
            LeadField::CurrentProfession => "current_profession",
            LeadField::PreferredLevel => "preferred_level",
            LeadField::PreferredDegree => "preferred_degree",
            LeadField::PreferredSpecialization => "preferred_specialization",
            LeadField::PreferredCity => "preferred_city",
            LeadField::PreferredState => "preferred_state",
        }
    }

    /// Look up a field by its canonical name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::PRIORITY_ORDER
            .iter()
            .copied()
            .find(|field| field.as_str() == name)
    }

    /// Position in the priority list (0 = highest priority)
    pub fn index(&self) -> usize {
        Self::PRIORITY_ORDER
            .iter()
            .position(|field| field == self)
            .unwrap_or(Self::PRIORITY_ORDER.len())
    }

    /// Match weight: `field_count - index`, so the first field weighs 11 and the last 1
    pub fn weight(&self) -> i64 {
        (Self::PRIORITY_ORDER.len() - self.index()) as i64
    }

    /// Lead-side lists only contribute their first element for these fields
    pub fn compares_first_element(&self) -> bool {
        matches!(
            self,
            LeadField::PreferredDegree | LeadField::PreferredSpecialization
        )
    }
}

impl fmt::Display for LeadField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A course attribute used by the L3 hierarchy, in narrowing order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CourseField {
    #[serde(rename = "courseName")]
    CourseName,
    #[serde(rename = "degree")]
    Degree,
    #[serde(rename = "specialization")]
    Specialization,
    #[serde(rename = "stream")]
    Stream,
    #[serde(rename = "level")]
    Level,
}

impl CourseField {
    /// Hierarchy walked by the L3 matcher
    pub const HIERARCHY: [CourseField; 5] = [
        CourseField::CourseName,
        CourseField::Degree,
        CourseField::Specialization,
        CourseField::Stream,
        CourseField::Level,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CourseField::CourseName => "courseName",
            CourseField::Degree => "degree",
            CourseField::Specialization => "specialization",
            CourseField::Stream => "stream",
            CourseField::Level => "level",
        }
    }
}

impl fmt::Display for CourseField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_follow_priority_order() {
        assert_eq!(LeadField::UtmCampaign.weight(), 11);
        assert_eq!(LeadField::FirstSourceUrl.weight(), 10);
        assert_eq!(LeadField::PreferredState.weight(), 1);
    }

    #[test]
    fn test_from_name_round_trips_every_field() {
        for field in LeadField::PRIORITY_ORDER {
            assert_eq!(LeadField::from_name(field.as_str()), Some(field));
        }
        assert_eq!(LeadField::from_name("utm_campaign"), None);
    }

    #[test]
    fn test_serde_uses_canonical_names() {
        let json = serde_json::to_string(&LeadField::UtmCampaign).unwrap();
        assert_eq!(json, "\"utmCampaign\"");
        let field: LeadField = serde_json::from_str("\"preferred_city\"").unwrap();
        assert_eq!(field, LeadField::PreferredCity);
    }

    #[test]
    fn test_course_hierarchy_order() {
        let names: Vec<&str> = CourseField::HIERARCHY.iter().map(|f| f.as_str()).collect();
        assert_eq!(
            names,
            vec!["courseName", "degree", "specialization", "stream", "level"]
        );
    }
}
