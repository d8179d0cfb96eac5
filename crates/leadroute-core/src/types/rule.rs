//! Assignment rule definitions
//!
//! An [`AssignmentRule`] maps a condition set to a target list for one tier.
//! An [`L3Rule`] carries its own mandatory gate (university, source) and a
//! nested course condition namespace used by the hierarchical matcher.

use crate::condition::RuleConditions;
use crate::error::{CoreError, Result};
use crate::types::{CounsellorRole, CourseField};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Routing tier a rule belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Initial-contact counsellors
    L2,
    /// Post-form-submission counsellors
    L3,
    /// Partner university reconciliation
    Recon,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::L2 => "l2",
            Tier::L3 => "l3",
            Tier::Recon => "recon",
        }
    }

    /// Counsellor role served by this tier (recon targets universities)
    pub fn counsellor_role(&self) -> Option<CounsellorRole> {
        match self {
            Tier::L2 => Some(CounsellorRole::L2),
            Tier::L3 => Some(CounsellorRole::L3),
            Tier::Recon => None,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "l2" => Ok(Tier::L2),
            "l3" => Ok(Tier::L3),
            "recon" => Ok(Tier::Recon),
            _ => Err(CoreError::UnknownLabel {
                kind: "tier",
                value: s.to_string(),
            }),
        }
    }
}

fn default_true() -> bool {
    true
}

/// Administrator-defined condition-to-target mapping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentRule {
    /// Unique identifier for this rule
    pub id: String,

    /// Optional human-readable name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Tier this rule routes for
    pub tier: Tier,

    /// Field conditions, all of which must hold
    pub conditions: RuleConditions,

    /// Counsellor targets (L2 / L3)
    #[serde(default)]
    pub assigned_counsellor_ids: Vec<String>,

    /// University targets (recon)
    #[serde(default)]
    pub assigned_university_names: Vec<String>,

    #[serde(default = "default_true")]
    pub is_active: bool,

    /// Tie-breaker folded into the match score
    #[serde(default)]
    pub priority: i64,

    /// Next slot in the target rotation; only the routing engine mutates it
    #[serde(default)]
    pub round_robin_index: usize,

    #[serde(default)]
    pub match_count: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_matched_at: Option<DateTime<Utc>>,
}

impl AssignmentRule {
    /// Create an active rule with no targets
    pub fn new(id: impl Into<String>, tier: Tier, conditions: RuleConditions) -> Self {
        Self {
            id: id.into(),
            name: None,
            tier,
            conditions,
            assigned_counsellor_ids: Vec::new(),
            assigned_university_names: Vec::new(),
            is_active: true,
            priority: 0,
            round_robin_index: 0,
            match_count: 0,
            last_matched_at: None,
        }
    }

    pub fn with_counsellors<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.assigned_counsellor_ids = ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_universities<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.assigned_university_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_round_robin_index(mut self, index: usize) -> Self {
        self.round_robin_index = index;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Target list for this rule's tier
    pub fn targets(&self) -> &[String] {
        match self.tier {
            Tier::Recon => &self.assigned_university_names,
            Tier::L2 | Tier::L3 => &self.assigned_counsellor_ids,
        }
    }

    /// Structural checks applied before a rule is stored
    pub fn validate(&self) -> Result<()> {
        if self.is_active && self.conditions.applicable_count() == 0 {
            return Err(CoreError::InvalidRule {
                rule_id: self.id.clone(),
                reason: "an active rule requires at least one condition".to_string(),
            });
        }
        if self.targets().is_empty() {
            return Err(CoreError::InvalidRule {
                rule_id: self.id.clone(),
                reason: format!("no {} targets assigned", self.tier),
            });
        }
        Ok(())
    }
}

/// Nested course condition lists of an L3 rule
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseConditions {
    #[serde(default)]
    pub stream: Vec<String>,
    #[serde(default)]
    pub degree: Vec<String>,
    #[serde(default)]
    pub specialization: Vec<String>,
    #[serde(default)]
    pub level: Vec<String>,
    #[serde(default, rename = "courseName")]
    pub course_name: Vec<String>,
}

impl CourseConditions {
    /// Declared values for one course field (blank entries ignored)
    pub fn values(&self, field: CourseField) -> Vec<&str> {
        let list = match field {
            CourseField::CourseName => &self.course_name,
            CourseField::Degree => &self.degree,
            CourseField::Specialization => &self.specialization,
            CourseField::Stream => &self.stream,
            CourseField::Level => &self.level,
        };
        list.iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Whether any course field is declared
    pub fn has_any(&self) -> bool {
        CourseField::HIERARCHY
            .iter()
            .any(|field| !self.values(*field).is_empty())
    }
}

/// Tier-3 rule: mandatory college/source gate plus optional course hierarchy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct L3Rule {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Accepted university names; empty accepts any
    #[serde(default)]
    pub university_name: Vec<String>,

    /// Accepted sources; empty accepts any
    #[serde(default)]
    pub source: Vec<String>,

    #[serde(default)]
    pub course_conditions: CourseConditions,

    #[serde(default)]
    pub assigned_counsellor_ids: Vec<String>,

    #[serde(default = "default_true")]
    pub is_active: bool,

    #[serde(default)]
    pub priority: i64,

    #[serde(default)]
    pub round_robin_index: usize,
}

impl L3Rule {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            university_name: Vec::new(),
            source: Vec::new(),
            course_conditions: CourseConditions::default(),
            assigned_counsellor_ids: Vec::new(),
            is_active: true,
            priority: 0,
            round_robin_index: 0,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.assigned_counsellor_ids.is_empty() {
            return Err(CoreError::InvalidRule {
                rule_id: self.id.clone(),
                reason: "no l3 counsellors assigned".to_string(),
            });
        }
        Ok(())
    }
}
