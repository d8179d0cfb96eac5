//! Routing engine output

use crate::types::LeadField;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a target was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssignmentMethod {
    #[serde(rename = "rule-based")]
    RuleBased,
    #[serde(rename = "default")]
    Default,
    #[serde(rename = "round-robin")]
    RoundRobin,
    #[serde(rename = "direct")]
    Direct,
    #[serde(rename = "dummy_fallback")]
    DummyFallback,
}

impl AssignmentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentMethod::RuleBased => "rule-based",
            AssignmentMethod::Default => "default",
            AssignmentMethod::RoundRobin => "round-robin",
            AssignmentMethod::Direct => "direct",
            AssignmentMethod::DummyFallback => "dummy_fallback",
        }
    }

    /// True for results produced by a fallback rather than a rule
    pub fn is_fallback(&self) -> bool {
        matches!(self, AssignmentMethod::Default | AssignmentMethod::DummyFallback)
    }
}

impl fmt::Display for AssignmentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Chosen target plus the audit trail of how it was chosen
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentResult {
    /// Counsellor id, or university name for recon routing
    pub target_id: String,

    pub method: AssignmentMethod,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<i64>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matched_fields: Vec<LeadField>,

    /// L3 only: hierarchy level at which the rule was resolved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_at_level: Option<String>,

    /// Human-readable explanation, always set for fallbacks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl AssignmentResult {
    /// Result attributed to a matching rule
    pub fn from_rule(
        target_id: impl Into<String>,
        method: AssignmentMethod,
        rule_id: impl Into<String>,
    ) -> Self {
        Self {
            target_id: target_id.into(),
            method,
            rule_id: Some(rule_id.into()),
            score: None,
            matched_fields: Vec::new(),
            matched_at_level: None,
            reason: None,
        }
    }

    /// Result produced by a fallback
    pub fn fallback(
        target_id: impl Into<String>,
        method: AssignmentMethod,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            target_id: target_id.into(),
            method,
            rule_id: None,
            score: None,
            matched_fields: Vec::new(),
            matched_at_level: None,
            reason: Some(reason.into()),
        }
    }

    pub fn with_score(mut self, score: i64, matched_fields: Vec<LeadField>) -> Self {
        self.score = Some(score);
        self.matched_fields = matched_fields;
        self
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.matched_at_level = Some(level.into());
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}
