//! Lead Routing Core - pure decision logic for the lead routing engine
//!
//! This crate provides the synchronous, I/O-free pieces of routing:
//! - Lead field catalogue and typed rule conditions
//! - Lead normalization (aliases, UTM extraction)
//! - Weighted condition matching and rule ranking
//! - Round-robin rotation step
//! - L3 hierarchical rule narrowing
//! - Error types

pub mod condition;
pub mod error;
pub mod hierarchy;
pub mod normalizer;
pub mod rotation;
pub mod selector;
pub mod types;

// Re-export commonly used types
pub use condition::{BudgetBound, FieldCondition, MatchOutcome, RuleConditionMatcher, RuleConditions};
pub use error::{CoreError, Result};
pub use hierarchy::{HierarchicalMatcher, L3Query, L3Resolution, L3Selection};
pub use normalizer::ConditionNormalizer;
pub use selector::{RankedRule, RuleSelector};
pub use types::{
    AssignmentMethod, AssignmentResult, AssignmentRule, Counsellor, CounsellorRole,
    CounsellorStatus, CourseConditions, CourseField, Lead, LeadField, LeadIdentity, LeadValue,
    L3Rule, Tier,
};
