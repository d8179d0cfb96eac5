//! Domain types shared across the routing engine

pub mod assignment;
pub mod counsellor;
pub mod field;
pub mod lead;
pub mod rule;

pub use assignment::{AssignmentMethod, AssignmentResult};
pub use counsellor::{Counsellor, CounsellorRole, CounsellorStatus};
pub use field::{CourseField, LeadField};
pub use lead::{Lead, LeadIdentity, LeadValue};
pub use rule::{AssignmentRule, CourseConditions, L3Rule, Tier};
