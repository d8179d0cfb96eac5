//! Seed content for the in-memory repository
//!
//! ```yaml
//! counsellors:
//!   - { id: c1, name: Asha, email: asha@example.com, role: l2, status: active }
//! rules:
//!   - id: delhi_online
//!     tier: l2
//!     conditions: { preferred_city: [Delhi], mode: [Online] }
//!     assigned_counsellor_ids: [c1]
//! l3_rules: []
//! leads: []
//! activities: []
//! ```

use crate::error::RepositoryResult;
use crate::models::{LeadActivity, LeadRecord};
use leadroute_core::{AssignmentRule, Counsellor, L3Rule};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepositoryContent {
    #[serde(default)]
    pub counsellors: Vec<Counsellor>,
    #[serde(default)]
    pub rules: Vec<AssignmentRule>,
    #[serde(default)]
    pub l3_rules: Vec<L3Rule>,
    #[serde(default)]
    pub leads: Vec<LeadRecord>,
    #[serde(default)]
    pub activities: Vec<LeadActivity>,
}

impl RepositoryContent {
    /// Parse and validate YAML seed content
    pub fn from_yaml(content: &str) -> RepositoryResult<Self> {
        let parsed: RepositoryContent = serde_yaml::from_str(content)?;
        parsed.validate()?;
        Ok(parsed)
    }

    /// Run domain validation over every rule
    pub fn validate(&self) -> RepositoryResult<()> {
        for rule in &self.rules {
            rule.validate()?;
        }
        for rule in &self.l3_rules {
            rule.validate()?;
        }
        Ok(())
    }
}
