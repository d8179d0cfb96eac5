//! Round-robin allocation over a matched rule's targets
//!
//! The rotation index is advanced by the repository in the same step that
//! selects the slot, so concurrent allocations against one rule stay fair.

use leadroute_core::{AssignmentMethod, AssignmentRule, Counsellor, L3Rule, Tier};
use leadroute_repository::RoutingRepository;
use std::sync::Arc;
use tracing::debug;

use crate::error::{Result, RuntimeError};

/// A chosen target and how it was chosen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub target_id: String,
    pub method: AssignmentMethod,
    /// Rotation slot used, `None` for direct assignment
    pub slot: Option<usize>,
}

pub struct RoundRobinAllocator {
    repository: Arc<dyn RoutingRepository>,
}

impl RoundRobinAllocator {
    pub fn new(repository: Arc<dyn RoutingRepository>) -> Self {
        Self { repository }
    }

    /// Pick the next eligible counsellor of an L2 rule
    ///
    /// Returns [`RuntimeError::AllocationExhausted`] when every assigned
    /// counsellor is inactive, unknown or of the wrong role.
    pub async fn allocate(&self, rule: &AssignmentRule) -> Result<Allocation> {
        let eligible = self
            .eligible_counsellors(&rule.assigned_counsellor_ids, rule.tier)
            .await?;
        self.rotate(rule.tier, &rule.id, &eligible).await
    }

    /// Pick a counsellor for an L3 rule
    ///
    /// A rule with a single assigned counsellor is a direct assignment and
    /// leaves the rotation index untouched.
    pub async fn allocate_l3(&self, rule: &L3Rule) -> Result<Allocation> {
        let eligible = self
            .eligible_counsellors(&rule.assigned_counsellor_ids, Tier::L3)
            .await?;

        if rule.assigned_counsellor_ids.len() == 1 {
            return eligible
                .into_iter()
                .next()
                .map(|target_id| Allocation {
                    target_id,
                    method: AssignmentMethod::Direct,
                    slot: None,
                })
                .ok_or_else(|| RuntimeError::exhausted(&rule.id));
        }

        self.rotate(Tier::L3, &rule.id, &eligible).await
    }

    /// Cycle a recon rule's universities
    ///
    /// Universities carry no activity state, so every listed name is a target.
    pub async fn allocate_university(&self, rule: &AssignmentRule) -> Result<Allocation> {
        let targets: Vec<String> = rule
            .assigned_university_names
            .iter()
            .filter(|name| !name.trim().is_empty())
            .cloned()
            .collect();

        let mut allocation = self.rotate(Tier::Recon, &rule.id, &targets).await?;
        allocation.method = AssignmentMethod::RuleBased;
        Ok(allocation)
    }

    async fn eligible_counsellors(&self, ids: &[String], tier: Tier) -> Result<Vec<String>> {
        let counsellors = self.repository.find_counsellors_by_ids(ids).await?;
        let eligible: Vec<String> = counsellors
            .into_iter()
            .filter(|c: &Counsellor| c.is_eligible_for(tier))
            .map(|c| c.id)
            .collect();

        debug!(
            "{} of {} assigned counsellors eligible for {}",
            eligible.len(),
            ids.len(),
            tier
        );
        Ok(eligible)
    }

    async fn rotate(&self, tier: Tier, rule_id: &str, targets: &[String]) -> Result<Allocation> {
        if targets.is_empty() {
            return Err(RuntimeError::exhausted(rule_id));
        }

        let slot = self
            .repository
            .advance_round_robin(tier, rule_id, targets.len())
            .await?
            .ok_or_else(|| RuntimeError::exhausted(rule_id))?;

        let target_id = targets
            .get(slot)
            .cloned()
            .ok_or_else(|| RuntimeError::exhausted(rule_id))?;

        debug!("Rule {} allocated slot {} -> {}", rule_id, slot, target_id);

        Ok(Allocation {
            target_id,
            method: AssignmentMethod::RoundRobin,
            slot: Some(slot),
        })
    }
}
