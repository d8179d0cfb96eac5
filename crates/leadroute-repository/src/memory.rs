//! In-memory repository backed by a single `tokio::sync::RwLock`
//!
//! Every mutation takes the write lock for its whole read-modify-write, so
//! rotation advances and retry increments are atomic per call.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use leadroute_core::rotation::next_slot;
use leadroute_core::{AssignmentRule, Counsellor, L3Rule, Tier};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::content::RepositoryContent;
use crate::error::{RepositoryError, RepositoryResult};
use crate::models::{AssignmentLogEntry, LeadActivity, LeadRecord, LeadSnapshot, StaleLeadQuery};
use crate::traits::{AdminRepository, RoutingRepository};

#[derive(Debug, Default)]
struct State {
    rules: Vec<AssignmentRule>,
    l3_rules: Vec<L3Rule>,
    counsellors: Vec<Counsellor>,
    leads: Vec<LeadRecord>,
    activities: HashMap<String, Vec<LeadActivity>>,
    logs: Vec<AssignmentLogEntry>,
}

impl State {
    fn lead_mut(&mut self, lead_id: &str) -> RepositoryResult<&mut LeadRecord> {
        self.leads
            .iter_mut()
            .find(|l| l.id == lead_id)
            .ok_or_else(|| RepositoryError::not_found("lead", lead_id))
    }

    fn latest_activity(&self, lead_id: &str) -> Option<&LeadActivity> {
        self.activities
            .get(lead_id)
            .and_then(|entries| entries.iter().max_by_key(|a| a.recorded_at))
    }
}

/// Repository holding all routing state in process memory
///
/// Cloning is cheap and clones share state.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<RwLock<State>>,
}

impl InMemoryRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository from validated seed content
    pub fn from_content(content: RepositoryContent) -> RepositoryResult<Self> {
        content.validate()?;

        let mut activities: HashMap<String, Vec<LeadActivity>> = HashMap::new();
        for activity in content.activities {
            activities
                .entry(activity.lead_id.clone())
                .or_default()
                .push(activity);
        }

        let state = State {
            rules: content.rules,
            l3_rules: content.l3_rules,
            counsellors: content.counsellors,
            leads: content.leads,
            activities,
            logs: Vec::new(),
        };

        Ok(Self {
            state: Arc::new(RwLock::new(state)),
        })
    }

    /// Create a repository from a YAML seed string
    pub fn from_yaml(yaml: &str) -> RepositoryResult<Self> {
        Self::from_content(RepositoryContent::from_yaml(yaml)?)
    }

    /// Create a repository from a YAML seed file
    pub async fn from_yaml_file(path: impl AsRef<Path>) -> RepositoryResult<Self> {
        let path = path.as_ref();
        debug!("Loading repository seed from {}", path.display());
        let yaml = tokio::fs::read_to_string(path).await?;
        Self::from_yaml(&yaml)
    }

    /// Snapshot of an assignment rule, including its rotation state
    pub async fn rule(&self, rule_id: &str) -> Option<AssignmentRule> {
        let state = self.state.read().await;
        state.rules.iter().find(|r| r.id == rule_id).cloned()
    }

    /// Snapshot of an L3 rule
    pub async fn l3_rule(&self, rule_id: &str) -> Option<L3Rule> {
        let state = self.state.read().await;
        state.l3_rules.iter().find(|r| r.id == rule_id).cloned()
    }

    /// Number of stored counsellors
    pub async fn counsellor_count(&self) -> usize {
        self.state.read().await.counsellors.len()
    }
}

#[async_trait]
impl RoutingRepository for InMemoryRepository {
    async fn find_active_rules(&self, tier: Tier) -> RepositoryResult<Vec<AssignmentRule>> {
        let state = self.state.read().await;
        Ok(state
            .rules
            .iter()
            .filter(|r| r.is_active && r.tier == tier)
            .cloned()
            .collect())
    }

    async fn find_active_l3_rules(&self) -> RepositoryResult<Vec<L3Rule>> {
        let state = self.state.read().await;
        Ok(state.l3_rules.iter().filter(|r| r.is_active).cloned().collect())
    }

    async fn advance_round_robin(
        &self,
        tier: Tier,
        rule_id: &str,
        eligible_len: usize,
    ) -> RepositoryResult<Option<usize>> {
        let mut state = self.state.write().await;

        let index = match tier {
            Tier::L3 => state
                .l3_rules
                .iter_mut()
                .find(|r| r.id == rule_id)
                .map(|r| &mut r.round_robin_index),
            _ => state
                .rules
                .iter_mut()
                .find(|r| r.id == rule_id && r.tier == tier)
                .map(|r| &mut r.round_robin_index),
        }
        .ok_or_else(|| RepositoryError::not_found("rule", rule_id))?;

        Ok(next_slot(*index, eligible_len).map(|(selected, next)| {
            *index = next;
            selected
        }))
    }

    async fn increment_match_telemetry(
        &self,
        rule_id: &str,
        at: DateTime<Utc>,
    ) -> RepositoryResult<()> {
        let mut state = self.state.write().await;
        let rule = state
            .rules
            .iter_mut()
            .find(|r| r.id == rule_id)
            .ok_or_else(|| RepositoryError::not_found("rule", rule_id))?;
        rule.match_count += 1;
        rule.last_matched_at = Some(at);
        Ok(())
    }

    async fn find_counsellors_by_ids(&self, ids: &[String]) -> RepositoryResult<Vec<Counsellor>> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.counsellors.iter().find(|c| &c.id == id).cloned())
            .collect())
    }

    async fn find_counsellor_by_id(&self, id: &str) -> RepositoryResult<Option<Counsellor>> {
        let state = self.state.read().await;
        Ok(state.counsellors.iter().find(|c| c.id == id).cloned())
    }

    async fn find_counsellor_by_email(
        &self,
        email: &str,
    ) -> RepositoryResult<Option<Counsellor>> {
        let state = self.state.read().await;
        Ok(state
            .counsellors
            .iter()
            .find(|c| c.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn ensure_default_counsellor(
        &self,
        candidate: &Counsellor,
    ) -> RepositoryResult<Counsellor> {
        let mut state = self.state.write().await;
        if let Some(existing) = state.counsellors.iter().find(|c| {
            c.id == candidate.id || c.email.eq_ignore_ascii_case(&candidate.email)
        }) {
            return Ok(existing.clone());
        }
        debug!("Creating default counsellor {}", candidate.id);
        state.counsellors.push(candidate.clone());
        Ok(candidate.clone())
    }

    async fn find_lead(&self, lead_id: &str) -> RepositoryResult<Option<LeadRecord>> {
        let state = self.state.read().await;
        Ok(state.leads.iter().find(|l| l.id == lead_id).cloned())
    }

    async fn find_stale_unopened_leads(
        &self,
        query: &StaleLeadQuery,
    ) -> RepositoryResult<Vec<LeadSnapshot>> {
        let state = self.state.read().await;

        let mut stale: Vec<&LeadRecord> = state.leads.iter().filter(|l| query.matches(l)).collect();
        stale.sort_by_key(|l| l.created_at);

        Ok(stale
            .into_iter()
            .filter_map(|lead| {
                let counsellor = lead.assigned_counsellor_id.clone()?;
                Some(LeadSnapshot {
                    lead_id: lead.id.clone(),
                    assigned_counsellor_id: counsellor,
                    created_at: lead.created_at,
                    last_reassigned_at: lead.last_reassigned_at,
                    reassign_retry_count: lead.reassign_retry_count,
                    activity: state.latest_activity(&lead.id).map(|a| a.snapshot.clone()),
                })
            })
            .collect())
    }

    async fn update_lead_assignment(
        &self,
        lead_id: &str,
        target_id: &str,
        at: DateTime<Utc>,
    ) -> RepositoryResult<()> {
        let mut state = self.state.write().await;
        let lead = state.lead_mut(lead_id)?;
        match lead.assigned_counsellor_id.as_deref() {
            Some(current) if current != target_id => {
                lead.last_reassigned_at = Some(at);
                lead.reassign_retry_count = 0;
            }
            _ => {}
        }
        lead.assigned_counsellor_id = Some(target_id.to_string());
        lead.assigned_at = Some(at);
        Ok(())
    }

    async fn append_assignment_log(&self, entry: AssignmentLogEntry) -> RepositoryResult<()> {
        self.state.write().await.logs.push(entry);
        Ok(())
    }

    async fn assignment_logs(&self, lead_id: &str) -> RepositoryResult<Vec<AssignmentLogEntry>> {
        let state = self.state.read().await;
        Ok(state
            .logs
            .iter()
            .filter(|e| e.lead_id == lead_id)
            .cloned()
            .collect())
    }

    async fn increment_reassign_retry(&self, lead_id: &str) -> RepositoryResult<u32> {
        let mut state = self.state.write().await;
        let lead = state.lead_mut(lead_id)?;
        lead.reassign_retry_count += 1;
        Ok(lead.reassign_retry_count)
    }

    async fn reset_reassign_retry(&self, lead_id: &str) -> RepositoryResult<()> {
        let mut state = self.state.write().await;
        state.lead_mut(lead_id)?.reassign_retry_count = 0;
        Ok(())
    }

    async fn save_lead(&self, lead: &LeadRecord) -> RepositoryResult<()> {
        let mut state = self.state.write().await;
        match state.leads.iter_mut().find(|l| l.id == lead.id) {
            Some(existing) => *existing = lead.clone(),
            None => state.leads.push(lead.clone()),
        }
        Ok(())
    }

    async fn record_lead_activity(&self, activity: &LeadActivity) -> RepositoryResult<()> {
        let mut state = self.state.write().await;
        if !state.leads.iter().any(|l| l.id == activity.lead_id) {
            return Err(RepositoryError::not_found("lead", activity.lead_id.clone()));
        }
        state
            .activities
            .entry(activity.lead_id.clone())
            .or_default()
            .push(activity.clone());
        Ok(())
    }
}

#[async_trait]
impl AdminRepository for InMemoryRepository {
    async fn save_rule(&self, rule: &AssignmentRule) -> RepositoryResult<()> {
        rule.validate()?;
        let mut state = self.state.write().await;
        match state.rules.iter_mut().find(|r| r.id == rule.id) {
            Some(existing) => *existing = rule.clone(),
            None => state.rules.push(rule.clone()),
        }
        Ok(())
    }

    async fn save_l3_rule(&self, rule: &L3Rule) -> RepositoryResult<()> {
        rule.validate()?;
        let mut state = self.state.write().await;
        match state.l3_rules.iter_mut().find(|r| r.id == rule.id) {
            Some(existing) => *existing = rule.clone(),
            None => state.l3_rules.push(rule.clone()),
        }
        Ok(())
    }

    async fn delete_rule(&self, tier: Tier, rule_id: &str) -> RepositoryResult<bool> {
        let mut state = self.state.write().await;
        let removed = match tier {
            Tier::L3 => {
                let before = state.l3_rules.len();
                state.l3_rules.retain(|r| r.id != rule_id);
                before != state.l3_rules.len()
            }
            _ => {
                let before = state.rules.len();
                state.rules.retain(|r| !(r.id == rule_id && r.tier == tier));
                before != state.rules.len()
            }
        };
        Ok(removed)
    }

    async fn save_counsellor(&self, counsellor: &Counsellor) -> RepositoryResult<()> {
        let mut state = self.state.write().await;
        match state.counsellors.iter_mut().find(|c| c.id == counsellor.id) {
            Some(existing) => *existing = counsellor.clone(),
            None => state.counsellors.push(counsellor.clone()),
        }
        Ok(())
    }

    async fn mark_lead_opened(&self, lead_id: &str) -> RepositoryResult<()> {
        let mut state = self.state.write().await;
        state.lead_mut(lead_id)?.opened = true;
        Ok(())
    }
}
