//! Storage collaborator traits
//!
//! - [`RoutingRepository`]: every lookup and mutation the routing engine and
//!   the reassignment sweep perform
//! - [`AdminRepository`]: rule and counsellor writes used by seeding, tests and admin tooling
//!
//! # Example
//!
//! ```no_run
//! use leadroute_core::Tier;
//! use leadroute_repository::{InMemoryRepository, RoutingRepository};
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let repo = InMemoryRepository::from_yaml_file("config/routing.yaml").await?;
//!
//! let rules = repo.find_active_rules(Tier::L2).await?;
//! if let Some(rule) = rules.first() {
//!     // Clamp, select and advance in a single step
//!     let slot = repo.advance_round_robin(Tier::L2, &rule.id, 2).await?;
//!     println!("next slot: {:?}", slot);
//! }
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use leadroute_core::{AssignmentRule, Counsellor, L3Rule, Tier};

use crate::models::{AssignmentLogEntry, LeadActivity, LeadRecord, LeadSnapshot, StaleLeadQuery};
use crate::RepositoryResult;

/// Storage operations consumed by the routing engine
///
/// All implementations must be `Send + Sync` for use across async tasks.
#[async_trait]
pub trait RoutingRepository: Send + Sync {
    /// Active L2 or recon rules, in insertion order
    async fn find_active_rules(&self, tier: Tier) -> RepositoryResult<Vec<AssignmentRule>>;

    /// Active L3 rules, in insertion order
    async fn find_active_l3_rules(&self) -> RepositoryResult<Vec<L3Rule>>;

    /// Atomically clamp, select and advance a rule's rotation index
    ///
    /// `tier` selects the rule namespace (`L3` addresses L3 rules). Returns the
    /// selected slot in `0..eligible_len`, or `None` when `eligible_len` is zero.
    /// The stored index becomes `(selected + 1) % eligible_len`.
    async fn advance_round_robin(
        &self,
        tier: Tier,
        rule_id: &str,
        eligible_len: usize,
    ) -> RepositoryResult<Option<usize>>;

    /// Bump `match_count` and set `last_matched_at` on an assignment rule
    async fn increment_match_telemetry(
        &self,
        rule_id: &str,
        at: DateTime<Utc>,
    ) -> RepositoryResult<()>;

    /// Counsellors for the given ids, in the order of `ids`; unknown ids are skipped
    async fn find_counsellors_by_ids(&self, ids: &[String]) -> RepositoryResult<Vec<Counsellor>>;

    async fn find_counsellor_by_id(&self, id: &str) -> RepositoryResult<Option<Counsellor>>;

    /// Case-insensitive email lookup
    async fn find_counsellor_by_email(&self, email: &str)
        -> RepositoryResult<Option<Counsellor>>;

    /// Insert `candidate` unless a counsellor with the same id or email exists
    ///
    /// Returns the stored record. Safe to call concurrently.
    async fn ensure_default_counsellor(&self, candidate: &Counsellor)
        -> RepositoryResult<Counsellor>;

    async fn find_lead(&self, lead_id: &str) -> RepositoryResult<Option<LeadRecord>>;

    /// Leads eligible for reassignment, oldest first
    async fn find_stale_unopened_leads(
        &self,
        query: &StaleLeadQuery,
    ) -> RepositoryResult<Vec<LeadSnapshot>>;

    /// Point the lead at `target_id`
    ///
    /// Sets `last_reassigned_at` when a previously assigned counsellor changes.
    async fn update_lead_assignment(
        &self,
        lead_id: &str,
        target_id: &str,
        at: DateTime<Utc>,
    ) -> RepositoryResult<()>;

    async fn append_assignment_log(&self, entry: AssignmentLogEntry) -> RepositoryResult<()>;

    /// Log entries for a lead, oldest first
    async fn assignment_logs(&self, lead_id: &str) -> RepositoryResult<Vec<AssignmentLogEntry>>;

    /// Increment and return the lead's same-counsellor retry count
    async fn increment_reassign_retry(&self, lead_id: &str) -> RepositoryResult<u32>;

    async fn reset_reassign_retry(&self, lead_id: &str) -> RepositoryResult<()>;

    /// Insert or replace a lead record
    async fn save_lead(&self, lead: &LeadRecord) -> RepositoryResult<()>;

    /// Record an interaction snapshot for a lead
    async fn record_lead_activity(&self, activity: &LeadActivity) -> RepositoryResult<()>;
}

/// Administrative writes
///
/// Rules are validated before they are stored.
#[async_trait]
pub trait AdminRepository: RoutingRepository {
    /// Insert or replace an assignment rule
    async fn save_rule(&self, rule: &AssignmentRule) -> RepositoryResult<()>;

    /// Insert or replace an L3 rule
    async fn save_l3_rule(&self, rule: &L3Rule) -> RepositoryResult<()>;

    /// Delete a rule of either namespace; returns whether anything was removed
    async fn delete_rule(&self, tier: Tier, rule_id: &str) -> RepositoryResult<bool>;

    async fn save_counsellor(&self, counsellor: &Counsellor) -> RepositoryResult<()>;

    /// Mark a lead as opened by its counsellor
    async fn mark_lead_opened(&self, lead_id: &str) -> RepositoryResult<()>;
}
