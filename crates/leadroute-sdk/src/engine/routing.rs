//! Core RoutingEngine implementation

use chrono::Utc;
use leadroute_core::{
    AssignmentMethod, AssignmentResult, ConditionNormalizer, HierarchicalMatcher, L3Query,
    L3Selection, Lead, RuleSelector, Tier,
};
use leadroute_repository::{AssignmentLogEntry, LeadActivity, LeadRecord, RoutingRepository};
use leadroute_runtime::{
    AssignmentFallbackChain, AssignmentKind, AssignmentNotification, Notifier,
    RoundRobinAllocator, RoutingMetrics, RuntimeError,
};
use serde_json::{Map, Value as JsonValue};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use super::types::{LeadAssignment, UniversityRouting};
use crate::config::EngineConfig;
use crate::error::{Result, SdkError};
use crate::partner::PartnerGateway;

const NO_RULE_MATCHED: &str = "no active rule matched the lead";
const NO_ELIGIBLE_TARGET: &str = "no eligible counsellor on any matching rule";
const NO_L3_RULESET: &str = "no ruleset found matching collegeName and source criteria";

/// Routing engine
///
/// Request-driven routing runs inline on the caller's task; the only shared
/// mutable state it touches is each rule's rotation index, which the
/// repository advances atomically.
pub struct RoutingEngine {
    config: EngineConfig,
    repository: Arc<dyn RoutingRepository>,
    allocator: RoundRobinAllocator,
    fallback: AssignmentFallbackChain,
    notifier: Arc<dyn Notifier>,
    partner: Arc<dyn PartnerGateway>,
    metrics: Option<Arc<RoutingMetrics>>,
}

impl RoutingEngine {
    /// Assemble an engine; use [`crate::RoutingEngineBuilder`] to also bootstrap storage
    pub fn new(
        config: EngineConfig,
        repository: Arc<dyn RoutingRepository>,
        notifier: Arc<dyn Notifier>,
        partner: Arc<dyn PartnerGateway>,
    ) -> Self {
        let allocator = RoundRobinAllocator::new(repository.clone());
        let fallback = AssignmentFallbackChain::new(
            repository.clone(),
            config.default_counsellor.clone(),
            config.dummy_l3_agent_id.clone(),
        );
        let metrics = config
            .enable_metrics
            .then(|| Arc::new(RoutingMetrics::new()));

        Self {
            config,
            repository,
            allocator,
            fallback,
            notifier,
            partner,
            metrics,
        }
    }

    /// Route a raw lead payload after normalizing its keys
    pub async fn route_raw(&self, raw: &Map<String, JsonValue>) -> Result<AssignmentResult> {
        let lead = ConditionNormalizer::normalize(raw);
        self.route_lead(&lead).await
    }

    /// Route a normalized lead to an L2 counsellor
    ///
    /// Matching rules are tried best score first; a rule whose targets are all
    /// ineligible falls through to the next one, and the fallback chain runs
    /// when no rule can place the lead. Nothing about the lead is persisted.
    pub async fn route_lead(&self, lead: &Lead) -> Result<AssignmentResult> {
        let started = Instant::now();
        lead.validate_identity()?;

        let rules = self.repository.find_active_rules(Tier::L2).await?;
        let ranked = RuleSelector::rank(lead, &rules);
        debug!(
            "{} of {} active L2 rules fully matched",
            ranked.len(),
            rules.len()
        );

        let mut outcome = None;
        for candidate in &ranked {
            match self.allocator.allocate(candidate.rule).await {
                Ok(allocation) => {
                    self.record_match(&candidate.rule.id).await;
                    outcome = Some(
                        AssignmentResult::from_rule(
                            allocation.target_id,
                            allocation.method,
                            &candidate.rule.id,
                        )
                        .with_score(
                            candidate.outcome.score,
                            candidate.outcome.matched_fields.clone(),
                        ),
                    );
                    break;
                }
                Err(RuntimeError::AllocationExhausted { rule_id }) => {
                    debug!("Rule {} has no eligible counsellor, trying next", rule_id);
                }
                Err(e) => return Err(e.into()),
            }
        }

        let result = match outcome {
            Some(result) => result,
            None => {
                let reason = if ranked.is_empty() {
                    NO_RULE_MATCHED
                } else {
                    NO_ELIGIBLE_TARGET
                };
                warn!("Falling back to default counsellor: {}", reason);
                self.fallback.assign_default(reason).await?
            }
        };

        info!(
            target_id = %result.target_id,
            method = %result.method,
            rule_id = ?result.rule_id,
            "L2 lead routed"
        );
        self.observe(Tier::L2, result.method, started);
        Ok(result)
    }

    /// Route a lead that reached the L3 milestone
    ///
    /// Returns the dummy sentinel, not an error, when no rule passes the
    /// university/source gate or the chosen rule has no eligible counsellor.
    pub async fn route_l3(&self, query: &L3Query) -> Result<AssignmentResult> {
        let started = Instant::now();
        if query.college_name.trim().is_empty() {
            return Err(SdkError::Validation("collegeName is required".to_string()));
        }

        let rules = self.repository.find_active_l3_rules().await?;

        let result = match HierarchicalMatcher::select(query, &rules) {
            L3Selection::NoMandatoryMatch => {
                warn!(
                    "No L3 rule for college '{}' and source '{}'",
                    query.college_name, query.source
                );
                self.fallback.assign_dummy_l3(NO_L3_RULESET)
            }
            L3Selection::Matched {
                rule, resolution, ..
            } => match self.allocator.allocate_l3(rule).await {
                Ok(allocation) => {
                    AssignmentResult::from_rule(allocation.target_id, allocation.method, &rule.id)
                        .with_level(resolution.label())
                }
                Err(RuntimeError::AllocationExhausted { rule_id }) => {
                    warn!("L3 rule {} has no eligible counsellor", rule_id);
                    self.fallback
                        .assign_dummy_l3(format!("no eligible L3 counsellor for rule {}", rule_id))
                        .with_level(resolution.label())
                }
                Err(e) => return Err(e.into()),
            },
        };

        info!(
            target_id = %result.target_id,
            method = %result.method,
            matched_at_level = ?result.matched_at_level,
            "L3 lead routed"
        );
        self.observe(Tier::L3, result.method, started);
        Ok(result)
    }

    /// Pick a partner university for a lead and submit it
    ///
    /// Recon routing has no fallback: no matching rule is [`SdkError::NoMatch`].
    pub async fn route_university(&self, lead: &Lead) -> Result<UniversityRouting> {
        let started = Instant::now();
        lead.validate_identity()?;

        let rules = self.repository.find_active_rules(Tier::Recon).await?;
        let ranked = RuleSelector::rank(lead, &rules);

        let mut outcome = None;
        for candidate in &ranked {
            match self.allocator.allocate_university(candidate.rule).await {
                Ok(allocation) => {
                    self.record_match(&candidate.rule.id).await;
                    outcome = Some(
                        AssignmentResult::from_rule(
                            allocation.target_id,
                            AssignmentMethod::RuleBased,
                            &candidate.rule.id,
                        )
                        .with_score(
                            candidate.outcome.score,
                            candidate.outcome.matched_fields.clone(),
                        ),
                    );
                    break;
                }
                Err(RuntimeError::AllocationExhausted { rule_id }) => {
                    debug!("Recon rule {} lists no universities", rule_id);
                }
                Err(e) => return Err(e.into()),
            }
        }

        let result = outcome
            .ok_or_else(|| SdkError::NoMatch("no recon rule matched the lead".to_string()))?;

        let receipt = self.partner.submit(&result.target_id, lead).await?;
        info!(
            university = %result.target_id,
            reference = %receipt.reference,
            "Lead routed to partner university"
        );
        self.observe(Tier::Recon, result.method, started);
        Ok(UniversityRouting { result, receipt })
    }

    /// Route a lead and persist the decision
    ///
    /// Creates the lead record if it does not exist, records the payload as an
    /// activity snapshot, updates the assignment pointer, appends an audit log
    /// entry and sends a best-effort notification.
    pub async fn assign_lead(&self, lead_id: &str, lead: &Lead) -> Result<LeadAssignment> {
        if lead_id.trim().is_empty() {
            return Err(SdkError::Validation("lead id is required".to_string()));
        }
        let result = self.route_lead(lead).await?;

        let previous_counsellor_id = match self.persist_assignment(lead_id, lead, &result).await {
            Ok(previous) => previous,
            Err(e) => {
                self.record_error("persistence");
                return Err(e);
            }
        };

        let assignment = LeadAssignment {
            lead_id: lead_id.to_string(),
            previous_counsellor_id,
            result,
        };
        let kind = if assignment.is_reassignment() {
            AssignmentKind::Reassigned
        } else {
            AssignmentKind::NewLead
        };
        self.notify(&assignment.result.target_id, lead_id, kind).await;

        Ok(assignment)
    }

    async fn persist_assignment(
        &self,
        lead_id: &str,
        lead: &Lead,
        result: &AssignmentResult,
    ) -> Result<Option<String>> {
        let now = Utc::now();
        let previous_counsellor_id = match self.repository.find_lead(lead_id).await? {
            Some(record) => record.assigned_counsellor_id,
            None => {
                self.repository
                    .save_lead(&LeadRecord::new(lead_id, now))
                    .await?;
                None
            }
        };

        self.repository
            .record_lead_activity(&LeadActivity {
                lead_id: lead_id.to_string(),
                recorded_at: now,
                snapshot: lead.clone(),
            })
            .await?;
        self.repository
            .update_lead_assignment(lead_id, &result.target_id, now)
            .await?;
        self.repository
            .append_assignment_log(AssignmentLogEntry {
                lead_id: lead_id.to_string(),
                target_id: result.target_id.clone(),
                assigned_by: "system".to_string(),
                reason: describe(result),
                method: Some(result.method),
                rule_id: result.rule_id.clone(),
                created_at: now,
            })
            .await?;
        Ok(previous_counsellor_id)
    }

    /// Send an assignment notification; failures are logged and swallowed
    pub async fn notify(&self, target_id: &str, lead_id: &str, kind: AssignmentKind) {
        let notification = AssignmentNotification::new(target_id, lead_id, kind);
        if let Err(e) = self.notifier.notify_assignment(&notification).await {
            warn!("Assignment notification for lead {} failed: {}", lead_id, e);
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn repository(&self) -> Arc<dyn RoutingRepository> {
        self.repository.clone()
    }

    pub fn fallback(&self) -> &AssignmentFallbackChain {
        &self.fallback
    }

    /// Metrics, when enabled
    pub fn metrics(&self) -> Option<Arc<RoutingMetrics>> {
        self.metrics.clone()
    }

    async fn record_match(&self, rule_id: &str) {
        if let Err(e) = self
            .repository
            .increment_match_telemetry(rule_id, Utc::now())
            .await
        {
            warn!("Failed to record match telemetry for rule {}: {}", rule_id, e);
            self.record_error("telemetry");
        }
    }

    /// Count a failure under `errors.<kind>` when metrics are enabled
    pub(crate) fn record_error(&self, kind: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.record_error(kind);
        }
    }

    fn observe(&self, tier: Tier, method: AssignmentMethod, started: Instant) {
        if let Some(metrics) = &self.metrics {
            metrics.record_assignment(tier, method);
            metrics.record_routing_time(tier, started.elapsed());
        }
    }
}

/// Human-readable audit reason for a result
pub(crate) fn describe(result: &AssignmentResult) -> String {
    match (&result.rule_id, &result.reason) {
        (_, Some(reason)) => reason.clone(),
        (Some(rule_id), None) => format!("matched rule {} ({})", rule_id, result.method),
        (None, None) => result.method.to_string(),
    }
}
