//! Reassignment sweep
//!
//! Re-routes leads that were assigned but left unopened, one lead at a time.
//! Per-lead failures become outcomes in the report and never abort the batch.
//!
//! Per-lead state machine:
//!
//! ```text
//! eligible -> retry-limit-skip       retry count already at the cap
//!          -> no-activity-skip       no recorded interaction to route from
//!          -> assignment-failed      routing or persistence failed
//!          -> same-counsellor-retry  routing chose the current counsellor
//!          -> reassigned             routing chose a different counsellor
//! ```

use chrono::{DateTime, Utc};
use leadroute_core::AssignmentResult;
use leadroute_repository::{AssignmentLogEntry, LeadSnapshot, StaleLeadQuery};
use leadroute_runtime::AssignmentKind;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::engine::{describe, RoutingEngine};
use crate::error::{Result, SdkError};

/// What happened to one lead in a sweep cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum SweepOutcome {
    /// Retry count was already at the cap; nothing was written
    RetryLimitSkip { retries: u32 },

    /// No activity snapshot exists for the lead
    NoActivitySkip,

    /// Routing or persistence failed for this lead
    AssignmentFailed { reason: String },

    /// Routing resolved to the current counsellor; the retry count was incremented
    SameCounsellorRetry { retries: u32, limit_reached: bool },

    /// Lead moved to a different counsellor
    Reassigned { from: String, to: String },
}

impl SweepOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            SweepOutcome::RetryLimitSkip { .. } => "retry-limit-skip",
            SweepOutcome::NoActivitySkip => "no-activity-skip",
            SweepOutcome::AssignmentFailed { .. } => "assignment-failed",
            SweepOutcome::SameCounsellorRetry { .. } => "same-counsellor-retry",
            SweepOutcome::Reassigned { .. } => "reassigned",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeadSweepResult {
    pub lead_id: String,
    #[serde(flatten)]
    pub outcome: SweepOutcome,
}

/// Summary of one sweep cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub results: Vec<LeadSweepResult>,
}

impl SweepReport {
    /// Number of leads with the given outcome label
    pub fn count(&self, label: &str) -> usize {
        self.results
            .iter()
            .filter(|r| r.outcome.label() == label)
            .count()
    }

    pub fn outcome_for(&self, lead_id: &str) -> Option<&SweepOutcome> {
        self.results
            .iter()
            .find(|r| r.lead_id == lead_id)
            .map(|r| &r.outcome)
    }
}

pub struct ReassignmentSweep {
    engine: Arc<RoutingEngine>,
    cycle: Mutex<()>,
}

impl ReassignmentSweep {
    pub fn new(engine: Arc<RoutingEngine>) -> Self {
        Self {
            engine,
            cycle: Mutex::new(()),
        }
    }

    /// Run one sweep cycle as of `now`
    ///
    /// Waits for a running cycle to finish first. Fails only when the stale
    /// lead query itself fails.
    pub async fn run_once(&self, now: DateTime<Utc>) -> Result<SweepReport> {
        let _cycle = self.cycle.lock().await;
        self.run_cycle(now).await
    }

    /// Run a cycle unless one is already in progress
    pub async fn try_run_once(&self, now: DateTime<Utc>) -> Option<Result<SweepReport>> {
        let _cycle = self.cycle.try_lock().ok()?;
        Some(self.run_cycle(now).await)
    }

    /// Drive the sweep on a fixed interval; the first cycle runs after one period
    pub fn spawn(self: Arc<Self>, period: std::time::Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            info!("Reassignment sweep scheduled every {:?}", period);

            loop {
                ticker.tick().await;
                match self.try_run_once(Utc::now()).await {
                    Some(Ok(report)) => debug!(
                        "Sweep cycle finished with {} leads",
                        report.results.len()
                    ),
                    Some(Err(e)) => error!("Sweep cycle failed: {}", e),
                    None => warn!("Previous sweep cycle still running, skipping tick"),
                }
            }
        })
    }

    async fn run_cycle(&self, now: DateTime<Utc>) -> Result<SweepReport> {
        let started_at = Utc::now();
        let sweep = &self.engine.config().sweep;
        let query = StaleLeadQuery::new(now, sweep.quiet_period(), sweep.staleness_window());

        let repository = self.engine.repository();
        let stale = repository.find_stale_unopened_leads(&query).await?;
        debug!("Sweep found {} stale leads", stale.len());

        let mut results = Vec::with_capacity(stale.len());
        for snapshot in &stale {
            let outcome = self.process(snapshot, now).await;
            if let Some(metrics) = self.engine.metrics() {
                metrics.record_sweep_outcome(outcome.label());
            }
            results.push(LeadSweepResult {
                lead_id: snapshot.lead_id.clone(),
                outcome,
            });
        }

        let report = SweepReport {
            started_at,
            finished_at: Utc::now(),
            results,
        };
        info!(
            leads = report.results.len(),
            reassigned = report.count("reassigned"),
            retried = report.count("same-counsellor-retry"),
            skipped = report.count("retry-limit-skip") + report.count("no-activity-skip"),
            failed = report.count("assignment-failed"),
            "Reassignment sweep finished"
        );
        Ok(report)
    }

    async fn process(&self, snapshot: &LeadSnapshot, now: DateTime<Utc>) -> SweepOutcome {
        let cap = self.engine.config().sweep.retry_cap;
        let lead_id = snapshot.lead_id.as_str();

        if snapshot.reassign_retry_count >= cap {
            debug!("Lead {} at retry limit, skipping", lead_id);
            return SweepOutcome::RetryLimitSkip {
                retries: snapshot.reassign_retry_count,
            };
        }

        let Some(activity) = &snapshot.activity else {
            debug!("Lead {} has no activity snapshot, skipping", lead_id);
            return SweepOutcome::NoActivitySkip;
        };

        let result = match self.engine.route_lead(activity).await {
            Ok(result) => result,
            Err(e) => return self.failed(lead_id, e),
        };

        let repository = self.engine.repository();

        if result.target_id == snapshot.assigned_counsellor_id {
            return match repository.increment_reassign_retry(lead_id).await {
                Ok(retries) => {
                    let limit_reached = retries >= cap;
                    if limit_reached {
                        info!(
                            "Lead {} keeps resolving to {}, retry limit reached",
                            lead_id, result.target_id
                        );
                    }
                    SweepOutcome::SameCounsellorRetry {
                        retries,
                        limit_reached,
                    }
                }
                Err(e) => self.failed(lead_id, e.into()),
            };
        }

        let persisted = self.persist_reassignment(snapshot, &result, now).await;
        if let Err(e) = persisted {
            return self.failed(lead_id, e);
        }

        self.engine
            .notify(&result.target_id, lead_id, AssignmentKind::Reassigned)
            .await;
        info!(
            "Lead {} reassigned from {} to {}",
            lead_id, snapshot.assigned_counsellor_id, result.target_id
        );

        SweepOutcome::Reassigned {
            from: snapshot.assigned_counsellor_id.clone(),
            to: result.target_id,
        }
    }

    async fn persist_reassignment(
        &self,
        snapshot: &LeadSnapshot,
        result: &AssignmentResult,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let repository = self.engine.repository();
        let lead_id = snapshot.lead_id.as_str();

        repository
            .update_lead_assignment(lead_id, &result.target_id, now)
            .await?;
        repository.reset_reassign_retry(lead_id).await?;
        repository
            .append_assignment_log(AssignmentLogEntry {
                lead_id: lead_id.to_string(),
                target_id: result.target_id.clone(),
                assigned_by: self.engine.config().sweep.assigned_by.clone(),
                reason: format!(
                    "reassigned from {}: {}",
                    snapshot.assigned_counsellor_id,
                    describe(result)
                ),
                method: Some(result.method),
                rule_id: result.rule_id.clone(),
                created_at: now,
            })
            .await?;
        Ok(())
    }

    fn failed(&self, lead_id: &str, error: SdkError) -> SweepOutcome {
        error!("Sweep could not reassign lead {}: {}", lead_id, error);
        self.engine.record_error("sweep");
        SweepOutcome::AssignmentFailed {
            reason: error.to_string(),
        }
    }
}
