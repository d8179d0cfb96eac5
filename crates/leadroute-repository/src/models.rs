//! Records owned by the storage collaborator

use chrono::{DateTime, Duration, Utc};
use leadroute_core::{AssignmentMethod, Lead};
use serde::{Deserialize, Serialize};

/// Persisted lead assignment state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadRecord {
    pub id: String,

    #[serde(default)]
    pub assigned_counsellor_id: Option<String>,

    /// Whether the assigned counsellor has opened the lead
    #[serde(default)]
    pub opened: bool,

    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub assigned_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub last_reassigned_at: Option<DateTime<Utc>>,

    /// Consecutive sweep resolutions back to the current counsellor
    #[serde(default)]
    pub reassign_retry_count: u32,
}

impl LeadRecord {
    pub fn new(id: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            assigned_counsellor_id: None,
            opened: false,
            created_at,
            assigned_at: None,
            last_reassigned_at: None,
            reassign_retry_count: 0,
        }
    }

    pub fn assigned_to(mut self, counsellor_id: impl Into<String>, at: DateTime<Utc>) -> Self {
        self.assigned_counsellor_id = Some(counsellor_id.into());
        self.assigned_at = Some(at);
        self
    }
}

/// Recorded interaction carrying the lead attributes seen at that time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadActivity {
    pub lead_id: String,
    pub recorded_at: DateTime<Utc>,
    pub snapshot: Lead,
}

/// Stale lead handed to the reassignment sweep
#[derive(Debug, Clone, PartialEq)]
pub struct LeadSnapshot {
    pub lead_id: String,
    pub assigned_counsellor_id: String,
    pub created_at: DateTime<Utc>,
    pub last_reassigned_at: Option<DateTime<Utc>>,
    pub reassign_retry_count: u32,
    /// Latest recorded activity, if any
    pub activity: Option<Lead>,
}

/// Parameters of the stale-lead eligibility query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaleLeadQuery {
    pub now: DateTime<Utc>,
    /// Minimum lead age before it can be reassigned
    pub quiet_period: Duration,
    /// Minimum time since the last reassignment on the same day
    pub staleness_window: Duration,
}

impl StaleLeadQuery {
    pub fn new(now: DateTime<Utc>, quiet_period: Duration, staleness_window: Duration) -> Self {
        Self {
            now,
            quiet_period,
            staleness_window,
        }
    }

    /// Midnight UTC of the query day
    pub fn start_of_today(&self) -> DateTime<Utc> {
        self.now
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .map(|midnight| midnight.and_utc())
            .unwrap_or(self.now)
    }

    /// Eligibility predicate
    ///
    /// Assigned, unopened, older than the quiet period, and either never
    /// reassigned or last reassigned before today or outside the staleness window.
    pub fn matches(&self, lead: &LeadRecord) -> bool {
        if lead.assigned_counsellor_id.is_none() || lead.opened {
            return false;
        }
        if lead.created_at >= self.now - self.quiet_period {
            return false;
        }
        match lead.last_reassigned_at {
            None => true,
            Some(at) => at < self.start_of_today() || at < self.now - self.staleness_window,
        }
    }
}

/// Audit log entry for an assignment decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentLogEntry {
    pub lead_id: String,
    pub target_id: String,
    /// Actor that made the assignment (e.g. `system`, `reassignment-sweep`)
    pub assigned_by: String,
    pub reason: String,
    #[serde(default)]
    pub method: Option<AssignmentMethod>,
    #[serde(default)]
    pub rule_id: Option<String>,
    pub created_at: DateTime<Utc>,
}
