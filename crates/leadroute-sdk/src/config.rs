//! Configuration types for RoutingEngine

use leadroute_runtime::DefaultCounsellor;
use serde::{Deserialize, Serialize};

/// Main engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Well-known default counsellor for L2 fallback
    pub default_counsellor: DefaultCounsellor,

    /// Sentinel agent id for unmatched L3 leads; never created as a record
    pub dummy_l3_agent_id: String,

    /// Reassignment sweep settings
    pub sweep: SweepConfig,

    /// Enable metrics collection
    pub enable_metrics: bool,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self {
            default_counsellor: DefaultCounsellor::default(),
            dummy_l3_agent_id: "dummy-l3-agent".to_string(),
            sweep: SweepConfig::default(),
            enable_metrics: true,
        }
    }

    pub fn with_default_counsellor(mut self, counsellor: DefaultCounsellor) -> Self {
        self.default_counsellor = counsellor;
        self
    }

    pub fn with_dummy_l3_agent(mut self, agent_id: impl Into<String>) -> Self {
        self.dummy_l3_agent_id = agent_id.into();
        self
    }

    pub fn with_sweep(mut self, sweep: SweepConfig) -> Self {
        self.sweep = sweep;
        self
    }

    pub fn enable_metrics(mut self, enable: bool) -> Self {
        self.enable_metrics = enable;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Reassignment sweep configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    /// Consecutive same-counsellor resolutions before a lead is skipped
    pub retry_cap: u32,

    /// Minimum lead age before reassignment, in seconds
    pub quiet_period_secs: u64,

    /// Minimum time since a same-day reassignment, in seconds
    pub staleness_window_secs: u64,

    /// Timer period, in seconds
    pub interval_secs: u64,

    /// Actor recorded on sweep log entries
    pub assigned_by: String,
}

impl SweepConfig {
    pub fn with_retry_cap(mut self, cap: u32) -> Self {
        self.retry_cap = cap;
        self
    }

    pub fn with_quiet_period_secs(mut self, secs: u64) -> Self {
        self.quiet_period_secs = secs;
        self
    }

    pub fn with_staleness_window_secs(mut self, secs: u64) -> Self {
        self.staleness_window_secs = secs;
        self
    }

    pub fn with_interval_secs(mut self, secs: u64) -> Self {
        self.interval_secs = secs;
        self
    }

    pub fn quiet_period(&self) -> chrono::Duration {
        chrono::Duration::seconds(secs_i64(self.quiet_period_secs))
    }

    pub fn staleness_window(&self) -> chrono::Duration {
        chrono::Duration::seconds(secs_i64(self.staleness_window_secs))
    }

    pub fn interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.interval_secs.max(1))
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            retry_cap: 2,
            quiet_period_secs: 10 * 60,
            staleness_window_secs: 2 * 60 * 60,
            interval_secs: 5 * 60,
            assigned_by: "reassignment-sweep".to_string(),
        }
    }
}

fn secs_i64(secs: u64) -> i64 {
    i64::try_from(secs).unwrap_or(i64::MAX / 1000)
}
