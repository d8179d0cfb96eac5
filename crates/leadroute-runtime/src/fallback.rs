//! Default assignment when no rule can place a lead
//!
//! L2 falls back to a real default counsellor: (a) by well-known id, (b) by
//! well-known email, (c) created if missing. L3 falls back to a fixed sentinel
//! agent id that never exists as a counsellor record.

use leadroute_core::{AssignmentMethod, AssignmentResult, Counsellor, CounsellorRole};
use leadroute_repository::RoutingRepository;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{Result, RuntimeError};

/// Identity of the well-known default counsellor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultCounsellor {
    pub id: String,
    pub email: String,
    pub name: String,
}

impl DefaultCounsellor {
    pub fn new(
        id: impl Into<String>,
        email: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            name: name.into(),
        }
    }

    /// Active L2 counsellor record for this identity
    pub fn to_counsellor(&self) -> Counsellor {
        Counsellor::new(&self.id, &self.name, &self.email, CounsellorRole::L2)
    }
}

impl Default for DefaultCounsellor {
    fn default() -> Self {
        Self::new("default-counsellor", "default.counsellor@leadroute.local", "Default Counsellor")
    }
}

pub struct AssignmentFallbackChain {
    repository: Arc<dyn RoutingRepository>,
    default_counsellor: DefaultCounsellor,
    dummy_l3_agent_id: String,
}

impl AssignmentFallbackChain {
    pub fn new(
        repository: Arc<dyn RoutingRepository>,
        default_counsellor: DefaultCounsellor,
        dummy_l3_agent_id: impl Into<String>,
    ) -> Self {
        Self {
            repository,
            default_counsellor,
            dummy_l3_agent_id: dummy_l3_agent_id.into(),
        }
    }

    pub fn default_counsellor(&self) -> &DefaultCounsellor {
        &self.default_counsellor
    }

    pub fn dummy_l3_agent_id(&self) -> &str {
        &self.dummy_l3_agent_id
    }

    /// Make sure the default counsellor exists; run once at startup
    pub async fn bootstrap(&self) -> Result<Counsellor> {
        let counsellor = self
            .repository
            .ensure_default_counsellor(&self.default_counsellor.to_counsellor())
            .await?;
        info!("Default counsellor ready: {}", counsellor.id);
        Ok(counsellor)
    }

    /// Resolve the L2 default counsellor
    ///
    /// Lookup failures in steps (a) and (b) fall through to the next step; only
    /// a failure of the final create-if-missing step is an error.
    pub async fn resolve_default(&self) -> Result<Counsellor> {
        match self
            .repository
            .find_counsellor_by_id(&self.default_counsellor.id)
            .await
        {
            Ok(Some(counsellor)) => return Ok(counsellor),
            Ok(None) => {}
            Err(e) => warn!("Default counsellor lookup by id failed: {}", e),
        }

        match self
            .repository
            .find_counsellor_by_email(&self.default_counsellor.email)
            .await
        {
            Ok(Some(counsellor)) => return Ok(counsellor),
            Ok(None) => {}
            Err(e) => warn!("Default counsellor lookup by email failed: {}", e),
        }

        warn!(
            "Default counsellor {} missing, creating it",
            self.default_counsellor.id
        );
        self.repository
            .ensure_default_counsellor(&self.default_counsellor.to_counsellor())
            .await
            .map_err(|e| RuntimeError::DefaultCounsellorUnavailable(e.to_string()))
    }

    /// L2 fallback result
    pub async fn assign_default(&self, reason: impl Into<String>) -> Result<AssignmentResult> {
        let counsellor = self.resolve_default().await?;
        Ok(AssignmentResult::fallback(
            counsellor.id,
            AssignmentMethod::Default,
            reason,
        ))
    }

    /// L3 sentinel result; performs no I/O
    pub fn assign_dummy_l3(&self, reason: impl Into<String>) -> AssignmentResult {
        AssignmentResult::fallback(
            self.dummy_l3_agent_id.clone(),
            AssignmentMethod::DummyFallback,
            reason,
        )
    }
}
