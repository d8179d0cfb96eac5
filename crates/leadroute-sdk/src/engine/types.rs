//! Result types for RoutingEngine

use leadroute_core::AssignmentResult;
use serde::{Deserialize, Serialize};

use crate::partner::PartnerReceipt;

/// A routing decision that has been persisted against a lead
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadAssignment {
    pub lead_id: String,

    /// Counsellor the lead pointed at before this assignment
    #[serde(default)]
    pub previous_counsellor_id: Option<String>,

    pub result: AssignmentResult,
}

impl LeadAssignment {
    pub fn is_reassignment(&self) -> bool {
        self.previous_counsellor_id
            .as_deref()
            .is_some_and(|previous| previous != self.result.target_id)
    }
}

/// Recon routing outcome: the chosen university and the partner's acknowledgement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniversityRouting {
    pub result: AssignmentResult,
    pub receipt: PartnerReceipt,
}
