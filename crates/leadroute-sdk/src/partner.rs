//! Partner (university) submission capability used by recon routing

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use leadroute_core::Lead;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PartnerError {
    #[error("submission rejected: {0}")]
    Rejected(String),

    #[error("partner unavailable: {0}")]
    Unavailable(String),
}

/// Acknowledgement returned by a partner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartnerReceipt {
    pub university: String,
    pub reference: String,
    pub submitted_at: DateTime<Utc>,
}

/// Submits a lead to a partner university
///
/// Submissions are all-or-nothing per lead; there is no rollback of the
/// routing decision when a submission fails.
#[async_trait]
pub trait PartnerGateway: Send + Sync {
    async fn submit(&self, university: &str, lead: &Lead) -> Result<PartnerReceipt, PartnerError>;
}

/// Gateway that accepts every submission and logs it
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingPartnerGateway;

#[async_trait]
impl PartnerGateway for LoggingPartnerGateway {
    async fn submit(&self, university: &str, lead: &Lead) -> Result<PartnerReceipt, PartnerError> {
        let submitted_at = Utc::now();
        info!(
            university = %university,
            email = %lead.identity.email,
            "Lead submitted to partner"
        );
        Ok(PartnerReceipt {
            university: university.to_string(),
            reference: format!(
                "{}-{}",
                university.to_lowercase().replace(' ', "-"),
                submitted_at.timestamp_millis()
            ),
            submitted_at,
        })
    }
}
