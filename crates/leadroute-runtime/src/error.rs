//! Runtime error types

use leadroute_repository::RepositoryError;
use thiserror::Error;

/// Runtime error
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Storage collaborator failure
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// A rule matched but none of its targets can take the lead
    #[error("No eligible target for rule {rule_id}")]
    AllocationExhausted { rule_id: String },

    /// Every step of the default-counsellor chain failed
    #[error("Default counsellor unavailable: {0}")]
    DefaultCounsellorUnavailable(String),

    /// Notification could not be delivered or queued
    #[error("Notification error: {0}")]
    Notification(String),
}

impl RuntimeError {
    pub(crate) fn exhausted(rule_id: impl Into<String>) -> Self {
        RuntimeError::AllocationExhausted {
            rule_id: rule_id.into(),
        }
    }
}

/// Result type for runtime operations
pub type Result<T> = std::result::Result<T, RuntimeError>;
