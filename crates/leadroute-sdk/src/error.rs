//! SDK error types

use leadroute_core::CoreError;
use leadroute_repository::RepositoryError;
use leadroute_runtime::RuntimeError;
use thiserror::Error;

use crate::partner::PartnerError;

/// SDK error type
#[derive(Error, Debug)]
pub enum SdkError {
    /// Lead failed validation; routing did not run
    #[error("Validation error: {0}")]
    Validation(String),

    /// Neither a rule nor the fallback chain produced a target
    #[error("No assignment possible: {0}")]
    NoMatch(String),

    /// Referenced record does not exist
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Storage collaborator failure
    #[error("Persistence error: {0}")]
    Persistence(RepositoryError),

    /// Partner submission failed
    #[error("Partner error: {0}")]
    Partner(#[from] PartnerError),

    /// Runtime error not covered by a more specific variant
    #[error("Runtime error: {0}")]
    Runtime(RuntimeError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<RepositoryError> for SdkError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound { kind, id } => SdkError::NotFound { kind, id },
            other => SdkError::Persistence(other),
        }
    }
}

impl From<RuntimeError> for SdkError {
    fn from(error: RuntimeError) -> Self {
        match error {
            RuntimeError::Repository(e) => e.into(),
            RuntimeError::DefaultCounsellorUnavailable(reason) => SdkError::NoMatch(reason),
            other => SdkError::Runtime(other),
        }
    }
}

impl From<CoreError> for SdkError {
    fn from(error: CoreError) -> Self {
        SdkError::Validation(error.to_string())
    }
}

/// Result type for SDK operations
pub type Result<T> = std::result::Result<T, SdkError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_from_core() {
        let error: SdkError = CoreError::MissingIdentity("email".to_string()).into();
        assert!(matches!(error, SdkError::Validation(_)));
        assert!(error.to_string().contains("email"));
    }

    #[test]
    fn test_repository_not_found_maps_to_not_found() {
        let error: SdkError = RepositoryError::NotFound {
            kind: "lead",
            id: "lead-1".to_string(),
        }
        .into();
        assert_eq!(error.to_string(), "lead not found: lead-1");
    }

    #[test]
    fn test_repository_failure_maps_to_persistence() {
        let error: SdkError = RepositoryError::Other("connection reset".to_string()).into();
        assert!(matches!(error, SdkError::Persistence(_)));
        assert!(error.to_string().contains("connection reset"));
    }

    #[test]
    fn test_runtime_mappings() {
        let nested: SdkError =
            RuntimeError::Repository(RepositoryError::Config("bad".to_string())).into();
        assert!(matches!(nested, SdkError::Persistence(_)));

        let no_default: SdkError =
            RuntimeError::DefaultCounsellorUnavailable("insert failed".to_string()).into();
        assert!(matches!(no_default, SdkError::NoMatch(_)));

        let other: SdkError = RuntimeError::Notification("closed".to_string()).into();
        assert!(matches!(other, SdkError::Runtime(_)));
    }

    #[test]
    fn test_partner_error_conversion() {
        let error: SdkError = PartnerError::Rejected("duplicate lead".to_string()).into();
        assert!(error.to_string().contains("Partner error"));
        assert!(error.to_string().contains("duplicate lead"));
    }
}
