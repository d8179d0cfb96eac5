//! Error types for the repository layer

use leadroute_core::CoreError;
use thiserror::Error;

/// Result type alias for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Errors that can occur during repository operations
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// Record not found
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Record failed domain validation
    #[error("Invalid record: {0}")]
    Invalid(#[from] CoreError),

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// JSON (de)serialization of stored columns
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Database error (when database feature is enabled)
    #[cfg(feature = "postgres")]
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Repository is misconfigured
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("Repository error: {0}")]
    Other(String),
}

impl RepositoryError {
    pub(crate) fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        RepositoryError::NotFound {
            kind,
            id: id.into(),
        }
    }
}
