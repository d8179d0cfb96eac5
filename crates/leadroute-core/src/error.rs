//! Error types for the routing core

use thiserror::Error;

/// Core error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// A rule failed structural validation
    #[error("Invalid rule {rule_id}: {reason}")]
    InvalidRule { rule_id: String, reason: String },

    /// A condition value could not be interpreted
    #[error("Invalid condition for field {field}: {reason}")]
    InvalidCondition { field: String, reason: String },

    /// Unrecognized tier, role or status label
    #[error("Unknown {kind}: {value}")]
    UnknownLabel { kind: &'static str, value: String },

    /// Lead identity fields are incomplete
    #[error("Lead identity incomplete: missing {0}")]
    MissingIdentity(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
