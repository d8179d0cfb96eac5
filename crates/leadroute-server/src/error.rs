//! Server error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use leadroute_sdk::SdkError;
use serde_json::json;
use std::fmt;

/// Server error type
#[derive(Debug)]
pub enum ServerError {
    /// Invalid request
    InvalidRequest(String),

    /// Not found
    NotFound(String),

    /// No rule or fallback could place the lead
    NoMatch(String),

    /// Routing engine or collaborator failure
    EngineError(String),

    /// Internal server error
    InternalError(String),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            ServerError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ServerError::NoMatch(msg) => write!(f, "No match: {}", msg),
            ServerError::EngineError(msg) => write!(f, "Engine error: {}", msg),
            ServerError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ServerError {}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::NoMatch(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServerError::EngineError(_) | ServerError::InternalError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = match self {
            ServerError::InvalidRequest(msg)
            | ServerError::NotFound(msg)
            | ServerError::NoMatch(msg)
            | ServerError::EngineError(msg)
            | ServerError::InternalError(msg) => msg,
        };

        let body = Json(json!({
            "error": error_message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

impl From<SdkError> for ServerError {
    fn from(err: SdkError) -> Self {
        match err {
            SdkError::Validation(msg) => ServerError::InvalidRequest(msg),
            SdkError::NotFound { .. } => ServerError::NotFound(err.to_string()),
            SdkError::NoMatch(msg) => ServerError::NoMatch(msg),
            other => ServerError::EngineError(other.to_string()),
        }
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(err: anyhow::Error) -> Self {
        ServerError::InternalError(err.to_string())
    }
}
