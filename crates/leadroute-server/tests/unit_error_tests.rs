//! Unit tests for server error mapping

use axum::{http::StatusCode, response::IntoResponse};
use http_body_util::BodyExt;
use leadroute_sdk::{PartnerError, SdkError};
use leadroute_server::error::ServerError;
use serde_json::Value;

#[test]
fn test_validation_maps_to_bad_request() {
    let err: ServerError = SdkError::Validation("email is required".to_string()).into();
    assert!(matches!(err, ServerError::InvalidRequest(_)));
    assert_eq!(err.status(), StatusCode::BAD_REQUEST);
}

#[test]
fn test_not_found_maps_to_404() {
    let err: ServerError = SdkError::NotFound {
        kind: "lead",
        id: "lead-9".to_string(),
    }
    .into();
    assert_eq!(err.status(), StatusCode::NOT_FOUND);
    assert!(err.to_string().contains("lead-9"));
}

#[test]
fn test_no_match_maps_to_422() {
    let err: ServerError = SdkError::NoMatch("no recon rule matched".to_string()).into();
    assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[test]
fn test_partner_failure_is_engine_error() {
    let err: ServerError = SdkError::Partner(PartnerError::Unavailable("timeout".to_string())).into();
    assert!(matches!(err, ServerError::EngineError(_)));
    assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn test_anyhow_error_conversion() {
    let err: ServerError = anyhow::anyhow!("something went wrong").into();
    assert!(err.to_string().contains("Internal error"));
    assert!(err.to_string().contains("something went wrong"));
}

#[tokio::test]
async fn test_error_body_shape() {
    let response = ServerError::InvalidRequest("bad input".to_string()).into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["error"], "bad input");
    assert_eq!(json["status"], 400);
}
