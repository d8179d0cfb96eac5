//! API endpoint handlers

use super::extractors::JsonExtractor;
use super::types::*;
use crate::error::ServerError;
use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use leadroute_core::ConditionNormalizer;
use leadroute_repository::AssignmentLogEntry;
use leadroute_sdk::{
    AssignmentResult, L3Query, LeadAssignment, MetricsSnapshot, SdkError, SweepReport,
    UniversityRouting,
};
use serde_json::{Map, Value};
use std::time::Instant;
use tracing::info;

type RawLead = Map<String, Value>;

/// Health check endpoint
pub(super) async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Metrics snapshot as JSON
pub(super) async fn metrics(
    State(state): State<AppState>,
) -> Result<Json<MetricsSnapshot>, ServerError> {
    state
        .engine
        .metrics()
        .map(|metrics| Json(metrics.snapshot()))
        .ok_or_else(|| ServerError::NotFound("metrics are disabled".to_string()))
}

/// Route an inbound lead to an L2 counsellor without persisting it
pub(super) async fn route_lead(
    State(state): State<AppState>,
    JsonExtractor(raw): JsonExtractor<RawLead>,
) -> Result<Json<RouteResponsePayload>, ServerError> {
    info!("Received routing request with {} lead fields", raw.len());
    let started = Instant::now();

    let result = state.engine.route_raw(&raw).await?;
    Ok(Json(timed(result, started)))
}

/// Route a lead and persist the assignment
pub(super) async fn assign_lead(
    State(state): State<AppState>,
    Path(lead_id): Path<String>,
    JsonExtractor(raw): JsonExtractor<RawLead>,
) -> Result<Json<LeadAssignment>, ServerError> {
    let lead = ConditionNormalizer::normalize(&raw);
    let assignment = state.engine.assign_lead(&lead_id, &lead).await?;
    Ok(Json(assignment))
}

/// Assignment history of a lead
pub(super) async fn lead_logs(
    State(state): State<AppState>,
    Path(lead_id): Path<String>,
) -> Result<Json<Vec<AssignmentLogEntry>>, ServerError> {
    let repository = state.engine.repository();
    let exists = repository
        .find_lead(&lead_id)
        .await
        .map_err(SdkError::from)?
        .is_some();
    if !exists {
        return Err(ServerError::NotFound(format!("lead {}", lead_id)));
    }

    let logs = repository
        .assignment_logs(&lead_id)
        .await
        .map_err(SdkError::from)?;
    Ok(Json(logs))
}

/// Hand a lead to an L3 counsellor
pub(super) async fn route_l3(
    State(state): State<AppState>,
    JsonExtractor(query): JsonExtractor<L3Query>,
) -> Result<Json<RouteResponsePayload>, ServerError> {
    let started = Instant::now();
    let result = state.engine.route_l3(&query).await?;
    Ok(Json(timed(result, started)))
}

/// Route a lead to a partner university and submit it
pub(super) async fn route_recon(
    State(state): State<AppState>,
    JsonExtractor(raw): JsonExtractor<RawLead>,
) -> Result<Json<UniversityRouting>, ServerError> {
    let lead = ConditionNormalizer::normalize(&raw);
    let routing = state.engine.route_university(&lead).await?;
    Ok(Json(routing))
}

/// Run one reassignment sweep cycle now
pub(super) async fn run_sweep(
    State(state): State<AppState>,
) -> Result<Json<SweepReport>, ServerError> {
    let report = state.sweep.run_once(Utc::now()).await?;
    info!("Manual sweep processed {} leads", report.results.len());
    Ok(Json(report))
}

fn timed(result: AssignmentResult, started: Instant) -> RouteResponsePayload {
    RouteResponsePayload {
        result,
        process_time_ms: started.elapsed().as_millis() as u64,
    }
}
