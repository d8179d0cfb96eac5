//! Router creation and configuration

use super::handlers::*;
use super::types::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use leadroute_sdk::{ReassignmentSweep, RoutingEngine};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create REST API router
pub fn create_router(engine: Arc<RoutingEngine>, sweep: Arc<ReassignmentSweep>) -> Router {
    let state = AppState { engine, sweep };

    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/v1/leads/route", post(route_lead))
        .route("/v1/leads/:lead_id/assign", post(assign_lead))
        .route("/v1/leads/:lead_id/logs", get(lead_logs))
        .route("/v1/l3/route", post(route_l3))
        .route("/v1/recon/route", post(route_recon))
        .route("/v1/sweep/run", post(run_sweep))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
