//! REST API type definitions

use leadroute_sdk::{AssignmentResult, ReassignmentSweep, RoutingEngine};
use serde::Serialize;
use std::sync::Arc;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RoutingEngine>,
    pub sweep: Arc<ReassignmentSweep>,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Routing decision plus timing
#[derive(Debug, Serialize)]
pub struct RouteResponsePayload {
    #[serde(flatten)]
    pub result: AssignmentResult,

    /// Processing time in milliseconds
    pub process_time_ms: u64,
}
