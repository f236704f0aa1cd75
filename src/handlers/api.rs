use std::sync::Arc;

use axum::{extract::State, response::Json};
use serde::Serialize;

use crate::core::pipeline::PipelineStats;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub backend: &'static str,
}

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let status = if state.pipeline.is_shut_down() {
        "SHUTTING_DOWN"
    } else {
        "OK"
    };
    Json(HealthResponse {
        status,
        backend: state.pipeline.backend_name(),
    })
}

/// Cache, quota and outcome counters
pub async fn pipeline_stats(State(state): State<Arc<AppState>>) -> Json<PipelineStats> {
    Json(state.pipeline.stats())
}
