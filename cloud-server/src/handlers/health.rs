//! Health check handler

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    core_version: &'static str,
    model_trees: usize,
    timestamp: i64,
}

pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        core_version: urlguard_core::constants::CORE_VERSION,
        model_trees: state.analyzer.models().info().tree_count,
        timestamp: chrono::Utc::now().timestamp(),
    })
}
