//! Model metadata handler

use axum::{extract::State, Json};

use crate::models::ModelResponse;
use crate::AppState;

/// Loaded model and active trust settings
pub async fn info(State(state): State<AppState>) -> Json<ModelResponse> {
    Json(ModelResponse {
        model: state.analyzer.models().info().clone(),
        trusted_domains: state.analyzer.trusted_domains().domains().to_vec(),
        max_batch_size: state.config.max_batch_size,
    })
}
