//! Analysis handlers
//!
//! Bodies are validated on the async side; model work runs on the
//! blocking pool.

use axum::{extract::State, Json};
use urlguard_core::{
    extract_features, parse_batch, parse_record, AnalysisError, AnalysisResult, FieldError, Loc,
    PageSnapshot,
};

use crate::extract::JsonBody;
use crate::models::{BatchResponse, PageAnalysisResponse};
use crate::{AppError, AppResult, AppState};

fn body_loc() -> Vec<Loc> {
    vec![Loc::from("body")]
}

/// Analyze one feature record (no trusted-domain bypass)
pub async fn analyze(
    State(state): State<AppState>,
    JsonBody(body): JsonBody,
) -> AppResult<Json<AnalysisResult>> {
    let record = match parse_record(&body, &body_loc()) {
        Ok(record) => record,
        Err(errors) => return Err(AppError::Validation { errors, body }),
    };

    let analyzer = state.analyzer.clone();
    let result = tokio::task::spawn_blocking(move || analyzer.analyze(&record)).await??;

    tracing::debug!("Prediction: {}", result.prediction);
    Ok(Json(result))
}

/// Analyze `{"inputs": [...]}`; results follow input order
pub async fn analyze_batch(
    State(state): State<AppState>,
    JsonBody(body): JsonBody,
) -> AppResult<Json<BatchResponse>> {
    let records = match parse_batch(&body, &body_loc(), state.config.max_batch_size) {
        Ok(records) => records,
        Err(errors) => return Err(AppError::Validation { errors, body }),
    };
    if records.is_empty() {
        return Ok(Json(BatchResponse { results: Vec::new() }));
    }

    let analyzer = state.analyzer.clone();
    let results = tokio::task::spawn_blocking(move || analyzer.analyze_batch(&records)).await??;

    tracing::debug!("Batch of {} analyzed", results.len());
    Ok(Json(BatchResponse { results }))
}

/// Extract features from a raw page snapshot, then analyze them
pub async fn analyze_page(
    State(state): State<AppState>,
    JsonBody(body): JsonBody,
) -> AppResult<Json<PageAnalysisResponse>> {
    let snapshot: PageSnapshot = match serde_json::from_value(body.clone()) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            let errors = vec![FieldError::new(body_loc(), e.to_string(), "model_attributes_type")];
            return Err(AppError::Validation { errors, body });
        }
    };
    let record = match extract_features(&snapshot) {
        Ok(record) => record,
        Err(e) => {
            let loc = vec![Loc::from("body"), Loc::from("url")];
            let errors = vec![FieldError::new(loc, e.to_string(), "url_parsing")];
            return Err(AppError::Validation { errors, body });
        }
    };

    let analyzer = state.analyzer.clone();
    let response = tokio::task::spawn_blocking(move || {
        let result = analyzer.analyze(&record)?;
        Ok::<_, AnalysisError>(PageAnalysisResponse { features: record, result })
    })
    .await??;

    Ok(Json(response))
}
