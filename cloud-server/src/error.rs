//! Error handling
//!
//! The only place analysis failures become HTTP responses.

use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use urlguard_core::{AnalysisError, FieldError};

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    /// Field-level problems, echoed with the request body (422)
    Validation { errors: Vec<FieldError>, body: Value },

    /// Input the model rejects (400)
    InvalidValue(String),

    // Generic errors
    InternalError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Validation { errors, body } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "detail": errors, "body": body }),
            ),
            AppError::InvalidValue(msg) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": format!("ValueError: {}", msg), "status": 400 }),
            ),
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal server error", "status": 500 }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<AnalysisError> for AppError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::Validation(errors) => AppError::Validation { errors, body: Value::Null },
            AnalysisError::InvalidValue(msg) => AppError::InvalidValue(msg),
            AnalysisError::Internal(msg) => AppError::InternalError(msg),
        }
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::InternalError(format!("analysis task failed: {}", err))
    }
}
