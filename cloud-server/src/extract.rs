//! Request body extractor
//!
//! Bodies are parsed to an untyped `Value` first so that schema problems
//! can be reported per field together with the body that caused them.

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde_json::Value;
use urlguard_core::{FieldError, Loc};

use crate::AppError;

/// Raw JSON request body
pub struct JsonBody(pub Value);

#[axum::async_trait]
impl<S> FromRequest<S> for JsonBody
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state).await.map_err(|rejection| AppError::Validation {
            errors: vec![FieldError::new(vec![Loc::from("body")], rejection.body_text(), "body_read")],
            body: Value::Null,
        })?;

        match serde_json::from_slice(&bytes) {
            Ok(value) => Ok(JsonBody(value)),
            Err(e) => Err(AppError::Validation {
                errors: vec![FieldError::new(
                    vec![Loc::from("body"), Loc::from(e.column())],
                    format!("JSON decode error: {}", e),
                    "json_invalid",
                )],
                body: Value::String(String::from_utf8_lossy(&bytes).into_owned()),
            }),
        }
    }
}
