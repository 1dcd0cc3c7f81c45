use crate::logic::features::FieldError;
use crate::logic::model::ModelError;

/// Failure kinds of an analysis call
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalysisError {
    /// Request body failed schema checks; never reaches a model
    #[error("validation failed with {} field error(s)", .0.len())]
    Validation(Vec<FieldError>),
    /// Well-formed input the model rejects
    #[error("{0}")]
    InvalidValue(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ModelError> for AnalysisError {
    fn from(error: ModelError) -> Self {
        match error {
            ModelError::Shape(msg) => AnalysisError::InvalidValue(msg),
            other => AnalysisError::Internal(other.to_string()),
        }
    }
}

impl From<Vec<FieldError>> for AnalysisError {
    fn from(errors: Vec<FieldError>) -> Self {
        AnalysisError::Validation(errors)
    }
}
