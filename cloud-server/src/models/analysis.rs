//! Analysis request/response payloads

use serde::Serialize;
use urlguard_core::{AnalysisResult, FeatureRecord, ModelInfo};

/// Response for `POST /analyze_batch`
#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub results: Vec<AnalysisResult>,
}

/// Response for `POST /analyze_page`
#[derive(Debug, Serialize)]
pub struct PageAnalysisResponse {
    /// Record extracted from the snapshot
    pub features: FeatureRecord,
    pub result: AnalysisResult,
}

/// Response for `GET /model`
#[derive(Debug, Serialize)]
pub struct ModelResponse {
    pub model: ModelInfo,
    pub trusted_domains: Vec<String>,
    pub max_batch_size: usize,
}
