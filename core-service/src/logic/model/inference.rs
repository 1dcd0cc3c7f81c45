//! Inference Interfaces
//!
//! Narrow seams between the analysis coordinator and the trained model.
//! Adapters take `&self` only: a loaded model is never mutated, so one
//! `ModelHandle` is shared by every concurrent request without locking.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::ensemble::TreeEnsemble;
use crate::logic::explain::AttributionMap;
use crate::logic::features::{FeatureVector, LayoutInfo};

// ============================================================================
// LABELS & ERRORS
// ============================================================================

/// Binary decision. Class 1 is legitimate, class 0 is phishing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Phishing,
    Legitimate,
}

impl Label {
    pub fn from_class(class: u8) -> Option<Self> {
        match class {
            0 => Some(Label::Phishing),
            1 => Some(Label::Legitimate),
            _ => None,
        }
    }

    pub fn class(self) -> u8 {
        match self {
            Label::Phishing => 0,
            Label::Legitimate => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Label::Phishing => "phishing",
            Label::Legitimate => "legitimate",
        }
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    /// Input rows do not match the column set the model expects
    #[error("{0}")]
    Shape(String),
    #[error("model runtime error: {0}")]
    Runtime(String),
    #[error("model load error: {0}")]
    Load(String),
}

// ============================================================================
// ADAPTER TRAITS
// ============================================================================

/// Maps rows to labels, one per row, in input order
pub trait Classifier: Send + Sync {
    fn predict(&self, rows: &[FeatureVector]) -> Result<Vec<Label>, ModelError>;
}

/// Maps rows to per-feature contributions, one map per row, in input order
pub trait Explainer: Send + Sync {
    fn explain(&self, rows: &[FeatureVector]) -> Result<Vec<AttributionMap>, ModelError>;
}

// ============================================================================
// MODEL HANDLE
// ============================================================================

/// Model metadata exposed read-only
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelInfo {
    pub model_path: String,
    pub model_type: String,
    pub sha256: String,
    pub tree_count: usize,
    pub feature_count: usize,
    pub base_score: f64,
    pub layout: LayoutInfo,
    pub loaded_at: chrono::DateTime<chrono::Utc>,
}

impl ModelInfo {
    /// Metadata for adapters not loaded from an artifact
    pub fn new(model_type: &str, model_path: &str) -> Self {
        Self {
            model_path: model_path.to_string(),
            model_type: model_type.to_string(),
            sha256: String::new(),
            tree_count: 0,
            feature_count: crate::logic::features::FEATURE_COUNT,
            base_score: crate::constants::DEFAULT_BASE_SCORE,
            layout: LayoutInfo::current(),
            loaded_at: chrono::Utc::now(),
        }
    }
}

/// Immutable, shareable classifier + explainer pair
#[derive(Clone)]
pub struct ModelHandle {
    classifier: Arc<dyn Classifier>,
    explainer: Arc<dyn Explainer>,
    info: Arc<ModelInfo>,
}

impl ModelHandle {
    pub fn new(classifier: Arc<dyn Classifier>, explainer: Arc<dyn Explainer>, info: ModelInfo) -> Self {
        Self {
            classifier,
            explainer,
            info: Arc::new(info),
        }
    }

    /// Load a tree-ensemble artifact; the same ensemble serves both roles
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        log::info!("Loading model from: {}", path.display());

        let bytes = std::fs::read(path)
            .map_err(|e| ModelError::Load(format!("cannot read {}: {}", path.display(), e)))?;
        let ensemble = TreeEnsemble::from_slice(&bytes)?;
        let sha256 = hex::encode(Sha256::digest(&bytes));

        let info = ModelInfo {
            model_path: path.display().to_string(),
            model_type: "tree_ensemble".to_string(),
            sha256,
            tree_count: ensemble.tree_count(),
            feature_count: ensemble.feature_count(),
            base_score: ensemble.base_score(),
            layout: LayoutInfo::current(),
            loaded_at: chrono::Utc::now(),
        };
        log::info!(
            "Model loaded: {} trees, sha256={}",
            info.tree_count,
            info.sha256
        );

        let ensemble = Arc::new(ensemble);
        Ok(Self::new(ensemble.clone(), ensemble, info))
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    pub fn explainer(&self) -> &dyn Explainer {
        self.explainer.as_ref()
    }

    pub fn info(&self) -> &ModelInfo {
        &self.info
    }
}

impl std::fmt::Debug for ModelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelHandle").field("info", &self.info).finish_non_exhaustive()
    }
}
