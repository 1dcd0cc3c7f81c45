//! URLGuard Core - Phishing classification with per-feature attribution
//!
//! Validates URL/page feature records, short-circuits trusted hosts, runs a
//! tree-ensemble classifier and explainer, and reassembles batch results in
//! input order. Transport-agnostic; the HTTP surface lives in the server.
#![recursion_limit = "256"]

pub mod constants;
pub mod logic;

#[cfg(test)]
mod fixtures;

pub use logic::analysis::{AnalysisError, AnalysisResult, Analyzer, BatchPlan};
pub use logic::explain::{AttributionMap, RankedAttribution};
pub use logic::features::{
    extract_features, parse_batch, parse_record, FeatureRecord, FeatureVector, FieldError, Loc,
    PageSnapshot,
};
pub use logic::model::{Classifier, Explainer, Label, ModelError, ModelHandle, ModelInfo, TreeEnsemble};
pub use logic::trust::TrustedDomains;
