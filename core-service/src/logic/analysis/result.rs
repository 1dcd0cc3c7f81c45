use serde::Serialize;

use crate::logic::explain::{AttributionMap, Explanation, RankedAttribution};
use crate::logic::model::Label;

/// Outcome for one record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisResult {
    pub prediction: Label,
    pub top_attributions: Vec<RankedAttribution>,
    pub full_attributions: AttributionMap,
    /// Only set when the model was bypassed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl AnalysisResult {
    pub fn from_model(prediction: Label, explanation: Explanation) -> Self {
        Self {
            prediction,
            top_attributions: explanation.top,
            full_attributions: explanation.full,
            reason: None,
        }
    }

    /// Synthetic result for a host on the trusted list
    pub fn trusted(host: &str) -> Self {
        Self {
            prediction: Label::Legitimate,
            top_attributions: Vec::new(),
            full_attributions: AttributionMap::new(),
            reason: Some(format!("Trusted domain: {}", host)),
        }
    }

    pub fn is_bypass(&self) -> bool {
        self.reason.is_some()
    }
}
