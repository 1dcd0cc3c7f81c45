//! Batch Coordinator
//!
//! Splits a batch into trusted (bypassed) and model-bound records, runs
//! the classifier and explainer once over the model-bound rows, then
//! scatters results back to their original positions.

use std::time::Instant;

use super::error::AnalysisError;
use super::result::AnalysisResult;
use crate::logic::explain;
use crate::logic::features::{FeatureRecord, FeatureVector};
use crate::logic::model::ModelHandle;
use crate::logic::trust::TrustedDomains;

/// Index map produced by partitioning a batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchPlan {
    /// (original index, matched hostname)
    pub bypass: Vec<(usize, String)>,
    /// Original indices, in input order
    pub model_bound: Vec<usize>,
}

impl BatchPlan {
    pub fn partition(records: &[FeatureRecord], trusted: &TrustedDomains) -> Self {
        let mut plan = Self::default();
        for (index, record) in records.iter().enumerate() {
            match record.origin_host().and_then(|host| trusted.matched_host(&host)) {
                Some(host) => plan.bypass.push((index, host)),
                None => plan.model_bound.push(index),
            }
        }
        plan
    }

    pub fn len(&self) -> usize {
        self.bypass.len() + self.model_bound.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Request handler core; cheap to share across threads
#[derive(Debug, Clone)]
pub struct Analyzer {
    models: ModelHandle,
    trusted: TrustedDomains,
}

impl Analyzer {
    pub fn new(models: ModelHandle, trusted: TrustedDomains) -> Self {
        Self { models, trusted }
    }

    pub fn models(&self) -> &ModelHandle {
        &self.models
    }

    pub fn trusted_domains(&self) -> &TrustedDomains {
        &self.trusted
    }

    /// Analyze one record.
    ///
    /// Always runs the model: the trusted-domain bypass applies to
    /// batches only.
    pub fn analyze(&self, record: &FeatureRecord) -> Result<AnalysisResult, AnalysisError> {
        let started = Instant::now();
        let mut results = self.run_models(&[record.to_vector()])?;
        let result = results
            .pop()
            .ok_or_else(|| AnalysisError::Internal("model returned no result".to_string()))?;

        log::debug!(
            "Record analyzed: {} in {:?}",
            result.prediction,
            started.elapsed()
        );
        Ok(result)
    }

    /// Analyze a batch; `result[i]` always belongs to `records[i]`.
    ///
    /// One failing model call fails the whole batch.
    pub fn analyze_batch(&self, records: &[FeatureRecord]) -> Result<Vec<AnalysisResult>, AnalysisError> {
        let started = Instant::now();
        let plan = BatchPlan::partition(records, &self.trusted);

        let mut slots: Vec<Option<AnalysisResult>> = vec![None; records.len()];
        for (index, host) in &plan.bypass {
            slots[*index] = Some(AnalysisResult::trusted(host));
        }

        if !plan.model_bound.is_empty() {
            let rows: Vec<FeatureVector> = plan
                .model_bound
                .iter()
                .map(|&index| records[index].to_vector())
                .collect();
            let results = self.run_models(&rows)?;
            for (&index, result) in plan.model_bound.iter().zip(results) {
                slots[index] = Some(result);
            }
        }

        let results = slots
            .into_iter()
            .collect::<Option<Vec<AnalysisResult>>>()
            .ok_or_else(|| AnalysisError::Internal("batch reassembly left an empty slot".to_string()))?;

        log::info!(
            "Batch analyzed: {} records ({} trusted, {} model-bound) in {:?}",
            records.len(),
            plan.bypass.len(),
            plan.model_bound.len(),
            started.elapsed()
        );
        Ok(results)
    }

    /// One classifier call and one explainer call over `rows`
    fn run_models(&self, rows: &[FeatureVector]) -> Result<Vec<AnalysisResult>, AnalysisError> {
        let labels = self.models.classifier().predict(rows)?;
        let attributions = self.models.explainer().explain(rows)?;

        if labels.len() != rows.len() || attributions.len() != rows.len() {
            return Err(AnalysisError::Internal(format!(
                "model returned {} labels and {} attribution maps for {} rows",
                labels.len(),
                attributions.len(),
                rows.len()
            )));
        }

        Ok(labels
            .into_iter()
            .zip(attributions)
            .map(|(label, map)| AnalysisResult::from_model(label, explain::explain(map)))
            .collect())
    }
}
