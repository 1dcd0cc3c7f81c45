use std::io::Write;
use std::sync::{Arc, Mutex};

use serde_json::json;

use super::{AnalysisError, AnalysisResult, Analyzer, BatchPlan};
use crate::constants::TOP_K;
use crate::fixtures::{record_with, sample_record};
use crate::logic::explain::AttributionMap;
use crate::logic::features::{FeatureRecord, FeatureVector, FEATURE_COUNT, FEATURE_LAYOUT};
use crate::logic::model::{Classifier, Explainer, Label, ModelError, ModelHandle, ModelInfo, TreeEnsemble};
use crate::logic::trust::TrustedDomains;

// ============================================================================
// STUB ADAPTERS
// ============================================================================

/// Records every call; labels by URLLength, attributions = value / 1000
#[derive(Default)]
struct StubModel {
    predict_calls: Mutex<Vec<usize>>,
    explain_calls: Mutex<Vec<usize>>,
    failure: Option<ModelError>,
    drop_last: bool,
}

impl StubModel {
    fn failing(error: ModelError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    fn predict_calls(&self) -> Vec<usize> {
        self.predict_calls.lock().unwrap().clone()
    }

    fn explain_calls(&self) -> Vec<usize> {
        self.explain_calls.lock().unwrap().clone()
    }
}

impl Classifier for StubModel {
    fn predict(&self, rows: &[FeatureVector]) -> Result<Vec<Label>, ModelError> {
        self.predict_calls.lock().unwrap().push(rows.len());
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        let mut labels: Vec<Label> = rows
            .iter()
            .map(|row| if row.values[0] < 50.0 { Label::Legitimate } else { Label::Phishing })
            .collect();
        if self.drop_last {
            labels.pop();
        }
        Ok(labels)
    }
}

impl Explainer for StubModel {
    fn explain(&self, rows: &[FeatureVector]) -> Result<Vec<AttributionMap>, ModelError> {
        self.explain_calls.lock().unwrap().push(rows.len());
        Ok(rows
            .iter()
            .map(|row| {
                AttributionMap::from_entries(
                    FEATURE_LAYOUT
                        .iter()
                        .zip(row.values.iter())
                        .map(|(spec, value)| (spec.name.to_string(), *value as f64 / 1000.0))
                        .collect(),
                )
            })
            .collect())
    }
}

fn analyzer(stub: &Arc<StubModel>) -> Analyzer {
    let handle = ModelHandle::new(stub.clone(), stub.clone(), ModelInfo::new("stub", "<memory>"));
    Analyzer::new(handle, TrustedDomains::default())
}

fn phishing(url_length: u32, host: &str) -> FeatureRecord {
    record_with(json!({ "URLLength": url_length, "hostname": host }))
}

fn trusted(host: &str) -> FeatureRecord {
    record_with(json!({ "URLLength": 999, "hostname": host }))
}

// ============================================================================
// BATCH COORDINATION
// ============================================================================

#[test]
fn test_partition_keeps_input_order() {
    let records = vec![
        phishing(80, "evil.io"),
        trusted("github.com"),
        sample_record(),
        trusted("www.LinkedIn.com"),
    ];
    let plan = BatchPlan::partition(&records, &TrustedDomains::default());

    assert_eq!(plan.model_bound, vec![0, 2]);
    assert_eq!(
        plan.bypass,
        vec![(1, "github.com".to_string()), (3, "linkedin.com".to_string())]
    );
    assert_eq!(plan.len(), 4);
}

#[test]
fn test_trusted_record_bypasses_model() {
    let stub = Arc::new(StubModel::default());
    let results = analyzer(&stub).analyze_batch(&[trusted("www.LinkedIn.com")]).unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].prediction, Label::Legitimate);
    assert_eq!(results[0].reason.as_deref(), Some("Trusted domain: linkedin.com"));
    assert!(results[0].top_attributions.is_empty());
    assert!(results[0].full_attributions.is_empty());
    assert!(stub.predict_calls().is_empty());
    assert!(stub.explain_calls().is_empty());
}

#[test]
fn test_trust_uses_url_when_hostname_absent() {
    let stub = Arc::new(StubModel::default());
    let record = record_with(json!({ "URL": "https://docs.github.com/en" }));
    let results = analyzer(&stub).analyze_batch(&[record]).unwrap();

    assert_eq!(results[0].reason.as_deref(), Some("Trusted domain: docs.github.com"));
    assert!(stub.predict_calls().is_empty());
}

#[test]
fn test_lookalike_host_goes_to_model() {
    let stub = Arc::new(StubModel::default());
    let results = analyzer(&stub)
        .analyze_batch(&[phishing(80, "evil-linkedin.com")])
        .unwrap();

    assert_eq!(results[0].prediction, Label::Phishing);
    assert!(results[0].reason.is_none());
    assert_eq!(stub.predict_calls(), vec![1]);
}

#[test]
fn test_mixed_batch_preserves_order_with_one_call_pair() {
    let stub = Arc::new(StubModel::default());
    let records = vec![
        phishing(80, "evil.io"),
        trusted("github.com"),
        phishing(10, "shop.example"),
        trusted("www.LinkedIn.com"),
        phishing(95, "login-paypa1.com"),
    ];
    let results = analyzer(&stub).analyze_batch(&records).unwrap();

    assert_eq!(results.len(), records.len());
    assert_eq!(stub.predict_calls(), vec![3]);
    assert_eq!(stub.explain_calls(), vec![3]);

    assert_eq!(results[0].prediction, Label::Phishing);
    assert_eq!(results[0].full_attributions.get("URLLength"), Some(0.08));
    assert_eq!(results[1].reason.as_deref(), Some("Trusted domain: github.com"));
    assert_eq!(results[2].prediction, Label::Legitimate);
    assert_eq!(results[2].full_attributions.get("URLLength"), Some(0.01));
    assert_eq!(results[3].reason.as_deref(), Some("Trusted domain: linkedin.com"));
    assert_eq!(results[4].prediction, Label::Phishing);
    assert_eq!(results[4].full_attributions.get("URLLength"), Some(0.095));
}

#[test]
fn test_trusted_then_phishing_example() {
    let stub = Arc::new(StubModel::default());
    let results = analyzer(&stub)
        .analyze_batch(&[trusted("google.com"), phishing(120, "g00gle-login.xyz")])
        .unwrap();

    assert!(results[0].is_bypass());
    assert_eq!(results[1].prediction, Label::Phishing);
    assert_eq!(results[1].top_attributions.len(), TOP_K);
    assert_eq!(stub.predict_calls(), vec![1]);
    assert_eq!(stub.explain_calls(), vec![1]);
}

#[test]
fn test_empty_and_all_trusted_batches_skip_model() {
    let stub = Arc::new(StubModel::default());
    let analyzer = analyzer(&stub);

    assert!(analyzer.analyze_batch(&[]).unwrap().is_empty());
    let results = analyzer
        .analyze_batch(&[trusted("apple.com"), trusted("a.b.amazon.com")])
        .unwrap();

    assert_eq!(results.len(), 2);
    assert!(results.iter().all(AnalysisResult::is_bypass));
    assert!(stub.predict_calls().is_empty());
    assert!(stub.explain_calls().is_empty());
}

#[test]
fn test_model_failure_fails_whole_batch() {
    let stub = Arc::new(StubModel::failing(ModelError::Runtime("tree walk failed".to_string())));
    let result = analyzer(&stub).analyze_batch(&[trusted("github.com"), phishing(80, "evil.io")]);

    assert!(matches!(result, Err(AnalysisError::Internal(_))));
    assert_eq!(stub.predict_calls(), vec![1]);
}

#[test]
fn test_shape_failure_is_value_error() {
    let stub = Arc::new(StubModel::failing(ModelError::Shape("wrong column set".to_string())));
    let result = analyzer(&stub).analyze_batch(&[phishing(80, "evil.io")]);

    assert_eq!(result, Err(AnalysisError::InvalidValue("wrong column set".to_string())));
}

#[test]
fn test_failing_model_is_not_touched_by_trusted_batch() {
    let stub = Arc::new(StubModel::failing(ModelError::Runtime("unreachable".to_string())));
    let results = analyzer(&stub).analyze_batch(&[trusted("github.com")]).unwrap();

    assert!(results[0].is_bypass());
    assert!(stub.predict_calls().is_empty());
}

#[test]
fn test_short_model_output_is_internal_error() {
    let stub = Arc::new(StubModel {
        drop_last: true,
        ..StubModel::default()
    });
    let result = analyzer(&stub).analyze_batch(&[phishing(80, "a.io"), phishing(70, "b.io")]);

    assert!(matches!(result, Err(AnalysisError::Internal(_))));
}

// ============================================================================
// SINGLE RECORD
// ============================================================================

#[test]
fn test_single_record_path_skips_trust_bypass() {
    // Unlike batches, a single record always reaches the model
    let stub = Arc::new(StubModel::default());
    let result = analyzer(&stub).analyze(&trusted("www.LinkedIn.com")).unwrap();

    assert_eq!(result.prediction, Label::Phishing);
    assert!(result.reason.is_none());
    assert_eq!(stub.predict_calls(), vec![1]);
    assert_eq!(stub.explain_calls(), vec![1]);
}

#[test]
fn test_single_record_is_idempotent() {
    let stub = Arc::new(StubModel::default());
    let analyzer = analyzer(&stub);
    let record = sample_record();

    let first = analyzer.analyze(&record).unwrap();
    let second = analyzer.analyze(&record).unwrap();

    assert_eq!(first, second);
    assert_eq!(first.full_attributions.len(), FEATURE_COUNT);
}

#[test]
fn test_result_wire_shape() {
    let bypass = serde_json::to_value(AnalysisResult::trusted("linkedin.com")).unwrap();
    assert_eq!(
        bypass,
        json!({
            "prediction": "legitimate",
            "top_attributions": [],
            "full_attributions": {},
            "reason": "Trusted domain: linkedin.com",
        })
    );

    let stub = Arc::new(StubModel::default());
    let modeled = serde_json::to_value(analyzer(&stub).analyze(&sample_record()).unwrap()).unwrap();
    assert_eq!(modeled["prediction"], "phishing");
    assert!(modeled.get("reason").is_none());
    assert_eq!(modeled["top_attributions"][0]["feature"], "LargestLineLength");
    assert_eq!(modeled["top_attributions"][0]["explanation"], "No explanation available");
    assert_eq!(modeled["full_attributions"]["URLLength"], 0.08);
}

// ============================================================================
// WITH A LOADED ENSEMBLE
// ============================================================================

#[test]
fn test_loaded_model_end_to_end() {
    let artifact = json!({
        "base_score": 0.5,
        "trees": [{
            "nodeid": 0, "split": "IsHTTPS", "split_condition": 0.5,
            "yes": 1, "no": 2, "missing": 1, "cover": 10.0,
            "children": [
                { "nodeid": 1, "leaf": -1.5, "cover": 4.0 },
                {
                    "nodeid": 2, "split": "URLLength", "split_condition": 100.0,
                    "yes": 3, "no": 4, "missing": 3, "cover": 6.0,
                    "children": [
                        { "nodeid": 3, "leaf": 1.1, "cover": 5.0 },
                        { "nodeid": 4, "leaf": -0.4, "cover": 1.0 }
                    ]
                }
            ]
        }]
    });
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(artifact.to_string().as_bytes()).unwrap();

    let handle = ModelHandle::load(file.path()).unwrap();
    assert_eq!(handle.info().tree_count, 1);
    assert_eq!(handle.info().sha256.len(), 64);
    assert_eq!(handle.info().feature_count, FEATURE_COUNT);

    let analyzer = Analyzer::new(handle, TrustedDomains::default());
    let record = sample_record();
    let result = analyzer.analyze(&record).unwrap();
    assert_eq!(result.prediction, Label::Legitimate);

    let top: Vec<&str> = result.top_attributions.iter().map(|r| r.feature.as_str()).collect();
    assert_eq!(&top[..2], &["IsHTTPS", "URLLength"]);
    assert!(result.top_attributions.len() <= TOP_K);
    assert!(result
        .top_attributions
        .windows(2)
        .all(|pair| pair[0].value.abs() >= pair[1].value.abs()));

    let ensemble = TreeEnsemble::from_slice(artifact.to_string().as_bytes()).unwrap();
    let vector = record.to_vector();
    let expected = ensemble.margin(&vector) - ensemble.expected_value();
    assert!((result.full_attributions.total() - expected).abs() < 1e-9);
}

#[test]
fn test_load_missing_file_is_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = ModelHandle::load(dir.path().join("absent.json"));
    assert!(matches!(result, Err(ModelError::Load(_))));
}
