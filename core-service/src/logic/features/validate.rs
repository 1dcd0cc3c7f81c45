//! Record Validation
//!
//! Turns an untyped JSON body into `FeatureRecord`s, collecting every
//! field-level problem instead of stopping at the first one.
//!
//! Two passes:
//! 1. Structure: object shape, required fields, JSON types, unknown keys
//! 2. Ranges: `validator` rules declared on `UrlFeatures`

use serde::Serialize;
use serde_json::{Map, Value};
use validator::{Validate, ValidationErrors};

use super::layout::{feature_index, find_spec, FeatureKind, FEATURE_LAYOUT};
use super::record::{FeatureRecord, MetadataKind, PageMetadata, UrlFeatures, METADATA_FIELDS};

// ============================================================================
// ERROR TYPES
// ============================================================================

/// One segment of an error location
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Loc {
    Key(String),
    Index(usize),
}

impl From<&str> for Loc {
    fn from(key: &str) -> Self {
        Loc::Key(key.to_string())
    }
}

impl From<usize> for Loc {
    fn from(index: usize) -> Self {
        Loc::Index(index)
    }
}

/// Field-level validation error
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub loc: Vec<Loc>,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl FieldError {
    pub fn new(loc: Vec<Loc>, msg: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            loc,
            msg: msg.into(),
            kind: kind.into(),
        }
    }

    /// Last key segment of the location (usually the field name)
    pub fn field(&self) -> Option<&str> {
        self.loc.iter().rev().find_map(|segment| match segment {
            Loc::Key(key) => Some(key.as_str()),
            Loc::Index(_) => None,
        })
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let path: Vec<String> = self
            .loc
            .iter()
            .map(|segment| match segment {
                Loc::Key(key) => key.clone(),
                Loc::Index(index) => index.to_string(),
            })
            .collect();
        write!(f, "{}: {} ({})", path.join("."), self.msg, self.kind)
    }
}

fn child(prefix: &[Loc], segment: impl Into<Loc>) -> Vec<Loc> {
    let mut loc = prefix.to_vec();
    loc.push(segment.into());
    loc
}

// ============================================================================
// SINGLE RECORD
// ============================================================================

/// Validate one record located at `prefix` in the request body
pub fn parse_record(value: &Value, prefix: &[Loc]) -> Result<FeatureRecord, Vec<FieldError>> {
    let Some(object) = value.as_object() else {
        return Err(vec![FieldError::new(
            prefix.to_vec(),
            "Input should be a valid dictionary or object",
            "dict_type",
        )]);
    };

    let mut errors = check_structure(object, prefix);
    if !errors.is_empty() {
        return Err(errors);
    }

    let features: UrlFeatures = serde_json::from_value(value.clone())
        .map_err(|e| vec![FieldError::new(prefix.to_vec(), e.to_string(), "value_error")])?;
    let metadata: PageMetadata = serde_json::from_value(value.clone())
        .map_err(|e| vec![FieldError::new(prefix.to_vec(), e.to_string(), "value_error")])?;

    if let Err(report) = features.validate() {
        errors.extend(range_errors(&report, prefix));
    }
    if metadata.has_title.is_some_and(|flag| flag > 1) {
        errors.push(FieldError::new(child(prefix, "HasTitle"), "Input should be 0 or 1", "range"));
    }

    if errors.is_empty() {
        Ok(FeatureRecord::new(features, metadata))
    } else {
        Err(errors)
    }
}

fn check_structure(object: &Map<String, Value>, prefix: &[Loc]) -> Vec<FieldError> {
    let mut errors = Vec::new();

    for spec in FEATURE_LAYOUT {
        let loc = child(prefix, spec.name);
        match object.get(spec.name) {
            None => errors.push(FieldError::new(loc, "Field required", "missing")),
            Some(value) => {
                if let Some((msg, kind)) = check_feature_value(spec.kind, value) {
                    errors.push(FieldError::new(loc, msg, kind));
                }
            }
        }
    }

    for (name, kind) in METADATA_FIELDS {
        if let Some(value) = object.get(*name).filter(|v| !v.is_null()) {
            if let Some((msg, error_kind)) = check_metadata_value(*kind, value) {
                errors.push(FieldError::new(child(prefix, *name), msg, error_kind));
            }
        }
    }

    for key in object.keys() {
        let known = feature_index(key).is_some() || METADATA_FIELDS.iter().any(|(name, _)| *name == key.as_str());
        if !known {
            errors.push(FieldError::new(
                child(prefix, key.as_str()),
                "Extra inputs are not permitted",
                "extra_forbidden",
            ));
        }
    }

    errors
}

fn check_feature_value(kind: FeatureKind, value: &Value) -> Option<(String, &'static str)> {
    match kind {
        FeatureKind::Count | FeatureKind::Flag => {
            let limit = if kind == FeatureKind::Count { u64::from(u32::MAX) } else { u64::from(u8::MAX) };
            match value.as_u64() {
                Some(n) if n > limit => Some((
                    format!("Input should be less than or equal to {}", limit),
                    "less_than_equal",
                )),
                Some(_) => None,
                None if value.as_i64().is_some() => Some((
                    "Input should be greater than or equal to 0".to_string(),
                    "greater_than_equal",
                )),
                None => Some(("Input should be a valid integer".to_string(), "int_type")),
            }
        }
        FeatureKind::Ratio => match value.as_f64() {
            Some(_) => None,
            None => Some(("Input should be a valid number".to_string(), "float_type")),
        },
    }
}

fn check_metadata_value(kind: MetadataKind, value: &Value) -> Option<(String, &'static str)> {
    match kind {
        MetadataKind::Flag => match value.as_u64() {
            Some(n) if n <= u64::from(u8::MAX) => None,
            _ => Some(("Input should be a valid integer".to_string(), "int_type")),
        },
        MetadataKind::Number => value
            .as_f64()
            .is_none()
            .then(|| ("Input should be a valid number".to_string(), "float_type")),
        MetadataKind::Text => value
            .as_str()
            .is_none()
            .then(|| ("Input should be a valid string".to_string(), "string_type")),
    }
}

fn range_errors(report: &ValidationErrors, prefix: &[Loc]) -> Vec<FieldError> {
    let mut found: Vec<(usize, FieldError)> = Vec::new();

    for (field, failures) in report.field_errors() {
        let field: &str = &field;
        let Some(spec) = find_spec(field) else {
            continue;
        };
        let index = feature_index(spec.name).unwrap_or(usize::MAX);
        let msg = match spec.kind {
            FeatureKind::Flag => "Input should be 0 or 1",
            FeatureKind::Ratio => "Input should be between 0 and 1",
            FeatureKind::Count => "Input is out of range",
        };
        for failure in failures.iter() {
            found.push((
                index,
                FieldError::new(child(prefix, spec.name), msg, failure.code.to_string()),
            ));
        }
    }

    found.sort_by_key(|(index, _)| *index);
    found.into_iter().map(|(_, error)| error).collect()
}

// ============================================================================
// BATCH
// ============================================================================

/// Validate a batch body `{"inputs": [...]}` located at `prefix`
pub fn parse_batch(
    value: &Value,
    prefix: &[Loc],
    max_batch_size: usize,
) -> Result<Vec<FeatureRecord>, Vec<FieldError>> {
    let Some(object) = value.as_object() else {
        return Err(vec![FieldError::new(
            prefix.to_vec(),
            "Input should be a valid dictionary or object",
            "dict_type",
        )]);
    };

    let mut errors: Vec<FieldError> = object
        .keys()
        .filter(|key| key.as_str() != "inputs")
        .map(|key| {
            FieldError::new(
                child(prefix, key.as_str()),
                "Extra inputs are not permitted",
                "extra_forbidden",
            )
        })
        .collect();

    let inputs_loc = child(prefix, "inputs");
    let inputs = match object.get("inputs") {
        None => {
            errors.push(FieldError::new(inputs_loc, "Field required", "missing"));
            return Err(errors);
        }
        Some(Value::Array(items)) => items,
        Some(_) => {
            errors.push(FieldError::new(inputs_loc, "Input should be a valid list", "list_type"));
            return Err(errors);
        }
    };

    if inputs.len() > max_batch_size {
        errors.push(FieldError::new(
            inputs_loc,
            format!("List should have at most {} items after validation, not {}", max_batch_size, inputs.len()),
            "too_long",
        ));
        return Err(errors);
    }

    let mut records = Vec::with_capacity(inputs.len());
    for (index, item) in inputs.iter().enumerate() {
        match parse_record(item, &child(&inputs_loc, index)) {
            Ok(record) => records.push(record),
            Err(item_errors) => errors.extend(item_errors),
        }
    }

    if errors.is_empty() {
        Ok(records)
    } else {
        Err(errors)
    }
}
