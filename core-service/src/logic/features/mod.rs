//! Features Module - Model input schema
//!
//! - `layout` - column order, kinds, versioned layout hash
//! - `record` - closed record types (model-visible + descriptive)
//! - `vector` - model input rows
//! - `validate` - JSON body → records with field-level errors
//! - `extract` - raw page snapshot → record

pub mod layout;
pub mod record;
pub mod vector;
pub mod validate;
pub mod extract;


// Re-export common types
pub use layout::{
    feature_index, feature_name, FeatureKind, FeatureSpec, LayoutInfo, FEATURE_COUNT, FEATURE_LAYOUT,
};
pub use record::{FeatureRecord, PageMetadata, UrlFeatures};
pub use vector::FeatureVector;
pub use validate::{parse_batch, parse_record, FieldError, Loc};
pub use extract::{extract_features, ExtractError, PageSnapshot};
