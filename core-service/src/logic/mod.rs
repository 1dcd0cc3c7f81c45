//! Logic Module - Classification pipeline
//!
//! - `features/` - record schema, validation, page extraction
//! - `trust` - trusted-domain filter
//! - `model/` - classifier / explainer seams and the tree ensemble
//! - `explain/` - attribution ranking
//! - `analysis/` - single-record and batch coordination

pub mod analysis;
pub mod explain;
pub mod features;
pub mod model;
pub mod trust;
