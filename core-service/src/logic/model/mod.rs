//! Model Module - Classification & attribution
//!
//! `inference` defines the adapter seams and the shared handle,
//! `ensemble` is the tree-ensemble implementation behind them.

pub mod ensemble;
pub mod inference;

pub use ensemble::TreeEnsemble;
pub use inference::{Classifier, Explainer, Label, ModelError, ModelHandle, ModelInfo};
