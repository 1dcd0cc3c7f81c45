//! Analysis Module - Request handling core
//!
//! # Architecture
//! - `coordinator.rs`: `Analyzer`, trust partitioning and order-preserving batches
//! - `result.rs`: `AnalysisResult`
//! - `error.rs`: `AnalysisError`

pub mod coordinator;
pub mod error;
pub mod result;
#[cfg(test)]
mod tests;

pub use coordinator::{Analyzer, BatchPlan};
pub use error::AnalysisError;
pub use result::AnalysisResult;
