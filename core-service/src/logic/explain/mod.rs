//! Explain Module - Attribution ranking
//!
//! Turns raw per-feature contributions into a ranked, described view.

pub mod ranker;
pub mod types;

pub use ranker::{describe, explain, rank};
pub use types::{AttributionMap, Explanation, RankedAttribution};
