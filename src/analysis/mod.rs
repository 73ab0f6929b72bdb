//! Analysis modules.
//!
//! Aggregation of extracted observations into per-year, per-class counts.

pub mod aggregator;

pub use aggregator::*;
