//! Data models for the orbit chart.
//!
//! This module contains the core data structures shared by the extractor,
//! the aggregator and the chart renderer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One `(year, orbit class)` pair taken from a database row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Observation {
    /// Launch year, kept as text exactly as it appears in the launch date.
    pub year: String,
    /// Orbit class label, verbatim from the source.
    pub orbit_class: String,
}

impl Observation {
    pub fn new(year: impl Into<String>, orbit_class: impl Into<String>) -> Self {
        Self {
            year: year.into(),
            orbit_class: orbit_class.into(),
        }
    }
}

/// What to do with a launch date that has fewer than three `/` components.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum MalformedDatePolicy {
    /// Drop the row, count it and keep going.
    #[default]
    Skip,
    /// Stop the whole run with an error.
    Abort,
}

impl fmt::Display for MalformedDatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MalformedDatePolicy::Skip => write!(f, "skip"),
            MalformedDatePolicy::Abort => write!(f, "abort"),
        }
    }
}

/// Row accounting gathered while extracting observations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractStats {
    /// Data rows seen (header excluded).
    pub rows: usize,
    /// Rows with too few fields.
    pub short_rows: usize,
    /// Rows whose launch date field was empty.
    pub empty_dates: usize,
    /// Rows whose launch date had fewer than three components.
    pub malformed_dates: usize,
    /// Observations emitted.
    pub observations: usize,
}

impl ExtractStats {
    /// Total rows that did not produce an observation.
    pub fn skipped(&self) -> usize {
        self.short_rows + self.empty_dates + self.malformed_dates
    }
}

/// Counts for one orbit class, aligned with the sorted year sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Series {
    /// Orbit class name, used as the legend entry.
    pub name: String,
    /// One count per year.
    pub values: Vec<usize>,
}

impl Series {
    /// Sum of all values in the series.
    pub fn total(&self) -> usize {
        self.values.iter().sum()
    }
}

/// Metadata about a rendered chart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartMetadata {
    /// Where the database came from (URL or local path).
    pub source: String,
    /// When the chart was generated.
    pub generated_at: DateTime<Utc>,
    /// Row accounting from extraction.
    pub stats: ExtractStats,
    /// Orbit classes present in the data but not charted.
    pub unlisted_classes: Vec<String>,
}

/// Everything the renderer needs to draw the chart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartReport {
    /// Chart title.
    pub title: String,
    /// Metadata about the run.
    pub metadata: ChartMetadata,
    /// X axis labels, ascending.
    pub years: Vec<String>,
    /// One series per charted orbit class.
    pub series: Vec<Series>,
    /// Full sparse table, including classes not charted.
    pub table: BTreeMap<String, BTreeMap<String, usize>>,
}
