//! Record extractor for the tab-separated satellite database.
//!
//! This module turns the raw database text into a lazy stream of
//! [`Observation`]s, tolerating short rows and empty launch dates.

use crate::error::PipelineError;
use crate::models::{ExtractStats, MalformedDatePolicy, Observation};
use std::str::Split;
use tracing::{debug, info, warn};

/// Field delimiter within a row.
pub const FIELD_DELIMITER: char = '\t';

/// Record delimiter between rows.
pub const RECORD_DELIMITER: char = '\n';

/// Configuration for record extraction.
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Zero-based column holding the orbit class.
    pub orbit_column: usize,
    /// Zero-based column holding the launch date (`MM/DD/YYYY`).
    pub date_column: usize,
    /// What to do when a launch date has fewer than three components.
    pub on_malformed_date: MalformedDatePolicy,
    /// Log header field names with their indices.
    pub print_header: bool,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            orbit_column: 8,
            date_column: 19,
            on_malformed_date: MalformedDatePolicy::Skip,
            print_header: false,
        }
    }
}

impl From<&crate::config::SourceConfig> for ExtractConfig {
    fn from(config: &crate::config::SourceConfig) -> Self {
        Self {
            orbit_column: config.orbit_column,
            date_column: config.date_column,
            on_malformed_date: config.on_malformed_date,
            print_header: config.print_header,
        }
    }
}

impl ExtractConfig {
    /// Minimum number of fields a row needs to be considered.
    pub fn min_fields(&self) -> usize {
        self.orbit_column.max(self.date_column) + 1
    }
}

/// Lazy, one-pass extractor over the database text.
///
/// The header line is consumed on construction. Iteration yields
/// `Ok(Observation)` for each usable row; under
/// [`MalformedDatePolicy::Abort`] a bad launch date yields a single
/// `Err(PipelineError::MalformedDate)` and the iterator is then exhausted.
pub struct RecordExtractor<'a> {
    config: ExtractConfig,
    lines: std::iter::Enumerate<Split<'a, char>>,
    header: &'a str,
    stats: ExtractStats,
    finished: bool,
}

impl<'a> RecordExtractor<'a> {
    /// Create an extractor over `text`, consuming its header line.
    pub fn new(text: &'a str, config: ExtractConfig) -> Self {
        let mut lines = text.split(RECORD_DELIMITER).enumerate();
        let header = lines
            .next()
            .map(|(_, line)| trim_line(line))
            .unwrap_or_default();

        let extractor = Self {
            config,
            lines,
            header,
            stats: ExtractStats::default(),
            finished: false,
        };

        if extractor.config.print_header {
            for (index, name) in extractor.header_fields() {
                info!("header field {}: {}", index, name);
            }
        }

        extractor
    }

    /// Non-empty header field names with their column indices.
    pub fn header_fields(&self) -> Vec<(usize, &'a str)> {
        self.header
            .split(FIELD_DELIMITER)
            .enumerate()
            .filter(|(_, name)| !name.is_empty())
            .collect()
    }

    /// Row accounting so far.
    pub fn stats(&self) -> ExtractStats {
        self.stats
    }

    /// Parse one data line; `Ok(None)` means the row was skipped.
    fn parse_line(
        &mut self,
        line_number: usize,
        line: &str,
    ) -> Result<Option<Observation>, PipelineError> {
        let fields: Vec<&str> = line.split(FIELD_DELIMITER).collect();

        if fields.len() < self.config.min_fields() {
            self.stats.short_rows += 1;
            debug!(
                "line {}: skipping short row ({} fields)",
                line_number,
                fields.len()
            );
            return Ok(None);
        }

        let orbit_type = fields[self.config.orbit_column];
        let date_of_launch = fields[self.config.date_column];

        if date_of_launch.is_empty() {
            self.stats.empty_dates += 1;
            return Ok(None);
        }

        match launch_year(date_of_launch) {
            Some(year) => {
                self.stats.observations += 1;
                Ok(Some(Observation::new(year, orbit_type)))
            }
            None => {
                self.stats.malformed_dates += 1;
                match self.config.on_malformed_date {
                    MalformedDatePolicy::Skip => {
                        warn!(
                            "line {}: skipping malformed launch date {:?}",
                            line_number, date_of_launch
                        );
                        Ok(None)
                    }
                    MalformedDatePolicy::Abort => Err(PipelineError::MalformedDate {
                        line: line_number,
                        value: date_of_launch.to_string(),
                    }),
                }
            }
        }
    }
}

impl Iterator for RecordExtractor<'_> {
    type Item = Result<Observation, PipelineError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        while let Some((index, line)) = self.lines.next() {
            let line = trim_line(line);
            if line.is_empty() {
                continue;
            }

            self.stats.rows += 1;
            match self.parse_line(index + 1, line) {
                Ok(Some(observation)) => return Some(Ok(observation)),
                Ok(None) => continue,
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        }

        self.finished = true;
        None
    }
}

/// Year component of an `MM/DD/YYYY` launch date.
///
/// Returns `None` when there are fewer than three `/`-separated parts.
pub fn launch_year(date: &str) -> Option<&str> {
    date.split('/').nth(2)
}

fn trim_line(line: &str) -> &str {
    line.strip_suffix('\r').unwrap_or(line)
}

/// Warn when a non-empty document produced no observations at all.
pub fn warn_if_empty(stats: &ExtractStats) {
    if stats.observations == 0 && stats.rows > 0 {
        warn!(
            "no observations extracted from {} rows; is the input tab-delimited?",
            stats.rows
        );
    }
}
