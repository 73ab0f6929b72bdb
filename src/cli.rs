//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation. Every flag is optional so that values from
//! `.orbitchart.toml` are only overridden when given explicitly.

use crate::models::MalformedDatePolicy;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// orbitchart - satellite orbit usage per launch year
///
/// Downloads the UCS Satellite Database, counts satellites by launch
/// year and orbit class, and renders a bar chart to an HTML file.
///
/// Examples:
///   orbitchart
///   orbitchart --output chart.html --stacked
///   orbitchart --input UCS-Satellite-Database.txt --classes LEO,GEO
///   orbitchart --format json --output counts.json
///   orbitchart --dry-run --print-header
///   orbitchart --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// URL of the tab-separated satellite database
    #[arg(short, long, value_name = "URL", env = "ORBITCHART_URL")]
    pub url: Option<String>,

    /// Read the database from a local file instead of downloading it
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Output file path for the chart
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .orbitchart.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format (html, json)
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Orbit classes to chart, in legend order (comma-separated)
    ///
    /// Example: --classes LEO,MEO,GEO,Elliptical
    #[arg(long, value_name = "CLASSES", value_delimiter = ',')]
    pub classes: Option<Vec<String>>,

    /// Chart title
    #[arg(long, value_name = "TITLE")]
    pub title: Option<String>,

    /// Stack the bars of each year instead of grouping them
    ///
    /// Overrides config file setting.
    #[arg(long, conflicts_with = "no_stacked")]
    pub stacked: bool,

    /// Group the bars of each year side by side
    ///
    /// Overrides config file setting.
    #[arg(long, conflicts_with = "stacked")]
    pub no_stacked: bool,

    /// What to do with launch dates lacking a year component (skip, abort)
    #[arg(long, value_name = "POLICY")]
    pub on_malformed_date: Option<MalformedDatePolicy>,

    /// Log the header fields of the database with their column indices
    #[arg(long, conflicts_with = "no_print_header")]
    pub print_header: bool,

    /// Do not log the header fields, even if the config file asks for it
    #[arg(long, conflicts_with = "print_header")]
    pub no_print_header: bool,

    /// Request timeout in seconds (no timeout by default)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Fetch and aggregate, print a summary, and write nothing
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .orbitchart.toml configuration file
    #[arg(long)]
    pub init_config: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,
}

/// Output format for the chart.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// HTML page with an embedded bar chart (default)
    #[default]
    Html,
    /// JSON document with years, series and the full count table
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if let Some(ref url) = self.url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Database URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        if let Some(ref classes) = self.classes {
            if classes.iter().any(|c| c.is_empty()) {
                return Err("Orbit class names must not be empty".to_string());
            }
        }

        if let Some(ref input) = self.input {
            if !input.is_file() {
                return Err(format!("Input file does not exist: {}", input.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
