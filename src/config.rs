//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.orbitchart.toml` files.

use crate::analysis::default_classes;
use crate::cli::OutputFormat;
use crate::models::MalformedDatePolicy;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = ".orbitchart.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Database source settings.
    #[serde(default)]
    pub source: SourceConfig,

    /// Chart settings.
    #[serde(default)]
    pub chart: ChartConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Output format.
    #[serde(default)]
    pub format: OutputFormat,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            format: OutputFormat::default(),
        }
    }
}

fn default_output() -> String {
    "orbit-chart.html".to_string()
}

/// Where and how to read the satellite database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// URL of the tab-separated database.
    #[serde(default = "default_url")]
    pub url: String,

    /// Request timeout in seconds. No timeout when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_seconds: Option<u64>,

    /// Log header field names and their column indices.
    #[serde(default)]
    pub print_header: bool,

    /// Zero-based column of the orbit class.
    #[serde(default = "default_orbit_column")]
    pub orbit_column: usize,

    /// Zero-based column of the launch date.
    #[serde(default = "default_date_column")]
    pub date_column: usize,

    /// Policy for launch dates with fewer than three `/` parts.
    #[serde(default)]
    pub on_malformed_date: MalformedDatePolicy,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            timeout_seconds: None,
            print_header: false,
            orbit_column: default_orbit_column(),
            date_column: default_date_column(),
            on_malformed_date: MalformedDatePolicy::default(),
        }
    }
}

pub fn default_url() -> String {
    "https://www.ucsusa.org/sites/default/files/2021-02/UCS-Satellite-Database-1-1-2021.txt"
        .to_string()
}

fn default_orbit_column() -> usize {
    8
}

fn default_date_column() -> usize {
    19
}

/// Chart rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartConfig {
    /// Chart title.
    #[serde(default = "default_title")]
    pub title: String,

    /// Orbit classes to chart, in legend order.
    #[serde(default = "default_classes")]
    pub classes: Vec<String>,

    /// Stack the bars of each year instead of grouping them.
    #[serde(default)]
    pub stacked: bool,

    /// Show the legend.
    #[serde(default = "default_true")]
    pub show_legend: bool,

    /// Script URL of the ECharts library.
    #[serde(default = "default_echarts_url")]
    pub echarts_url: String,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            classes: default_classes(),
            stacked: false,
            show_legend: true,
            echarts_url: default_echarts_url(),
        }
    }
}

fn default_title() -> String {
    "Satellite orbit usage per year".to_string()
}

fn default_true() -> bool {
    true
}

fn default_echarts_url() -> String {
    "https://cdn.jsdelivr.net/npm/echarts@5/dist/echarts.min.js".to_string()
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// Only values the user supplied on the command line override the file.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }
        if let Some(format) = args.format {
            self.general.format = format;
        }

        if let Some(ref url) = args.url {
            self.source.url = url.clone();
        }
        if let Some(timeout) = args.timeout {
            self.source.timeout_seconds = Some(timeout);
        }
        if args.print_header {
            self.source.print_header = true;
        } else if args.no_print_header {
            self.source.print_header = false;
        }
        if let Some(policy) = args.on_malformed_date {
            self.source.on_malformed_date = policy;
        }

        if let Some(ref title) = args.title {
            self.chart.title = title.clone();
        }
        if let Some(ref classes) = args.classes {
            self.chart.classes = classes.clone();
        }
        if args.stacked {
            self.chart.stacked = true;
        } else if args.no_stacked {
            self.chart.stacked = false;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
