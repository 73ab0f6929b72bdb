//! Error types for the fetch → extract → render pipeline.
//!
//! Each stage returns a [`PipelineError`]; the binary wraps these with
//! `anyhow` context and decides whether to abort.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by pipeline stages.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The HTTP request could not be completed.
    #[error("failed to fetch {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status code.
    #[error("http request to {url} failed: {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    /// A local file could not be read, created or written.
    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A launch date has fewer than three `/`-separated components.
    #[error("malformed launch date {value:?} on line {line}")]
    MalformedDate { line: usize, value: String },
}

impl PipelineError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
