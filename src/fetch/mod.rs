//! Database download.
//!
//! This module fetches the tab-separated satellite database over HTTP,
//! or reads a local copy of it.

use crate::error::PipelineError;
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Upper bound on the body buffer reserved up front (64 MiB).
const MAX_PREALLOCATION: u64 = 64 << 20;

/// Options for downloading the database.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Request timeout (None waits indefinitely).
    pub timeout: Option<Duration>,
    /// Whether to show a progress bar.
    pub show_progress: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: None,
            show_progress: true,
        }
    }
}

impl From<&crate::config::SourceConfig> for FetchOptions {
    fn from(config: &crate::config::SourceConfig) -> Self {
        Self {
            timeout: config.timeout_seconds.map(Duration::from_secs),
            ..Default::default()
        }
    }
}

/// Build the HTTP client used for the download.
pub fn build_client(options: &FetchOptions) -> Result<Client, PipelineError> {
    let mut builder = Client::builder().user_agent(concat!(
        env!("CARGO_PKG_NAME"),
        "/",
        env!("CARGO_PKG_VERSION")
    ));

    if let Some(timeout) = options.timeout {
        builder = builder.timeout(timeout);
    }

    builder.build().map_err(|source| PipelineError::Network {
        url: String::new(),
        source,
    })
}

/// Download the database at `url` and return its text.
///
/// Any transport failure or non-success status is an error; there is no retry.
pub async fn fetch_database(
    client: &Client,
    url: &str,
    options: &FetchOptions,
) -> Result<String, PipelineError> {
    info!("Downloading database: {}", url);

    let network_error = |source| PipelineError::Network {
        url: url.to_string(),
        source,
    };

    let response = client.get(url).send().await.map_err(network_error)?;

    let status = response.status();
    if !status.is_success() {
        return Err(PipelineError::HttpStatus {
            url: url.to_string(),
            status,
        });
    }

    let content_length = response.content_length();
    debug!("Response {} ({:?} bytes)", status, content_length);

    let progress_bar = options
        .show_progress
        .then(|| download_progress_bar(content_length));

    // Content-Length is a hint only.
    let capacity = content_length.map_or(0, |len| len.min(MAX_PREALLOCATION));
    let mut body = Vec::with_capacity(capacity as usize);
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(network_error)?;
        if let Some(ref pb) = progress_bar {
            pb.inc(chunk.len() as u64);
        }
        body.extend_from_slice(&chunk);
    }

    if let Some(pb) = progress_bar {
        pb.finish_with_message("Download complete");
    }

    info!("Downloaded {} bytes", body.len());
    Ok(decode_text(body))
}

/// Read a local copy of the database.
pub fn read_local_database(path: &Path) -> Result<String, PipelineError> {
    info!("Reading database from: {}", path.display());

    let bytes = std::fs::read(path).map_err(|e| PipelineError::io(path, e))?;
    Ok(decode_text(bytes))
}

fn download_progress_bar(content_length: Option<u64>) -> ProgressBar {
    match content_length {
        Some(len) => {
            let pb = ProgressBar::new(len);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template(
                        "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})",
                    )
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            pb
        }
        None => {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} [{elapsed_precise}] {bytes} downloaded")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb
        }
    }
}

/// Decode bytes as UTF-8, replacing invalid sequences.
fn decode_text(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => {
            warn!("Database is not valid UTF-8; replacing invalid bytes");
            String::from_utf8_lossy(e.as_bytes()).into_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn test_client() -> Client {
        Client::builder().no_proxy().build().unwrap()
    }

    fn quiet() -> FetchOptions {
        FetchOptions {
            show_progress: false,
            ..Default::default()
        }
    }

    /// Serve one canned HTTP response on a local port and return its URL.
    async fn serve_once(status_line: &str, body: &str) -> String {
        serve_raw(format!(
            "HTTP/1.1 {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        ))
        .await
    }

    /// Serve one raw response, written verbatim, and return its URL.
    async fn serve_raw(response: String) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });

        format!("http://{}/UCS-Satellite-Database.txt", addr)
    }

    #[tokio::test]
    async fn test_fetch_success() {
        let body = include_str!("../../fixtures/sample_database.txt");
        let url = serve_once("200 OK", body).await;

        let text = fetch_database(&test_client(), &url, &quiet()).await.unwrap();
        assert_eq!(text, body);
    }

    #[tokio::test]
    async fn test_fetch_oversized_content_length() {
        let url = serve_raw(
            "HTTP/1.1 200 OK\r\nContent-Length: 1000000000000000\r\nConnection: close\r\n\r\nLEO\n"
                .to_string(),
        )
        .await;

        // The body ends long before the advertised length.
        let result = fetch_database(&test_client(), &url, &quiet()).await;
        assert!(matches!(result, Err(PipelineError::Network { .. })));
    }

    #[tokio::test]
    async fn test_fetch_non_success_status() {
        let url = serve_once("404 Not Found", "").await;

        let err = fetch_database(&test_client(), &url, &quiet())
            .await
            .unwrap_err();

        match err {
            PipelineError::HttpStatus { status, url: failed } => {
                assert_eq!(status, reqwest::StatusCode::NOT_FOUND);
                assert_eq!(failed, url);
            }
            other => panic!("expected HttpStatus, got {:?}", other),
        }
    }

    #[test]
    fn test_fetch_unreachable_host() {
        let result = tokio_test::block_on(fetch_database(
            &test_client(),
            "http://127.0.0.1:1/db.txt",
            &quiet(),
        ));
        assert!(matches!(result, Err(PipelineError::Network { .. })));
    }

    #[test]
    fn test_read_local_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.txt");
        std::fs::write(&path, b"header\nrow\xff\n").unwrap();

        let text = read_local_database(&path).unwrap();
        assert!(text.starts_with("header\nrow"));
        assert!(text.contains('\u{FFFD}'));

        let missing = read_local_database(&dir.path().join("missing.txt"));
        assert!(matches!(missing, Err(PipelineError::Io { .. })));
    }

    #[test]
    fn test_options_from_config() {
        let config = crate::config::SourceConfig {
            timeout_seconds: Some(45),
            ..Default::default()
        };
        let options = FetchOptions::from(&config);
        assert_eq!(options.timeout, Some(Duration::from_secs(45)));
        assert!(options.show_progress);
    }
}
