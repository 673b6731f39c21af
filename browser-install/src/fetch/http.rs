//! HTTP conditional fetcher.
//!
//! Sends `If-Modified-Since` with the recorded token, streams a fresh body
//! to the payload path in fixed-size chunks, and takes the new token from
//! `Last-Modified` (or `Date` when the server sends no modification time).

use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, DATE, IF_MODIFIED_SINCE, LAST_MODIFIED};
use reqwest::StatusCode;
use tracing::{debug, info, warn};

use super::error::FetchError;
use super::payload::{remove_if_present, Payload};
use super::{ConditionalFetcher, FetchResult};

/// Chunk size for streaming payloads to disk (64KB).
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Fetcher backed by a blocking `reqwest` client.
#[derive(Debug)]
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
    dest: PathBuf,
}

impl HttpFetcher {
    /// Create a fetcher writing payloads to `dest`.
    ///
    /// `timeout` bounds each request from connect to the last body byte.
    pub fn new(dest: impl Into<PathBuf>, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("browser-install/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::ClientFailed(e.to_string()))?;

        Ok(Self {
            client,
            timeout,
            dest: dest.into(),
        })
    }

    /// The single-slot payload path.
    pub fn dest(&self) -> &Path {
        &self.dest
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn try_fetch(
        &self,
        url: &str,
        freshness_token: Option<&str>,
    ) -> Result<FetchResult, FetchError> {
        let condition = freshness_token.and_then(|token| condition_header(url, token));
        let conditional = condition.is_some();

        let mut request = self.client.get(url);
        if let Some(value) = condition {
            request = request.header(IF_MODIFIED_SINCE, value);
        }

        debug!(
            url,
            dest = %self.dest.display(),
            conditional,
            "Requesting installer"
        );

        let response = request.send().map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    url: url.to_string(),
                    timeout_secs: self.timeout.as_secs(),
                }
            } else {
                FetchError::RequestFailed {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if status == StatusCode::NOT_MODIFIED {
            debug!(url, "Installer not modified");
            return Ok(FetchResult::Unchanged);
        }
        if !status.is_success() {
            return Err(FetchError::BadStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let token = freshness_token_from(response.headers());
        let size = self.stream_to_dest(url, response)?;

        info!(
            url,
            bytes = size,
            token = token.as_deref().unwrap_or(""),
            "Downloaded installer"
        );
        Ok(FetchResult::Fetched(Payload::new(&self.dest, token, size)))
    }

    /// Stream the body to the payload path.
    ///
    /// A partially written file is removed on failure.
    fn stream_to_dest(&self, url: &str, mut response: Response) -> Result<u64, FetchError> {
        let write_failed = |e: std::io::Error| FetchError::WriteFailed {
            path: self.dest.clone(),
            source: e,
        };

        if let Some(parent) = self.dest.parent() {
            fs::create_dir_all(parent).map_err(write_failed)?;
        }
        let file = File::create(&self.dest).map_err(write_failed)?;

        let mut writer = BufWriter::new(file);
        let mut buffer = vec![0u8; CHUNK_SIZE];
        let mut written = 0u64;

        let result = loop {
            let bytes_read = match response.read(&mut buffer) {
                Ok(0) => break writer.flush().map_err(write_failed),
                Ok(n) => n,
                Err(e) => {
                    break Err(FetchError::ReadFailed {
                        url: url.to_string(),
                        reason: e.to_string(),
                    })
                }
            };

            if let Err(e) = writer.write_all(&buffer[..bytes_read]) {
                break Err(write_failed(e));
            }
            written += bytes_read as u64;
        };

        if let Err(e) = result {
            drop(writer);
            remove_if_present(&self.dest);
            return Err(e);
        }
        Ok(written)
    }
}

impl ConditionalFetcher for HttpFetcher {
    fn fetch(&self, url: &str, freshness_token: Option<&str>) -> FetchResult {
        // A payload left behind by an interrupted run must never be installed.
        remove_if_present(&self.dest);

        self.try_fetch(url, freshness_token)
            .unwrap_or_else(FetchResult::Failed)
    }
}

/// Token for a fresh payload: `Last-Modified`, else `Date`.
fn freshness_token_from(headers: &HeaderMap) -> Option<String> {
    [LAST_MODIFIED, DATE]
        .iter()
        .filter_map(|name| headers.get(name))
        .find_map(|value| value.to_str().ok())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// `If-Modified-Since` value for a recorded token.
///
/// A token that is not a valid header value (a hand-edited status file, say)
/// is ignored so the channel falls back to an unconditional fetch.
fn condition_header(url: &str, token: &str) -> Option<HeaderValue> {
    match HeaderValue::from_str(token) {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(url, token, "Ignoring unusable freshness token, fetching unconditionally");
            None
        }
    }
}
