//! Error types for fetches.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Why a fetch produced no payload.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Failed to build the HTTP client.
    #[error("failed to create HTTP client: {0}")]
    ClientFailed(String),

    /// The request could not be sent or the connection failed.
    #[error("request to {url} failed: {reason}")]
    RequestFailed { url: String, reason: String },

    /// The request did not complete in time.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout { url: String, timeout_secs: u64 },

    /// The server answered with neither success nor "not modified".
    #[error("request to {url} failed with status {status}")]
    BadStatus { url: String, status: u16 },

    /// Reading the response body failed.
    #[error("failed to read response from {url}: {reason}")]
    ReadFailed { url: String, reason: String },

    /// Writing the payload to disk failed.
    #[error("failed to write {}: {}", .path.display(), .source)]
    WriteFailed { path: PathBuf, source: io::Error },
}

impl FetchError {
    /// Whether the error came from the network rather than the local disk.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            Self::RequestFailed { .. }
                | Self::Timeout { .. }
                | Self::BadStatus { .. }
                | Self::ReadFailed { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_status_display() {
        let err = FetchError::BadStatus {
            url: "https://example.com/setup.exe".to_string(),
            status: 503,
        };
        assert_eq!(
            err.to_string(),
            "request to https://example.com/setup.exe failed with status 503"
        );
        assert!(err.is_network());
    }

    #[test]
    fn test_write_failed_is_local() {
        let err = FetchError::WriteFailed {
            path: PathBuf::from("/tmp/browser_install.exe"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("/tmp/browser_install.exe"));
        assert!(!err.is_network());
    }
}
