//! Downloaded installer payload.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// An installer written to the single-slot payload path.
///
/// The file is deleted when the payload is dropped, whether or not the
/// install succeeded. Deletion failures are logged and otherwise ignored.
#[derive(Debug)]
pub struct Payload {
    path: PathBuf,
    freshness_token: Option<String>,
    size: u64,
}

impl Payload {
    pub fn new(path: impl Into<PathBuf>, freshness_token: Option<String>, size: u64) -> Self {
        Self {
            path: path.into(),
            freshness_token,
            size,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Token declared by the server for this payload, if any.
    pub fn freshness_token(&self) -> Option<&str> {
        self.freshness_token.as_deref()
    }

    /// Size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }
}

impl Drop for Payload {
    fn drop(&mut self) {
        remove_if_present(&self.path);
    }
}

/// Best-effort removal of a file that may not exist.
pub(crate) fn remove_if_present(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => debug!(path = %path.display(), "Removed payload"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove payload"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_drop_removes_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("browser_install.exe");
        fs::write(&path, b"installer").unwrap();

        let payload = Payload::new(&path, Some("token".to_string()), 9);
        assert_eq!(payload.freshness_token(), Some("token"));
        assert_eq!(payload.size(), 9);
        assert!(path.exists());

        drop(payload);
        assert!(!path.exists());
    }

    #[test]
    fn test_drop_tolerates_missing_file() {
        let temp = TempDir::new().unwrap();
        let payload = Payload::new(temp.path().join("gone.exe"), None, 0);
        drop(payload);
    }
}
