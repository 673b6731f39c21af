//! Persisted per-channel install status.
//!
//! The status file maps each channel key to the freshness token of the last
//! payload that installed successfully. It is read once when a run starts and
//! written once when it ends. A missing or unreadable file counts as "nothing
//! installed yet", which makes the next fetch unconditional.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Result type for status store operations.
pub type StatusResult<T> = Result<T, StatusError>;

/// Errors that can occur while reading or writing the status file.
#[derive(Debug, Error)]
pub enum StatusError {
    /// Failed to read the status file.
    #[error("failed to read {}: {}", .path.display(), .source)]
    ReadFailed { path: PathBuf, source: io::Error },

    /// The status file is not a JSON object of strings.
    #[error("failed to parse {}: {}", .path.display(), .source)]
    ParseFailed {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Failed to encode the record.
    #[error("failed to encode status record: {0}")]
    EncodeFailed(#[source] serde_json::Error),

    /// Failed to write or replace the status file.
    #[error("failed to write {}: {}", .path.display(), .source)]
    WriteFailed { path: PathBuf, source: io::Error },
}

/// Channel key → freshness token of the last successful install.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusRecord {
    tokens: BTreeMap<String, String>,
}

impl StatusRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Freshness token recorded for a channel.
    pub fn token(&self, key: &str) -> Option<&str> {
        self.tokens.get(key).map(String::as_str)
    }

    /// Record the token of a payload that installed successfully.
    pub fn record(&mut self, key: impl Into<String>, token: impl Into<String>) {
        self.tokens.insert(key.into(), token.into());
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for StatusRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            tokens: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// JSON file holding the [`StatusRecord`].
#[derive(Debug, Clone)]
pub struct StatusStore {
    path: PathBuf,
}

impl StatusStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the record, treating a missing or corrupt file as empty.
    pub fn load(&self) -> StatusRecord {
        match self.try_load() {
            Ok(Some(record)) => {
                debug!(
                    path = %self.path.display(),
                    channels = record.len(),
                    "Loaded install status"
                );
                record
            }
            Ok(None) => {
                debug!(path = %self.path.display(), "No install status yet");
                StatusRecord::new()
            }
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable install status");
                StatusRecord::new()
            }
        }
    }

    /// Load the record, reporting why it could not be read.
    ///
    /// Returns `Ok(None)` when the file does not exist.
    pub fn try_load(&self) -> StatusResult<Option<StatusRecord>> {
        let contents = match fs::read(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StatusError::ReadFailed {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };

        serde_json::from_slice(&contents)
            .map(Some)
            .map_err(|e| StatusError::ParseFailed {
                path: self.path.clone(),
                source: e,
            })
    }

    /// Persist the record.
    ///
    /// An empty record is not written. The file is replaced atomically: the
    /// JSON goes to a sibling temporary file which is then renamed over the
    /// target. Returns whether the file was written.
    pub fn save(&self, record: &StatusRecord) -> StatusResult<bool> {
        if record.is_empty() {
            debug!("Install status is empty, not saving");
            return Ok(false);
        }

        let temp_path = self.path.with_extension("json.tmp");
        let result = write_json(&temp_path, record).and_then(|()| {
            fs::rename(&temp_path, &self.path).map_err(|e| StatusError::WriteFailed {
                path: self.path.clone(),
                source: e,
            })
        });

        if result.is_err() {
            fs::remove_file(&temp_path).ok();
        }
        result?;

        info!(
            path = %self.path.display(),
            channels = record.len(),
            "Saved install status"
        );
        Ok(true)
    }
}

/// Write the record as four-space indented JSON and flush it to disk.
fn write_json(path: &Path, record: &StatusRecord) -> StatusResult<()> {
    let write_failed = |e: io::Error| StatusError::WriteFailed {
        path: path.to_path_buf(),
        source: e,
    };

    let file = File::create(path).map_err(write_failed)?;
    let mut writer = BufWriter::new(file);

    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
    record
        .serialize(&mut serializer)
        .map_err(StatusError::EncodeFailed)?;

    writer.write_all(b"\n").map_err(write_failed)?;
    let file = writer
        .into_inner()
        .map_err(|e| write_failed(e.into_error()))?;
    file.sync_all().map_err(write_failed)?;
    Ok(())
}
