//! Error types for installer backends.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Exit code reported for an installer terminated after its timeout.
pub const TERMINATED_EXIT_CODE: i32 = 13;

/// Result of an install: `Ok(())` when the backend reported success.
pub type InstallOutcome = Result<(), InstallError>;

/// Why an install did not succeed.
#[derive(Debug, Error)]
pub enum InstallError {
    /// The installer process could not be started.
    #[error("failed to start {program}: {source}")]
    SpawnFailed { program: String, source: io::Error },

    /// Waiting on the installer process failed.
    #[error("failed to wait for {program}: {source}")]
    WaitFailed { program: String, source: io::Error },

    /// The installer exited unsuccessfully.
    #[error("{program} exited with {}", exit_description(.code))]
    ExitFailure { program: String, code: Option<i32> },

    /// The installer ran past its timeout and was terminated.
    #[error("{program} timed out after {timeout_secs}s and was terminated")]
    TimedOut { program: String, timeout_secs: u64 },

    /// The answer file could not be written.
    #[error("failed to write answer file {}: {}", .path.display(), .source)]
    AnswerFileFailed { path: PathBuf, source: io::Error },

    /// The attached image exposed nothing to install.
    #[error("no application found on volumes matching '{volume_prefix}'")]
    NothingToInstall { volume_prefix: String },

    /// Listing mounted volumes failed.
    #[error("failed to list {}: {}", .path.display(), .source)]
    VolumeScanFailed { path: PathBuf, source: io::Error },

    /// The backend cannot apply this kind of payload.
    #[error("installer kind '{kind}' is not supported by this backend")]
    Unsupported { kind: &'static str },
}

impl InstallError {
    /// Exit code of the installer, when it ran to an exit.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::ExitFailure { code, .. } => *code,
            Self::TimedOut { .. } => Some(TERMINATED_EXIT_CODE),
            _ => None,
        }
    }
}

fn exit_description(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "no exit code (killed by signal)".to_string(),
    }
}
