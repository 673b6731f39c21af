//! Orchestrator outcomes and reports

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::fetch::FetchError;
use crate::installer::InstallError;
use crate::status::StatusRecord;

/// Status record shared between the orchestrator and the run driver.
///
/// The orchestrator commits a token and publishes the channel's report
/// while holding the lock, so a snapshot taken under the lock agrees with
/// every report sent before it.
pub type SharedStatus = Arc<Mutex<StatusRecord>>;

/// What happened to one channel during a run.
#[derive(Debug)]
pub enum ChannelOutcome {
    /// The vendor has nothing newer than the recorded token.
    Unchanged,

    /// A new payload was installed.
    ///
    /// The token is recorded only when the server declared one.
    Installed { freshness_token: Option<String> },

    /// The download failed; the record is unchanged.
    FetchFailed(FetchError),

    /// The download succeeded but the install did not; the record is unchanged.
    InstallFailed(InstallError),

    /// The run was cancelled before this channel finished.
    Cancelled,
}

impl ChannelOutcome {
    /// Whether the channel needs another attempt on the next run.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::FetchFailed(_) | Self::InstallFailed(_))
    }

    pub fn is_installed(&self) -> bool {
        matches!(self, Self::Installed { .. })
    }

    /// Short name for logs and summaries.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Unchanged => "unchanged",
            Self::Installed { .. } => "installed",
            Self::FetchFailed(_) => "fetch failed",
            Self::InstallFailed(_) => "install failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ChannelOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FetchFailed(e) => write!(f, "fetch failed: {}", e),
            Self::InstallFailed(e) => write!(f, "install failed: {}", e),
            other => f.write_str(other.name()),
        }
    }
}

/// Outcome for a channel, keyed by the channel's status key.
#[derive(Debug)]
pub struct ChannelReport {
    pub key: String,
    pub outcome: ChannelOutcome,
}

impl ChannelReport {
    pub fn new(key: impl Into<String>, outcome: ChannelOutcome) -> Self {
        Self {
            key: key.into(),
            outcome,
        }
    }
}
