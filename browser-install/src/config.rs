//! Configuration for an update run.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::catalog::Platform;

/// Default timeout for a single vendor request in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300; // 5 minutes

/// Default timeout for a single installer run in seconds.
pub const DEFAULT_INSTALL_TIMEOUT_SECS: u64 = 300; // 5 minutes

/// Default wall-clock budget for a whole run in seconds.
pub const DEFAULT_RUN_BUDGET_SECS: u64 = 3600; // 1 hour

/// Name of the persisted status file inside the working directory.
pub const STATUS_FILE_NAME: &str = "browser_install.json";

/// Name of the Firefox installer answer file inside the working directory.
pub const ANSWER_FILE_NAME: &str = "firefox.ini";

/// Configuration for an update run.
#[derive(Debug, Clone)]
pub struct UpdaterConfig {
    /// Directory holding the status file and temporary payloads.
    pub work_dir: PathBuf,

    /// File name of the single-slot payload inside `work_dir`.
    pub payload_file_name: String,

    /// Timeout for each vendor request.
    pub request_timeout: Duration,

    /// Timeout for each installer run; the installer is terminated after it.
    pub install_timeout: Duration,

    /// Wall-clock budget for the whole run.
    pub run_budget: Duration,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            work_dir: default_work_dir(),
            payload_file_name: "browser_install.exe".to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            install_timeout: Duration::from_secs(DEFAULT_INSTALL_TIMEOUT_SECS),
            run_budget: Duration::from_secs(DEFAULT_RUN_BUDGET_SECS),
        }
    }
}

impl UpdaterConfig {
    /// Create a configuration with the payload name for `platform`.
    pub fn for_platform(platform: Platform) -> Self {
        Self {
            payload_file_name: platform.payload_file_name().to_string(),
            ..Default::default()
        }
    }

    /// Set the working directory.
    pub fn with_work_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.work_dir = path.into();
        self
    }

    /// Set the per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the per-install timeout.
    pub fn with_install_timeout(mut self, timeout: Duration) -> Self {
        self.install_timeout = timeout;
        self
    }

    /// Set the global run budget.
    pub fn with_run_budget(mut self, budget: Duration) -> Self {
        self.run_budget = budget;
        self
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Path of the persisted status file.
    pub fn status_path(&self) -> PathBuf {
        self.work_dir.join(STATUS_FILE_NAME)
    }

    /// Path of the single-slot payload.
    pub fn payload_path(&self) -> PathBuf {
        self.work_dir.join(&self.payload_file_name)
    }

    /// Path of the installer answer file.
    pub fn answer_file_path(&self) -> PathBuf {
        self.work_dir.join(ANSWER_FILE_NAME)
    }
}

/// The `tmp` directory beside the running executable.
///
/// Falls back to `tmp` in the current directory when the executable path
/// cannot be resolved.
pub fn default_work_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("tmp")))
        .unwrap_or_else(|| PathBuf::from("tmp"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = UpdaterConfig::default();
        assert_eq!(config.request_timeout, Duration::from_secs(300));
        assert_eq!(config.install_timeout, Duration::from_secs(300));
        assert_eq!(config.run_budget, Duration::from_secs(3600));
        assert!(config.work_dir.ends_with("tmp"));
    }

    #[test]
    fn test_builder_pattern() {
        let config = UpdaterConfig::for_platform(Platform::MacOs { universal: true })
            .with_work_dir("/var/lib/browser-install")
            .with_request_timeout(Duration::from_secs(60))
            .with_install_timeout(Duration::from_secs(120))
            .with_run_budget(Duration::from_secs(600));

        assert_eq!(config.work_dir(), Path::new("/var/lib/browser-install"));
        assert_eq!(config.request_timeout, Duration::from_secs(60));
        assert_eq!(config.install_timeout, Duration::from_secs(120));
        assert_eq!(config.run_budget, Duration::from_secs(600));
    }

    #[test]
    fn test_derived_paths() {
        let config = UpdaterConfig::for_platform(Platform::MacOs { universal: false })
            .with_work_dir("/work");
        assert_eq!(
            config.status_path(),
            PathBuf::from("/work/browser_install.json")
        );
        assert_eq!(config.payload_path(), PathBuf::from("/work/browser.dmg"));
        assert_eq!(config.answer_file_path(), PathBuf::from("/work/firefox.ini"));
    }
}
