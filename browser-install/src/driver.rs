//! Run driver: one bounded update run.
//!
//! The driver loads the status record, hands the selected channels to a
//! [`ChannelOrchestrator`] on a background thread, and waits for its reports
//! until the run budget elapses. On expiry the orchestrator is cancelled and
//! abandoned; the record is snapshotted under its lock so the save reflects
//! exactly the channels whose reports were received. The record is saved
//! once per run.

use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::catalog::{Catalog, Platform, Selection};
use crate::config::UpdaterConfig;
use crate::fetch::{ConditionalFetcher, FetchError, HttpFetcher};
use crate::installer::{backend_for, InstallerBackend};
use crate::orchestrator::{ChannelOrchestrator, ChannelOutcome, ChannelReport, SharedStatus};
use crate::status::StatusStore;

/// Name of the background thread processing channels.
const WORKER_THREAD_NAME: &str = "browser-install-worker";

/// Errors that prevent a run from starting.
#[derive(Debug, Error)]
pub enum DriverError {
    /// The working directory could not be created.
    #[error("failed to create working directory {}: {}", .path.display(), .source)]
    WorkDirFailed { path: PathBuf, source: io::Error },

    /// The HTTP client could not be built.
    #[error("failed to set up downloads: {0}")]
    ClientFailed(#[source] FetchError),

    /// The background thread could not be started.
    #[error("failed to start worker thread: {0}")]
    SpawnFailed(#[source] io::Error),
}

/// Result type for run driver operations.
pub type DriverResult<T> = Result<T, DriverError>;

/// Summary of a finished run.
#[derive(Debug)]
pub struct RunReport {
    /// Per-channel outcomes in processing order.
    pub channels: Vec<ChannelReport>,

    /// Whether the run budget elapsed before every channel finished.
    pub timed_out: bool,

    /// Wall-clock time of the run.
    pub elapsed: Duration,

    /// Whether the status file was written.
    pub saved: bool,
}

impl RunReport {
    /// Number of channels that installed a new payload.
    pub fn installed(&self) -> usize {
        self.count(ChannelOutcome::is_installed)
    }

    /// Number of channels that failed and will be retried next run.
    pub fn failed(&self) -> usize {
        self.count(ChannelOutcome::is_failure)
    }

    pub fn cancelled(&self) -> usize {
        self.count(|o| matches!(o, ChannelOutcome::Cancelled))
    }

    /// Whether any channel failed or the budget elapsed.
    pub fn is_partial(&self) -> bool {
        self.timed_out || self.failed() > 0
    }

    /// Outcome reported for a channel key.
    pub fn outcome(&self, key: &str) -> Option<&ChannelOutcome> {
        self.channels
            .iter()
            .find(|r| r.key == key)
            .map(|r| &r.outcome)
    }

    fn count(&self, pred: impl Fn(&ChannelOutcome) -> bool) -> usize {
        self.channels.iter().filter(|r| pred(&r.outcome)).count()
    }
}

/// Runs the orchestrator under the configured budget.
pub struct RunDriver {
    config: UpdaterConfig,
    catalog: Catalog,
    fetcher: Arc<dyn ConditionalFetcher>,
    installer: Arc<dyn InstallerBackend>,
    cancel: Mutex<CancellationToken>,
}

impl RunDriver {
    pub fn new(
        config: UpdaterConfig,
        catalog: Catalog,
        fetcher: Arc<dyn ConditionalFetcher>,
        installer: Arc<dyn InstallerBackend>,
    ) -> Self {
        Self {
            config,
            catalog,
            fetcher,
            installer,
            cancel: Mutex::new(CancellationToken::new()),
        }
    }

    /// Build a driver with the vendor catalog, HTTP fetcher and installer
    /// backend for `platform`.
    pub fn for_platform(platform: Platform, config: UpdaterConfig) -> DriverResult<Self> {
        let fetcher = HttpFetcher::new(config.payload_path(), config.request_timeout)
            .map_err(DriverError::ClientFailed)?;
        let installer = backend_for(platform, &config);
        let catalog = Catalog::for_platform(platform);

        Ok(Self::new(config, catalog, Arc::new(fetcher), installer))
    }

    pub fn config(&self) -> &UpdaterConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Token that cancels the current (or next) run between channels.
    ///
    /// Channels completed before cancellation are still saved. A run that
    /// ends cancelled retires the token; later runs need a fresh one from
    /// this method.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.lock().clone()
    }

    /// Cancellation for one run, a child of the public token.
    fn run_token(&self) -> CancellationToken {
        self.cancel.lock().child_token()
    }

    /// Swap in a fresh public token once the current one has fired.
    fn retire_cancelled_token(&self) {
        let mut cancel = self.cancel.lock();
        if cancel.is_cancelled() {
            debug!("Run was cancelled, resetting cancellation token");
            *cancel = CancellationToken::new();
        }
    }

    /// Run the selected channels.
    ///
    /// Only startup failures are errors; channel failures are reported in
    /// the returned [`RunReport`].
    pub fn run(&self, selection: &Selection) -> DriverResult<RunReport> {
        let started = Instant::now();
        let work_dir = self.config.work_dir();
        fs::create_dir_all(work_dir).map_err(|e| DriverError::WorkDirFailed {
            path: work_dir.to_path_buf(),
            source: e,
        })?;

        let store = StatusStore::new(self.config.status_path());
        let status: SharedStatus = Arc::new(Mutex::new(store.load()));

        let channels = self.catalog.select(selection);
        if channels.is_empty() {
            info!("No channels selected");
        } else {
            debug!(
                channels = channels.len(),
                budget_secs = self.config.run_budget.as_secs(),
                "Starting update run"
            );
        }

        let (tx, rx) = mpsc::channel();
        let orchestrator = ChannelOrchestrator::new(
            self.catalog.clone(),
            Arc::clone(&self.fetcher),
            Arc::clone(&self.installer),
            Arc::clone(&status),
        );
        let worker_channels = channels.clone();
        let run_cancel = self.run_token();
        let worker_cancel = run_cancel.clone();
        let worker = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || {
                orchestrator.run_with(&worker_channels, &worker_cancel, |report| {
                    // The receiver is gone once the driver gave up on the run.
                    tx.send(report).ok();
                });
            })
            .map_err(DriverError::SpawnFailed)?;

        // A budget too large for a deadline means no budget.
        let deadline = started.checked_add(self.config.run_budget);
        let mut reports = Vec::with_capacity(channels.len());
        let timed_out = loop {
            let received = match deadline {
                Some(deadline) => {
                    rx.recv_timeout(deadline.saturating_duration_since(Instant::now()))
                }
                None => rx.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };
            match received {
                Ok(report) => reports.push(report),
                Err(RecvTimeoutError::Disconnected) => break false,
                Err(RecvTimeoutError::Timeout) => break true,
            }
        };

        let record = if timed_out {
            warn!(
                budget_secs = self.config.run_budget.as_secs(),
                completed = reports.len(),
                "Run budget elapsed, abandoning remaining channels"
            );
            run_cancel.cancel();

            // Reports are sent under the record lock, so everything committed
            // so far is already in the channel.
            let guard = status.lock();
            reports.extend(rx.try_iter());
            let snapshot = guard.clone();
            drop(guard);
            snapshot
        } else {
            if worker.join().is_err() {
                error!("Worker thread panicked");
            }
            status.lock().clone()
        };
        self.retire_cancelled_token();

        for channel in &channels {
            if !reports.iter().any(|r| r.key == channel.key) {
                reports.push(ChannelReport::new(&channel.key, ChannelOutcome::Cancelled));
            }
        }

        let saved = match store.save(&record) {
            Ok(saved) => saved,
            Err(e) => {
                error!(error = %e, "Failed to save install status");
                false
            }
        };

        let elapsed = started.elapsed();
        debug!(elapsed_ms = elapsed.as_millis() as u64, "Update run finished");

        Ok(RunReport {
            channels: reports,
            timed_out,
            elapsed,
            saved,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ChannelDescriptor, InstallerKind, Product, Tier};
    use crate::fetch::{FetchResult, Payload};
    use crate::installer::InstallOutcome;
    use std::path::Path;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tempfile::TempDir;

    /// Fetcher serving a fresh payload for every channel.
    struct AlwaysFresh {
        slot: PathBuf,
    }

    impl ConditionalFetcher for AlwaysFresh {
        fn fetch(&self, url: &str, _freshness_token: Option<&str>) -> FetchResult {
            fs::write(&self.slot, url).unwrap();
            FetchResult::Fetched(Payload::new(
                &self.slot,
                Some("Wed, 02 Jan 2024 00:00:00 GMT".to_string()),
                url.len() as u64,
            ))
        }
    }

    /// Fetcher that stalls on its first call only.
    struct StallsOnce {
        inner: AlwaysFresh,
        stall: Duration,
        stalled: AtomicBool,
    }

    impl ConditionalFetcher for StallsOnce {
        fn fetch(&self, url: &str, freshness_token: Option<&str>) -> FetchResult {
            if !self.stalled.swap(true, Ordering::SeqCst) {
                thread::sleep(self.stall);
                return FetchResult::Unchanged;
            }
            self.inner.fetch(url, freshness_token)
        }
    }

    struct NoopInstaller;

    impl InstallerBackend for NoopInstaller {
        fn install(&self, _payload: &Path, _channel: &ChannelDescriptor) -> InstallOutcome {
            Ok(())
        }
    }

    fn firefox_catalog() -> Catalog {
        Catalog::from_channels(
            Platform::Windows { x64: true },
            vec![ChannelDescriptor::new(
                Product::Firefox,
                Tier::Stable,
                "Mozilla Firefox",
                "https://example.com/firefox.exe",
                InstallerKind::AnswerFileExe,
            )
            .with_key("Mozilla Firefox")],
        )
    }

    fn driver(work_dir: &Path) -> RunDriver {
        let config = UpdaterConfig::for_platform(Platform::Windows { x64: true })
            .with_work_dir(work_dir)
            .with_run_budget(Duration::from_secs(30));
        let slot = config.payload_path();
        RunDriver::new(
            config,
            firefox_catalog(),
            Arc::new(AlwaysFresh { slot }),
            Arc::new(NoopInstaller),
        )
    }

    #[test]
    fn test_for_platform_builds_vendor_catalog() {
        let temp = TempDir::new().unwrap();
        let platform = Platform::MacOs { universal: true };
        let config = UpdaterConfig::for_platform(platform).with_work_dir(temp.path());

        let driver = RunDriver::for_platform(platform, config).unwrap();
        assert_eq!(driver.catalog().platform(), platform);
        assert!(!driver.catalog().channels().is_empty());
    }

    #[test]
    fn test_work_dir_failure_is_fatal() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("tmp");
        fs::write(&blocker, b"not a directory").unwrap();

        let err = driver(&blocker.join("work")).run(&Selection::all()).unwrap_err();
        assert!(matches!(err, DriverError::WorkDirFailed { .. }));
    }

    #[test]
    fn test_run_creates_work_dir_and_saves() {
        let temp = TempDir::new().unwrap();
        let work_dir = temp.path().join("tmp");
        let driver = driver(&work_dir);

        let report = driver.run(&Selection::all()).unwrap();

        assert!(!report.timed_out);
        assert!(report.saved);
        assert_eq!(report.installed(), 1);
        assert!(!report.is_partial());
        let saved = fs::read_to_string(work_dir.join("browser_install.json")).unwrap();
        assert_eq!(
            saved,
            "{\n    \"Mozilla Firefox\": \"Wed, 02 Jan 2024 00:00:00 GMT\"\n}\n"
        );
        assert!(!work_dir.join("browser_install.exe").exists());
    }

    #[test]
    fn test_empty_selection_does_not_save() {
        let temp = TempDir::new().unwrap();
        let driver = driver(temp.path());

        let report = driver.run(&Selection::new()).unwrap();

        assert!(report.channels.is_empty());
        assert!(!report.saved);
        assert!(!temp.path().join("browser_install.json").exists());
    }

    #[test]
    fn test_cancelled_before_start() {
        let temp = TempDir::new().unwrap();
        let driver = driver(temp.path());
        driver.cancellation_token().cancel();

        let report = driver.run(&Selection::all()).unwrap();

        assert!(!report.timed_out);
        assert_eq!(report.cancelled(), 1);
        assert!(!report.saved);
    }

    #[test]
    fn test_driver_is_reusable_after_cancellation() {
        let temp = TempDir::new().unwrap();
        let driver = driver(temp.path());
        let token = driver.cancellation_token();
        token.cancel();

        let first = driver.run(&Selection::all()).unwrap();
        assert_eq!(first.cancelled(), 1);

        assert!(!driver.cancellation_token().is_cancelled());
        let second = driver.run(&Selection::all()).unwrap();
        assert_eq!(second.installed(), 1);
        assert_eq!(second.cancelled(), 0);
        assert!(second.saved);
    }

    #[test]
    fn test_budget_expiry_leaves_public_token_usable() {
        let temp = TempDir::new().unwrap();
        let config = UpdaterConfig::for_platform(Platform::Windows { x64: true })
            .with_work_dir(temp.path())
            .with_run_budget(Duration::from_millis(100));
        let slot = config.payload_path();
        let fetcher = StallsOnce {
            inner: AlwaysFresh { slot },
            stall: Duration::from_millis(1500),
            stalled: AtomicBool::new(false),
        };
        let driver = RunDriver::new(
            config,
            firefox_catalog(),
            Arc::new(fetcher),
            Arc::new(NoopInstaller),
        );
        let token = driver.cancellation_token();

        let report = driver.run(&Selection::all()).unwrap();

        assert!(report.timed_out);
        assert_eq!(report.cancelled(), 1);
        assert!(!token.is_cancelled());
        assert!(!driver.cancellation_token().is_cancelled());
    }

    #[test]
    fn test_unrepresentable_budget_means_no_deadline() {
        let temp = TempDir::new().unwrap();
        let config = UpdaterConfig::for_platform(Platform::Windows { x64: true })
            .with_work_dir(temp.path())
            .with_run_budget(Duration::from_secs(u64::MAX));
        let slot = config.payload_path();
        let driver = RunDriver::new(
            config,
            firefox_catalog(),
            Arc::new(AlwaysFresh { slot }),
            Arc::new(NoopInstaller),
        );

        let report = driver.run(&Selection::all()).unwrap();

        assert!(!report.timed_out);
        assert_eq!(report.installed(), 1);
        assert!(report.saved);
        assert!(temp.path().join("browser_install.json").exists());
    }
}
