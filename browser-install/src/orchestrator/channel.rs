//! Channel orchestrator implementation

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::types::{ChannelOutcome, ChannelReport, SharedStatus};
use crate::catalog::{Catalog, ChannelDescriptor};
use crate::fetch::{ConditionalFetcher, FetchResult};
use crate::installer::InstallerBackend;

/// Drives channels through check, download, and install.
///
/// Tokens are written into the shared in-memory record only; persisting the
/// record is left to the caller.
pub struct ChannelOrchestrator {
    catalog: Catalog,
    fetcher: Arc<dyn ConditionalFetcher>,
    installer: Arc<dyn InstallerBackend>,
    status: SharedStatus,
}

impl ChannelOrchestrator {
    pub fn new(
        catalog: Catalog,
        fetcher: Arc<dyn ConditionalFetcher>,
        installer: Arc<dyn InstallerBackend>,
        status: SharedStatus,
    ) -> Self {
        Self {
            catalog,
            fetcher,
            installer,
            status,
        }
    }

    /// The shared status record.
    pub fn status(&self) -> &SharedStatus {
        &self.status
    }

    /// Check one channel and install a new payload if there is one.
    ///
    /// Returns `None` for channels unknown to the catalog. The record is not
    /// touched; see [`run_with`](Self::run_with) for committing tokens.
    pub fn process(&self, channel: &ChannelDescriptor) -> Option<ChannelOutcome> {
        if !self.catalog.contains(&channel.key) {
            debug!(channel = %channel.key, "Skipping channel not in catalog");
            return None;
        }

        info!(channel = %channel.key, "Checking {}...", channel.key);
        let prior = self.status.lock().token(&channel.key).map(str::to_owned);

        let payload = match self.fetcher.fetch(&channel.url, prior.as_deref()) {
            FetchResult::Unchanged => {
                info!(channel = %channel.key, "{} is up to date", channel.key);
                return Some(ChannelOutcome::Unchanged);
            }
            FetchResult::Failed(e) => {
                warn!(channel = %channel.key, url = %channel.url, error = %e, "Download failed");
                return Some(ChannelOutcome::FetchFailed(e));
            }
            FetchResult::Fetched(payload) => payload,
        };

        // The payload file is removed when `payload` drops at the end of
        // this scope, whatever the install outcome.
        let outcome = match self.installer.install(payload.path(), channel) {
            Ok(()) => {
                let freshness_token = payload.freshness_token().map(str::to_owned);
                match &freshness_token {
                    Some(token) => info!(channel = %channel.key, token = %token, "Installed"),
                    None => warn!(
                        channel = %channel.key,
                        "Installed without a freshness token; it will be downloaded again next run"
                    ),
                }
                ChannelOutcome::Installed { freshness_token }
            }
            Err(e) => {
                warn!(channel = %channel.key, error = %e, "Install failed");
                ChannelOutcome::InstallFailed(e)
            }
        };
        Some(outcome)
    }

    /// Process `channels` in order, handing each report to `on_report`.
    ///
    /// A successful install's token is committed to the shared record under
    /// the same lock acquisition that hands out its report. Once `cancel`
    /// fires, the remaining channels are reported as cancelled without being
    /// touched.
    pub fn run_with<F>(
        &self,
        channels: &[ChannelDescriptor],
        cancel: &CancellationToken,
        mut on_report: F,
    ) where
        F: FnMut(ChannelReport),
    {
        for channel in channels {
            if !self.catalog.contains(&channel.key) {
                debug!(channel = %channel.key, "Skipping channel not in catalog");
                continue;
            }
            if cancel.is_cancelled() {
                debug!(channel = %channel.key, "Run cancelled, not checking channel");
                on_report(ChannelReport::new(&channel.key, ChannelOutcome::Cancelled));
                continue;
            }

            let Some(outcome) = self.process(channel) else {
                continue;
            };

            let mut status = self.status.lock();
            if let ChannelOutcome::Installed {
                freshness_token: Some(token),
            } = &outcome
            {
                status.record(&channel.key, token.as_str());
            }
            on_report(ChannelReport::new(&channel.key, outcome));
        }
    }

    /// Process `channels` in order and collect their reports.
    pub fn run(
        &self,
        channels: &[ChannelDescriptor],
        cancel: &CancellationToken,
    ) -> Vec<ChannelReport> {
        let mut reports = Vec::with_capacity(channels.len());
        self.run_with(channels, cancel, |report| reports.push(report));
        reports
    }
}
