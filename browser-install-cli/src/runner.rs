//! Run setup shared by the CLI entry point.

use std::time::Duration;

use browser_install::catalog::Platform;
use browser_install::config::UpdaterConfig;
use browser_install::driver::{RunDriver, RunReport};
use tracing::{debug, info};

use crate::cli::Cli;
use crate::error::CliError;

/// Resolves the platform and configuration, then drives a run.
#[derive(Debug)]
pub struct CliRunner {
    platform: Platform,
    config: UpdaterConfig,
}

impl CliRunner {
    /// Resolve the platform (override or detection) and layer flags over
    /// the defaults.
    pub fn new(cli: &Cli) -> Result<Self, CliError> {
        let platform = resolve_platform(cli.platform.map(Platform::from), Platform::detect())?;
        let config = build_config(cli, platform);
        Ok(Self { platform, config })
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn config(&self) -> &UpdaterConfig {
        &self.config
    }

    /// Log startup information.
    pub fn log_startup(&self) {
        info!(
            version = browser_install::VERSION,
            platform = %self.platform,
            "browser-install starting"
        );
        debug!(
            work_dir = %self.config.work_dir().display(),
            request_timeout_secs = self.config.request_timeout.as_secs(),
            install_timeout_secs = self.config.install_timeout.as_secs(),
            budget_secs = self.config.run_budget.as_secs(),
            "Configuration"
        );
    }

    /// Run the selected channels.
    ///
    /// Ctrl+C cancels the run between channels; completed channels are
    /// still saved.
    pub fn run(&self, cli: &Cli) -> Result<RunReport, CliError> {
        let driver = RunDriver::for_platform(self.platform, self.config.clone())?;

        let cancel = driver.cancellation_token();
        ctrlc::set_handler(move || {
            eprintln!();
            eprintln!("Received interrupt, finishing the current channel...");
            cancel.cancel();
        })
        .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

        Ok(driver.run(&cli.selection())?)
    }
}

/// Pick the override if given, else the detected platform.
pub fn resolve_platform(
    requested: Option<Platform>,
    detected: Option<Platform>,
) -> Result<Platform, CliError> {
    requested.or(detected).ok_or(CliError::UnsupportedPlatform)
}

/// Layer CLI flags over the platform defaults.
pub fn build_config(cli: &Cli, platform: Platform) -> UpdaterConfig {
    let config = UpdaterConfig::for_platform(platform)
        .with_request_timeout(Duration::from_secs(cli.timeout))
        .with_install_timeout(Duration::from_secs(cli.install_timeout))
        .with_run_budget(Duration::from_secs(cli.budget));

    match &cli.work_dir {
        Some(dir) => config.with_work_dir(dir),
        None => config,
    }
}
