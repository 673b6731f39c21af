//! Installer backends.
//!
//! The orchestrator hands each downloaded payload to an [`InstallerBackend`]
//! and only looks at whether the install succeeded. How privileges are
//! raised or images mounted is up to the platform backend:
//!
//! ```text
//! InstallerBackend (trait)
//!         ├── ElevatedExeInstaller   Windows: UAC-elevated silent / answer-file setup
//!         └── DiskImageInstaller     macOS: hdiutil attach + copy .app bundles
//! ```
//!
//! [`backend_for`] picks the backend for a platform.

mod disk_image;
mod error;
mod process;
mod windows;

use std::path::Path;
use std::sync::Arc;

use crate::catalog::{ChannelDescriptor, Platform};
use crate::config::UpdaterConfig;

pub use disk_image::DiskImageInstaller;
pub use error::{InstallError, InstallOutcome, TERMINATED_EXIT_CODE};
pub use process::run_with_timeout;
pub use windows::ElevatedExeInstaller;

/// Applies a downloaded payload for a channel.
///
/// Implementations block until the install finished or was given up on.
pub trait InstallerBackend: Send + Sync {
    fn install(&self, payload: &Path, channel: &ChannelDescriptor) -> InstallOutcome;
}

/// The installer backend for a platform.
pub fn backend_for(platform: Platform, config: &UpdaterConfig) -> Arc<dyn InstallerBackend> {
    match platform {
        Platform::Windows { .. } => Arc::new(ElevatedExeInstaller::new(
            config.answer_file_path(),
            config.install_timeout,
        )),
        Platform::MacOs { .. } => Arc::new(DiskImageInstaller::new(config.install_timeout)),
    }
}
