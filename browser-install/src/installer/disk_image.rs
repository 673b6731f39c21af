//! macOS disk image installer backend.
//!
//! The image is attached with `hdiutil`, every `.app` bundle on the mounted
//! volume is copied into `/Applications/`, and the volume is detached again.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::error::{InstallError, InstallOutcome};
use super::process::run_with_timeout;
use super::InstallerBackend;
use crate::catalog::{ChannelDescriptor, InstallerKind};

const VOLUMES_ROOT: &str = "/Volumes";
const APPLICATIONS_DIR: &str = "/Applications/";

/// Installs `.app` bundles from a disk image.
#[derive(Debug, Clone)]
pub struct DiskImageInstaller {
    volumes_root: PathBuf,
    applications_dir: PathBuf,
    timeout: Duration,
}

impl DiskImageInstaller {
    pub fn new(timeout: Duration) -> Self {
        Self {
            volumes_root: PathBuf::from(VOLUMES_ROOT),
            applications_dir: PathBuf::from(APPLICATIONS_DIR),
            timeout,
        }
    }

    /// Detach every mounted volume whose name starts with `prefix`.
    ///
    /// Failures are logged; a stale mount only matters if it hides the new one.
    fn detach_matching(&self, prefix: &str) {
        let volumes = match matching_volumes(&self.volumes_root, prefix) {
            Ok(volumes) => volumes,
            Err(e) => {
                warn!(prefix, error = %e, "Failed to scan volumes for detach");
                return;
            }
        };

        for volume in volumes {
            debug!(volume = %volume.display(), "Detaching volume");
            let mut command = sudo("hdiutil");
            command.arg("detach").arg(&volume);
            if let Err(e) = run_with_timeout(command, self.timeout) {
                warn!(volume = %volume.display(), error = %e, "Failed to detach volume");
            }
        }
    }

    fn attach_and_copy(&self, image: &Path, prefix: &str) -> InstallOutcome {
        let mut attach = sudo("hdiutil");
        attach.arg("attach").arg(image);
        run_with_timeout(attach, self.timeout)?;

        let volumes = matching_volumes(&self.volumes_root, prefix)?;
        let mut copied = 0usize;
        let mut last_error = None;

        for volume in &volumes {
            for app in app_bundles(volume)? {
                info!(app = %app.display(), "Copying application bundle");
                let mut copy = sudo("cp");
                copy.arg("-R").arg(&app).arg(&self.applications_dir);
                match run_with_timeout(copy, self.timeout) {
                    Ok(()) => copied += 1,
                    Err(e) => {
                        warn!(app = %app.display(), error = %e, "Failed to copy application");
                        last_error = Some(e);
                    }
                }
            }
        }

        match (copied, last_error) {
            (0, Some(e)) => Err(e),
            (0, None) => Err(InstallError::NothingToInstall {
                volume_prefix: prefix.to_string(),
            }),
            _ => Ok(()),
        }
    }
}

impl InstallerBackend for DiskImageInstaller {
    fn install(&self, payload: &Path, channel: &ChannelDescriptor) -> InstallOutcome {
        let prefix = match &channel.installer {
            InstallerKind::DiskImage { volume_prefix } => *volume_prefix,
            other => return Err(InstallError::Unsupported { kind: other.name() }),
        };

        info!(channel = %channel.key, "Installing {}", channel.key);
        self.detach_matching(prefix);
        let result = self.attach_and_copy(payload, prefix);
        self.detach_matching(prefix);
        result
    }
}

fn sudo(program: &str) -> Command {
    let mut command = Command::new("sudo");
    command.arg(program);
    command
}

/// Mounted volumes under `root` whose directory name starts with `prefix`.
pub(crate) fn matching_volumes(root: &Path, prefix: &str) -> Result<Vec<PathBuf>, InstallError> {
    let entries = fs::read_dir(root).map_err(|e| InstallError::VolumeScanFailed {
        path: root.to_path_buf(),
        source: e,
    })?;

    let mut volumes: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().starts_with(prefix))
        .map(|entry| entry.path())
        .collect();
    volumes.sort();
    Ok(volumes)
}

/// `.app` bundles at the top level of a mounted volume.
pub(crate) fn app_bundles(volume: &Path) -> Result<Vec<PathBuf>, InstallError> {
    let entries = fs::read_dir(volume).map_err(|e| InstallError::VolumeScanFailed {
        path: volume.to_path_buf(),
        source: e,
    })?;

    let mut apps: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "app"))
        .collect();
    apps.sort();
    Ok(apps)
}
