//! Windows installer backend.
//!
//! Setup executables are started through PowerShell's `Start-Process -Verb
//! RunAs`, which raises the UAC prompt (or elevates silently for an admin
//! service account). PowerShell waits for the setup, terminates it after the
//! install timeout, and exits with the setup's exit code.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use ini::Ini;
use tracing::{debug, info, warn};

use super::error::{InstallError, InstallOutcome, TERMINATED_EXIT_CODE};
use super::process::run_with_timeout;
use super::InstallerBackend;
use crate::catalog::{ChannelDescriptor, InstallerKind};

/// Extra time granted to the PowerShell wrapper beyond the installer timeout.
const WRAPPER_GRACE: Duration = Duration::from_secs(30);

/// Exit code of the wrapper when the setup could not be started elevated.
const ELEVATION_FAILED_EXIT_CODE: i32 = 1;

/// Runs setup executables elevated.
#[derive(Debug, Clone)]
pub struct ElevatedExeInstaller {
    answer_file: PathBuf,
    timeout: Duration,
}

impl ElevatedExeInstaller {
    /// Create a backend writing answer files to `answer_file`.
    pub fn new(answer_file: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            answer_file: answer_file.into(),
            timeout,
        }
    }

    /// Run `exe` elevated with `args` and wait for it.
    fn run_elevated(&self, exe: &Path, args: &str) -> InstallOutcome {
        let script = elevation_script(exe, args, self.timeout);
        debug!(exe = %exe.display(), args, "Running installer elevated");

        let mut command = Command::new("powershell");
        command.args([
            "-NoProfile",
            "-NonInteractive",
            "-ExecutionPolicy",
            "Bypass",
            "-Command",
            &script,
        ]);

        let wrapper_timeout = self.timeout.saturating_add(WRAPPER_GRACE);
        match run_with_timeout(command, wrapper_timeout) {
            Err(InstallError::ExitFailure {
                code: Some(TERMINATED_EXIT_CODE),
                ..
            }) => Err(InstallError::TimedOut {
                program: exe.display().to_string(),
                timeout_secs: self.timeout.as_secs(),
            }),
            other => other,
        }
    }

    /// Install with an INI answer file, removing the file afterwards.
    fn install_with_answer_file(
        &self,
        payload: &Path,
        channel: &ChannelDescriptor,
    ) -> InstallOutcome {
        write_answer_file(&self.answer_file, &channel.label).map_err(|e| {
            InstallError::AnswerFileFailed {
                path: self.answer_file.clone(),
                source: e,
            }
        })?;

        let args = format!("/INI=\"{}\"", self.answer_file.display());
        let result = self.run_elevated(payload, &args);

        if let Err(e) = fs::remove_file(&self.answer_file) {
            if e.kind() != io::ErrorKind::NotFound {
                warn!(
                    path = %self.answer_file.display(),
                    error = %e,
                    "Failed to remove answer file"
                );
            }
        }
        result
    }
}

impl InstallerBackend for ElevatedExeInstaller {
    fn install(&self, payload: &Path, channel: &ChannelDescriptor) -> InstallOutcome {
        info!(channel = %channel.key, "Installing {}", channel.key);
        match &channel.installer {
            InstallerKind::SilentExe { args } => self.run_elevated(payload, args),
            InstallerKind::AnswerFileExe => self.install_with_answer_file(payload, channel),
            other => Err(InstallError::Unsupported { kind: other.name() }),
        }
    }
}

/// The Firefox installer answer file.
pub(crate) fn answer_file_ini(install_directory_name: &str) -> Ini {
    let mut conf = Ini::new();
    conf.with_section(Some("Install"))
        .set("InstallDirectoryName", install_directory_name)
        .set("MaintenanceService", "false");
    conf
}

fn write_answer_file(path: &Path, install_directory_name: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    answer_file_ini(install_directory_name).write_to_file(path)
}

/// PowerShell script that runs `exe` elevated, waits up to `timeout`, and
/// exits with the setup's exit code (or the terminated code on timeout).
///
/// A declined UAC prompt or any other `Start-Process` error exits non-zero.
pub(crate) fn elevation_script(exe: &Path, args: &str, timeout: Duration) -> String {
    format!(
        "$ErrorActionPreference = 'Stop'; \
         try {{ \
         $p = Start-Process -FilePath {exe} -ArgumentList {args} -Verb RunAs -WindowStyle Hidden -PassThru; \
         if ($null -eq $p) {{ exit {failed} }}; \
         if (-not $p.WaitForExit({millis})) {{ Stop-Process -Id $p.Id -Force; exit {terminated} }}; \
         exit $p.ExitCode \
         }} catch {{ exit {failed} }}",
        exe = ps_quote(&exe.display().to_string()),
        args = ps_quote(args),
        millis = timeout.as_millis().min(i32::MAX as u128),
        terminated = TERMINATED_EXIT_CODE,
        failed = ELEVATION_FAILED_EXIT_CODE,
    )
}

/// Quote a value as a PowerShell single-quoted literal.
fn ps_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Product, Tier};
    use tempfile::TempDir;

    fn disk_image_channel() -> ChannelDescriptor {
        ChannelDescriptor::new(
            Product::Chrome,
            Tier::Stable,
            "Stable",
            "https://example.com/googlechrome.dmg",
            InstallerKind::DiskImage {
                volume_prefix: "Google Chrome",
            },
        )
    }

    #[test]
    fn test_answer_file_contents() {
        let conf = answer_file_ini("Mozilla Firefox ESR");
        let install = conf.section(Some("Install")).unwrap();
        assert_eq!(install.get("InstallDirectoryName"), Some("Mozilla Firefox ESR"));
        assert_eq!(install.get("MaintenanceService"), Some("false"));
    }

    #[test]
    fn test_write_answer_file_creates_parent() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("work").join("firefox.ini");

        write_answer_file(&path, "Nightly").unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("[Install]"));
        assert!(written.contains("InstallDirectoryName=Nightly"));
        assert!(written.contains("MaintenanceService=false"));

        let loaded = Ini::load_from_file(&path).unwrap();
        assert_eq!(
            loaded.get_from(Some("Install"), "InstallDirectoryName"),
            Some("Nightly")
        );
    }

    #[test]
    fn test_elevation_script() {
        let script = elevation_script(
            Path::new(r"C:\tools\tmp\browser_install.exe"),
            "/silent /install",
            Duration::from_secs(300),
        );
        assert!(script.contains(r"-FilePath 'C:\tools\tmp\browser_install.exe'"));
        assert!(script.contains("-ArgumentList '/silent /install'"));
        assert!(script.contains("-Verb RunAs"));
        assert!(script.contains("WaitForExit(300000)"));
        assert!(script.contains("exit 13"));
    }

    #[test]
    fn test_elevation_script_fails_when_setup_does_not_start() {
        let script = elevation_script(
            Path::new(r"C:\tools\tmp\browser_install.exe"),
            "/S",
            Duration::from_secs(300),
        );
        assert!(script.starts_with("$ErrorActionPreference = 'Stop';"));
        assert!(script.contains("if ($null -eq $p) { exit 1 }"));
        assert!(script.trim_end().ends_with("} catch { exit 1 }"));
        // The only success path exits with the setup's own code.
        assert_eq!(script.matches("exit $p.ExitCode").count(), 1);
        assert!(!script.contains("exit 0"));
    }

    #[test]
    fn test_elevation_script_clamps_huge_timeout() {
        let script = elevation_script(Path::new("setup.exe"), "/S", Duration::from_secs(u64::MAX));
        assert!(script.contains(&format!("WaitForExit({})", i32::MAX)));
    }

    #[test]
    fn test_ps_quote_escapes_single_quotes() {
        assert_eq!(ps_quote("it's"), "'it''s'");
        assert_eq!(
            ps_quote(r#"/INI="C:\a b\firefox.ini""#),
            r#"'/INI="C:\a b\firefox.ini"'"#
        );
    }

    #[test]
    fn test_disk_image_is_unsupported() {
        let temp = TempDir::new().unwrap();
        let installer =
            ElevatedExeInstaller::new(temp.path().join("firefox.ini"), Duration::from_secs(1));

        let err = installer
            .install(&temp.path().join("browser.dmg"), &disk_image_channel())
            .unwrap_err();
        assert!(matches!(err, InstallError::Unsupported { kind: "disk-image" }));
    }
}
