//! Running installer processes under a timeout.

use std::process::Command;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::error::{InstallError, InstallOutcome};

/// How often a running installer is polled for exit.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Run `command` to completion, terminating it once `timeout` elapses.
///
/// Success means the process exited with status zero. A timeout too large
/// to represent as a deadline waits without limit.
pub fn run_with_timeout(mut command: Command, timeout: Duration) -> InstallOutcome {
    let program = command.get_program().to_string_lossy().into_owned();
    debug!(command = ?command, timeout_secs = timeout.as_secs(), "Running installer command");

    let mut child = command.spawn().map_err(|e| InstallError::SpawnFailed {
        program: program.clone(),
        source: e,
    })?;

    let deadline = Instant::now().checked_add(timeout);
    loop {
        match child.try_wait() {
            Ok(Some(status)) if status.success() => {
                debug!(program = %program, "Installer command succeeded");
                return Ok(());
            }
            Ok(Some(status)) => {
                return Err(InstallError::ExitFailure {
                    program,
                    code: status.code(),
                });
            }
            Ok(None) if deadline.is_some_and(|d| Instant::now() >= d) => {
                warn!(
                    program = %program,
                    timeout_secs = timeout.as_secs(),
                    "Installer command timed out, terminating"
                );
                child.kill().ok();
                child.wait().ok();
                return Err(InstallError::TimedOut {
                    program,
                    timeout_secs: timeout.as_secs(),
                });
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => {
                child.kill().ok();
                return Err(InstallError::WaitFailed { program, source: e });
            }
        }
    }
}
