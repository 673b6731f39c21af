//! CLI error type.

use std::fmt;
use std::io;

use browser_install::driver::DriverError;

/// Exit status for a run that could not start.
pub const EXIT_STARTUP_FAILURE: i32 = 1;

/// Exit status for a `--strict` run with failed or abandoned channels.
pub const EXIT_PARTIAL_FAILURE: i32 = 2;

/// Errors that stop the CLI before or while starting a run.
#[derive(Debug)]
pub enum CliError {
    /// Logging could not be initialised.
    Logging(io::Error),
    /// The platform could not be detected and none was given.
    UnsupportedPlatform,
    /// Invalid configuration or environment.
    Config(String),
    /// The run driver failed to start.
    Driver(DriverError),
}

impl CliError {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        EXIT_STARTUP_FAILURE
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Logging(e) => write!(f, "Failed to initialise logging: {}", e),
            CliError::UnsupportedPlatform => write!(
                f,
                "Unsupported platform: only Windows and macOS are supported (use --platform to override)"
            ),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Driver(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Logging(e) => Some(e),
            CliError::Driver(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DriverError> for CliError {
    fn from(e: DriverError) -> Self {
        CliError::Driver(e)
    }
}
