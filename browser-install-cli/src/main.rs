//! browser-install CLI - Command-line interface
//!
//! Checks the selected Chrome and Firefox channels once and installs the
//! ones that changed since the last run. Meant to be run from a scheduler.

mod cli;
mod error;
mod logging;
mod runner;
mod summary;

use std::process;

use clap::Parser;

use crate::cli::Cli;
use crate::error::{CliError, EXIT_PARTIAL_FAILURE};
use crate::logging::{init_logging, LogConfig};
use crate::runner::CliRunner;
use crate::summary::print_summary;

fn main() {
    let cli = Cli::parse();

    // Logging goes first: the local time offset is read while the process is
    // still single-threaded.
    let log_config = LogConfig::from_verbosity(cli.verbose).with_log_file(cli.log_file.clone());
    let log_guard = match init_logging(&log_config) {
        Ok(guard) => guard,
        Err(e) => exit_with(CliError::Logging(e)),
    };

    let exit_code = match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Run failed to start");
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    };

    // Flush the non-blocking log writer before exiting.
    drop(log_guard);
    process::exit(exit_code);
}

fn run(cli: &Cli) -> Result<i32, CliError> {
    let runner = CliRunner::new(cli)?;
    runner.log_startup();

    let report = runner.run(cli)?;
    print_summary(&report);

    if cli.strict && report.is_partial() {
        Ok(EXIT_PARTIAL_FAILURE)
    } else {
        Ok(0)
    }
}

fn exit_with(error: CliError) -> ! {
    eprintln!("Error: {}", error);
    process::exit(error.exit_code());
}
