//! End-of-run summary output.

use std::io::{self, Write};

use browser_install::driver::RunReport;
use browser_install::orchestrator::{ChannelOutcome, ChannelReport};

/// Print the run summary to stdout.
pub fn print_summary(report: &RunReport) {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    // A closed stdout must not turn a finished run into a failure.
    write_summary(&mut out, report).ok();
}

/// Write one line per channel followed by a totals line.
pub fn write_summary<W: Write>(out: &mut W, report: &RunReport) -> io::Result<()> {
    if report.channels.is_empty() {
        writeln!(out, "No channels selected.")?;
        return Ok(());
    }

    let width = report
        .channels
        .iter()
        .map(|r| r.key.len())
        .max()
        .unwrap_or(0);

    for channel in &report.channels {
        writeln!(
            out,
            "  {:<width$}  {}",
            channel.key,
            format_outcome(channel),
            width = width
        )?;
    }

    writeln!(
        out,
        "{} installed, {} failed, {} cancelled in {:.1}s{}",
        report.installed(),
        report.failed(),
        report.cancelled(),
        report.elapsed.as_secs_f64(),
        if report.timed_out {
            " (run budget elapsed)"
        } else {
            ""
        }
    )
}

/// Describe a channel outcome for the summary.
pub fn format_outcome(report: &ChannelReport) -> String {
    match &report.outcome {
        ChannelOutcome::Installed {
            freshness_token: Some(token),
        } => format!("installed ({})", token),
        ChannelOutcome::Installed {
            freshness_token: None,
        } => "installed (no freshness token)".to_string(),
        other => other.to_string(),
    }
}
