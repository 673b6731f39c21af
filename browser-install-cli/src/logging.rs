//! Logging setup using `tracing-subscriber`.
//!
//! Verbosity follows the repeatable `-v` flag:
//!
//! - 0: silent
//! - 1: errors
//! - 2: warnings
//! - 3: progress (`Checking Chrome Stable...`)
//! - 4+: debug detail
//!
//! `RUST_LOG` overrides the flag when set. With `--log-file`, output is
//! appended to the file through a non-blocking writer; the returned guard
//! must be kept alive until exit so buffered lines are flushed.

use std::cmp;
use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;

use time::macros::format_description;
use time::UtcOffset;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::OffsetTime;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Maximum level for this crate and the library.
    pub level: LevelFilter,
    /// Append logs to this file instead of stderr.
    pub log_file: Option<PathBuf>,
}

impl LogConfig {
    /// Create a configuration from the `-v` count.
    pub fn from_verbosity(verbosity: u8) -> Self {
        Self {
            level: level_filter(verbosity),
            log_file: None,
        }
    }

    pub fn with_log_file(mut self, path: Option<PathBuf>) -> Self {
        self.log_file = path;
        self
    }
}

/// Map the `-v` count to a level filter.
pub fn level_filter(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::OFF,
        1 => LevelFilter::ERROR,
        2 => LevelFilter::WARN,
        3 => LevelFilter::INFO,
        _ => LevelFilter::DEBUG,
    }
}

/// Install the global subscriber.
///
/// Must be called before any other thread is started: the local UTC offset
/// can only be read safely while the process is single-threaded.
pub fn init_logging(config: &LogConfig) -> io::Result<Option<WorkerGuard>> {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    let timer = OffsetTime::new(
        offset,
        format_description!("[hour]:[minute]:[second].[subsecond digits:3]"),
    );

    let (writer, guard) = match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            (BoxMakeWriter::new(non_blocking), Some(guard))
        }
        None => (BoxMakeWriter::new(io::stderr), None),
    };

    let layer = fmt::layer()
        .with_writer(writer)
        .with_timer(timer)
        .with_target(false)
        .with_ansi(config.log_file.is_none());

    tracing_subscriber::registry()
        .with(build_env_filter(config.level))
        .with(layer)
        .try_init()
        .map_err(io::Error::other)?;

    Ok(guard)
}

/// Build the filter, letting `RUST_LOG` take precedence.
fn build_env_filter(level: LevelFilter) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(level)))
}

/// Directives for `level`, keeping HTTP internals at warnings or quieter.
fn default_directives(level: LevelFilter) -> String {
    let deps = cmp::min(level, LevelFilter::WARN);
    format!(
        "{level},hyper={deps},hyper_util={deps},reqwest={deps},rustls={deps}",
        level = directive(level),
        deps = directive(deps)
    )
}

fn directive(level: LevelFilter) -> String {
    level.to_string().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_filter_mapping() {
        assert_eq!(level_filter(0), LevelFilter::OFF);
        assert_eq!(level_filter(1), LevelFilter::ERROR);
        assert_eq!(level_filter(2), LevelFilter::WARN);
        assert_eq!(level_filter(3), LevelFilter::INFO);
        assert_eq!(level_filter(4), LevelFilter::DEBUG);
        assert_eq!(level_filter(9), LevelFilter::DEBUG);
    }

    #[test]
    fn test_silent_directives() {
        assert_eq!(
            default_directives(LevelFilter::OFF),
            "off,hyper=off,hyper_util=off,reqwest=off,rustls=off"
        );
    }

    #[test]
    fn test_debug_keeps_http_quiet() {
        assert_eq!(
            default_directives(LevelFilter::DEBUG),
            "debug,hyper=warn,hyper_util=warn,reqwest=warn,rustls=warn"
        );
    }

    #[test]
    fn test_log_config_from_verbosity() {
        let config = LogConfig::from_verbosity(3).with_log_file(Some(PathBuf::from("run.log")));
        assert_eq!(config.level, LevelFilter::INFO);
        assert_eq!(config.log_file, Some(PathBuf::from("run.log")));
    }
}
