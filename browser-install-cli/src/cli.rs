//! Command-line arguments.

use std::path::PathBuf;

use browser_install::catalog::{Platform, Product, Selection, Tier};
use browser_install::config::{
    DEFAULT_INSTALL_TIMEOUT_SECS, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_RUN_BUDGET_SECS,
};
use clap::{value_parser, ArgAction, Parser, ValueEnum};

/// Upper bound for the timeout and budget flags (one week).
pub const MAX_TIMEOUT_SECS: u64 = 7 * 24 * 60 * 60;

#[derive(Debug, Parser)]
#[command(
    name = "browser-install",
    version,
    about = "Install or update Chrome and Firefox release channels",
    long_about = "Check the vendor download endpoints for new Chrome and Firefox installers \
                  and install the channels that changed since the last run.\n\n\
                  Product flags (-c, -f) and tier flags (-s, -b, -d) combine: -c -b selects \
                  Chrome Beta. With no selection flags every channel is checked."
)]
pub struct Cli {
    /// Check every product and tier.
    #[arg(short = 'a', long)]
    pub all: bool,

    /// Select Chrome.
    #[arg(short = 'c', long)]
    pub chrome: bool,

    /// Select Firefox.
    #[arg(short = 'f', long)]
    pub firefox: bool,

    /// Select stable channels.
    #[arg(short = 's', long)]
    pub stable: bool,

    /// Select beta channels.
    #[arg(short = 'b', long)]
    pub beta: bool,

    /// Select dev, canary and nightly channels.
    #[arg(short = 'd', long)]
    pub dev: bool,

    /// Increase log verbosity (-v errors, -vv warnings, -vvv info, -vvvv debug).
    #[arg(short = 'v', long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Directory for the status file and downloaded installers
    /// (default: tmp/ beside the executable).
    #[arg(long, value_name = "DIR")]
    pub work_dir: Option<PathBuf>,

    /// Timeout for each download request in seconds.
    #[arg(
        long,
        value_name = "SECS",
        default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS,
        value_parser = value_parser!(u64).range(1..=MAX_TIMEOUT_SECS)
    )]
    pub timeout: u64,

    /// Timeout for each installer run in seconds.
    #[arg(
        long,
        value_name = "SECS",
        default_value_t = DEFAULT_INSTALL_TIMEOUT_SECS,
        value_parser = value_parser!(u64).range(1..=MAX_TIMEOUT_SECS)
    )]
    pub install_timeout: u64,

    /// Wall-clock budget for the whole run in seconds.
    #[arg(
        long,
        value_name = "SECS",
        default_value_t = DEFAULT_RUN_BUDGET_SECS,
        value_parser = value_parser!(u64).range(1..=MAX_TIMEOUT_SECS)
    )]
    pub budget: u64,

    /// Platform to install for (default: detect).
    #[arg(long, value_enum)]
    pub platform: Option<PlatformArg>,

    /// Write logs to a file instead of stderr.
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Exit with status 2 when any channel failed or the budget elapsed.
    #[arg(long)]
    pub strict: bool,
}

impl Cli {
    /// The channels the flags select.
    ///
    /// `--all`, or no selection flags at all, selects everything. Otherwise a
    /// channel is selected when both its product and its tier are.
    pub fn selection(&self) -> Selection {
        let any_flag = self.chrome || self.firefox || self.stable || self.beta || self.dev;
        if self.all || !any_flag {
            return Selection::all();
        }

        let products = [(self.chrome, Product::Chrome), (self.firefox, Product::Firefox)];
        let tiers = [
            (self.stable, Tier::Stable),
            (self.beta, Tier::Beta),
            (self.dev, Tier::Dev),
        ];

        let selection = products
            .into_iter()
            .filter(|(set, _)| *set)
            .fold(Selection::new(), |s, (_, product)| s.with_product(product));
        tiers
            .into_iter()
            .filter(|(set, _)| *set)
            .fold(selection, |s, (_, tier)| s.with_tier(tier))
    }
}

/// Platform override for CLI arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PlatformArg {
    /// 64-bit Windows
    #[value(alias = "win64", alias = "windows-x64")]
    Windows,
    /// 32-bit Windows
    #[value(alias = "win32")]
    WindowsX86,
    /// macOS on Apple silicon (universal builds)
    #[value(alias = "mac", alias = "macos-universal")]
    Macos,
    /// macOS on Intel
    MacosIntel,
}

impl From<PlatformArg> for Platform {
    fn from(arg: PlatformArg) -> Self {
        match arg {
            PlatformArg::Windows => Platform::Windows { x64: true },
            PlatformArg::WindowsX86 => Platform::Windows { x64: false },
            PlatformArg::Macos => Platform::MacOs { universal: true },
            PlatformArg::MacosIntel => Platform::MacOs { universal: false },
        }
    }
}
