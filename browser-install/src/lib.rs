//! browser-install - Keep browser release channels up to date
//!
//! This library checks vendor download endpoints for new Chrome and Firefox
//! installers, installs only what changed since the last run, and records a
//! freshness token per channel so the next run can ask the vendor for
//! "anything newer than this".
//!
//! ```text
//! Selection ─► Catalog ─► RunDriver ─► ChannelOrchestrator ─┬─► ConditionalFetcher
//!                             │                             └─► InstallerBackend
//!                             └─► StatusStore (load once, save once)
//! ```

pub mod catalog;
pub mod config;
pub mod driver;
pub mod fetch;
pub mod installer;
pub mod orchestrator;
pub mod status;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
