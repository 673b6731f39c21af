//! Per-channel update orchestration
//!
//! Each selected channel goes through the same state machine:
//!
//! ```text
//! Idle ─► Checking ─┬─► Unchanged
//!                   ├─► FetchFailed
//!                   └─► Downloaded ─► Installing ─┬─► Installed      (token recorded)
//!                                                 └─► InstallFailed  (token kept)
//! ```
//!
//! Channels are processed sequentially; one channel's failure never stops
//! the rest. Cancellation is checked before each channel starts.

mod channel;
mod types;

pub use channel::ChannelOrchestrator;
pub use types::{ChannelOutcome, ChannelReport, SharedStatus};
