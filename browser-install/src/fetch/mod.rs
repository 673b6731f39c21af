//! Conditional download of installer payloads.
//!
//! A fetch asks the vendor for the installer only if it changed since the
//! freshness token recorded for the channel:
//!
//! ```text
//! fetch(url, token?) ──► 304 Not Modified ──► FetchResult::Unchanged
//!                   ├──► 2xx              ──► FetchResult::Fetched(Payload)
//!                   └──► anything else    ──► FetchResult::Failed(FetchError)
//! ```
//!
//! The payload lives at a single fixed path that is cleared before every
//! attempt and removed again when the [`Payload`] is dropped.

mod error;
mod http;
mod payload;

pub use error::FetchError;
pub use http::{HttpFetcher, CHUNK_SIZE};
pub use payload::Payload;

/// Outcome of a conditional fetch.
#[derive(Debug)]
pub enum FetchResult {
    /// The server has nothing newer than the given token.
    Unchanged,

    /// A new payload was written to disk.
    Fetched(Payload),

    /// The request or the write failed.
    Failed(FetchError),
}

/// Performs conditional retrievals.
///
/// This abstraction lets the orchestrator run against scripted fetchers in
/// tests; [`HttpFetcher`] is the production implementation.
pub trait ConditionalFetcher: Send + Sync {
    /// Fetch `url` unless it is unchanged since `freshness_token`.
    ///
    /// With no token the fetch is unconditional.
    fn fetch(&self, url: &str, freshness_token: Option<&str>) -> FetchResult;
}
