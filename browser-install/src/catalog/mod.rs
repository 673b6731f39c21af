//! Channel catalog.
//!
//! This module describes what can be installed:
//! - [`Platform`] detection (`platform`)
//! - Channel identity types (`descriptor`)
//! - Per-platform vendor URL tables (`tables`)
//! - Product × tier selection (`selection`)
//!
//! # Example
//!
//! ```
//! use browser_install::catalog::{Catalog, Platform, Product, Selection, Tier};
//!
//! let catalog = Catalog::for_platform(Platform::Windows { x64: true });
//! let selection = Selection::new()
//!     .with_product(Product::Chrome)
//!     .with_tier(Tier::Beta);
//!
//! let channels = catalog.select(&selection);
//! assert_eq!(channels.len(), 1);
//! assert_eq!(channels[0].key, "Chrome Beta");
//! ```

mod descriptor;
mod platform;
mod selection;
mod tables;

pub use descriptor::{ChannelDescriptor, InstallerKind, Product, Tier};
pub use platform::Platform;
pub use selection::Selection;
pub use tables::Catalog;
