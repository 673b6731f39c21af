//! Channel identity types.
//!
//! A [`ChannelDescriptor`] names one release channel of one product, where its
//! installer is downloaded from and which installer backend applies it.

use std::fmt;

/// A browser product managed by the updater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Product {
    /// Google Chrome.
    Chrome,
    /// Mozilla Firefox.
    Firefox,
}

impl Product {
    /// Every supported product, in processing order.
    pub const ALL: [Product; 2] = [Product::Chrome, Product::Firefox];

    /// Get the display name used in channel keys.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Chrome => "Chrome",
            Self::Firefox => "Firefox",
        }
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Release tier used by the selection flags.
///
/// Several channels can share a tier: Firefox ESR and Developer Edition are
/// both selected by the stable flag, Chrome Canary by the dev flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Tier {
    Stable,
    Beta,
    Dev,
}

impl Tier {
    /// Every tier, in processing order.
    pub const ALL: [Tier; 3] = [Tier::Stable, Tier::Beta, Tier::Dev];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Stable => "stable",
            Self::Beta => "beta",
            Self::Dev => "dev",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Selects how a downloaded payload is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallerKind {
    /// Executable run elevated with fixed silent-install arguments.
    SilentExe { args: &'static str },

    /// Executable run elevated with an INI answer file naming the install
    /// directory after the channel label.
    AnswerFileExe,

    /// Disk image attached with `hdiutil`; application bundles found on the
    /// volume whose name starts with `volume_prefix` are copied into
    /// `/Applications`.
    DiskImage { volume_prefix: &'static str },
}

impl InstallerKind {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SilentExe { .. } => "silent-exe",
            Self::AnswerFileExe => "answer-file-exe",
            Self::DiskImage { .. } => "disk-image",
        }
    }
}

/// One installable release channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelDescriptor {
    /// Product this channel belongs to.
    pub product: Product,

    /// Tier the channel is selected by.
    pub tier: Tier,

    /// Channel label as the vendor names it (e.g. "Beta", "Mozilla Firefox ESR").
    pub label: String,

    /// Stable key under which the freshness token is persisted.
    pub key: String,

    /// Vendor download URL.
    pub url: String,

    /// Installer backend selector.
    pub installer: InstallerKind,
}

impl ChannelDescriptor {
    /// Create a descriptor keyed as `"<product> <label>"`.
    pub fn new(
        product: Product,
        tier: Tier,
        label: impl Into<String>,
        url: impl Into<String>,
        installer: InstallerKind,
    ) -> Self {
        let label = label.into();
        Self {
            key: format!("{} {}", product.name(), label),
            product,
            tier,
            label,
            url: url.into(),
            installer,
        }
    }

    /// Override the persisted key.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }
}

impl fmt::Display for ChannelDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_defaults_to_product_and_label() {
        let channel = ChannelDescriptor::new(
            Product::Chrome,
            Tier::Beta,
            "Beta",
            "https://example.com/beta.exe",
            InstallerKind::SilentExe {
                args: "/silent /install",
            },
        );
        assert_eq!(channel.key, "Chrome Beta");
        assert_eq!(channel.to_string(), "Chrome Beta");
    }

    #[test]
    fn test_with_key_overrides() {
        let channel = ChannelDescriptor::new(
            Product::Firefox,
            Tier::Dev,
            "Nightly",
            "https://example.com/nightly.exe",
            InstallerKind::AnswerFileExe,
        )
        .with_key("Nightly");
        assert_eq!(channel.key, "Nightly");
        assert_eq!(channel.label, "Nightly");
    }

    #[test]
    fn test_tier_order() {
        assert!(Tier::Stable < Tier::Beta);
        assert!(Tier::Beta < Tier::Dev);
        assert_eq!(Tier::Dev.to_string(), "dev");
    }

    #[test]
    fn test_installer_kind_name() {
        let kind = InstallerKind::DiskImage {
            volume_prefix: "Firefox",
        };
        assert_eq!(kind.name(), "disk-image");
    }
}
