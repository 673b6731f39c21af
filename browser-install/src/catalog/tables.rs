//! Vendor download tables.
//!
//! [`Catalog::for_platform`] builds the full list of known channels for a
//! platform. Entries are ordered product first, then tier, which is the
//! order channels are processed in.

use super::descriptor::{ChannelDescriptor, InstallerKind, Product, Tier};
use super::platform::Platform;
use super::selection::Selection;

/// Arguments for a silent, system-wide Chrome install.
const CHROME_SILENT_ARGS: &str = "/silent /install";

/// Chrome standalone installer URLs for 64-bit Windows.
const CHROME_WIN64: [(&str, Tier, &str); 3] = [
    (
        "Stable",
        Tier::Stable,
        "https://dl.google.com/tag/s/\
         appguid%3D%7B8A69D345-D564-463C-AFF1-A69D9E530F96%7D%26\
         iid%3D%7B3C078BAD-5ACB-D945-6C84-7F778A6383F1%7D%26lang%3Den%26\
         browser%3D4%26usagestats%3D0%26appname%3DGoogle%2520Chrome%26\
         needsadmin%3Dtrue%26ap%3Dx64-stable-statsdef_1%26\
         installdataindex%3Ddefaultbrowser\
         /chrome/install/ChromeStandaloneSetup64.exe",
    ),
    (
        "Beta",
        Tier::Beta,
        "https://dl.google.com/tag/s/\
         appguid%3D%7B8237E44A-0054-442C-B6B6-EA0509993955%7D%26\
         iid%3D%7B8F94C426-F48E-944F-58B4-56AC548C0A6F%7D%26lang%3Den%26\
         browser%3D4%26usagestats%3D0%26appname%3DChrome%2520Beta%26\
         needsadmin%3Dtrue%26ap%3D-arch_x64-statsdef_1%26\
         installdataindex%3Dempty\
         /chrome/install/beta/ChromeBetaStandaloneSetup64.exe",
    ),
    (
        "Dev",
        Tier::Dev,
        "https://dl.google.com/tag/s/\
         appguid%3D%7B401C381F-E0DE-4B85-8BD8-3F3F14FBDA57%7D%26\
         iid%3D%7B3C078BAD-5ACB-D945-6C84-7F778A6383F1%7D%26lang%3Den%26\
         browser%3D4%26usagestats%3D0%26appname%3DGoogle%2520Chrome%2520Dev%26\
         needsadmin%3Dtrue%26ap%3D-arch_x64-statsdef_1%26\
         installdataindex%3Dempty\
         /chrome/install/dev/ChromeDevStandaloneSetup64.exe",
    ),
];

/// Chrome standalone installer URLs for 32-bit Windows.
const CHROME_WIN32: [(&str, Tier, &str); 3] = [
    (
        "Stable",
        Tier::Stable,
        "https://dl.google.com/tag/s/\
         appguid%3D%7B8A69D345-D564-463C-AFF1-A69D9E530F96%7D%26\
         iid%3D%7B3C078BAD-5ACB-D945-6C84-7F778A6383F1%7D%26lang%3D\
         en%26browser%3D4%26usagestats%3D0%26appname%3DGoogle%2520Chrome%26\
         needsadmin%3Dtrue%26ap%3Dstable-arch_x86-statsdef_1%26\
         installdataindex%3Ddefaultbrowser\
         /chrome/install/ChromeStandaloneSetup.exe",
    ),
    (
        "Beta",
        Tier::Beta,
        "https://dl.google.com/tag/s/\
         appguid%3D%7B8237E44A-0054-442C-B6B6-EA0509993955%7D%26\
         iid%3D%7B8F94C426-F48E-944F-58B4-56AC548C0A6F%7D%26lang%3Den%26\
         browser%3D4%26usagestats%3D0%26appname%3DChrome%2520Beta%26\
         needsadmin%3Dtrue%26ap%3D-arch_x86-statsdef_1%26\
         installdataindex%3Dempty\
         /chrome/install/beta/ChromeBetaStandaloneSetup.exe",
    ),
    (
        "Dev",
        Tier::Dev,
        "https://dl.google.com/tag/s/\
         appguid%3D%7B401C381F-E0DE-4B85-8BD8-3F3F14FBDA57%7D%26\
         iid%3D%7B3C078BAD-5ACB-D945-6C84-7F778A6383F1%7D%26lang%3Den%26\
         browser%3D4%26usagestats%3D0%26appname%3DGoogle%2520Chrome%2520Dev%26\
         needsadmin%3Dtrue%26ap%3D-arch_x86-statsdef_1%26\
         installdataindex%3Dempty\
         /chrome/install/dev/ChromeDevStandaloneSetup.exe",
    ),
];

/// Firefox channels on Windows: (label, tier, Mozilla product id).
const FIREFOX_WINDOWS: [(&str, Tier, &str); 5] = [
    ("Mozilla Firefox", Tier::Stable, "firefox-latest"),
    ("Mozilla Firefox ESR", Tier::Stable, "firefox-esr-latest"),
    ("Mozilla Firefox Dev", Tier::Stable, "firefox-devedition-latest"),
    ("Mozilla Firefox Beta", Tier::Beta, "firefox-beta-latest"),
    ("Nightly", Tier::Dev, "firefox-nightly-latest"),
];

/// Chrome disk images on macOS: (label, tier, path below the build flavour).
const CHROME_MAC: [(&str, Tier, &str); 4] = [
    ("Stable", Tier::Stable, "stable/GGRO/googlechrome.dmg"),
    ("Beta", Tier::Beta, "beta/googlechromebeta.dmg"),
    ("Dev", Tier::Dev, "dev/googlechromedev.dmg"),
    ("Canary", Tier::Dev, "canary/googlechromecanary.dmg"),
];

const FIREFOX_MAC_URL: &str =
    "https://download.mozilla.org/?product=firefox-latest-ssl&os=osx&lang=en-US";

/// The known channels for one platform.
#[derive(Debug, Clone)]
pub struct Catalog {
    platform: Platform,
    channels: Vec<ChannelDescriptor>,
}

impl Catalog {
    /// Build the vendor table for a platform.
    pub fn for_platform(platform: Platform) -> Self {
        let channels = match platform {
            Platform::Windows { x64 } => windows_channels(x64),
            Platform::MacOs { universal } => macos_channels(universal),
        };
        Self { platform, channels }
    }

    /// Build a catalog from an explicit channel list.
    pub fn from_channels(platform: Platform, channels: Vec<ChannelDescriptor>) -> Self {
        Self { platform, channels }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// All known channels in processing order.
    pub fn channels(&self) -> &[ChannelDescriptor] {
        &self.channels
    }

    /// Look up a channel by its persisted key.
    pub fn get(&self, key: &str) -> Option<&ChannelDescriptor> {
        self.channels.iter().find(|c| c.key == key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// The channels a selection covers, in processing order.
    pub fn select(&self, selection: &Selection) -> Vec<ChannelDescriptor> {
        self.channels
            .iter()
            .filter(|c| selection.includes(c))
            .cloned()
            .collect()
    }
}

fn windows_channels(x64: bool) -> Vec<ChannelDescriptor> {
    let chrome = if x64 { &CHROME_WIN64 } else { &CHROME_WIN32 };
    let firefox_os = if x64 { "win64" } else { "win" };

    let chrome = chrome.iter().map(|(label, tier, url)| {
        ChannelDescriptor::new(
            Product::Chrome,
            *tier,
            *label,
            *url,
            InstallerKind::SilentExe {
                args: CHROME_SILENT_ARGS,
            },
        )
    });

    // Firefox keys are the bare channel label so existing status files stay valid.
    let firefox = FIREFOX_WINDOWS.iter().map(|(label, tier, product)| {
        ChannelDescriptor::new(
            Product::Firefox,
            *tier,
            *label,
            format!(
                "http://download.mozilla.org/?product={}&lang=en-US&os={}",
                product, firefox_os
            ),
            InstallerKind::AnswerFileExe,
        )
        .with_key(*label)
    });

    chrome.chain(firefox).collect()
}

fn macos_channels(universal: bool) -> Vec<ChannelDescriptor> {
    let flavour = if universal { "mac/universal" } else { "mac" };

    let chrome = CHROME_MAC.iter().map(|(label, tier, path)| {
        ChannelDescriptor::new(
            Product::Chrome,
            *tier,
            *label,
            format!("https://dl.google.com/chrome/{}/{}", flavour, path),
            InstallerKind::DiskImage {
                volume_prefix: "Google Chrome",
            },
        )
    });

    let firefox = std::iter::once(ChannelDescriptor::new(
        Product::Firefox,
        Tier::Stable,
        "Mozilla Firefox",
        FIREFOX_MAC_URL,
        InstallerKind::DiskImage {
            volume_prefix: "Firefox",
        },
    ));

    chrome.chain(firefox).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(channels: &[ChannelDescriptor]) -> Vec<&str> {
        channels.iter().map(|c| c.key.as_str()).collect()
    }

    #[test]
    fn test_windows_catalog_keys() {
        let catalog = Catalog::for_platform(Platform::Windows { x64: true });
        assert_eq!(
            keys(catalog.channels()),
            vec![
                "Chrome Stable",
                "Chrome Beta",
                "Chrome Dev",
                "Mozilla Firefox",
                "Mozilla Firefox ESR",
                "Mozilla Firefox Dev",
                "Mozilla Firefox Beta",
                "Nightly",
            ]
        );
    }

    #[test]
    fn test_windows_architecture_selects_urls() {
        let x64 = Catalog::for_platform(Platform::Windows { x64: true });
        let x86 = Catalog::for_platform(Platform::Windows { x64: false });

        let chrome64 = x64.get("Chrome Stable").unwrap();
        let chrome32 = x86.get("Chrome Stable").unwrap();
        assert!(chrome64.url.ends_with("ChromeStandaloneSetup64.exe"));
        assert!(chrome32.url.ends_with("ChromeStandaloneSetup.exe"));
        assert!(!chrome64.url.contains(' '));

        assert!(x64.get("Nightly").unwrap().url.ends_with("os=win64"));
        assert!(x86.get("Nightly").unwrap().url.ends_with("os=win"));
    }

    #[test]
    fn test_windows_installer_kinds() {
        let catalog = Catalog::for_platform(Platform::Windows { x64: true });
        assert_eq!(
            catalog.get("Chrome Beta").unwrap().installer,
            InstallerKind::SilentExe {
                args: "/silent /install"
            }
        );
        assert_eq!(
            catalog.get("Mozilla Firefox ESR").unwrap().installer,
            InstallerKind::AnswerFileExe
        );
    }

    #[test]
    fn test_macos_catalog() {
        let catalog = Catalog::for_platform(Platform::MacOs { universal: true });
        assert_eq!(
            keys(catalog.channels()),
            vec![
                "Chrome Stable",
                "Chrome Beta",
                "Chrome Dev",
                "Chrome Canary",
                "Firefox Mozilla Firefox",
            ]
        );
        assert_eq!(
            catalog.get("Chrome Canary").unwrap().url,
            "https://dl.google.com/chrome/mac/universal/canary/googlechromecanary.dmg"
        );

        let intel = Catalog::for_platform(Platform::MacOs { universal: false });
        assert_eq!(
            intel.get("Chrome Stable").unwrap().url,
            "https://dl.google.com/chrome/mac/stable/GGRO/googlechrome.dmg"
        );
    }

    #[test]
    fn test_get_unknown_key() {
        let catalog = Catalog::for_platform(Platform::MacOs { universal: true });
        assert!(catalog.get("Nightly").is_none());
        assert!(!catalog.contains("Nightly"));
    }
}
