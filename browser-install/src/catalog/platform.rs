//! Host platform detection.
//!
//! The platform decides which vendor URLs are used and which installer
//! backend applies the payload. It is detected once at startup and then
//! passed around explicitly.

use std::fmt;
use std::process::Command;

use tracing::debug;

/// Platform the updater installs browsers on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// Windows. `x64` selects the 64-bit installers.
    Windows { x64: bool },

    /// macOS. `universal` selects the universal Chrome images, used on Apple
    /// Silicon and when running under Rosetta translation.
    MacOs { universal: bool },
}

impl Platform {
    /// Detect the platform of the running host.
    ///
    /// Returns `None` on operating systems the vendors ship no supported
    /// installers for.
    pub fn detect() -> Option<Self> {
        if cfg!(target_os = "windows") {
            let x64 = windows_is_64bit();
            debug!(x64, "Detected Windows host");
            Some(Self::Windows { x64 })
        } else if cfg!(target_os = "macos") {
            let arm = std::env::consts::ARCH.starts_with("aarch64")
                || std::env::consts::ARCH.starts_with("arm");
            let translated = rosetta_translated();
            debug!(
                arch = std::env::consts::ARCH,
                translated, "Detected macOS host"
            );
            Some(Self::MacOs {
                universal: arm || translated,
            })
        } else {
            None
        }
    }

    /// Parse a platform name as accepted on the command line.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "windows" | "windows-x64" | "win64" => Some(Self::Windows { x64: true }),
            "windows-x86" | "win32" | "win" => Some(Self::Windows { x64: false }),
            "macos" | "macos-universal" | "mac" => Some(Self::MacOs { universal: true }),
            "macos-intel" => Some(Self::MacOs { universal: false }),
            _ => None,
        }
    }

    /// File name of the single-slot payload for this platform.
    pub fn payload_file_name(&self) -> &'static str {
        match self {
            Self::Windows { .. } => "browser_install.exe",
            Self::MacOs { .. } => "browser.dmg",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Windows { x64: true } => f.write_str("windows-x64"),
            Self::Windows { x64: false } => f.write_str("windows-x86"),
            Self::MacOs { universal: true } => f.write_str("macos-universal"),
            Self::MacOs { universal: false } => f.write_str("macos-intel"),
        }
    }
}

/// Whether the Windows host is 64-bit, regardless of the bitness of this binary.
fn windows_is_64bit() -> bool {
    std::env::var("PROCESSOR_ARCHITEW6432")
        .or_else(|_| std::env::var("PROCESSOR_ARCHITECTURE"))
        .map(|arch| arch.ends_with("64"))
        .unwrap_or_else(|_| std::env::consts::ARCH.ends_with("64"))
}

/// Whether the process runs translated under Rosetta.
fn rosetta_translated() -> bool {
    Command::new("sysctl")
        .args(["-in", "sysctl.proc_translated"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| String::from_utf8_lossy(&output.stdout).trim() == "1")
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name() {
        assert_eq!(
            Platform::from_name("windows"),
            Some(Platform::Windows { x64: true })
        );
        assert_eq!(
            Platform::from_name("Windows-X86"),
            Some(Platform::Windows { x64: false })
        );
        assert_eq!(
            Platform::from_name("macos-intel"),
            Some(Platform::MacOs { universal: false })
        );
        assert_eq!(Platform::from_name("linux"), None);
    }

    #[test]
    fn test_display_round_trips_through_from_name() {
        for platform in [
            Platform::Windows { x64: true },
            Platform::Windows { x64: false },
            Platform::MacOs { universal: true },
            Platform::MacOs { universal: false },
        ] {
            assert_eq!(Platform::from_name(&platform.to_string()), Some(platform));
        }
    }

    #[test]
    fn test_payload_file_name() {
        assert_eq!(
            Platform::Windows { x64: true }.payload_file_name(),
            "browser_install.exe"
        );
        assert_eq!(
            Platform::MacOs { universal: false }.payload_file_name(),
            "browser.dmg"
        );
    }

    #[test]
    fn test_detect_matches_build_target() {
        let detected = Platform::detect();
        if cfg!(target_os = "windows") {
            assert!(matches!(detected, Some(Platform::Windows { .. })));
        } else if cfg!(target_os = "macos") {
            assert!(matches!(detected, Some(Platform::MacOs { .. })));
        } else {
            assert!(detected.is_none());
        }
    }
}
