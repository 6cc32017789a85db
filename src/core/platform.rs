//! Deployment platforms and their packager flags.

use serde::{Deserialize, Serialize};

use crate::util::errors::DeployError;

/// A platform the packager can produce output for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformTarget {
    Win32,
    Android,
    Ios,
    Wp8,
    #[serde(rename = "wince")]
    WinCe,
    #[serde(rename = "winmo", alias = "winmobile")]
    WinMobile,
    Linux,
}

impl PlatformTarget {
    /// Every supported platform, in declaration order.
    pub const ALL: [PlatformTarget; 7] = [
        PlatformTarget::Win32,
        PlatformTarget::Android,
        PlatformTarget::Ios,
        PlatformTarget::Wp8,
        PlatformTarget::WinCe,
        PlatformTarget::WinMobile,
        PlatformTarget::Linux,
    ];

    /// The packager flag token, without the leading dash.
    pub fn flag(&self) -> &'static str {
        match self {
            PlatformTarget::Win32 => "win32",
            PlatformTarget::Android => "android",
            PlatformTarget::Ios => "ios",
            PlatformTarget::Wp8 => "wp8",
            PlatformTarget::WinCe => "wince",
            PlatformTarget::WinMobile => "winmo",
            PlatformTarget::Linux => "linux",
        }
    }

    /// Upper-case enumerator name (e.g. `WINMOBILE`).
    pub fn name(&self) -> &'static str {
        match self {
            PlatformTarget::Win32 => "WIN32",
            PlatformTarget::Android => "ANDROID",
            PlatformTarget::Ios => "IOS",
            PlatformTarget::Wp8 => "WP8",
            PlatformTarget::WinCe => "WINCE",
            PlatformTarget::WinMobile => "WINMOBILE",
            PlatformTarget::Linux => "LINUX",
        }
    }
}

impl std::str::FromStr for PlatformTarget {
    type Err = DeployError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().trim_start_matches('-').to_ascii_lowercase();
        PlatformTarget::ALL
            .into_iter()
            .find(|p| p.flag() == lower || p.name().eq_ignore_ascii_case(&lower))
            .ok_or_else(|| DeployError::InvalidPlatform(s.to_string()))
    }
}

impl std::fmt::Display for PlatformTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.flag())
    }
}
