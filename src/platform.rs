//! Target platform identification and release asset conventions.

/// Platform the host application runs on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Platform {
    /// Windows family. Updates ship as Squirrel `.nupkg` packages.
    Windows,
    /// macOS family. Update archives carry `darwin` in their name.
    MacOs,
    /// Anything else. Never eligible for updates.
    Other(String),
}

impl Platform {
    /// Platform of the running build, from `std::env::consts::OS`.
    pub fn current() -> Self {
        Self::from_identifier(std::env::consts::OS)
    }

    /// Map an OS identifier to a platform.
    ///
    /// Accepts both Rust target names (`windows`, `macos`) and Node-style
    /// process identifiers (`win32`, `darwin`).
    pub fn from_identifier(id: &str) -> Self {
        match id.trim().to_ascii_lowercase().as_str() {
            "windows" | "win32" | "win" => Self::Windows,
            "macos" | "darwin" | "mac" | "osx" => Self::MacOs,
            other => Self::Other(other.to_owned()),
        }
    }

    /// Returns `true` for the two platforms updates are published for.
    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Other(_))
    }

    /// Returns `true` if an asset with this file name serves this platform.
    pub fn matches_asset(&self, name: &str) -> bool {
        match self {
            Self::Windows => name.ends_with(".nupkg"),
            Self::MacOs => name.contains("darwin"),
            Self::Other(_) => false,
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Windows => write!(f, "windows"),
            Self::MacOs => write!(f, "macos"),
            Self::Other(id) => write!(f, "{id}"),
        }
    }
}

impl std::str::FromStr for Platform {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::from_identifier(s))
    }
}
