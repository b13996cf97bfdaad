//! Host platform as seen by the probes.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Platform family. Only ordering heuristics depend on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformFamily {
    Posix,
    Windows,
}

impl std::str::FromStr for PlatformFamily {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "posix" | "unix" | "linux" | "macos" | "sunos" => Ok(PlatformFamily::Posix),
            "windows" | "win32" => Ok(PlatformFamily::Windows),
            _ => Err(format!(
                "invalid platform '{}'; expected 'posix' or 'windows'",
                s
            )),
        }
    }
}

/// Platform the probes run on.
///
/// `ms_tools` marks a native toolchain with Visual Studio conventions
/// (`cl`, `link`, `lib`). Linking through a Fortran driver then needs a
/// driver-specific command template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Platform {
    pub family: PlatformFamily,
    pub ms_tools: bool,
}

impl Platform {
    pub fn posix() -> Self {
        Platform {
            family: PlatformFamily::Posix,
            ms_tools: false,
        }
    }

    /// Windows with GNU-style drivers (e.g. MinGW).
    pub fn windows() -> Self {
        Platform {
            family: PlatformFamily::Windows,
            ms_tools: false,
        }
    }

    /// Windows with the Visual Studio toolchain.
    pub fn windows_ms_tools() -> Self {
        Platform {
            family: PlatformFamily::Windows,
            ms_tools: true,
        }
    }

    /// Detect from the host and the configured C compiler.
    pub fn detect(cc: Option<&Path>) -> Self {
        let family = if cfg!(windows) {
            PlatformFamily::Windows
        } else {
            PlatformFamily::Posix
        };
        let ms_tools = family == PlatformFamily::Windows && cc.is_some_and(is_msvc_driver);

        Platform { family, ms_tools }
    }

    pub fn is_windows(&self) -> bool {
        self.family == PlatformFamily::Windows
    }

    /// Object file extension for probe builds.
    pub fn object_extension(&self) -> &'static str {
        if self.ms_tools {
            "obj"
        } else {
            "o"
        }
    }

    /// Executable extension for probe builds.
    pub fn exe_extension(&self) -> &'static str {
        if self.is_windows() {
            "exe"
        } else {
            ""
        }
    }
}

impl Default for Platform {
    fn default() -> Self {
        Platform::detect(None)
    }
}

/// Whether `path` names the Visual Studio compiler driver.
pub fn is_msvc_driver(path: &Path) -> bool {
    path.file_stem()
        .and_then(|s| s.to_str())
        .is_some_and(|s| s.eq_ignore_ascii_case("cl"))
}
