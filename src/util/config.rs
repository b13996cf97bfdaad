//! Configuration file support for abiprobe.
//!
//! Two locations are read:
//! - Global: `~/.abiprobe/probe.toml` - user-wide defaults
//! - Project: `.abiprobe/probe.toml` - project-specific overrides
//!
//! Project config takes precedence over global config. Compilers not named
//! in either file are taken from the environment (`CC`, `F77`, ...) or PATH.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::{Platform, PlatformFamily};

/// abiprobe configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Compiler selection and flags
    pub toolchain: ToolchainSettings,

    /// Probe behavior
    pub probe: ProbeSettings,
}

/// Toolchain settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainSettings {
    /// Path to the C compiler (e.g., /usr/bin/gcc)
    pub cc: Option<PathBuf>,

    /// Path to the C++ compiler
    pub cxx: Option<PathBuf>,

    /// Path to the Fortran 77 compiler (e.g., /usr/bin/gfortran)
    pub f77: Option<PathBuf>,

    /// Path to the Fortran 90 compiler
    pub f90: Option<PathBuf>,

    /// Path to the archiver
    pub ar: Option<PathBuf>,

    /// Additional C compiler flags
    pub cflags: Vec<String>,

    /// Additional Fortran compiler flags
    pub fflags: Vec<String>,

    /// Additional linker flags
    pub ldflags: Vec<String>,
}

/// Probe settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeSettings {
    /// Platform family override ("posix" or "windows")
    pub platform: Option<String>,

    /// Force Visual Studio conventions for the native toolchain
    pub ms_tools: Option<bool>,

    /// Keep probe sources and objects in this directory
    pub scratch_dir: Option<PathBuf>,

    /// Add discovered flags and defines to the build configuration
    /// (default: true)
    pub autoadd: Option<bool>,

    /// Also emit unprefixed mangling defines (default: true)
    pub f2py_compat: Option<bool>,
}

impl ProbeSettings {
    pub fn autoadd(&self) -> bool {
        self.autoadd.unwrap_or(true)
    }

    pub fn f2py_compat(&self) -> bool {
        self.f2py_compat.unwrap_or(true)
    }
}

impl ProbeConfig {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read probe config: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse probe config: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if the file is missing or broken.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load probe config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents =
            toml::to_string_pretty(self).with_context(|| "failed to serialize probe config")?;

        crate::util::fs::write_string(path, &contents)
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: ProbeConfig) {
        let tc = other.toolchain;
        if tc.cc.is_some() {
            self.toolchain.cc = tc.cc;
        }
        if tc.cxx.is_some() {
            self.toolchain.cxx = tc.cxx;
        }
        if tc.f77.is_some() {
            self.toolchain.f77 = tc.f77;
        }
        if tc.f90.is_some() {
            self.toolchain.f90 = tc.f90;
        }
        if tc.ar.is_some() {
            self.toolchain.ar = tc.ar;
        }
        if !tc.cflags.is_empty() {
            self.toolchain.cflags = tc.cflags;
        }
        if !tc.fflags.is_empty() {
            self.toolchain.fflags = tc.fflags;
        }
        if !tc.ldflags.is_empty() {
            self.toolchain.ldflags = tc.ldflags;
        }

        let probe = other.probe;
        if probe.platform.is_some() {
            self.probe.platform = probe.platform;
        }
        if probe.ms_tools.is_some() {
            self.probe.ms_tools = probe.ms_tools;
        }
        if probe.scratch_dir.is_some() {
            self.probe.scratch_dir = probe.scratch_dir;
        }
        if probe.autoadd.is_some() {
            self.probe.autoadd = probe.autoadd;
        }
        if probe.f2py_compat.is_some() {
            self.probe.f2py_compat = probe.f2py_compat;
        }
    }

    /// Platform to probe for, honoring overrides.
    pub fn platform(&self) -> Result<Platform> {
        let mut platform = Platform::detect(self.toolchain.cc.as_deref());

        if let Some(ref family) = self.probe.platform {
            platform.family = family
                .parse::<PlatformFamily>()
                .map_err(anyhow::Error::msg)?;
        }
        if let Some(ms_tools) = self.probe.ms_tools {
            platform.ms_tools = ms_tools;
        }

        Ok(platform)
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.abiprobe/probe.toml)
/// 2. Global config (~/.abiprobe/probe.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> ProbeConfig {
    let mut config = ProbeConfig::default();

    if let Some(global_path) = global_path {
        if global_path.exists() {
            config.merge(ProbeConfig::load_or_default(global_path));
        }
    }

    if project_path.exists() {
        config.merge(ProbeConfig::load_or_default(project_path));
    }

    config
}

/// Get the global abiprobe config directory (~/.abiprobe).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".abiprobe"))
}

/// Get the global config path (~/.abiprobe/probe.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("probe.toml"))
}

/// Get the project config path (.abiprobe/probe.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".abiprobe").join("probe.toml")
}
