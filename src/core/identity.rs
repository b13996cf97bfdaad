//! Compiler identity.
//!
//! A [`ToolchainIdentity`] is produced once per classified compiler
//! invocation and never changes afterwards.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Compiler family, as recognized from identification output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompilerFamily {
    /// GNU Compiler Collection (gcc, g++, g77, gfortran)
    Gnu,
    /// A vendor compiler with its own runtime (e.g. Sun Studio)
    VendorProprietary,
    /// Not classified; probes still run empirically
    Unknown,
}

impl CompilerFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompilerFamily::Gnu => "gnu",
            CompilerFamily::VendorProprietary => "vendor-proprietary",
            CompilerFamily::Unknown => "unknown",
        }
    }
}

impl fmt::Display for CompilerFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The role a compiler plays in the toolchain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompilerRole {
    C,
    Cxx,
    Fortran77,
    Fortran90,
}

impl CompilerRole {
    /// All roles, in probing order.
    pub const ALL: [CompilerRole; 4] = [
        CompilerRole::C,
        CompilerRole::Cxx,
        CompilerRole::Fortran77,
        CompilerRole::Fortran90,
    ];

    /// Configuration key holding this role's compiler.
    pub fn compiler_key(&self) -> &'static str {
        match self {
            CompilerRole::C => "CC",
            CompilerRole::Cxx => "CXX",
            CompilerRole::Fortran77 => "F77",
            CompilerRole::Fortran90 => "F90",
        }
    }

    /// The Fortran role, if this is one.
    pub fn fortran(&self) -> Option<FortranRole> {
        match self {
            CompilerRole::Fortran77 => Some(FortranRole::F77),
            CompilerRole::Fortran90 => Some(FortranRole::F90),
            CompilerRole::C | CompilerRole::Cxx => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CompilerRole::C => "c",
            CompilerRole::Cxx => "cxx",
            CompilerRole::Fortran77 => "f77",
            CompilerRole::Fortran90 => "f90",
        }
    }
}

impl fmt::Display for CompilerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A Fortran dialect role. Dummy-main and mangling answers are kept per role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FortranRole {
    F77,
    F90,
}

impl FortranRole {
    /// Key prefix used for everything committed about this role.
    pub fn prefix(&self) -> &'static str {
        match self {
            FortranRole::F77 => "F77",
            FortranRole::F90 => "F90",
        }
    }

    /// Configuration key holding the compiler driver.
    pub fn compiler_key(&self) -> &'static str {
        self.prefix()
    }

    /// Source file extension for probe snippets.
    pub fn source_extension(&self) -> &'static str {
        match self {
            FortranRole::F77 => "f",
            FortranRole::F90 => "f90",
        }
    }
}

impl From<FortranRole> for CompilerRole {
    fn from(role: FortranRole) -> Self {
        match role {
            FortranRole::F77 => CompilerRole::Fortran77,
            FortranRole::F90 => CompilerRole::Fortran90,
        }
    }
}

impl fmt::Display for FortranRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Driver flavor, used to pick driver-specific conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompilerFlavor {
    Gcc,
    Gxx,
    G77,
    Gfortran,
    SunCc,
    SunCxx,
    SunF77,
}

impl CompilerFlavor {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompilerFlavor::Gcc => "gcc",
            CompilerFlavor::Gxx => "g++",
            CompilerFlavor::G77 => "g77",
            CompilerFlavor::Gfortran => "gfortran",
            CompilerFlavor::SunCc => "suncc",
            CompilerFlavor::SunCxx => "suncxx",
            CompilerFlavor::SunF77 => "sunf77",
        }
    }

    pub fn is_gnu(&self) -> bool {
        matches!(
            self,
            CompilerFlavor::Gcc | CompilerFlavor::Gxx | CompilerFlavor::G77 | CompilerFlavor::Gfortran
        )
    }
}

impl fmt::Display for CompilerFlavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A compiler version as captured from its output.
///
/// The raw text is always kept. A numeric parse is attempted leniently
/// (`8.3` becomes `8.3.0`) for callers that need comparisons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerVersion {
    raw: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    parsed: Option<semver::Version>,
}

impl CompilerVersion {
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let parsed = parse_lenient(&raw);
        CompilerVersion { raw, parsed }
    }

    /// Version of a compiler that was not classified.
    pub fn unknown() -> Self {
        CompilerVersion {
            raw: String::new(),
            parsed: None,
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn semver(&self) -> Option<&semver::Version> {
        self.parsed.as_ref()
    }

    /// Major version number, if the raw text starts with one.
    pub fn major(&self) -> Option<u64> {
        self.parsed.as_ref().map(|v| v.major)
    }
}

impl fmt::Display for CompilerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn parse_lenient(raw: &str) -> Option<semver::Version> {
    let numeric: Vec<u64> = raw
        .split(['.', '-'])
        .take(3)
        .map(|part| part.parse::<u64>())
        .collect::<Result<_, _>>()
        .ok()?;

    match numeric.as_slice() {
        [major] => Some(semver::Version::new(*major, 0, 0)),
        [major, minor] => Some(semver::Version::new(*major, *minor, 0)),
        [major, minor, patch] => Some(semver::Version::new(*major, *minor, *patch)),
        _ => None,
    }
}

/// Identity of one discovered compiler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolchainIdentity {
    pub family: CompilerFamily,
    pub role: CompilerRole,
    pub version: CompilerVersion,
    pub path: PathBuf,
    /// Driver flavor; `None` for unknown compilers
    pub flavor: Option<CompilerFlavor>,
}

impl ToolchainIdentity {
    /// Identity recorded for a compiler that matched no signature.
    pub fn unknown(role: CompilerRole, path: impl Into<PathBuf>) -> Self {
        ToolchainIdentity {
            family: CompilerFamily::Unknown,
            role,
            version: CompilerVersion::unknown(),
            path: path.into(),
            flavor: None,
        }
    }

    pub fn is_gnu(&self) -> bool {
        self.family == CompilerFamily::Gnu
    }
}

impl fmt::Display for ToolchainIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.flavor {
            Some(flavor) => write!(f, "{} {} ({})", flavor, self.version, self.family),
            None => write!(f, "{} ({})", self.path.display(), self.family),
        }
    }
}
