//! Toolchain command construction, identification and discovery.
//!
//! The command side provides a unified interface for generating
//! compile/archive/link commands for GNU-style drivers and for the
//! Visual Studio tools. Identification runs a compiler and classifies it
//! by its output; discovery fills a [`BuildEnv`](crate::env::BuildEnv)
//! from configuration, the environment and PATH.

use std::path::{Path, PathBuf};

use crate::core::{CompilerRole, FortranRole, Platform};
use crate::util::process::CommandSpec;

pub mod classify;
pub mod detect;
mod gcc;
mod msvc;

pub use classify::{classify, classify_text};
pub use detect::detect_environment;
pub use gcc::GccToolchain;
pub use msvc::MsvcToolchain;

/// Source language of a probe snippet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    C,
    Cxx,
    Fortran(FortranRole),
}

impl Language {
    /// The compiler role that builds this language.
    pub fn compiler_role(self) -> CompilerRole {
        match self {
            Language::C => CompilerRole::C,
            Language::Cxx => CompilerRole::Cxx,
            Language::Fortran(role) => role.into(),
        }
    }

    /// Source file extension.
    pub fn source_extension(self) -> &'static str {
        match self {
            Language::C => "c",
            Language::Cxx => "cpp",
            Language::Fortran(role) => role.source_extension(),
        }
    }
}

/// Input for a compile step.
#[derive(Debug, Clone)]
pub struct CompileInput {
    /// Source file to compile
    pub source: PathBuf,
    /// Output object file
    pub output: PathBuf,
    /// Compiler flags, in order
    pub flags: Vec<String>,
}

/// Input for an archive step (creating static library).
#[derive(Debug, Clone)]
pub struct ArchiveInput {
    /// Object files to archive
    pub objects: Vec<PathBuf>,
    /// Output archive file
    pub output: PathBuf,
}

/// Input for a link step.
#[derive(Debug, Clone, Default)]
pub struct LinkInput {
    /// Object files to link
    pub objects: Vec<PathBuf>,
    /// Output executable
    pub output: PathBuf,
    /// Library search paths
    pub lib_dirs: Vec<String>,
    /// Libraries: bare names or paths to library files
    pub libs: Vec<String>,
    /// Flags before the objects
    pub ldflags: Vec<String>,
    /// Flags after the libraries
    pub ldflags_end: Vec<String>,
}

/// Whether a `LIBS` entry names a library file rather than a library.
pub fn is_library_path(lib: &str) -> bool {
    lib.contains('/')
        || lib.contains('\\')
        || [".a", ".lib", ".so", ".dylib"]
            .iter()
            .any(|ext| lib.ends_with(ext))
}

/// Trait for toolchain command styles.
///
/// Each style knows how to generate commands for its driver conventions.
/// The program is passed in because probes switch drivers freely (a C
/// program linked through the Fortran driver, for instance).
pub trait Toolchain {
    /// Style name for logs.
    fn name(&self) -> &'static str;

    /// Generate a compile command.
    fn compile_command(&self, compiler: &Path, input: &CompileInput) -> CommandSpec;

    /// Generate an archive command (create static library).
    fn archive_command(&self, ar: &Path, input: &ArchiveInput) -> CommandSpec;

    /// Generate a link command for an executable.
    fn link_exe_command(&self, linker: &Path, input: &LinkInput) -> CommandSpec;

    /// Library search path and library arguments.
    fn lib_flags(&self, lib_dirs: &[String], libs: &[String]) -> Vec<String>;

    /// File name of a static library called `name`.
    fn static_lib_name(&self, name: &str) -> String;
}

static GCC: GccToolchain = GccToolchain;
static MSVC: MsvcToolchain = MsvcToolchain;

/// Command style of the native toolchain on `platform`.
pub fn native_toolchain(platform: &Platform) -> &'static dyn Toolchain {
    if platform.ms_tools {
        &MSVC
    } else {
        &GCC
    }
}

/// Command style used to compile `lang` on `platform`.
///
/// Fortran drivers use GNU conventions even next to the Visual Studio tools.
pub fn compile_toolchain(platform: &Platform, lang: Language) -> &'static dyn Toolchain {
    match lang {
        Language::Fortran(_) => &GCC,
        Language::C | Language::Cxx => native_toolchain(platform),
    }
}

/// GNU conventions, used for driver-specific link templates.
pub fn gnu_toolchain() -> &'static dyn Toolchain {
    &GCC
}
