//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use abiprobe::core::{Case, CompilerRole, Platform};

/// abiprobe - discover the ABI conventions of C and Fortran toolchains
#[derive(Parser)]
#[command(name = "abiprobe")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Probe the configured toolchain and report what was found
    Probe(ProbeArgs),

    /// Identify a compiler
    Classify(ClassifyArgs),

    /// Show how an identifier is decorated under a mangling scheme
    Decorate(DecorateArgs),

    /// Extract runtime link flags from verbose link output
    LinkFlags(LinkFlagsArgs),
}

#[derive(Args)]
pub struct ProbeArgs {
    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Write the resulting build environment to this TOML file
    #[arg(long, value_name = "FILE")]
    pub save: Option<PathBuf>,

    /// Only probe these roles
    #[arg(long, value_enum)]
    pub role: Vec<RoleArg>,

    /// Do not add discovered flags and defines to the environment
    #[arg(long)]
    pub no_autoadd: bool,

    /// Do not emit unprefixed mangling defines
    #[arg(long)]
    pub no_f2py_compat: bool,

    /// Keep probe files in this directory
    #[arg(long, value_name = "DIR")]
    pub scratch_dir: Option<PathBuf>,
}

#[derive(Args)]
pub struct ClassifyArgs {
    /// Compiler to run, or with --text a file of identification output ("-" for stdin)
    pub path: PathBuf,

    /// Role the compiler plays
    #[arg(long, value_enum, default_value = "c")]
    pub role: RoleArg,

    /// Classify saved identification output instead of running a compiler
    #[arg(long)]
    pub text: bool,
}

#[derive(Args)]
pub struct DecorateArgs {
    /// Identifiers to decorate
    #[arg(required = true)]
    pub idents: Vec<String>,

    /// Prepend an underscore
    #[arg(long)]
    pub leading: bool,

    /// Append a second underscore to names containing an underscore
    #[arg(long)]
    pub double: bool,

    /// Case applied to the identifier
    #[arg(long, value_enum, default_value = "lower")]
    pub case: CaseArg,
}

#[derive(Args)]
pub struct LinkFlagsArgs {
    /// File holding verbose link output (defaults to stdin)
    pub file: Option<PathBuf>,

    /// Platform whose ignore list applies
    #[arg(long, value_enum, default_value = "posix")]
    pub platform: PlatformArg,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum RoleArg {
    C,
    Cxx,
    F77,
    F90,
}

impl From<RoleArg> for CompilerRole {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::C => CompilerRole::C,
            RoleArg::Cxx => CompilerRole::Cxx,
            RoleArg::F77 => CompilerRole::Fortran77,
            RoleArg::F90 => CompilerRole::Fortran90,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum CaseArg {
    Lower,
    Upper,
}

impl From<CaseArg> for Case {
    fn from(case: CaseArg) -> Self {
        match case {
            CaseArg::Lower => Case::Lower,
            CaseArg::Upper => Case::Upper,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum PlatformArg {
    Posix,
    Windows,
}

impl From<PlatformArg> for Platform {
    fn from(platform: PlatformArg) -> Self {
        match platform {
            PlatformArg::Posix => Platform::posix(),
            PlatformArg::Windows => Platform::windows(),
        }
    }
}
