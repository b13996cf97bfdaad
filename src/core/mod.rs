//! Core value types: compiler identity, platform, mangling schemes.

pub mod identity;
pub mod mangling;
pub mod platform;

pub use identity::{
    CompilerFamily, CompilerFlavor, CompilerRole, CompilerVersion, FortranRole, ToolchainIdentity,
};
pub use mangling::{decorate, Case, ManglingScheme};
pub use platform::{Platform, PlatformFamily};
