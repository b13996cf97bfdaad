//! abiprobe - discover the ABI conventions of C and Fortran toolchains
//!
//! This crate identifies compilers and empirically probes how a Fortran
//! toolchain interoperates with C: the dummy main its runtime needs, how
//! it decorates external names, and which runtime libraries a C linker
//! must add.

pub mod builder;
pub mod core;
pub mod env;
pub mod ops;
pub mod probe;
pub mod toolchain;
pub mod util;

/// Test utilities and mocks for abiprobe unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides a pattern-matching mock executor and a
/// simulated compiler toolchain.
#[cfg(test)]
pub mod test_support;

pub use crate::core::{
    decorate, Case, CompilerFamily, CompilerFlavor, CompilerRole, CompilerVersion, FortranRole,
    ManglingScheme, Platform, ToolchainIdentity,
};
pub use env::{BuildEnv, DummyMain, Transaction};
pub use probe::{ProbeError, ProbeOptions, Prober};
