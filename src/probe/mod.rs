//! Toolchain ABI probes.
//!
//! A [`Prober`] owns the scratch space and the per-role answers discovered
//! so far. Each probe takes the build configuration explicitly, changes it
//! only inside a transaction, and commits its answer on success.
//!
//! Probes build on each other: the mangling search needs the dummy main,
//! and the runtime link flags need a verbose flag.

use std::collections::HashMap;
use std::path::Path;

use crate::builder::{BuildProbe, ScratchDir};
use crate::core::{CompilerRole, FortranRole, Platform, ToolchainIdentity};
use crate::env::{keys, BuildEnv, DummyMain};
use crate::toolchain::classify;
use crate::util::process::CommandRunner;

pub mod dummy_main;
mod errors;
pub mod link_flags;
pub mod mangling;
pub mod runtime;

pub use errors::ProbeError;
pub use link_flags::{check_link_verbose, extract_link_flags, implicit_link_flags};

/// Switches that control what probes commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeOptions {
    /// Add discovered flags and defines to the build configuration
    pub autoadd: bool,
    /// Also emit unprefixed mangling defines
    pub f2py_compat: bool,
}

impl Default for ProbeOptions {
    fn default() -> Self {
        ProbeOptions {
            autoadd: true,
            f2py_compat: true,
        }
    }
}

/// Runs probes against one toolchain.
pub struct Prober<'r> {
    build: BuildProbe<'r>,
    options: ProbeOptions,
    /// Dummy-main answers by role and compiler
    dummy_mains: HashMap<(FortranRole, String), DummyMain>,
}

impl<'r> Prober<'r> {
    pub fn new(runner: &'r dyn CommandRunner, platform: Platform, scratch: ScratchDir) -> Self {
        Prober {
            build: BuildProbe::new(runner, platform, scratch),
            options: ProbeOptions::default(),
            dummy_mains: HashMap::new(),
        }
    }

    pub fn with_options(mut self, options: ProbeOptions) -> Self {
        self.options = options;
        self
    }

    pub fn platform(&self) -> &Platform {
        self.build.platform()
    }

    pub fn options(&self) -> &ProbeOptions {
        &self.options
    }

    pub fn build_probe(&mut self) -> &mut BuildProbe<'r> {
        &mut self.build
    }

    /// Identify the compiler configured for `role` and record it.
    pub fn classify(
        &self,
        env: &mut BuildEnv,
        role: CompilerRole,
    ) -> Result<ToolchainIdentity, ProbeError> {
        let compiler = env
            .compiler(role)
            .ok_or(ProbeError::MissingCompiler { role })?
            .to_string();

        let identity = classify(self.build.runner(), Path::new(&compiler), role)?;

        env.set(keys::family(role), identity.family.as_str());
        env.set(keys::version(role), identity.version.raw());
        if let Some(flavor) = identity.flavor {
            env.set(keys::flavor(role), flavor.as_str());
        }

        Ok(identity)
    }
}

/// The Fortran compiler configured for `role`.
fn fortran_compiler(env: &BuildEnv, role: FortranRole) -> Result<String, ProbeError> {
    env.compiler(role.into())
        .map(str::to_string)
        .ok_or(ProbeError::MissingCompiler { role: role.into() })
}

/// Make the link step go through the Fortran driver of `role`.
///
/// With the Visual Studio tools the native `LINK` cannot drive a GNU-style
/// Fortran linker, so `ms_template` is installed as `LINKCOM` instead.
/// Callers must hold a transaction over `LINK` and `LINKCOM`.
fn link_through_fortran(
    env: &mut BuildEnv,
    platform: &Platform,
    role: FortranRole,
    ms_template: String,
) {
    if platform.ms_tools {
        env.set(keys::LINKCOM, ms_template);
    } else {
        if let Some(driver) = env.get(role.compiler_key()).cloned() {
            env.set(keys::LINK, driver);
        }
        env.remove(keys::LINKCOM);
    }
}
