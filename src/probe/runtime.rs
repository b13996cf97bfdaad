//! Fortran runtime probes: dry run, verbose flag and implicit link flags.

use crate::core::FortranRole;
use crate::env::{keys, BuildEnv};
use crate::toolchain::Language;
use crate::util::process::ProbeResult;

use super::link_flags::{check_link_verbose, implicit_link_flags};
use super::{fortran_compiler, link_through_fortran, ProbeError, Prober};

/// Smallest complete Fortran program.
pub const EMPTY_PROGRAM: &str = "      PROGRAM MAIN\n      END\n";

/// Verbose flags tried, in order.
pub const VERBOSE_FLAGS: [&str; 4] = ["-v", "--verbose", "-verbose", "-V"];

impl Prober<'_> {
    /// Whether the Fortran compiler of `role` can build an executable.
    pub fn dry_run(&mut self, env: &mut BuildEnv, role: FortranRole) -> Result<bool, ProbeError> {
        let compiler = fortran_compiler(env, role)?;
        let ok = self.link_empty_program(env, role, &[]).success;
        tracing::info!(
            "{} compiler {} can create executables: {}",
            role,
            compiler,
            if ok { "yes" } else { "no" }
        );
        Ok(ok)
    }

    /// Find the flag that makes the Fortran driver print its link line.
    ///
    /// The flag is committed to `<P>LINK_VFLAG`.
    pub fn verbose_flag(
        &mut self,
        env: &mut BuildEnv,
        role: FortranRole,
    ) -> Result<String, ProbeError> {
        let key = keys::link_vflag(role);
        if let Some(flag) = env.get_str(&key).filter(|f| !f.is_empty()) {
            return Ok(flag.to_string());
        }

        let compiler = fortran_compiler(env, role)?;
        for flag in VERBOSE_FLAGS {
            let result = self.link_empty_program(env, role, &[flag.to_string()]);
            if result.success && check_link_verbose(&result.output) {
                tracing::info!("{} verbose flag: {}", role, flag);
                env.set(key, flag);
                return Ok(flag.to_string());
            }
        }

        Err(ProbeError::VerboseFlagUndetermined { role, compiler })
    }

    /// Library paths and libraries the Fortran runtime of `role` needs when
    /// linking with a C linker.
    ///
    /// The flags are committed to `<P>_LDFLAGS` and, with `autoadd`,
    /// appended to `LINKFLAGSEND`.
    pub fn runtime_link_flags(
        &mut self,
        env: &mut BuildEnv,
        role: FortranRole,
    ) -> Result<Vec<String>, ProbeError> {
        let compiler = fortran_compiler(env, role)?;
        let platform = *self.build.platform();

        let flags = if platform.ms_tools {
            Vec::new()
        } else {
            let mut vflag = env.tokens(&keys::link_vflag(role));
            if vflag.is_empty() {
                vflag.push("-v".to_string());
            }

            let result = self.link_empty_program(env, role, &vflag);
            if !result.success {
                return Err(ProbeError::DryRunFailed {
                    role,
                    compiler,
                    output: result.output,
                });
            }
            implicit_link_flags(&result.output, &platform)
        };

        if flags.is_empty() {
            tracing::info!("{} runtime link flags: none needed", role);
        } else {
            tracing::info!("{} runtime link flags: {}", role, flags.join(" "));
        }

        env.set(keys::ldflags(role), flags.clone());
        if self.options.autoadd && !flags.is_empty() {
            env.append_unique(keys::LINKFLAGSEND, flags.iter().cloned());
        }
        Ok(flags)
    }

    /// Build [`EMPTY_PROGRAM`] through the Fortran driver with `extra` link
    /// flags. Nothing it changes survives the call.
    fn link_empty_program(
        &mut self,
        env: &mut BuildEnv,
        role: FortranRole,
        extra: &[String],
    ) -> ProbeResult {
        let platform = *self.build.platform();
        let mut tx = env.transaction(&[keys::LINK, keys::LINKCOM, keys::LINKFLAGS]);
        tx.append(keys::LINKFLAGS, extra.iter().cloned());
        link_through_fortran(
            &mut tx,
            &platform,
            role,
            format!("${} $LINKFLAGS -o $TARGET $SOURCES", role.compiler_key()),
        );

        let object = self
            .build
            .try_compile(&tx, EMPTY_PROGRAM, Language::Fortran(role));
        if !object.success() {
            return object.result;
        }
        self.build.link_objects(&tx, &[object.artifact])
    }
}
