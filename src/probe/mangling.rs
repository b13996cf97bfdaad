//! Fortran name mangling discovery.
//!
//! Two subroutines, `foobar` and `foo_bar`, are compiled with the Fortran
//! compiler and archived. A C driver calling both under a candidate
//! decoration is then linked against the archive through the Fortran
//! driver. The first decoration that links is the compiler's scheme.

use crate::core::mangling::search_order;
use crate::core::{Case, FortranRole, ManglingScheme};
use crate::env::{keys, BuildEnv, DummyMain};
use crate::toolchain::Language;

use super::{fortran_compiler, link_through_fortran, ProbeError, Prober};

/// Subroutines whose symbols the driver references.
pub const FORTRAN_FRAGMENT: &str = "
      subroutine foobar()
      return
      end
      subroutine foo_bar()
      return
      end
";

/// C program calling `foobar` and `foo_bar` as decorated by `scheme`.
pub fn driver_program(scheme: &ManglingScheme, dummy: &DummyMain) -> String {
    let foobar = scheme.decorate("foobar");
    let foo_bar = scheme.decorate("foo_bar");

    let mut program = String::new();
    if let Some(symbol) = dummy.symbol() {
        program.push_str(&format!("int {}(void) {{ return 1; }}\n", symbol));
    }
    program.push_str(&format!(
        "void {foobar}(void);\n\
         void {foo_bar}(void);\n\
         int my_main(void) {{\n\
         {foobar}();\n\
         {foo_bar}();\n\
         return 0;\n\
         }}\n"
    ));
    program
}

impl Prober<'_> {
    /// Discover how the Fortran compiler of `role` decorates external names.
    ///
    /// Needs the dummy main, which is probed first if unknown. On success
    /// the scheme is committed as `<P>_UNDERSCORE_G77`,
    /// `<P>_PREPEND_FORTRAN` and `<P>_UPPERCASE_FORTRAN`, and with
    /// `autoadd` the matching defines are appended to `CPPDEFINES`.
    pub fn mangling(
        &mut self,
        env: &mut BuildEnv,
        role: FortranRole,
    ) -> Result<ManglingScheme, ProbeError> {
        if let Some(scheme) = env.mangling_scheme(role) {
            tracing::debug!("{} mangling already known: {}", role, scheme);
            return Ok(scheme);
        }

        let compiler = fortran_compiler(env, role)?;
        let dummy = self.dummy_main(env, role)?;
        let platform = *self.build.platform();
        let order = search_order(&platform);

        let found = env.with_saved_keys(&[keys::LINK, keys::LINKCOM, keys::LIBS], |tx| {
            let object = self
                .build
                .try_compile(tx, FORTRAN_FRAGMENT, Language::Fortran(role));
            if !object.success() {
                return Err(ProbeError::HelperBuildFailed {
                    what: "Fortran subroutines",
                    compiler: compiler.clone(),
                    output: object.result.output,
                });
            }

            let library = self.build.archive(tx, &[object.artifact]);
            if !library.success() {
                return Err(ProbeError::HelperBuildFailed {
                    what: "subroutine library",
                    compiler: compiler.clone(),
                    output: library.result.output,
                });
            }

            tx.append(keys::LIBS, [library.artifact.display().to_string()]);
            link_through_fortran(
                tx,
                &platform,
                role,
                format!("${} -o $TARGET $SOURCES $_LIBFLAGS", role.compiler_key()),
            );

            for scheme in order {
                tracing::debug!("{} mangling attempt: {}", role, scheme);
                let program = driver_program(scheme, &dummy);
                if self.build.try_link(tx, &program, Language::C).success {
                    return Ok(*scheme);
                }
            }

            Err(ProbeError::ManglingUndetermined {
                role,
                compiler: compiler.clone(),
                attempts: order.len(),
            })
        })?;

        tracing::info!("{} mangling: {}", role, found);
        self.commit_mangling(env, role, &found);
        Ok(found)
    }

    fn commit_mangling(&self, env: &mut BuildEnv, role: FortranRole, scheme: &ManglingScheme) {
        env.set(
            keys::underscore_g77(role),
            scheme.double_trailing_underscore_on_compound,
        );
        env.set(keys::prepend_fortran(role), scheme.leading_underscore);
        env.set(
            keys::uppercase_fortran(role),
            scheme.case == Case::Upper,
        );

        let defines = scheme.cpp_defines(role.prefix(), self.options.f2py_compat);
        if self.options.autoadd && !defines.is_empty() {
            env.append_unique(keys::CPPDEFINES, defines);
        }
    }
}
