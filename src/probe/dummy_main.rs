//! Dummy main detection.
//!
//! Some Fortran runtimes define `main` themselves and call a symbol the
//! program is expected to provide (g77 wants `MAIN__`). A C program linked
//! through such a driver must define that symbol. The probe links a tiny C
//! program through the Fortran driver with each candidate entry point until
//! one links.

use crate::core::{FortranRole, Platform};
use crate::env::{keys, BuildEnv, DummyMain};
use crate::toolchain::Language;

use super::{fortran_compiler, link_through_fortran, ProbeError, Prober};

/// Candidates on POSIX-family platforms. The empty string means "none".
pub const POSIX_CANDIDATES: [&str; 11] = [
    "", "MAIN__", "__MAIN", "_MAIN", "MAIN_", "main__", "__main", "_main", "main_", "MAIN", "main",
];

/// Candidates on Windows-family platforms, where runtimes commonly want `main`.
pub const WINDOWS_CANDIDATES: [&str; 11] = [
    "", "main", "MAIN__", "__MAIN", "_MAIN", "MAIN_", "main__", "__main", "_main", "main_", "MAIN",
];

/// Candidate order for `platform`.
pub fn candidates(platform: &Platform) -> &'static [&'static str; 11] {
    if platform.is_windows() {
        &WINDOWS_CANDIDATES
    } else {
        &POSIX_CANDIDATES
    }
}

/// C program defining `symbol` (if any) and one ordinary function.
pub fn candidate_program(symbol: &str) -> String {
    let mut program = String::new();
    if !symbol.is_empty() {
        program.push_str(&format!("int {}(void) {{ return 0; }}\n", symbol));
    }
    program.push_str("int dummy(void) { return 0; }\n");
    program
}

impl Prober<'_> {
    /// Determine the dummy main required by the Fortran runtime of `role`.
    ///
    /// The answer is committed to `<P>_DUMMY_MAIN` and cached per compiler;
    /// an answer already in the configuration is reused without probing.
    pub fn dummy_main(
        &mut self,
        env: &mut BuildEnv,
        role: FortranRole,
    ) -> Result<DummyMain, ProbeError> {
        let key = keys::dummy_main(role);
        if let Some(found) = env.dummy_main(role) {
            tracing::debug!("{} dummy main already known: {}", role, found);
            return Ok(found);
        }

        let compiler = fortran_compiler(env, role)?;
        if let Some(found) = self.dummy_mains.get(&(role, compiler.clone())) {
            env.set(key, found.to_value());
            return Ok(found.clone());
        }

        let platform = *self.build.platform();
        let candidates = candidates(&platform);

        let found = {
            let mut tx = env.transaction(&[keys::LINK, keys::LINKCOM]);
            link_through_fortran(
                &mut tx,
                &platform,
                role,
                format!("${} -o $TARGET $SOURCES", role.compiler_key()),
            );

            candidates.iter().enumerate().find_map(|(attempt, symbol)| {
                tracing::debug!(
                    "{} dummy main attempt {}: `{}`",
                    role,
                    attempt + 1,
                    symbol
                );
                let result = self
                    .build
                    .try_link(&tx, &candidate_program(symbol), Language::C);
                result.success.then(|| {
                    if symbol.is_empty() {
                        DummyMain::NoneRequired
                    } else {
                        DummyMain::Symbol(symbol.to_string())
                    }
                })
            })
        };

        let Some(found) = found else {
            return Err(ProbeError::DummyMainUndetermined {
                role,
                compiler,
                attempts: candidates.len(),
            });
        };

        tracing::info!("{} dummy main: {}", role, found);
        env.set(key, found.to_value());
        self.dummy_mains.insert((role, compiler), found.clone());
        Ok(found)
    }
}
