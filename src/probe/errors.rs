//! Probe error types and diagnostics.

use std::path::PathBuf;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

use crate::core::{CompilerRole, FortranRole};
use crate::util::diagnostic::{suggestions, Diagnostic};
use crate::util::process::ProcessError;

/// Number of trailing output lines kept in diagnostics.
const OUTPUT_TAIL: usize = 10;

/// Error raised by a probe.
#[derive(Debug, Error, MietteDiagnostic)]
pub enum ProbeError {
    #[error("unknown {role} compiler `{}`", .path.display())]
    #[diagnostic(
        code(abiprobe::classify::unknown_compiler),
        help("the compiler output matched no known vendor signature")
    )]
    UnknownCompiler { path: PathBuf, role: CompilerRole },

    #[error("no {role} compiler configured")]
    #[diagnostic(code(abiprobe::config::missing_compiler))]
    MissingCompiler { role: CompilerRole },

    #[error(transparent)]
    #[diagnostic(code(abiprobe::process::failed))]
    ProcessFailed(#[from] ProcessError),

    #[error("failed to build the {what} with `{compiler}`")]
    #[diagnostic(code(abiprobe::probe::helper_build_failed))]
    HelperBuildFailed {
        what: &'static str,
        compiler: String,
        output: Vec<String>,
    },

    #[error("could not determine the {role} dummy main of `{compiler}`")]
    #[diagnostic(
        code(abiprobe::probe::dummy_main_undetermined),
        help("no candidate entry point made a C program link through the Fortran driver")
    )]
    DummyMainUndetermined {
        role: FortranRole,
        compiler: String,
        attempts: usize,
    },

    #[error("could not determine the {role} name mangling of `{compiler}`")]
    #[diagnostic(
        code(abiprobe::probe::mangling_undetermined),
        help("the toolchain is not supported: every decoration scheme failed to link")
    )]
    ManglingUndetermined {
        role: FortranRole,
        compiler: String,
        attempts: usize,
    },

    #[error("no verbose link flag found for `{compiler}`")]
    #[diagnostic(code(abiprobe::probe::verbose_flag_undetermined))]
    VerboseFlagUndetermined { role: FortranRole, compiler: String },

    #[error("{role} compiler `{compiler}` cannot create executables")]
    #[diagnostic(code(abiprobe::probe::dry_run_failed))]
    DryRunFailed {
        role: FortranRole,
        compiler: String,
        output: Vec<String>,
    },

    #[error("malformed link output: {reason}")]
    #[diagnostic(code(abiprobe::link_flags::malformed))]
    MalformedLinkOutput { line: String, reason: String },

    #[error("{context}")]
    #[diagnostic(code(abiprobe::io))]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl ProbeError {
    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        ProbeError::Io {
            context: context.into(),
            source,
        }
    }

    /// Convert to a user-friendly diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ProbeError::UnknownCompiler { path, role } => {
                Diagnostic::error(format!("could not identify the {} compiler", role))
                    .with_location(path)
                    .with_context("its identification output matched no known signature")
                    .with_suggestion("Check that the path points at a C, C++ or Fortran compiler driver")
                    .with_suggestion(suggestions::RUN_VERBOSE)
            }

            ProbeError::MissingCompiler { role } => {
                Diagnostic::error(format!("no {} compiler configured", role))
                    .with_suggestion(suggestions::SET_COMPILER)
            }

            ProbeError::ProcessFailed(err) => {
                let mut diag = Diagnostic::error(err.to_string());
                if let Some(source) = std::error::Error::source(err) {
                    diag = diag.with_context(source.to_string());
                }
                diag.with_suggestion(suggestions::SET_COMPILER)
            }

            ProbeError::HelperBuildFailed {
                what,
                compiler,
                output,
            } => with_output_tail(
                Diagnostic::error(format!("failed to build the {}", what)).with_location(compiler),
                output,
            )
            .with_suggestion(suggestions::CHECK_INSTALL),

            ProbeError::DummyMainUndetermined {
                role,
                compiler,
                attempts,
            } => Diagnostic::error(format!("could not determine the {} dummy main", role))
                .with_location(compiler)
                .with_context(format!("{} candidate entry points tried", attempts))
                .with_suggestion(suggestions::CHECK_INSTALL)
                .with_suggestion(suggestions::RUN_VERBOSE),

            ProbeError::ManglingUndetermined {
                role,
                compiler,
                attempts,
            } => Diagnostic::error(format!("could not determine the {} name mangling", role))
                .with_location(compiler)
                .with_context(format!("{} decoration schemes tried, none linked", attempts))
                .with_suggestion("This toolchain is unsupported for mixed C/Fortran linking")
                .with_suggestion(suggestions::RUN_VERBOSE),

            ProbeError::VerboseFlagUndetermined { role, compiler } => {
                Diagnostic::warning(format!("no verbose link flag found for the {} compiler", role))
                    .with_location(compiler)
                    .with_context("tried -v, --verbose, -verbose and -V")
            }

            ProbeError::DryRunFailed {
                role,
                compiler,
                output,
            } => with_output_tail(
                Diagnostic::error(format!("the {} compiler cannot create executables", role))
                    .with_location(compiler),
                output,
            )
            .with_suggestion(suggestions::CHECK_INSTALL),

            ProbeError::MalformedLinkOutput { line, reason } => {
                Diagnostic::warning(format!("could not parse link output: {}", reason))
                    .with_context(line.clone())
            }

            ProbeError::Io { context, source } => {
                Diagnostic::error(context.clone()).with_context(source.to_string())
            }
        }
    }
}

fn with_output_tail(mut diag: Diagnostic, output: &[String]) -> Diagnostic {
    let start = output.len().saturating_sub(OUTPUT_TAIL);
    for line in &output[start..] {
        diag = diag.with_context(line.clone());
    }
    diag
}
