//! Compiler identification from invocation output.
//!
//! A compiler is run with an identification flag and its merged output is
//! matched against an ordered list of vendor signatures. The first
//! signature that matches (from an invocation that exited 0) decides the
//! family, the version and the driver flavor.

use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::core::{
    CompilerFamily, CompilerFlavor, CompilerRole, CompilerVersion, ToolchainIdentity,
};
use crate::probe::ProbeError;
use crate::util::process::{CommandRunner, CommandSpec, ProbeResult};

const FORTRAN_ROLES: &[CompilerRole] = &[CompilerRole::Fortran77, CompilerRole::Fortran90];

/// A vendor signature: how to invoke the compiler and what to look for.
#[derive(Debug)]
struct Signature {
    name: &'static str,
    pattern: &'static str,
    family: CompilerFamily,
    /// Roles this signature applies to; empty means all
    roles: &'static [CompilerRole],
    args: &'static [&'static str],
}

impl Signature {
    fn applies_to(&self, role: CompilerRole) -> bool {
        self.roles.is_empty() || self.roles.contains(&role)
    }
}

/// Ordered most specific first.
static SIGNATURES: [Signature; 4] = [
    Signature {
        name: "sun-fortran",
        pattern: r"Sun Fortran 95 ([0-9.\-]+)",
        family: CompilerFamily::VendorProprietary,
        roles: FORTRAN_ROLES,
        args: &["-V"],
    },
    Signature {
        name: "sun-cxx",
        pattern: r"Sun C\+\+ ([0-9.\-]+)",
        family: CompilerFamily::VendorProprietary,
        roles: &[CompilerRole::Cxx],
        args: &["-V"],
    },
    Signature {
        name: "sun-c",
        pattern: r"Sun C ([0-9.\-]+)",
        family: CompilerFamily::VendorProprietary,
        roles: &[CompilerRole::C],
        args: &["-V", "-###", "nonexistingfile.fakec"],
    },
    Signature {
        name: "gnu",
        pattern: r"gcc version ([0-9.\-]+)",
        family: CompilerFamily::Gnu,
        roles: &[],
        args: &["-v"],
    },
];

static COMPILED: LazyLock<Vec<(&'static Signature, Regex)>> = LazyLock::new(|| {
    SIGNATURES
        .iter()
        .filter_map(|sig| match Regex::new(sig.pattern) {
            Ok(re) => Some((sig, re)),
            Err(e) => {
                tracing::warn!("invalid compiler signature `{}`: {}", sig.name, e);
                None
            }
        })
        .collect()
});

/// Result of matching identification output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub family: CompilerFamily,
    pub version: CompilerVersion,
    pub flavor: CompilerFlavor,
}

impl Classification {
    fn into_identity(self, role: CompilerRole, path: &Path) -> ToolchainIdentity {
        ToolchainIdentity {
            family: self.family,
            role,
            version: self.version,
            path: path.to_path_buf(),
            flavor: Some(self.flavor),
        }
    }
}

/// Classify already captured identification output.
///
/// Returns `None` when no signature for `role` matches, or when a GNU
/// Fortran version is not numeric (the flavor cannot be decided).
pub fn classify_text(role: CompilerRole, text: &str) -> Option<Classification> {
    COMPILED
        .iter()
        .filter(|(sig, _)| sig.applies_to(role))
        .find_map(|(sig, re)| match_signature(sig, re, role, text))
}

fn match_signature(
    sig: &Signature,
    re: &Regex,
    role: CompilerRole,
    text: &str,
) -> Option<Classification> {
    let version = re.captures(text)?.get(1)?.as_str();
    let version = CompilerVersion::new(version);
    let flavor = flavor_for(sig.family, role, &version)?;

    Some(Classification {
        family: sig.family,
        version,
        flavor,
    })
}

fn flavor_for(
    family: CompilerFamily,
    role: CompilerRole,
    version: &CompilerVersion,
) -> Option<CompilerFlavor> {
    let flavor = match (family, role) {
        (CompilerFamily::Gnu, CompilerRole::C) => CompilerFlavor::Gcc,
        (CompilerFamily::Gnu, CompilerRole::Cxx) => CompilerFlavor::Gxx,
        (CompilerFamily::Gnu, CompilerRole::Fortran77 | CompilerRole::Fortran90) => {
            // g77 was replaced by gfortran in GCC 4
            if version.major()? < 4 {
                CompilerFlavor::G77
            } else {
                CompilerFlavor::Gfortran
            }
        }
        (CompilerFamily::VendorProprietary, CompilerRole::C) => CompilerFlavor::SunCc,
        (CompilerFamily::VendorProprietary, CompilerRole::Cxx) => CompilerFlavor::SunCxx,
        (CompilerFamily::VendorProprietary, _) => CompilerFlavor::SunF77,
        (CompilerFamily::Unknown, _) => return None,
    };
    Some(flavor)
}

/// Identify the compiler at `path` for `role`.
///
/// Each distinct invocation runs at most once per call. Spawn failures and
/// non-zero exits count as "no match".
pub fn classify(
    runner: &dyn CommandRunner,
    path: &Path,
    role: CompilerRole,
) -> Result<ToolchainIdentity, ProbeError> {
    let mut outputs: HashMap<&'static [&'static str], ProbeResult> = HashMap::new();

    for (sig, re) in COMPILED.iter().filter(|(sig, _)| sig.applies_to(role)) {
        let result = outputs
            .entry(sig.args)
            .or_insert_with(|| run_identification(runner, path, sig.args));

        if !result.success {
            continue;
        }

        if let Some(classification) = match_signature(sig, re, role, &result.text()) {
            let identity = classification.into_identity(role, path);
            tracing::info!("{} compiler: {}", role, identity);
            return Ok(identity);
        }
    }

    tracing::debug!(
        "no signature matched {} compiler `{}`",
        role,
        path.display()
    );
    Err(ProbeError::UnknownCompiler {
        path: path.to_path_buf(),
        role,
    })
}

fn run_identification(runner: &dyn CommandRunner, path: &Path, args: &[&str]) -> ProbeResult {
    let cmd = CommandSpec::new(path).args(args.iter().copied());
    tracing::debug!("identifying `{}`", cmd.display_command());

    runner.run(&cmd).unwrap_or_else(|e| {
        tracing::debug!("{}", e);
        ProbeResult::not_run(e.to_string())
    })
}
