//! Toolchain detection.
//!
//! Builds the initial [`BuildEnv`] from the configuration files, the usual
//! environment variables and a `PATH` search, in that order.

use std::path::PathBuf;

use crate::core::Platform;
use crate::env::{keys, BuildEnv};
use crate::util::config::ProbeConfig;
use crate::util::process::find_executable;

/// Programs searched on `PATH` for each tool when nothing is configured.
const CC_CANDIDATES: &[&str] = &["cc", "gcc", "clang"];
const CXX_CANDIDATES: &[&str] = &["c++", "g++", "clang++"];
const FORTRAN_CANDIDATES: &[&str] = &["gfortran", "g77", "f77", "f95", "f90"];
const AR_CANDIDATES: &[&str] = &["ar", "llvm-ar"];

/// Detect the tools to probe.
///
/// Each tool comes from, in order of priority:
/// 1. The toolchain config (`.abiprobe/probe.toml` or `~/.abiprobe/probe.toml`)
/// 2. Environment variables (`CC`, `CXX`, `F77`, `F90`/`FC`, `AR`)
/// 3. A search on `PATH`
///
/// Tools that cannot be found are left unset; probes for their role then
/// fail with a missing-compiler error.
pub fn detect_environment(config: &ProbeConfig, platform: &Platform) -> BuildEnv {
    detect_with(
        config,
        platform,
        |var| std::env::var(var).ok().filter(|v| !v.is_empty()),
        find_executable,
    )
}

fn detect_with<V, W>(config: &ProbeConfig, platform: &Platform, var: V, which: W) -> BuildEnv
where
    V: Fn(&str) -> Option<String>,
    W: Fn(&str) -> Option<PathBuf>,
{
    let tc = &config.toolchain;
    let mut env = BuildEnv::new();

    let search = |names: &[&str]| -> Option<String> {
        names
            .iter()
            .find_map(|name| which(*name))
            .map(|p| p.display().to_string())
    };
    let pick = |configured: &Option<PathBuf>, vars: &[&str], names: &[&str]| -> Option<String> {
        configured
            .as_ref()
            .map(|p| p.display().to_string())
            .or_else(|| vars.iter().find_map(|v| var(*v)))
            .or_else(|| search(names))
    };

    let (cc_names, cxx_names, ar_names): (&[&str], &[&str], &[&str]) = if platform.ms_tools {
        (&["cl"], &["cl"], &["lib"])
    } else {
        (CC_CANDIDATES, CXX_CANDIDATES, AR_CANDIDATES)
    };

    let cc = pick(&tc.cc, &["CC"], cc_names);
    let cxx = pick(&tc.cxx, &["CXX"], cxx_names);
    let f77 = pick(&tc.f77, &["F77", "FC"], FORTRAN_CANDIDATES);
    let f90 = pick(&tc.f90, &["F90", "FC"], FORTRAN_CANDIDATES)
        .or_else(|| f77.clone());
    let ar = pick(&tc.ar, &["AR"], ar_names);

    for (key, value) in [
        (keys::CC, &cc),
        (keys::CXX, &cxx),
        (keys::F77, &f77),
        (keys::F90, &f90),
        (keys::AR, &ar),
    ] {
        match value {
            Some(value) => {
                tracing::debug!("{} = {}", key, value);
                env.set(key, value.as_str());
            }
            None => tracing::debug!("{} not found", key),
        }
    }

    let link = if platform.ms_tools {
        search(&["link"])
    } else {
        cc.clone()
    };
    if let Some(link) = link {
        env.set(keys::LINK, link);
    }

    if !tc.cflags.is_empty() {
        env.append(keys::CFLAGS, tc.cflags.iter().cloned());
        env.append(keys::CXXFLAGS, tc.cflags.iter().cloned());
    }
    if !tc.fflags.is_empty() {
        env.append(keys::F77FLAGS, tc.fflags.iter().cloned());
        env.append(keys::F90FLAGS, tc.fflags.iter().cloned());
    }
    if !tc.ldflags.is_empty() {
        env.append(keys::LINKFLAGS, tc.ldflags.iter().cloned());
    }

    env
}
