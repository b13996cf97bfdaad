//! Full toolchain configuration.
//!
//! Classifies every configured compiler and, for the Fortran roles, runs the
//! dry run, dummy-main, mangling, verbose-flag and runtime link-flag probes.
//! A failure is recorded against its role and never stops the other roles.
//!
//! ## Usage
//!
//! ```bash
//! abiprobe probe              # Text report
//! abiprobe probe --json       # Machine-readable report
//! abiprobe probe --save env.toml
//! ```

use std::fmt::Write;
use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::builder::ScratchDir;
use crate::core::{CompilerRole, FortranRole, Platform, ToolchainIdentity};
use crate::env::BuildEnv;
use crate::probe::{ProbeError, ProbeOptions, Prober};
use crate::toolchain::detect_environment;
use crate::util::config::{global_config_path, load_config, project_config_path, ProbeConfig};
use crate::util::diagnostic::Diagnostic;
use crate::util::process::SystemRunner;

/// Result of a single probe step.
#[derive(Debug, Clone, Serialize)]
pub struct StepResult {
    /// Name of the step
    pub name: String,

    /// Whether the step produced an answer
    pub passed: bool,

    /// The answer, or why there is none
    pub message: String,

    /// Rendered diagnosis for failed steps
    #[serde(skip)]
    pub diagnostic: Option<Diagnostic>,
}

impl StepResult {
    pub fn pass(name: impl Into<String>, message: impl Into<String>) -> Self {
        StepResult {
            name: name.into(),
            passed: true,
            message: message.into(),
            diagnostic: None,
        }
    }

    pub fn fail(name: impl Into<String>, error: &ProbeError) -> Self {
        StepResult {
            name: name.into(),
            passed: false,
            message: error.to_string(),
            diagnostic: Some(error.to_diagnostic()),
        }
    }

    pub fn skipped(name: impl Into<String>, reason: impl Into<String>) -> Self {
        StepResult {
            name: name.into(),
            passed: false,
            message: reason.into(),
            diagnostic: None,
        }
    }
}

/// Everything learned about one compiler role.
#[derive(Debug, Clone, Serialize)]
pub struct RoleReport {
    pub role: CompilerRole,

    /// Configured compiler, if any
    pub compiler: Option<String>,

    /// Identity; `Unknown` when classification failed
    pub identity: Option<ToolchainIdentity>,

    pub steps: Vec<StepResult>,
}

impl RoleReport {
    pub fn passed(&self) -> bool {
        self.steps.iter().all(|s| s.passed)
    }
}

/// Summary of a configure run.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigureReport {
    pub platform: Platform,

    pub roles: Vec<RoleReport>,

    /// Total time taken
    #[serde(skip)]
    pub total_duration: Duration,
}

impl ConfigureReport {
    pub fn all_passed(&self) -> bool {
        self.roles
            .iter()
            .filter(|r| r.compiler.is_some())
            .all(RoleReport::passed)
    }

    pub fn failed_count(&self) -> usize {
        self.roles
            .iter()
            .filter(|r| r.compiler.is_some())
            .flat_map(|r| &r.steps)
            .filter(|s| !s.passed)
            .count()
    }

    pub fn role(&self, role: CompilerRole) -> Option<&RoleReport> {
        self.roles.iter().find(|r| r.role == role)
    }
}

/// Options for the configure operation.
#[derive(Debug, Clone)]
pub struct ConfigureOptions {
    /// Roles to probe, in order
    pub roles: Vec<CompilerRole>,

    pub probe: ProbeOptions,
}

impl Default for ConfigureOptions {
    fn default() -> Self {
        ConfigureOptions {
            roles: CompilerRole::ALL.to_vec(),
            probe: ProbeOptions::default(),
        }
    }
}

/// Probe every role in `options` and commit the answers to `env`.
pub fn configure(
    prober: &mut Prober<'_>,
    env: &mut BuildEnv,
    options: &ConfigureOptions,
) -> ConfigureReport {
    let start = Instant::now();
    let mut roles = Vec::new();

    for &role in &options.roles {
        let Some(compiler) = env.compiler(role).map(str::to_string) else {
            tracing::info!("no {} compiler configured, skipping", role);
            roles.push(RoleReport {
                role,
                compiler: None,
                identity: None,
                steps: vec![StepResult::skipped("compiler", "not configured")],
            });
            continue;
        };

        let mut report = RoleReport {
            role,
            compiler: Some(compiler.clone()),
            identity: None,
            steps: Vec::new(),
        };

        match prober.classify(env, role) {
            Ok(identity) => {
                report
                    .steps
                    .push(StepResult::pass("identity", identity.to_string()));
                report.identity = Some(identity);
            }
            Err(e) => {
                tracing::warn!("{}", e);
                report.steps.push(StepResult::fail("identity", &e));
                report.identity = Some(ToolchainIdentity::unknown(role, &compiler));
            }
        }

        if let Some(fortran) = role.fortran() {
            probe_fortran(prober, env, fortran, &mut report.steps);
        }

        roles.push(report);
    }

    ConfigureReport {
        platform: *prober.platform(),
        roles,
        total_duration: start.elapsed(),
    }
}

fn probe_fortran(
    prober: &mut Prober<'_>,
    env: &mut BuildEnv,
    role: FortranRole,
    steps: &mut Vec<StepResult>,
) {
    match prober.dry_run(env, role) {
        Ok(true) => steps.push(StepResult::pass("can create executables", "yes")),
        Ok(false) => {
            tracing::warn!("{} compiler cannot create executables", role);
            steps.push(StepResult::skipped("can create executables", "no"));
            return;
        }
        Err(e) => {
            steps.push(StepResult::fail("can create executables", &e));
            return;
        }
    }

    match prober.dummy_main(env, role) {
        Ok(found) => {
            steps.push(StepResult::pass("dummy main", found.to_string()));
            match prober.mangling(env, role) {
                Ok(scheme) => steps.push(StepResult::pass("mangling", scheme.to_string())),
                Err(e) => {
                    tracing::warn!("{}", e);
                    steps.push(StepResult::fail("mangling", &e));
                }
            }
        }
        Err(e) => {
            tracing::warn!("{}", e);
            steps.push(StepResult::fail("dummy main", &e));
            steps.push(StepResult::skipped("mangling", "dummy main unknown"));
        }
    }

    match prober.verbose_flag(env, role) {
        Ok(flag) => steps.push(StepResult::pass("verbose flag", flag)),
        Err(e) => {
            tracing::warn!("{}", e);
            steps.push(StepResult::fail("verbose flag", &e));
        }
    }

    match prober.runtime_link_flags(env, role) {
        Ok(flags) if flags.is_empty() => {
            steps.push(StepResult::pass("runtime link flags", "none needed"))
        }
        Ok(flags) => steps.push(StepResult::pass("runtime link flags", flags.join(" "))),
        Err(e) => {
            tracing::warn!("{}", e);
            steps.push(StepResult::fail("runtime link flags", &e));
        }
    }
}

/// Load the configuration files for the project at `project_root`.
pub fn load_project_config(project_root: &Path) -> ProbeConfig {
    let global = global_config_path();
    load_config(global.as_deref(), &project_config_path(project_root))
}

/// Detect the toolchain from `config` and probe it with the real tools.
pub fn configure_system(
    config: &ProbeConfig,
    options: &ConfigureOptions,
) -> Result<(BuildEnv, ConfigureReport)> {
    let platform = config.platform().context("invalid platform in configuration")?;
    let scratch = ScratchDir::from_config(config.probe.scratch_dir.as_deref())
        .context("failed to create scratch directory")?;
    tracing::debug!("scratch directory: {}", scratch.path().display());

    let mut env = detect_environment(config, &platform);
    let runner = SystemRunner;
    let mut prober = Prober::new(&runner, platform, scratch).with_options(options.probe);
    let report = configure(&mut prober, &mut env, options);

    Ok((env, report))
}

/// Format a report for display.
pub fn format_report(report: &ConfigureReport, verbose: bool) -> String {
    let mut output = String::new();

    let _ = writeln!(
        output,
        "Platform: {:?}{}",
        report.platform.family,
        if report.platform.ms_tools { " (MS tools)" } else { "" }
    );
    let _ = writeln!(output);

    for role in &report.roles {
        let status = if role.compiler.is_none() {
            "[--]"
        } else if role.passed() {
            "[OK]"
        } else {
            "[!!]"
        };
        let _ = writeln!(
            output,
            "{} {} {}",
            status,
            role.role,
            role.compiler.as_deref().unwrap_or("")
        );

        if role.compiler.is_none() {
            continue;
        }
        for step in &role.steps {
            let mark = if step.passed { "ok" } else { "failed" };
            let _ = writeln!(output, "      {}: {} ({})", step.name, step.message, mark);
            if verbose {
                if let Some(diag) = &step.diagnostic {
                    for line in diag.format(false).lines() {
                        let _ = writeln!(output, "        {}", line);
                    }
                }
            }
        }
    }

    let _ = writeln!(output);
    let failed = report.failed_count();
    if failed == 0 {
        let _ = writeln!(output, "All probes succeeded");
    } else {
        let _ = writeln!(output, "{} probe(s) failed", failed);
    }
    if verbose {
        let _ = writeln!(
            output,
            "Finished in {:.2}s",
            report.total_duration.as_secs_f64()
        );
    }

    output
}
