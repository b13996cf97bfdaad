//! `abiprobe probe` command

use anyhow::{Context, Result};

use crate::cli::ProbeArgs;
use abiprobe::core::CompilerRole;
use abiprobe::ops::{configure_system, format_report, load_project_config, ConfigureOptions};
use abiprobe::probe::ProbeOptions;
use abiprobe::util::diagnostic::emit;

pub fn execute(args: ProbeArgs, verbose: bool, color: bool) -> Result<()> {
    let cwd = std::env::current_dir().context("failed to get current directory")?;
    let mut config = load_project_config(&cwd);

    if let Some(dir) = args.scratch_dir {
        config.probe.scratch_dir = Some(dir);
    }
    if args.no_autoadd {
        config.probe.autoadd = Some(false);
    }
    if args.no_f2py_compat {
        config.probe.f2py_compat = Some(false);
    }

    let roles = if args.role.is_empty() {
        CompilerRole::ALL.to_vec()
    } else {
        args.role.into_iter().map(CompilerRole::from).collect()
    };
    let options = ConfigureOptions {
        roles,
        probe: ProbeOptions {
            autoadd: config.probe.autoadd(),
            f2py_compat: config.probe.f2py_compat(),
        },
    };

    let (env, report) = configure_system(&config, &options)?;

    if args.json {
        let json =
            serde_json::to_string_pretty(&report).context("failed to serialize report")?;
        println!("{}", json);
    } else {
        print!("{}", format_report(&report, verbose));
        if !verbose {
            for diag in report
                .roles
                .iter()
                .flat_map(|r| &r.steps)
                .filter_map(|s| s.diagnostic.as_ref())
            {
                emit(diag, color);
            }
        }
    }

    if let Some(path) = &args.save {
        env.save(path)?;
        tracing::info!("saved build environment to {}", path.display());
    }

    if !report.all_passed() {
        std::process::exit(1);
    }

    Ok(())
}
