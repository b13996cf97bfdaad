//! abiprobe CLI - discover the ABI conventions of C and Fortran toolchains

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("abiprobe=debug")
    } else {
        EnvFilter::new("abiprobe=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    match cli.command {
        Commands::Probe(args) => commands::probe::execute(args, cli.verbose, !cli.no_color),
        Commands::Classify(args) => commands::classify::execute(args),
        Commands::Decorate(args) => commands::decorate::execute(args),
        Commands::LinkFlags(args) => commands::link_flags::execute(args),
    }
}
