//! `abiprobe classify` command

use std::io::Read;

use anyhow::{bail, Context, Result};

use crate::cli::ClassifyArgs;
use abiprobe::core::CompilerRole;
use abiprobe::toolchain::{classify, classify_text};
use abiprobe::util::fs::read_to_string;
use abiprobe::util::process::SystemRunner;

pub fn execute(args: ClassifyArgs) -> Result<()> {
    let role = CompilerRole::from(args.role);

    if !args.text {
        let identity = classify(&SystemRunner, &args.path, role)?;
        println!("{}", identity);
        println!("  family:  {}", identity.family);
        println!("  version: {}", identity.version);
        if let Some(flavor) = identity.flavor {
            println!("  flavor:  {}", flavor);
        }
        return Ok(());
    }

    let text = if args.path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read stdin")?;
        text
    } else {
        read_to_string(&args.path)?
    };

    let Some(found) = classify_text(role, &text) else {
        bail!("the text matches no known {} compiler", role);
    };

    println!("family:  {}", found.family);
    println!("version: {}", found.version);
    println!("flavor:  {}", found.flavor);
    Ok(())
}
