//! `abiprobe link-flags` command

use std::io::Read;

use anyhow::{Context, Result};

use crate::cli::LinkFlagsArgs;
use abiprobe::core::Platform;
use abiprobe::probe::extract_link_flags;
use abiprobe::util::fs::read_to_string;

pub fn execute(args: LinkFlagsArgs) -> Result<()> {
    let text = match &args.file {
        Some(path) => read_to_string(path)?,
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("failed to read stdin")?;
            text
        }
    };

    let lines: Vec<String> = text.lines().map(str::to_string).collect();
    let platform = Platform::from(args.platform);
    let flags = extract_link_flags(&lines, &platform)?;

    println!("{}", flags.join(" "));
    Ok(())
}
