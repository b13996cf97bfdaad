//! `abiprobe decorate` command

use anyhow::Result;

use crate::cli::DecorateArgs;
use abiprobe::core::{decorate, ManglingScheme};

pub fn execute(args: DecorateArgs) -> Result<()> {
    let scheme = ManglingScheme::new(args.leading, args.double, args.case.into());

    for ident in &args.idents {
        println!("{} -> {}", ident, decorate(&scheme, ident));
    }

    Ok(())
}
