// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! `quill modes <type>`: which access modes an accessor over a value of
//! that type supports.

use quill_access::ModeSet;
use quill_form::{AccessMode, PrimType, ValueType};

use crate::output;

const USAGE: &str = "quill modes <type> [--memory] [--read-only] [--unaligned]";

pub fn capabilities(ty: &str, memory: bool, read_only: bool, unaligned: bool) -> Result<ModeSet, String> {
    if memory {
        let carrier = PrimType::from_name(ty).ok_or_else(|| format!("`{}` is not a primitive carrier", ty))?;
        let modes = ModeSet::for_memory(carrier, !unaligned);
        Ok(if read_only { modes.filter(|m| ModeSet::reads().contains(m)) } else { modes })
    } else {
        Ok(ModeSet::for_field(&ValueType::from_name(ty), read_only))
    }
}

pub fn run(args: &[String]) -> Result<(), String> {
    let mut args = args.to_vec();
    let memory = crate::take_flag(&mut args, "--memory");
    let read_only = crate::take_flag(&mut args, "--read-only");
    let unaligned = crate::take_flag(&mut args, "--unaligned");
    let ty = crate::positional(&args, USAGE)?;

    let modes = capabilities(ty, memory, read_only, unaligned)?;
    let target = if memory { "memory" } else { "field" };
    println!(
        "{} {}",
        output::title(&format!("{} {}", ty, target)),
        output::dim(&format!("{} of {} modes", modes.len(), AccessMode::COUNT))
    );
    println!("{}", output::separator(40));
    for mode in AccessMode::ALL {
        let mark = if modes.contains(*mode) { output::supported() } else { output::unsupported() };
        println!("  {} {}", mark, mode);
    }
    Ok(())
}
