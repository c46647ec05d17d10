// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! `quill shape <sig> <kind>`: the form a generator builds for a shape,
//! and the code it lowers to.

use quill_access::Runtime;
use quill_form::{AccessMode, Kind, OpId, Signature};
use quill_resolve::ShapeKey;
use quill_synth::lower;

use crate::output;

const USAGE: &str = "quill shape <sig> <kind> [--mode MODE]";

/// Accepts the entry-name prefix (`add`, `invoke_vh`) or the qualified
/// debug name (`LF.add`).
pub fn parse_kind(name: &str) -> Result<Kind, String> {
    Kind::from_method_name(name)
        .or_else(|| Kind::ALL.into_iter().find(|k| k.debug_name() == name))
        .ok_or_else(|| {
            let known: Vec<&str> = Kind::ALL.iter().map(|k| k.method_name()).collect();
            format!("unknown kind `{}` (expected one of: {})", name, known.join(", "))
        })
}

pub fn parse_key(sig: &str, kind: &str, mode: Option<&str>) -> Result<ShapeKey, String> {
    let signature = Signature::parse(sig).map_err(|e| e.to_string())?;
    let kind = parse_kind(kind)?;
    let op = match (kind, mode) {
        (Kind::AccessInvoker, Some(m)) => {
            OpId::mode(AccessMode::from_method_name(m).ok_or_else(|| format!("unknown access mode `{}`", m))?)
        }
        (Kind::AccessInvoker, None) => return Err("invoke_vh shapes need --mode".to_string()),
        (_, Some(_)) => return Err(format!("--mode only applies to {}", Kind::AccessInvoker.method_name())),
        (_, None) => OpId::NONE,
    };
    Ok(ShapeKey::with_op(signature, kind, op))
}

pub fn run(args: &[String]) -> Result<(), String> {
    let mut args = args.to_vec();
    let mode = crate::take_option(&mut args, "--mode")?;
    let [sig, kind] = args.as_slice() else {
        return Err(format!("usage: {}", USAGE));
    };
    let key = parse_key(sig, kind, mode.as_deref())?;

    let runtime = Runtime::from_env();
    let form = runtime.resolver().generate(&key).map_err(|e| e.to_string())?;
    let code = lower(form.name(), &form).map_err(|e| e.to_string())?;

    println!("{} {}", output::entry_name(&key.entry_name()), output::dim(&key.to_string()));
    println!("{}", output::separator(40));
    println!("{}", form);
    println!();
    println!("{}", output::section_header("Code:"));
    for (i, insn) in code.code.iter().enumerate() {
        println!("  {:>3}  {}", i, insn);
    }
    if !code.constants.is_empty() {
        println!("{}", output::section_header("Constants:"));
        for (i, c) in code.constants.iter().enumerate() {
            println!("  {:>3}  {}", i, c);
        }
    }
    if !code.ops.is_empty() {
        println!("{}", output::section_header("Calls:"));
        for (i, op) in code.ops.iter().enumerate() {
            println!("  {:>3}  {}", i, op);
        }
    }
    println!("{}", output::dim(&format!("max locals: {}", code.max_locals)));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_parse_by_either_name() {
        assert_eq!(parse_kind("add").unwrap(), Kind::Add);
        assert_eq!(parse_kind("LF.add").unwrap(), Kind::Add);
        assert_eq!(parse_kind("invoke_vh").unwrap(), Kind::AccessInvoker);
        assert!(parse_kind("divide").unwrap_err().contains("identity"));
    }

    #[test]
    fn modes_only_go_with_access_invokers() {
        let key = parse_key("LL_I", "invoke_vh", Some("getVolatile")).unwrap();
        assert_eq!(key.entry_name(), "invoke_vh_getVolatile_LL_I");
        assert!(parse_key("LL_I", "invoke_vh", None).is_err());
        assert!(parse_key("LL_I", "invoke_vh", Some("fetch")).is_err());
        assert!(parse_key("II_I", "add", Some("get")).is_err());
        assert_eq!(parse_key("II_I", "add", None).unwrap().op, OpId::NONE);
    }
}
