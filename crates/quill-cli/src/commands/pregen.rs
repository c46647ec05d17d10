// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! `quill pregen <file>`: writes a holder unit that a later runtime loads
//! through `QUILL_HOLDER`.

use std::fs;
use std::path::Path;

use quill_access::Runtime;
use quill_form::{AccessMode, BasicType, Kind, OpId, ValueType};
use quill_resolve::{common_shapes, ShapeKey};

use crate::output;

const USAGE: &str = "quill pregen <file>";

/// Accessor invokers for instance-field access to int, long and reference
/// values, the shapes nearly every program touches.
pub fn access_shapes() -> Vec<ShapeKey> {
    let receiver = [ValueType::OBJECT];
    let mut keys = Vec::new();
    for value in [ValueType::INT, ValueType::LONG, ValueType::OBJECT] {
        for mode in [
            AccessMode::Get,
            AccessMode::Set,
            AccessMode::GetVolatile,
            AccessMode::SetVolatile,
            AccessMode::CompareAndSet,
            AccessMode::GetAndSet,
            AccessMode::GetAndAdd,
        ] {
            if mode.is_numeric_update() && !value.is_primitive() {
                continue;
            }
            let signature = mode
                .access_type()
                .method_type(&value, &receiver)
                .basic_signature()
                .with_leading(BasicType::L);
            keys.push(ShapeKey::with_op(signature, Kind::AccessInvoker, OpId::mode(mode)));
        }
    }
    keys
}

pub fn run(args: &[String]) -> Result<(), String> {
    let path = crate::positional(args, USAGE)?;
    let unit_name = Path::new(path)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("Holder");

    let mut keys = common_shapes();
    keys.extend(access_shapes());

    let runtime = Runtime::from_env();
    let unit = runtime.resolver().pregenerate(unit_name, &keys).map_err(|e| e.to_string())?;
    let bytes = unit.to_bytes().map_err(|e| e.to_string())?;
    fs::write(path, &bytes).map_err(|e| format!("failed to write {}: {}", path, e))?;

    println!(
        "{}: wrote {} entries ({} bytes) to {}",
        output::ok_label(),
        unit.len(),
        bytes.len(),
        output::file_path(path)
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_shapes_skip_numeric_updates_on_references() {
        let names: Vec<String> = access_shapes().iter().map(|k| k.entry_name()).collect();
        assert!(names.contains(&"invoke_vh_get_LL_I".to_string()));
        assert!(names.contains(&"invoke_vh_getAndAdd_LLJ_J".to_string()));
        assert!(names.contains(&"invoke_vh_compareAndSet_L4_I".to_string()));
        assert!(!names.iter().any(|n| n.starts_with("invoke_vh_getAndAdd_LLL")));
    }
}
