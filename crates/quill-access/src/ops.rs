// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Access-mode semantics over a single stored value, shared by every storage.

use quill_form::{AccessMode, AccessType, InvokeError, PrimType, UpdateOp, Value, ValueType};

/// Checks a value argument against the accessor's value type and narrows
/// subword primitives to their range.
pub(crate) fn check_value(ty: &ValueType, value: &Value) -> Result<Value, InvokeError> {
    match ty {
        ValueType::Prim(prim) if value.basic_type() == prim.basic_type() => Ok(narrow(*prim, value.clone())),
        ValueType::Ref(r) if value.is_instance_of(r) => Ok(value.clone()),
        _ => Err(InvokeError::type_mismatch(ty, value.type_name())),
    }
}

fn narrow(prim: PrimType, value: Value) -> Value {
    match (prim, value) {
        (PrimType::Boolean, Value::Int(v)) => Value::Int(v & 1),
        (PrimType::Byte, Value::Int(v)) => Value::Int(v as i8 as i32),
        (PrimType::Short, Value::Int(v)) => Value::Int(v as i16 as i32),
        (PrimType::Char, Value::Int(v)) => Value::Int(v as u16 as i32),
        (_, value) => value,
    }
}

/// Applies `mode` to `current`, the value held at the accessed location.
/// `values` are the mode's value arguments, already checked.
pub(crate) fn apply(
    mode: AccessMode,
    ty: &ValueType,
    current: &mut Value,
    values: &[Value],
) -> Result<Value, InvokeError> {
    let arg = move |i: usize| {
        values
            .get(i)
            .ok_or_else(|| InvokeError::Internal(format!("`{mode}` is missing value argument {i}")))
    };
    match mode.access_type() {
        AccessType::Get => Ok(current.clone()),
        AccessType::Set => {
            *current = arg(0)?.clone();
            Ok(Value::Void)
        }
        AccessType::CompareAndSet => {
            let swapped = current.same_as(arg(0)?);
            if swapped {
                *current = arg(1)?.clone();
            }
            Ok(Value::bool(swapped))
        }
        AccessType::CompareAndExchange => {
            let witness = current.clone();
            if witness.same_as(arg(0)?) {
                *current = arg(1)?.clone();
            }
            Ok(witness)
        }
        AccessType::GetAndUpdate => {
            let op = mode
                .update_op()
                .ok_or_else(|| InvokeError::Internal(format!("`{mode}` has no update operation")))?;
            let previous = current.clone();
            *current = combine(op, ty, &previous, arg(0)?)?;
            Ok(previous)
        }
    }
}

/// The value a get-and-update mode stores.
fn combine(op: UpdateOp, ty: &ValueType, current: &Value, operand: &Value) -> Result<Value, InvokeError> {
    let unsupported = || InvokeError::UnsupportedOperation(format!("{op:?} on {ty}"));
    let prim = match ty {
        ValueType::Prim(prim) => *prim,
        ValueType::Ref(_) if op == UpdateOp::Set => return Ok(operand.clone()),
        ValueType::Ref(_) => return Err(unsupported()),
    };
    let result = match (op, current, operand) {
        (UpdateOp::Set, _, v) => v.clone(),
        (UpdateOp::Add, Value::Int(a), Value::Int(b)) => Value::Int(a.wrapping_add(*b)),
        (UpdateOp::Add, Value::Long(a), Value::Long(b)) => Value::Long(a.wrapping_add(*b)),
        (UpdateOp::Add, Value::Float(a), Value::Float(b)) => Value::Float(a + b),
        (UpdateOp::Add, Value::Double(a), Value::Double(b)) => Value::Double(a + b),
        (UpdateOp::Or, Value::Int(a), Value::Int(b)) => Value::Int(a | b),
        (UpdateOp::Or, Value::Long(a), Value::Long(b)) => Value::Long(a | b),
        (UpdateOp::And, Value::Int(a), Value::Int(b)) => Value::Int(a & b),
        (UpdateOp::And, Value::Long(a), Value::Long(b)) => Value::Long(a & b),
        (UpdateOp::Xor, Value::Int(a), Value::Int(b)) => Value::Int(a ^ b),
        (UpdateOp::Xor, Value::Long(a), Value::Long(b)) => Value::Long(a ^ b),
        _ => return Err(unsupported()),
    };
    Ok(narrow(prim, result))
}
