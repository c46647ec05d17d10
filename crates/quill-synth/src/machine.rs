// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! The stack machine that runs loaded entries.

use std::sync::Arc;

use quill_form::{Boxed, Invocable, InvokeError, MethodType, Object, PrimType, RefType, Value};

use crate::emit::EntryCode;
use crate::error::SynthResult;
use crate::insn::Insn;
use crate::link::{Linker, Target};

/// A loaded entry: code plus its linked call targets.
pub struct CompiledEntry {
    code: Arc<EntryCode>,
    targets: Vec<Target>,
    ty: MethodType,
}

impl CompiledEntry {
    pub fn link(code: Arc<EntryCode>, linker: &dyn Linker) -> SynthResult<CompiledEntry> {
        let targets = code
            .ops
            .iter()
            .map(|op| Target::resolve(op, linker))
            .collect::<SynthResult<Vec<_>>>()?;
        let ty = code.signature.to_method_type();
        Ok(CompiledEntry { code, targets, ty })
    }

    fn run(&self, args: &[Value]) -> Result<Value, InvokeError> {
        let mut locals = vec![Value::Void; (self.code.max_locals as usize).max(args.len())];
        locals[..args.len()].clone_from_slice(args);
        let mut stack: Vec<Value> = Vec::with_capacity(8);

        for insn in &self.code.code {
            match insn {
                Insn::Load(i) => stack.push(slot(&locals, *i)?.clone()),
                Insn::Store(i) => {
                    let value = pop(&mut stack)?;
                    *locals.get_mut(*i as usize).ok_or_else(|| bad_index("local", *i))? = value;
                }
                Insn::Const(i) => {
                    let value = self.code.constants.get(*i as usize).ok_or_else(|| bad_index("constant", *i))?;
                    stack.push(value.clone());
                }
                Insn::Call(i) => {
                    let op = self.code.ops.get(*i as usize).ok_or_else(|| bad_index("op", *i))?;
                    let target = &self.targets[*i as usize];
                    let argc = op.method_type().arity();
                    if stack.len() < argc {
                        return Err(InvokeError::Internal("operand stack underflow".to_string()));
                    }
                    let argv = stack.split_off(stack.len() - argc);
                    let result = target.invoke(&argv)?;
                    if !op.method_type().ret().is_void() {
                        stack.push(result);
                    }
                }
                Insn::Return => return pop(&mut stack),
                Insn::ReturnVoid => return Ok(Value::Void),
                other => {
                    let value = pop(&mut stack)?;
                    stack.push(apply(other, value)?);
                }
            }
        }
        Err(InvokeError::Internal(format!("`{}` ran past its last instruction", self.code.name)))
    }
}

impl Invocable for CompiledEntry {
    fn name(&self) -> &str {
        &self.code.name
    }

    fn method_type(&self) -> &MethodType {
        &self.ty
    }

    fn call(&self, args: &[Value]) -> Result<Value, InvokeError> {
        self.run(args)
    }
}

/// Runs a conversion sequence on a single value.
pub(crate) fn run_conversion(code: &[Insn], mut value: Value) -> Result<Value, InvokeError> {
    for insn in code {
        value = apply(insn, value)?;
    }
    Ok(value)
}

/// Applies a value-to-value instruction.
fn apply(insn: &Insn, value: Value) -> Result<Value, InvokeError> {
    match insn {
        Insn::Widen(widening) => widening.apply(value),
        Insn::Box(prim) => Boxed::from_value(*prim, &value)
            .map(Value::boxed)
            .ok_or_else(|| InvokeError::Internal(format!("cannot box {} as {}", value.type_name(), prim.name()))),
        Insn::Unbox { owner, to } => unbox(&value, owner, *to),
        Insn::CheckCast(ty) => {
            if value.is_instance_of(ty) {
                Ok(value)
            } else {
                Err(InvokeError::type_mismatch(ty.name(), value.type_name()))
            }
        }
        other => Err(InvokeError::Internal(format!("`{other}` is not a conversion"))),
    }
}

fn unbox(value: &Value, owner: &RefType, to: PrimType) -> Result<Value, InvokeError> {
    match value {
        Value::Ref(None) => Err(InvokeError::NullPointer(format!(
            "cannot unbox null as {}",
            to.name()
        ))),
        Value::Ref(Some(obj)) => match obj.as_ref() {
            Object::Boxed(boxed) if obj.is_instance_of(owner) => Ok(boxed.convert_to(to)),
            other => Err(InvokeError::type_mismatch(owner.name(), other.type_name())),
        },
        other => Err(InvokeError::Internal(format!("unbox applied to {}", other.type_name()))),
    }
}

fn slot(locals: &[Value], index: u16) -> Result<&Value, InvokeError> {
    locals.get(index as usize).ok_or_else(|| bad_index("local", index))
}

fn pop(stack: &mut Vec<Value>) -> Result<Value, InvokeError> {
    stack
        .pop()
        .ok_or_else(|| InvokeError::Internal("operand stack underflow".to_string()))
}

fn bad_index(what: &str, index: u16) -> InvokeError {
    InvokeError::Internal(format!("{what} index {index} out of range"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::convert;
    use quill_form::ValueType;

    #[test]
    fn conversion_sequences_run() {
        let code = convert(&ValueType::OBJECT, &ValueType::LONG, &ValueType::OBJECT).unwrap();
        let value = run_conversion(&code, Value::boxed(Boxed::Short(-4))).unwrap();
        assert_eq!(value, Value::Long(-4));
    }

    #[test]
    fn bad_reference_to_primitive_is_a_type_mismatch() {
        let code = convert(&ValueType::OBJECT, &ValueType::INT, &ValueType::OBJECT).unwrap();
        let err = run_conversion(&code, Value::string("nope")).unwrap_err();
        assert!(matches!(err, InvokeError::TypeMismatch { ref expected, .. } if expected == "Number"));
    }

    #[test]
    fn unboxing_null_fails() {
        let code = convert(&ValueType::NUMBER, &ValueType::DOUBLE, &ValueType::NUMBER).unwrap();
        assert!(matches!(run_conversion(&code, Value::NULL), Err(InvokeError::NullPointer(_))));
    }

    #[test]
    fn boxing_produces_wrappers() {
        let code = convert(&ValueType::INT, &ValueType::boxed(PrimType::Double), &ValueType::OBJECT).unwrap();
        let value = run_conversion(&code, Value::Int(3)).unwrap();
        assert!(value.is_instance_of(&RefType::Boxed(PrimType::Double)));
        assert_eq!(value, Value::boxed(Boxed::Double(3.0)));
    }
}
