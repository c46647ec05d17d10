// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Direct evaluation of bootstrap operations.

use quill_form::{BootstrapOp, Executable, InvokeError, Object, Value};

use crate::convert::convert;
use crate::machine;

pub(crate) fn eval(op: &BootstrapOp, args: &[Value]) -> Result<Value, InvokeError> {
    match op {
        BootstrapOp::Identity(_) => arg(args, 0).cloned(),
        BootstrapOp::Zero(bt) => Ok(bt.zero()),
        BootstrapOp::Add(_) | BootstrapOp::Sub(_) | BootstrapOp::Mul(_) => {
            arith(op, arg(args, 0)?, arg(args, 1)?)
        }
        BootstrapOp::InvokeBasic(sig) => {
            let target = Executable::from_value(arg(args, 0)?)?;
            if target.method_type().basic_signature() != *sig {
                return Err(InvokeError::WrongMethodType {
                    expected: sig.to_method_type(),
                    actual: target.method_type().erase(),
                });
            }
            target.invoke(&args[1..])
        }
        BootstrapOp::GetField { slot, .. } => match arg(args, 0)? {
            Value::Ref(None) => Err(InvokeError::NullPointer("bound field read".to_string())),
            Value::Ref(Some(obj)) => match obj.as_ref() {
                Object::Instance(instance) => instance
                    .cell(*slot as usize)
                    .map(|cell| cell.load())
                    .ok_or_else(|| {
                        InvokeError::Internal(format!(
                            "{} has no field slot {slot}",
                            instance.class().name()
                        ))
                    }),
                other => Err(InvokeError::type_mismatch("bound holder", other.type_name())),
            },
            other => Err(InvokeError::type_mismatch("bound holder", other.type_name())),
        },
        BootstrapOp::Convert { from, to, call_site } => {
            let code = convert(from, to, call_site).map_err(|e| InvokeError::Internal(e.to_string()))?;
            machine::run_conversion(&code, arg(args, 0)?.clone())
        }
    }
}

fn arg(args: &[Value], index: usize) -> Result<&Value, InvokeError> {
    args.get(index)
        .ok_or_else(|| InvokeError::Internal(format!("missing bootstrap argument {index}")))
}

fn arith(op: &BootstrapOp, a: &Value, b: &Value) -> Result<Value, InvokeError> {
    let result = match (op, a, b) {
        (BootstrapOp::Add(_), Value::Int(x), Value::Int(y)) => Value::Int(x.wrapping_add(*y)),
        (BootstrapOp::Sub(_), Value::Int(x), Value::Int(y)) => Value::Int(x.wrapping_sub(*y)),
        (BootstrapOp::Mul(_), Value::Int(x), Value::Int(y)) => Value::Int(x.wrapping_mul(*y)),
        (BootstrapOp::Add(_), Value::Long(x), Value::Long(y)) => Value::Long(x.wrapping_add(*y)),
        (BootstrapOp::Sub(_), Value::Long(x), Value::Long(y)) => Value::Long(x.wrapping_sub(*y)),
        (BootstrapOp::Mul(_), Value::Long(x), Value::Long(y)) => Value::Long(x.wrapping_mul(*y)),
        (BootstrapOp::Add(_), Value::Float(x), Value::Float(y)) => Value::Float(x + y),
        (BootstrapOp::Sub(_), Value::Float(x), Value::Float(y)) => Value::Float(x - y),
        (BootstrapOp::Mul(_), Value::Float(x), Value::Float(y)) => Value::Float(x * y),
        (BootstrapOp::Add(_), Value::Double(x), Value::Double(y)) => Value::Double(x + y),
        (BootstrapOp::Sub(_), Value::Double(x), Value::Double(y)) => Value::Double(x - y),
        (BootstrapOp::Mul(_), Value::Double(x), Value::Double(y)) => Value::Double(x * y),
        _ => {
            return Err(InvokeError::Internal(format!(
                "{} applied to {} and {}",
                op.name(),
                a.type_name(),
                b.type_name()
            )))
        }
    };
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use quill_form::{BasicType, ClassInfo, FieldDecl, Instance, MethodType, Signature, ValueType};

    #[test]
    fn arithmetic_wraps() {
        let add = BootstrapOp::Add(BasicType::I);
        assert_eq!(eval(&add, &[Value::Int(i32::MAX), Value::Int(1)]).unwrap(), Value::Int(i32::MIN));
        let mul = BootstrapOp::Mul(BasicType::D);
        assert_eq!(eval(&mul, &[Value::Double(1.5), Value::Double(2.0)]).unwrap(), Value::Double(3.0));
        assert!(eval(&add, &[Value::Long(1), Value::Int(1)]).is_err());
    }

    #[test]
    fn invoke_basic_checks_erased_signature() {
        let target = Executable::native("neg", MethodType::new(ValueType::INT, vec![ValueType::INT]), |args| {
            Ok(Value::Int(-args[0].as_int().unwrap_or_default()))
        });
        let ok = BootstrapOp::InvokeBasic(Signature::parse("I_I").unwrap());
        assert_eq!(eval(&ok, &[target.to_value(), Value::Int(2)]).unwrap(), Value::Int(-2));
        let wrong = BootstrapOp::InvokeBasic(Signature::parse("J_I").unwrap());
        assert!(matches!(
            eval(&wrong, &[target.to_value(), Value::Long(2)]),
            Err(InvokeError::WrongMethodType { .. })
        ));
    }

    #[test]
    fn get_field_reads_instance_cells() {
        let class = Arc::new(ClassInfo::new("Pair", None, vec![
            FieldDecl::instance("a", ValueType::INT),
            FieldDecl::instance("b", ValueType::OBJECT),
        ]));
        let pair = Value::object(Object::Instance(Instance::with_values(
            class,
            vec![Value::Int(7), Value::string("x")],
        )));
        let op = BootstrapOp::GetField { slot: 0, ty: BasicType::I };
        assert_eq!(eval(&op, &[pair]).unwrap(), Value::Int(7));
        assert!(matches!(eval(&op, &[Value::NULL]), Err(InvokeError::NullPointer(_))));
    }

    #[test]
    fn zero_and_identity() {
        assert_eq!(eval(&BootstrapOp::Zero(BasicType::J), &[]).unwrap(), Value::Long(0));
        assert_eq!(eval(&BootstrapOp::Identity(BasicType::F), &[Value::Float(2.5)]).unwrap(), Value::Float(2.5));
    }
}
