// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Direct evaluation of forms, used before a form is hot enough to compile.

use std::sync::Arc;

use quill_form::{
    Arg, BootstrapOp, Form, Invocable, InvokeError, Linkage, MethodType, NameDef, Value, ValueType,
};
use tracing::trace;

use crate::convert::convert;
use crate::error::SynthResult;
use crate::link::{Linker, Target};

pub struct InterpretedForm {
    form: Arc<Form>,
    /// One target per name; `None` for parameters.
    targets: Vec<Option<Target>>,
    ty: MethodType,
    trace: bool,
}

impl InterpretedForm {
    /// Links member operations and checks conversions up front, so an
    /// interpreted form fails where its compiled counterpart would.
    pub fn new(form: Arc<Form>, linker: &dyn Linker, trace: bool) -> SynthResult<InterpretedForm> {
        let mut targets = Vec::with_capacity(form.names().len());
        for name in form.names() {
            match name.def() {
                NameDef::Param => targets.push(None),
                NameDef::Apply { op, .. } => {
                    if let Linkage::Bootstrap(BootstrapOp::Convert { from, to, call_site }) = op.linkage() {
                        convert(from, to, call_site)?;
                    }
                    targets.push(Some(Target::resolve(op, linker)?));
                }
            }
        }
        let ty = form.signature().to_method_type();
        Ok(InterpretedForm { form, targets, ty, trace })
    }

    pub fn form(&self) -> &Arc<Form> {
        &self.form
    }

    fn run(&self, args: &[Value]) -> Result<Value, InvokeError> {
        let mut values: Vec<Value> = Vec::with_capacity(self.form.names().len());
        values.extend_from_slice(args);

        for (name, target) in self.form.names()[args.len()..].iter().zip(&self.targets[args.len()..]) {
            let (NameDef::Apply { op, args: operands }, Some(target)) = (name.def(), target) else {
                return Err(InvokeError::Internal(format!(
                    "parameter name {} past the arity of `{}`",
                    name.index(),
                    self.form.name()
                )));
            };
            let mut argv = Vec::with_capacity(operands.len());
            for (operand, param) in operands.iter().zip(op.method_type().params()) {
                let value = match operand {
                    Arg::Name(i) => values
                        .get(*i)
                        .cloned()
                        .ok_or_else(|| InvokeError::Internal(format!("name {i} is not yet defined")))?,
                    Arg::Const(c) => c.clone(),
                };
                check_param(&value, param)?;
                argv.push(value);
            }
            let result = target.invoke(&argv)?;
            if self.trace {
                trace!(form = self.form.name(), name = name.index(), op = %op, result = %result, "interpret");
            }
            values.push(result);
        }

        match self.form.result() {
            Some(index) => values
                .get(index)
                .cloned()
                .ok_or_else(|| InvokeError::Internal(format!("result name {index} was never computed"))),
            None => Ok(Value::Void),
        }
    }
}

fn check_param(value: &Value, param: &ValueType) -> Result<(), InvokeError> {
    match param {
        ValueType::Ref(r) if !value.is_instance_of(r) => {
            Err(InvokeError::type_mismatch(r.name(), value.type_name()))
        }
        _ => Ok(()),
    }
}

impl Invocable for InterpretedForm {
    fn name(&self) -> &str {
        self.form.name()
    }

    fn method_type(&self) -> &MethodType {
        &self.ty
    }

    fn call(&self, args: &[Value]) -> Result<Value, InvokeError> {
        self.run(args)
    }
}
