// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! asType adapters: a conversion form bound to its target.

use quill_form::{
    Arg, BasicType, BootstrapOp, Executable, Form, FormBuilder, Invocable, InvokeError, Kind,
    MethodType, NamedOp, Value,
};

use crate::error::{ResolveError, ResolveResult};

/// Builds the form adapting a handle of type `target` to `requested`.
/// The handle itself arrives as `a0`.
pub(crate) fn adapter_form(target: &MethodType, requested: &MethodType) -> ResolveResult<Form> {
    if target.arity() != requested.arity() {
        return Err(ResolveError::Adaptation {
            target: target.clone(),
            requested: requested.clone(),
            reason: format!("arity {} differs from {}", requested.arity(), target.arity()),
        });
    }

    let signature = requested.basic_signature().with_leading(BasicType::L);
    let mut builder = FormBuilder::new(Kind::Convert, signature);

    let mut call_args = vec![Arg::Name(0)];
    for (i, (from, to)) in requested.params().iter().zip(target.params()).enumerate() {
        let param = Arg::Name(i + 1);
        if from == to {
            call_args.push(param);
        } else {
            let convert = BootstrapOp::Convert { from: from.clone(), to: to.clone(), call_site: from.clone() };
            call_args.push(Arg::Name(builder.apply(NamedOp::bootstrap(convert), vec![param])));
        }
    }

    let call = builder.apply(NamedOp::bootstrap(BootstrapOp::InvokeBasic(target.basic_signature())), call_args);

    let (from, to) = (target.ret(), requested.ret());
    let result = match (from.is_void(), to.is_void()) {
        (_, true) => None,
        (true, false) => Some(builder.apply(NamedOp::bootstrap(BootstrapOp::Zero(to.basic_type())), vec![])),
        (false, false) if from == to => Some(call),
        (false, false) => {
            let convert = BootstrapOp::Convert { from: from.clone(), to: to.clone(), call_site: to.clone() };
            Some(builder.apply(NamedOp::bootstrap(convert), vec![Arg::Name(call)]))
        }
    };
    Ok(builder.finish_with(result)?)
}

/// A shared adapter executable with its target bound in front.
pub(crate) struct Adapted {
    pub(crate) target: Executable,
    pub(crate) adapter: Executable,
    pub(crate) ty: MethodType,
    pub(crate) name: String,
}

impl Invocable for Adapted {
    fn name(&self) -> &str {
        &self.name
    }

    fn method_type(&self) -> &MethodType {
        &self.ty
    }

    fn call(&self, args: &[Value]) -> Result<Value, InvokeError> {
        let mut full = Vec::with_capacity(args.len() + 1);
        full.push(self.target.to_value());
        full.extend_from_slice(args);
        self.adapter.invoke(&full)
    }
}
