// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! The access invoker: the form every accessor invocation runs through.
//!
//! For mode `m` and erased signature `(L, P...)R` the form is
//!
//! ```text
//! t = VarHandle.getExecutable(a0, m)
//! d = VarHandle.asDirect(a0)
//! invokeBasic(t, d, a1, ...)
//! ```

use quill_form::{
    AccessMode, Arg, BasicType, BootstrapOp, Executable, Form, FormBuilder, InvokeError, Kind, MemberRef,
    MethodType, NamedOp, Value, ValueType,
};
use quill_resolve::{ResolveError, ResolveResult, ShapeGenerator, ShapeKey};
use quill_synth::MemberTable;

use crate::accessor::{Accessor, ACCESSOR_CLASS};

fn get_executable() -> (MemberRef, MethodType) {
    let ty = MethodType::new(ValueType::OBJECT, vec![ValueType::class(ACCESSOR_CLASS), ValueType::INT]);
    (MemberRef::new(ACCESSOR_CLASS, "getExecutable"), ty)
}

fn as_direct() -> (MemberRef, MethodType) {
    let ty = MethodType::new(ValueType::class(ACCESSOR_CLASS), vec![ValueType::class(ACCESSOR_CLASS)]);
    (MemberRef::new(ACCESSOR_CLASS, "asDirect"), ty)
}

/// Registers the accessor members the access invoker links against.
pub(crate) fn register_members(members: &MemberTable) {
    let (member, ty) = get_executable();
    members.register(
        member.clone(),
        Executable::native(&member.to_string(), ty, |args| {
            let accessor = Accessor::from_value(&args[0])?;
            let ordinal = args[1].as_int().unwrap_or(-1);
            let mode = usize::try_from(ordinal)
                .ok()
                .and_then(AccessMode::from_ordinal)
                .ok_or_else(|| InvokeError::Internal(format!("{ordinal} is not an access mode")))?;
            Ok(accessor.get_executable(mode)?.to_value())
        }),
    );
    let (member, ty) = as_direct();
    members.register(
        member.clone(),
        Executable::native(&member.to_string(), ty, |args| Ok(Accessor::from_value(&args[0])?.as_direct()?.to_value())),
    );
}

pub(crate) struct AccessInvokers;

impl ShapeGenerator for AccessInvokers {
    fn generate(&self, key: &ShapeKey) -> ResolveResult<Form> {
        let unresolvable = |reason: &str| ResolveError::UnresolvableShape {
            signature: key.signature.clone(),
            kind: key.kind,
            reason: reason.to_string(),
        };
        let mode = key.op.access_mode().ok_or_else(|| unresolvable("op id is not an access mode"))?;
        let sig = &key.signature;
        if sig.params().first() != Some(&BasicType::L) {
            return Err(unresolvable("the accessor must be the first argument"));
        }

        let mut builder = FormBuilder::new(Kind::AccessInvoker, sig.clone()).named(key.entry_name());
        let (member, ty) = get_executable();
        let exec = builder.apply(
            NamedOp::member(member, ty),
            vec![Arg::Name(0), Arg::Const(Value::Int(mode.ordinal() as i32))],
        );
        let (member, ty) = as_direct();
        let direct = builder.apply(NamedOp::member(member, ty), vec![Arg::Name(0)]);
        let mut args = vec![Arg::Name(exec), Arg::Name(direct)];
        args.extend((1..sig.arity()).map(Arg::Name));
        builder.apply(NamedOp::bootstrap(BootstrapOp::InvokeBasic(sig.clone())), args);
        Ok(builder.finish()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_form::{OpId, Signature};

    #[test]
    fn builds_the_invoker_form() {
        let key = ShapeKey::with_op(Signature::parse("LLI_V").unwrap(), Kind::AccessInvoker, OpId::mode(AccessMode::SetRelease));
        let form = AccessInvokers.generate(&key).unwrap();
        assert_eq!(form.name(), "invoke_vh_setRelease_LLI_V");
        assert_eq!(form.names().len(), 6);
        assert_eq!(form.result(), None);
    }

    #[test]
    fn rejects_shapes_without_an_accessor() {
        let key = ShapeKey::with_op(Signature::parse("I_I").unwrap(), Kind::AccessInvoker, OpId::mode(AccessMode::Get));
        assert!(matches!(AccessInvokers.generate(&key), Err(ResolveError::UnresolvableShape { .. })));
        let key = ShapeKey::with_op(Signature::parse("L_I").unwrap(), Kind::AccessInvoker, OpId(99));
        assert!(AccessInvokers.generate(&key).is_err());
    }

    #[test]
    fn members_are_registered() {
        let members = MemberTable::new();
        register_members(&members);
        assert!(members.contains(&MemberRef::new(ACCESSOR_CLASS, "getExecutable")));
        assert!(members.contains(&MemberRef::new(ACCESSOR_CLASS, "asDirect")));
    }
}
