// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Generators for the shapes every runtime needs.

use quill_form::{Arg, BasicType, BootstrapOp, Form, FormBuilder, Kind, NamedOp, Signature};

use crate::error::{ResolveError, ResolveResult};
use crate::shape::{ShapeGenerator, ShapeKey};

/// Identity, zero, arithmetic and the generic invoker.
pub struct Builtins;

impl Builtins {
    pub const KINDS: [Kind; 6] =
        [Kind::Identity, Kind::Zero, Kind::Add, Kind::Sub, Kind::Mul, Kind::Invoker];
}

impl ShapeGenerator for Builtins {
    fn generate(&self, key: &ShapeKey) -> ResolveResult<Form> {
        let sig = &key.signature;
        let unresolvable = |reason: &str| ResolveError::UnresolvableShape {
            signature: sig.clone(),
            kind: key.kind,
            reason: reason.to_string(),
        };
        let mut builder = FormBuilder::new(key.kind, sig.clone()).named(key.entry_name());

        match key.kind {
            Kind::Identity => {
                if sig.params() != [sig.ret()] {
                    return Err(unresolvable("identity takes exactly one argument of the return kind"));
                }
                builder.apply(NamedOp::bootstrap(BootstrapOp::Identity(sig.ret())), vec![Arg::Name(0)]);
            }
            Kind::Zero => {
                if sig.ret() == BasicType::V {
                    return Err(unresolvable("void has no zero value"));
                }
                builder.apply(NamedOp::bootstrap(BootstrapOp::Zero(sig.ret())), vec![]);
            }
            Kind::Add | Kind::Sub | Kind::Mul => {
                let bt = sig.ret();
                if bt == BasicType::L || bt == BasicType::V || sig.params() != [bt, bt] {
                    return Err(unresolvable("arithmetic needs two numeric arguments of the return kind"));
                }
                let op = match key.kind {
                    Kind::Add => BootstrapOp::Add(bt),
                    Kind::Sub => BootstrapOp::Sub(bt),
                    _ => BootstrapOp::Mul(bt),
                };
                builder.apply(NamedOp::bootstrap(op), vec![Arg::Name(0), Arg::Name(1)]);
            }
            Kind::Invoker => {
                if sig.params().first() != Some(&BasicType::L) {
                    return Err(unresolvable("the invoked handle must be the first argument"));
                }
                let args = (0..sig.arity()).map(Arg::Name).collect();
                builder.apply(NamedOp::bootstrap(BootstrapOp::InvokeBasic(sig.drop_leading(1))), args);
            }
            _ => return Err(unresolvable("not a built-in kind")),
        }
        Ok(builder.finish()?)
    }
}

/// Signature of an invoker for a handle erased to `target`.
pub fn invoker_signature(target: &Signature) -> Signature {
    target.with_leading(BasicType::L)
}
