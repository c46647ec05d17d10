// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Forms and their builder.

use crate::error::FormError;
use crate::kind::{Kind, OpId};
use crate::name::{Arg, Name, NameDef, NamedOp};
use crate::signature::Signature;
use crate::types::BasicType;

/// A structural description of how to compute a result from arguments.
///
/// Names `0..arity` are the parameters; every later name applies an
/// operation to earlier names or constants. Forms are validated once when
/// built and immutable afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Form {
    kind: Kind,
    name: String,
    signature: Signature,
    names: Vec<Name>,
    result: Option<usize>,
}

impl Form {
    /// Builds a form from a list of operations, the last of which produces
    /// the result (unless the signature returns `V`).
    pub fn build(
        kind: Kind,
        signature: Signature,
        ops: Vec<(NamedOp, Vec<Arg>)>,
    ) -> Result<Form, FormError> {
        let mut builder = FormBuilder::new(kind, signature);
        for (op, args) in ops {
            builder.apply(op, args);
        }
        builder.finish()
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    /// Debug name; defaults to the kind's entry name for the signature.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn arity(&self) -> usize {
        self.signature.arity()
    }

    pub fn names(&self) -> &[Name] {
        &self.names
    }

    /// Index of the result name; `None` for void forms.
    pub fn result(&self) -> Option<usize> {
        self.result
    }

    fn validate(&self) -> Result<(), FormError> {
        for name in &self.names[self.arity()..] {
            let NameDef::Apply { op, args } = &name.def else {
                continue;
            };
            let expected = op.method_type().params();
            if expected.len() != args.len() {
                return Err(FormError::ArgumentCount {
                    index: name.index,
                    op: op.to_string(),
                    expected: expected.len(),
                    got: args.len(),
                });
            }
            for (position, (arg, param)) in args.iter().zip(expected).enumerate() {
                let found = match arg {
                    Arg::Name(target) => {
                        if *target >= name.index {
                            return Err(FormError::ForwardReference {
                                index: name.index,
                                target: *target,
                            });
                        }
                        let ty = self.names[*target].ty;
                        if ty == BasicType::V {
                            return Err(FormError::VoidReference {
                                index: name.index,
                                target: *target,
                            });
                        }
                        ty
                    }
                    Arg::Const(value) => value.basic_type(),
                };
                if found != param.basic_type() {
                    return Err(FormError::ArgumentType {
                        index: name.index,
                        op: op.to_string(),
                        arg: position,
                        expected: param.basic_type(),
                        found,
                    });
                }
            }
        }

        let expected = self.signature.ret();
        let found = match self.result {
            Some(index) => match self.names.get(index) {
                Some(name) => name.ty,
                None => {
                    return Err(FormError::ResultOutOfRange { index, len: self.names.len() })
                }
            },
            None => BasicType::V,
        };
        if found != expected {
            return Err(FormError::ResultKind { expected, found });
        }
        Ok(())
    }
}

/// Incremental construction of a [`Form`].
pub struct FormBuilder {
    kind: Kind,
    name: Option<String>,
    signature: Signature,
    names: Vec<Name>,
}

impl FormBuilder {
    pub fn new(kind: Kind, signature: Signature) -> Self {
        let names = signature
            .params()
            .iter()
            .enumerate()
            .map(|(index, ty)| Name { index, ty: *ty, def: NameDef::Param })
            .collect();
        FormBuilder { kind, name: None, signature, names }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn arity(&self) -> usize {
        self.signature.arity()
    }

    /// Appends a name applying `op`; returns its index. Checked in `finish`.
    pub fn apply(&mut self, op: NamedOp, args: Vec<Arg>) -> usize {
        let index = self.names.len();
        let ty = op.method_type().ret().basic_type();
        self.names.push(Name { index, ty, def: NameDef::Apply { op, args } });
        index
    }

    /// Finishes with the last name as the result, or no result for `V`.
    pub fn finish(self) -> Result<Form, FormError> {
        let result = match self.signature.ret() {
            BasicType::V => None,
            _ => self.names.len().checked_sub(1),
        };
        self.finish_with(result)
    }

    pub fn finish_with(self, result: Option<usize>) -> Result<Form, FormError> {
        let name = self
            .name
            .unwrap_or_else(|| self.kind.entry_name(&self.signature, OpId::NONE));
        // A void name as the result is the same as no result.
        let result = result.filter(|&i| self.names.get(i).map_or(true, |n| n.ty != BasicType::V));
        let form = Form { kind: self.kind, name, signature: self.signature, names: self.names, result };
        form.validate()?;
        Ok(form)
    }
}
