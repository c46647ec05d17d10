// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Lowering forms into units of stack-machine entries.

use std::sync::Arc;

use indexmap::IndexMap;
use quill_form::{
    Arg, BasicType, BootstrapOp, Form, Kind, Linkage, NameDef, NamedOp, Signature, ValueType,
    Value,
};
use tracing::debug;

use crate::convert::{convert, param_check};
use crate::error::SynthResult;
use crate::insn::Insn;
use crate::unitfile;

/// One lowered form: code plus the pools it indexes.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryCode {
    pub name: String,
    pub kind: Kind,
    pub signature: Signature,
    pub max_locals: u16,
    pub constants: Vec<Value>,
    pub ops: Vec<NamedOp>,
    pub code: Vec<Insn>,
}

/// A named batch of entries, in emission order.
#[derive(Debug, Clone)]
pub struct Unit {
    name: String,
    entries: IndexMap<String, Arc<EntryCode>>,
}

impl Unit {
    pub(crate) fn from_entries(name: String, entries: Vec<EntryCode>) -> Unit {
        let mut unit = Unit { name, entries: IndexMap::with_capacity(entries.len()) };
        for entry in entries {
            unit.entries.entry(entry.name.clone()).or_insert_with(|| Arc::new(entry));
        }
        unit
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, name: &str) -> Option<&Arc<EntryCode>> {
        self.entries.get(name)
    }

    pub fn entries(&self) -> impl Iterator<Item = &Arc<EntryCode>> {
        self.entries.values()
    }

    /// Deterministic encoding: the same unit always produces the same bytes.
    pub fn to_bytes(&self) -> SynthResult<Vec<u8>> {
        unitfile::encode(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> SynthResult<Unit> {
        unitfile::decode(bytes)
    }
}

/// Emits one entry per distinct name. Later forms whose name collides with
/// an earlier entry are dropped.
pub fn emit(unit_name: &str, forms: &[(String, Form)]) -> SynthResult<Unit> {
    let mut entries: IndexMap<String, Arc<EntryCode>> = IndexMap::with_capacity(forms.len());
    for (name, form) in forms {
        if entries.contains_key(name) {
            debug!(unit = unit_name, entry = %name, "merged duplicate entry");
            continue;
        }
        let code = lower(name, form)?;
        entries.insert(name.clone(), Arc::new(code));
    }
    debug!(unit = unit_name, entries = entries.len(), "emitted unit");
    Ok(Unit { name: unit_name.to_string(), entries })
}

/// Lowers a single form. Each name gets the local slot of its index.
pub fn lower(name: &str, form: &Form) -> SynthResult<EntryCode> {
    let mut lowering = Lowering::default();

    for n in &form.names()[form.arity()..] {
        let NameDef::Apply { op, args } = n.def() else {
            continue;
        };
        let params = op.method_type().params();
        for (arg, param) in args.iter().zip(params) {
            lowering.load(arg, param);
        }
        match op.linkage() {
            Linkage::Bootstrap(BootstrapOp::Convert { from, to, call_site }) => {
                lowering.code.extend(convert(from, to, call_site)?);
            }
            _ => {
                let index = lowering.op_index(op);
                lowering.code.push(Insn::Call(index));
            }
        }
        if n.ty() != BasicType::V {
            lowering.code.push(Insn::Store(n.index() as u16));
        }
    }

    match form.result() {
        Some(result) => {
            lowering.code.push(Insn::Load(result as u16));
            lowering.code.push(Insn::Return);
        }
        None => lowering.code.push(Insn::ReturnVoid),
    }

    Ok(EntryCode {
        name: name.to_string(),
        kind: form.kind(),
        signature: form.signature().clone(),
        max_locals: form.names().len() as u16,
        constants: lowering.constants,
        ops: lowering.ops,
        code: lowering.code,
    })
}

#[derive(Default)]
struct Lowering {
    constants: Vec<Value>,
    ops: Vec<NamedOp>,
    code: Vec<Insn>,
}

impl Lowering {
    fn load(&mut self, arg: &Arg, param: &ValueType) {
        match arg {
            Arg::Name(index) => self.code.push(Insn::Load(*index as u16)),
            Arg::Const(value) => {
                let index = self.constants.len() as u16;
                self.constants.push(value.clone());
                self.code.push(Insn::Const(index));
            }
        }
        self.code.extend(param_check(param));
    }

    fn op_index(&mut self, op: &NamedOp) -> u16 {
        match self.ops.iter().position(|existing| existing == op) {
            Some(index) => index as u16,
            None => {
                self.ops.push(op.clone());
                (self.ops.len() - 1) as u16
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_form::{FormBuilder, MemberRef, MethodType, PrimType, RefType};

    fn sig(s: &str) -> Signature {
        Signature::parse(s).unwrap()
    }

    fn add_form(s: &str) -> Form {
        let signature = sig(s);
        let bt = signature.ret();
        Form::build(
            Kind::Add,
            signature,
            vec![(NamedOp::bootstrap(BootstrapOp::Add(bt)), vec![Arg::Name(0), Arg::Name(1)])],
        )
        .unwrap()
    }

    #[test]
    fn lowers_add() {
        let entry = lower("add_II_I", &add_form("II_I")).unwrap();
        assert_eq!(
            entry.code,
            vec![
                Insn::Load(0),
                Insn::Load(1),
                Insn::Call(0),
                Insn::Store(2),
                Insn::Load(2),
                Insn::Return,
            ]
        );
        assert_eq!(entry.max_locals, 3);
        assert_eq!(entry.ops.len(), 1);
    }

    #[test]
    fn reference_parameters_are_checked() {
        let length = NamedOp::member(
            MemberRef::new("String", "length"),
            MethodType::new(ValueType::INT, vec![ValueType::STRING]),
        );
        let form = Form::build(Kind::Identity, sig("L_I"), vec![(length, vec![Arg::Name(0)])]).unwrap();
        let entry = lower("length", &form).unwrap();
        assert_eq!(&entry.code[..3], &[Insn::Load(0), Insn::CheckCast(RefType::String), Insn::Call(0)]);
    }

    #[test]
    fn conversions_are_inlined() {
        let mut builder = FormBuilder::new(Kind::Convert, sig("I_L"));
        builder.apply(
            NamedOp::bootstrap(BootstrapOp::Convert {
                from: ValueType::INT,
                to: ValueType::boxed(PrimType::Int),
                call_site: ValueType::OBJECT,
            }),
            vec![Arg::Name(0)],
        );
        let entry = lower("box", &builder.finish().unwrap()).unwrap();
        assert!(entry.ops.is_empty());
        assert_eq!(
            entry.code,
            vec![Insn::Load(0), Insn::Box(PrimType::Int), Insn::Store(1), Insn::Load(1), Insn::Return]
        );
    }

    #[test]
    fn emit_merges_colliding_names() {
        let forms = vec![
            ("add".to_string(), add_form("II_I")),
            ("add".to_string(), add_form("JJ_J")),
            ("add_long".to_string(), add_form("JJ_J")),
        ];
        let unit = emit("Holder", &forms).unwrap();
        assert_eq!(unit.len(), 2);
        assert_eq!(unit.entry("add").unwrap().signature, sig("II_I"));
        let names: Vec<_> = unit.entries().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["add", "add_long"]);
    }

    #[test]
    fn lowering_is_deterministic() {
        let form = add_form("DD_D");
        assert_eq!(lower("a", &form).unwrap(), lower("a", &form).unwrap());
    }
}
