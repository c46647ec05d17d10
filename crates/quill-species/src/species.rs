// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Generated holder layouts.

use std::sync::{Arc, OnceLock};

use quill_form::{
    Arg, BasicType, BootstrapOp, ClassInfo, FieldDecl, Form, FormBuilder, FormError, Instance, Kind, NamedOp,
    Object, Signature, Value,
};

use crate::key::SpeciesKey;

/// Superclass of every species class.
pub const BASE_CLASS: &str = "BoundHolder";

/// Accessor for one captured slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Getter {
    pub name: String,
    pub slot: u16,
    pub offset: u32,
    pub ty: BasicType,
}

impl Getter {
    pub fn op(&self) -> NamedOp {
        NamedOp::bootstrap(BootstrapOp::GetField { slot: self.slot, ty: self.ty })
    }

    /// `(holder) -> value` as a form named after the getter.
    pub fn form(&self) -> Result<Form, FormError> {
        let signature = Signature::new(vec![BasicType::L], self.ty);
        let mut builder = FormBuilder::new(Kind::BoundGetter, signature).named(self.name.clone());
        builder.apply(self.op(), vec![Arg::Name(0)]);
        builder.finish()
    }
}

pub struct SpeciesData {
    key: SpeciesKey,
    class: Arc<ClassInfo>,
    getters: Vec<Getter>,
    /// Children keyed by the ordinal of the appended kind.
    pub(crate) extensions: [OnceLock<Arc<SpeciesData>>; 5],
}

impl SpeciesData {
    pub(crate) fn root(base: Arc<ClassInfo>) -> SpeciesData {
        SpeciesData { key: SpeciesKey::default(), class: base, getters: Vec::new(), extensions: Default::default() }
    }

    /// The species for `parent`'s key plus `bt`. Every field of the parent
    /// keeps its slot and offset; one field is appended.
    pub(crate) fn derive(parent: &Arc<SpeciesData>, bt: BasicType) -> SpeciesData {
        let key = parent.key.extended(bt);
        let decls = key
            .kinds()
            .iter()
            .enumerate()
            .map(|(i, kind)| FieldDecl::instance(&field_name(*kind, i), kind.erased()).final_())
            .collect();
        let class = Arc::new(ClassInfo::new(&class_name(&key), Some(parent.class.clone()), decls));
        let mut getters = parent.getters.clone();
        getters.extend(class.instance_fields().last().map(|field| Getter {
            name: field.name.clone(),
            slot: field.slot as u16,
            offset: field.offset,
            ty: bt,
        }));
        SpeciesData { key, class, getters, extensions: Default::default() }
    }

    pub fn key(&self) -> &SpeciesKey {
        &self.key
    }

    pub fn class(&self) -> &Arc<ClassInfo> {
        &self.class
    }

    pub fn getters(&self) -> &[Getter] {
        &self.getters
    }

    pub fn getter(&self, index: usize) -> Option<&Getter> {
        self.getters.get(index)
    }

    /// An already generated child, without generating it.
    pub fn extension(&self, bt: BasicType) -> Option<&Arc<SpeciesData>> {
        self.extensions.get(bt.ordinal())?.get()
    }

    /// A holder instance; `values` must match the key's kinds.
    pub fn instantiate(&self, values: Vec<Value>) -> Value {
        debug_assert_eq!(values.len(), self.key.len());
        Value::object(Object::Instance(Instance::with_values(self.class.clone(), values)))
    }
}

pub fn class_name(key: &SpeciesKey) -> String {
    if key.is_empty() {
        BASE_CLASS.to_string()
    } else {
        format!("Species_{key}")
    }
}

fn field_name(bt: BasicType, index: usize) -> String {
    format!("arg{bt}{index}")
}
