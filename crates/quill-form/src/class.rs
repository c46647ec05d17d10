// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Class layouts, instances and storage cells.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::types::{PrimType, ValueType};
use crate::value::Value;

/// A single storage location. Every access mode runs under the cell's lock,
/// which gives each mode at least the ordering it promises.
#[derive(Debug)]
pub struct Cell(Mutex<Value>);

impl Cell {
    pub fn new(value: Value) -> Self {
        Cell(Mutex::new(value))
    }

    fn lock(&self) -> MutexGuard<'_, Value> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn load(&self) -> Value {
        self.lock().clone()
    }

    pub fn store(&self, value: Value) {
        *self.lock() = value;
    }

    pub fn swap(&self, value: Value) -> Value {
        std::mem::replace(&mut *self.lock(), value)
    }

    /// Runs `f` with exclusive access to the stored value.
    pub fn update<R>(&self, f: impl FnOnce(&mut Value) -> R) -> R {
        f(&mut self.lock())
    }
}

/// Declaration of a field before layout.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub name: String,
    pub ty: ValueType,
    pub is_static: bool,
    pub is_final: bool,
}

impl FieldDecl {
    pub fn instance(name: &str, ty: ValueType) -> Self {
        FieldDecl { name: name.to_string(), ty, is_static: false, is_final: false }
    }

    pub fn of_static(name: &str, ty: ValueType) -> Self {
        FieldDecl { name: name.to_string(), ty, is_static: true, is_final: false }
    }

    pub fn final_(mut self) -> Self {
        self.is_final = true;
        self
    }
}

/// A laid-out field. `slot` indexes the instance cells (or the owning
/// scope's static cells); `offset` is the byte offset in the layout.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldInfo {
    pub name: String,
    pub ty: ValueType,
    pub slot: usize,
    pub offset: u32,
    pub is_static: bool,
    pub is_final: bool,
}

#[derive(Debug)]
pub struct ClassInfo {
    name: Arc<str>,
    superclass: Option<Arc<ClassInfo>>,
    fields: Vec<FieldInfo>,
}

impl ClassInfo {
    /// Bytes reserved ahead of the first instance field.
    pub const HEADER_SIZE: u32 = 16;

    /// Lays out `decls` in declaration order. Each field is appended at the
    /// next offset satisfying its natural alignment, so a class whose
    /// declarations extend another's keeps the shared prefix in place.
    pub fn new(name: &str, superclass: Option<Arc<ClassInfo>>, decls: Vec<FieldDecl>) -> Self {
        let mut instance_cursor = Self::HEADER_SIZE;
        let mut static_cursor = 0u32;
        let mut instance_slots = 0;
        let mut static_slots = 0;
        let mut fields = Vec::with_capacity(decls.len());

        for decl in decls {
            let size = field_size(&decl.ty);
            let (cursor, slots) = if decl.is_static {
                (&mut static_cursor, &mut static_slots)
            } else {
                (&mut instance_cursor, &mut instance_slots)
            };
            let offset = cursor.next_multiple_of(size);
            *cursor = offset + size;
            fields.push(FieldInfo {
                name: decl.name,
                ty: decl.ty,
                slot: *slots,
                offset,
                is_static: decl.is_static,
                is_final: decl.is_final,
            });
            *slots += 1;
        }

        ClassInfo { name: Arc::from(name), superclass, fields }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn superclass(&self) -> Option<&Arc<ClassInfo>> {
        self.superclass.as_ref()
    }

    pub fn fields(&self) -> &[FieldInfo] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn instance_fields(&self) -> impl Iterator<Item = &FieldInfo> {
        self.fields.iter().filter(|f| !f.is_static)
    }

    pub fn static_fields(&self) -> impl Iterator<Item = &FieldInfo> {
        self.fields.iter().filter(|f| f.is_static)
    }

    /// True for this class or any class up its superclass chain.
    pub fn is_subclass_of(&self, name: &str) -> bool {
        let mut current = Some(self);
        while let Some(class) = current {
            if class.name() == name {
                return true;
            }
            current = class.superclass().map(|s| s.as_ref());
        }
        false
    }
}

fn field_size(ty: &ValueType) -> u32 {
    match ty {
        ValueType::Prim(PrimType::Void) => 0,
        ValueType::Prim(p) => p.byte_size() as u32,
        ValueType::Ref(_) => 8,
    }
    .max(1)
}

/// An object of a laid-out class: one cell per instance field.
#[derive(Debug)]
pub struct Instance {
    class: Arc<ClassInfo>,
    cells: Vec<Cell>,
}

impl Instance {
    /// A zero-initialized instance.
    pub fn new(class: Arc<ClassInfo>) -> Self {
        let cells = class
            .instance_fields()
            .map(|f| Cell::new(f.ty.basic_type().zero()))
            .collect();
        Instance { class, cells }
    }

    /// `values` are assigned to instance fields in slot order.
    pub fn with_values(class: Arc<ClassInfo>, values: Vec<Value>) -> Self {
        Instance { class, cells: values.into_iter().map(Cell::new).collect() }
    }

    pub fn class(&self) -> &Arc<ClassInfo> {
        &self.class
    }

    pub fn cell(&self, slot: usize) -> Option<&Cell> {
        self.cells.get(slot)
    }

    pub fn field_count(&self) -> usize {
        self.cells.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point() -> ClassInfo {
        ClassInfo::new(
            "Point",
            None,
            vec![
                FieldDecl::instance("flag", ValueType::BOOLEAN),
                FieldDecl::instance("x", ValueType::LONG),
                FieldDecl::of_static("count", ValueType::INT),
                FieldDecl::instance("y", ValueType::INT).final_(),
            ],
        )
    }

    #[test]
    fn layout_aligns_naturally() {
        let class = point();
        let flag = class.field("flag").unwrap();
        let x = class.field("x").unwrap();
        let y = class.field("y").unwrap();
        let count = class.field("count").unwrap();
        assert_eq!((flag.slot, flag.offset), (0, 16));
        assert_eq!((x.slot, x.offset), (1, 24));
        assert_eq!((y.slot, y.offset), (2, 32));
        assert!(y.is_final);
        assert_eq!((count.slot, count.offset), (0, 0));
        assert!(count.is_static);
    }

    #[test]
    fn extended_declarations_keep_prefix_layout() {
        let base = point();
        let mut decls: Vec<FieldDecl> = base
            .fields()
            .iter()
            .map(|f| FieldDecl {
                name: f.name.clone(),
                ty: f.ty.clone(),
                is_static: f.is_static,
                is_final: f.is_final,
            })
            .collect();
        decls.push(FieldDecl::instance("z", ValueType::DOUBLE));
        let extended = ClassInfo::new("Point3", None, decls);
        assert_eq!(&extended.fields()[..base.fields().len()], base.fields());
    }

    #[test]
    fn subclass_chain() {
        let base = Arc::new(ClassInfo::new("Base", None, vec![]));
        let derived = ClassInfo::new("Derived", Some(base), vec![]);
        assert!(derived.is_subclass_of("Base"));
        assert!(derived.is_subclass_of("Derived"));
        assert!(!derived.is_subclass_of("Other"));
    }

    #[test]
    fn instances_start_zeroed() {
        let inst = Instance::new(Arc::new(point()));
        assert_eq!(inst.field_count(), 3);
        assert_eq!(inst.cell(1).unwrap().load(), Value::Long(0));
        inst.cell(2).unwrap().store(Value::Int(4));
        assert_eq!(inst.cell(2).unwrap().swap(Value::Int(5)), Value::Int(4));
    }
}
