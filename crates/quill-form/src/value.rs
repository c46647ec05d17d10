// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Runtime values and the object model they point into.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::class::{Cell, Instance};
use crate::exec::Executable;
use crate::types::{BasicType, PrimType, RefType, ValueType};

pub type ObjRef = Arc<Object>;

/// An erased runtime value. Subword primitives travel as `Int`.
#[derive(Clone, Debug)]
pub enum Value {
    Void,
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Ref(Option<ObjRef>),
}

impl Value {
    pub const NULL: Value = Value::Ref(None);

    pub fn object(obj: Object) -> Value {
        Value::Ref(Some(Arc::new(obj)))
    }

    pub fn string(s: impl Into<String>) -> Value {
        Value::object(Object::Str(s.into()))
    }

    pub fn boxed(b: Boxed) -> Value {
        Value::object(Object::Boxed(b))
    }

    pub fn bool(b: bool) -> Value {
        Value::Int(b as i32)
    }

    pub fn basic_type(&self) -> BasicType {
        match self {
            Value::Void => BasicType::V,
            Value::Int(_) => BasicType::I,
            Value::Long(_) => BasicType::J,
            Value::Float(_) => BasicType::F,
            Value::Double(_) => BasicType::D,
            Value::Ref(_) => BasicType::L,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            Value::Long(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.as_int().map(|v| v != 0)
    }

    /// The referenced object; `None` for null and for primitives.
    pub fn as_object(&self) -> Option<&ObjRef> {
        match self {
            Value::Ref(Some(obj)) => Some(obj),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Ref(None))
    }

    /// Identity comparison used by compare-and-set: raw bits for floating
    /// values, pointer identity for references.
    pub fn same_as(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Void, Value::Void) => true,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Double(a), Value::Double(b)) => a.to_bits() == b.to_bits(),
            (Value::Ref(None), Value::Ref(None)) => true,
            (Value::Ref(Some(a)), Value::Ref(Some(b))) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Runtime type test; null is an instance of every reference type.
    pub fn is_instance_of(&self, ty: &RefType) -> bool {
        match self {
            Value::Ref(None) => true,
            Value::Ref(Some(obj)) => obj.is_instance_of(ty),
            _ => false,
        }
    }

    pub fn type_name(&self) -> String {
        match self {
            Value::Void => "void".to_string(),
            Value::Int(_) => "int".to_string(),
            Value::Long(_) => "long".to_string(),
            Value::Float(_) => "float".to_string(),
            Value::Double(_) => "double".to_string(),
            Value::Ref(None) => "null".to_string(),
            Value::Ref(Some(obj)) => obj.type_name(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Ref(Some(a)), Value::Ref(Some(b))) => {
                Arc::ptr_eq(a, b)
                    || match (a.as_ref(), b.as_ref()) {
                        (Object::Boxed(x), Object::Boxed(y)) => x == y,
                        (Object::Str(x), Object::Str(y)) => x == y,
                        _ => false,
                    }
            }
            _ => self.same_as(other),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Void => write!(f, "void"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Long(v) => write!(f, "{v}L"),
            Value::Float(v) => write!(f, "{v}f"),
            Value::Double(v) => write!(f, "{v}d"),
            Value::Ref(None) => write!(f, "null"),
            Value::Ref(Some(obj)) => write!(f, "{obj}"),
        }
    }
}

/// A boxed primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Boxed {
    Boolean(bool),
    Byte(i8),
    Short(i16),
    Char(u16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
}

impl Boxed {
    pub fn prim_type(&self) -> PrimType {
        match self {
            Boxed::Boolean(_) => PrimType::Boolean,
            Boxed::Byte(_) => PrimType::Byte,
            Boxed::Short(_) => PrimType::Short,
            Boxed::Char(_) => PrimType::Char,
            Boxed::Int(_) => PrimType::Int,
            Boxed::Long(_) => PrimType::Long,
            Boxed::Float(_) => PrimType::Float,
            Boxed::Double(_) => PrimType::Double,
        }
    }

    /// Boxes an erased value as the wrapper of `prim`, narrowing subword ints.
    /// `None` when the value's erasure does not match `prim`.
    pub fn from_value(prim: PrimType, value: &Value) -> Option<Boxed> {
        let boxed = match (prim, value) {
            (PrimType::Boolean, Value::Int(v)) => Boxed::Boolean(*v != 0),
            (PrimType::Byte, Value::Int(v)) => Boxed::Byte(*v as i8),
            (PrimType::Short, Value::Int(v)) => Boxed::Short(*v as i16),
            (PrimType::Char, Value::Int(v)) => Boxed::Char(*v as u16),
            (PrimType::Int, Value::Int(v)) => Boxed::Int(*v),
            (PrimType::Long, Value::Long(v)) => Boxed::Long(*v),
            (PrimType::Float, Value::Float(v)) => Boxed::Float(*v),
            (PrimType::Double, Value::Double(v)) => Boxed::Double(*v),
            _ => return None,
        };
        Some(boxed)
    }

    /// The wrapped value as its own primitive type.
    pub fn unbox(&self) -> Value {
        self.convert_to(self.prim_type())
    }

    /// `xxxValue()` semantics: a primitive conversion of the wrapped value.
    pub fn convert_to(&self, to: PrimType) -> Value {
        let (int, float) = match *self {
            Boxed::Boolean(v) => (v as i64, v as i64 as f64),
            Boxed::Byte(v) => (v as i64, v as f64),
            Boxed::Short(v) => (v as i64, v as f64),
            Boxed::Char(v) => (v as i64, v as f64),
            Boxed::Int(v) => (v as i64, v as f64),
            Boxed::Long(v) => (v, v as f64),
            Boxed::Float(v) => (v as i64, v as f64),
            Boxed::Double(v) => (v as i64, v),
        };
        let floating = matches!(self, Boxed::Float(_) | Boxed::Double(_));
        let as_int = if floating { float as i32 } else { int as i32 };
        match to {
            PrimType::Boolean => Value::bool(int != 0),
            PrimType::Byte => Value::Int(as_int as i8 as i32),
            PrimType::Short => Value::Int(as_int as i16 as i32),
            PrimType::Char => Value::Int(as_int as u16 as i32),
            PrimType::Int => Value::Int(as_int),
            PrimType::Long => Value::Long(int),
            PrimType::Float => match self {
                Boxed::Float(v) => Value::Float(*v),
                _ if floating => Value::Float(float as f32),
                _ => Value::Float(int as f32),
            },
            PrimType::Double => Value::Double(if floating { float } else { int as f64 }),
            PrimType::Void => Value::Void,
        }
    }
}

impl fmt::Display for Boxed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Boxed::Boolean(v) => write!(f, "{v}"),
            Boxed::Byte(v) => write!(f, "{v}"),
            Boxed::Short(v) => write!(f, "{v}"),
            Boxed::Char(v) => match char::from_u32(*v as u32) {
                Some(c) => write!(f, "'{c}'"),
                None => write!(f, "'\\u{v:04x}'"),
            },
            Boxed::Int(v) => write!(f, "{v}"),
            Boxed::Long(v) => write!(f, "{v}"),
            Boxed::Float(v) => write!(f, "{v}"),
            Boxed::Double(v) => write!(f, "{v}"),
        }
    }
}

/// A fixed-length array whose elements are storage cells.
#[derive(Debug)]
pub struct ArrayObject {
    elem: ValueType,
    cells: Vec<Cell>,
}

impl ArrayObject {
    /// A zero-filled array.
    pub fn new(elem: ValueType, len: usize) -> Self {
        let zero = elem.basic_type().zero();
        ArrayObject { cells: (0..len).map(|_| Cell::new(zero.clone())).collect(), elem }
    }

    pub fn from_values(elem: ValueType, values: Vec<Value>) -> Self {
        ArrayObject { cells: values.into_iter().map(Cell::new).collect(), elem }
    }

    pub fn elem(&self) -> &ValueType {
        &self.elem
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cell(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }
}

/// Foreign payload carried through the value world under a class name.
#[derive(Clone)]
pub struct Opaque {
    class: Arc<str>,
    payload: Arc<dyn Any + Send + Sync>,
}

impl Opaque {
    pub fn new(class: &str, payload: Arc<dyn Any + Send + Sync>) -> Self {
        Opaque { class: Arc::from(class), payload }
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.payload.downcast_ref::<T>()
    }
}

impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Opaque({})", self.class)
    }
}

#[derive(Debug)]
pub enum Object {
    Boxed(Boxed),
    Str(String),
    Array(ArrayObject),
    Instance(Instance),
    Handle(Executable),
    Opaque(Opaque),
}

impl Object {
    pub fn type_name(&self) -> String {
        match self {
            Object::Boxed(b) => b.prim_type().wrapper_name().to_string(),
            Object::Str(_) => "String".to_string(),
            Object::Array(a) => format!("{}[]", a.elem()),
            Object::Instance(i) => i.class().name().to_string(),
            Object::Handle(_) => "MethodHandle".to_string(),
            Object::Opaque(o) => o.class().to_string(),
        }
    }

    pub fn is_instance_of(&self, ty: &RefType) -> bool {
        match ty {
            RefType::Object => true,
            RefType::Number => matches!(self, Object::Boxed(b) if b.prim_type().is_numeric()),
            RefType::String => matches!(self, Object::Str(_)),
            RefType::Boxed(p) => matches!(self, Object::Boxed(b) if b.prim_type() == *p),
            RefType::Array(elem) => matches!(self, Object::Array(a) if a.elem() == elem.as_ref()),
            RefType::Class(name) => match self {
                Object::Instance(i) => i.class().is_subclass_of(name),
                Object::Handle(_) => name.as_ref() == "MethodHandle",
                Object::Opaque(o) => o.class() == name.as_ref(),
                _ => false,
            },
        }
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::Boxed(b) => write!(f, "{b}"),
            Object::Str(s) => write!(f, "{s:?}"),
            Object::Array(a) => write!(f, "{}[{}]", a.elem(), a.len()),
            Object::Instance(i) => write!(f, "{}@{:p}", i.class().name(), i),
            Object::Handle(h) => write!(f, "MethodHandle{}", h.method_type()),
            Object::Opaque(o) => write!(f, "{}", o.class()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boxing_narrows_subwords() {
        assert_eq!(Boxed::from_value(PrimType::Byte, &Value::Int(300)), Some(Boxed::Byte(44)));
        assert_eq!(Boxed::from_value(PrimType::Boolean, &Value::Int(2)), Some(Boxed::Boolean(true)));
        assert_eq!(Boxed::from_value(PrimType::Long, &Value::Int(1)), None);
    }

    #[test]
    fn number_value_conversions() {
        assert_eq!(Boxed::Long(1 << 40 | 7).convert_to(PrimType::Int), Value::Int(7));
        assert_eq!(Boxed::Double(3.9).convert_to(PrimType::Int), Value::Int(3));
        assert_eq!(Boxed::Double(1e20).convert_to(PrimType::Int), Value::Int(i32::MAX));
        assert_eq!(Boxed::Char(65).convert_to(PrimType::Long), Value::Long(65));
        assert_eq!(Boxed::Int(-1).convert_to(PrimType::Char), Value::Int(0xffff));
        assert_eq!(Boxed::Float(1.5).unbox(), Value::Float(1.5));
    }

    #[test]
    fn same_as_is_identity_for_references() {
        let a = Value::string("x");
        let b = Value::string("x");
        assert!(a.same_as(&a.clone()));
        assert!(!a.same_as(&b));
        assert_eq!(a, b);
        assert!(Value::Float(f32::NAN).same_as(&Value::Float(f32::NAN)));
    }

    #[test]
    fn instance_checks() {
        let n = Value::boxed(Boxed::Int(3));
        assert!(n.is_instance_of(&RefType::Number));
        assert!(n.is_instance_of(&RefType::Boxed(PrimType::Int)));
        assert!(!n.is_instance_of(&RefType::String));
        assert!(Value::NULL.is_instance_of(&RefType::String));
        assert!(!Value::boxed(Boxed::Char(1)).is_instance_of(&RefType::Number));
    }
}
