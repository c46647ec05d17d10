// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Type vocabulary: erased basic types, declared value types, method types.

use std::fmt;
use std::sync::Arc;

use crate::signature::Signature;
use crate::value::Value;

/// Erased storage kind of a value as seen by forms and signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BasicType {
    L,
    I,
    J,
    F,
    D,
    V,
}

impl BasicType {
    /// The kinds a value can actually be stored as (everything but `V`).
    pub const ARG_TYPES: [BasicType; 5] =
        [BasicType::L, BasicType::I, BasicType::J, BasicType::F, BasicType::D];

    pub fn as_char(self) -> char {
        match self {
            BasicType::L => 'L',
            BasicType::I => 'I',
            BasicType::J => 'J',
            BasicType::F => 'F',
            BasicType::D => 'D',
            BasicType::V => 'V',
        }
    }

    /// Strict parse: only the six basic letters are accepted.
    pub fn from_char(c: char) -> Option<BasicType> {
        match c {
            'L' => Some(BasicType::L),
            'I' => Some(BasicType::I),
            'J' => Some(BasicType::J),
            'F' => Some(BasicType::F),
            'D' => Some(BasicType::D),
            'V' => Some(BasicType::V),
            _ => None,
        }
    }

    pub fn ordinal(self) -> usize {
        self as usize
    }

    pub fn is_arg(self) -> bool {
        self != BasicType::V
    }

    pub fn zero(self) -> Value {
        match self {
            BasicType::L => Value::NULL,
            BasicType::I => Value::Int(0),
            BasicType::J => Value::Long(0),
            BasicType::F => Value::Float(0.0),
            BasicType::D => Value::Double(0.0),
            BasicType::V => Value::Void,
        }
    }

    /// The most general declared type with this erasure.
    pub fn erased(self) -> ValueType {
        match self {
            BasicType::L => ValueType::OBJECT,
            BasicType::I => ValueType::INT,
            BasicType::J => ValueType::LONG,
            BasicType::F => ValueType::FLOAT,
            BasicType::D => ValueType::DOUBLE,
            BasicType::V => ValueType::VOID,
        }
    }
}

impl fmt::Display for BasicType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Primitive value types, including `void`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimType {
    Boolean,
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
    Void,
}

impl PrimType {
    pub const ALL: [PrimType; 9] = [
        PrimType::Boolean,
        PrimType::Byte,
        PrimType::Short,
        PrimType::Char,
        PrimType::Int,
        PrimType::Long,
        PrimType::Float,
        PrimType::Double,
        PrimType::Void,
    ];

    pub fn basic_type(self) -> BasicType {
        match self {
            PrimType::Boolean
            | PrimType::Byte
            | PrimType::Short
            | PrimType::Char
            | PrimType::Int => BasicType::I,
            PrimType::Long => BasicType::J,
            PrimType::Float => BasicType::F,
            PrimType::Double => BasicType::D,
            PrimType::Void => BasicType::V,
        }
    }

    /// Signed integral types. Floating types are not "signed" here.
    pub fn is_signed(self) -> bool {
        matches!(
            self,
            PrimType::Byte | PrimType::Short | PrimType::Int | PrimType::Long
        )
    }

    pub fn is_floating(self) -> bool {
        matches!(self, PrimType::Float | PrimType::Double)
    }

    /// Types whose wrappers extend `Number`.
    pub fn is_numeric(self) -> bool {
        self.is_signed() || self.is_floating()
    }

    pub fn is_integral(self) -> bool {
        matches!(
            self,
            PrimType::Byte | PrimType::Short | PrimType::Char | PrimType::Int | PrimType::Long
        )
    }

    /// Identity or a widening primitive conversion.
    pub fn widens_to(self, to: PrimType) -> bool {
        if self == to {
            return true;
        }
        match self {
            PrimType::Byte => matches!(
                to,
                PrimType::Short | PrimType::Int | PrimType::Long | PrimType::Float | PrimType::Double
            ),
            PrimType::Short | PrimType::Char => matches!(
                to,
                PrimType::Int | PrimType::Long | PrimType::Float | PrimType::Double
            ),
            PrimType::Int => matches!(to, PrimType::Long | PrimType::Float | PrimType::Double),
            PrimType::Long => matches!(to, PrimType::Float | PrimType::Double),
            PrimType::Float => to == PrimType::Double,
            PrimType::Boolean | PrimType::Double | PrimType::Void => false,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PrimType::Boolean => "boolean",
            PrimType::Byte => "byte",
            PrimType::Short => "short",
            PrimType::Char => "char",
            PrimType::Int => "int",
            PrimType::Long => "long",
            PrimType::Float => "float",
            PrimType::Double => "double",
            PrimType::Void => "void",
        }
    }

    pub fn from_name(name: &str) -> Option<PrimType> {
        PrimType::ALL.into_iter().find(|p| p.name() == name)
    }

    pub fn wrapper_name(self) -> &'static str {
        match self {
            PrimType::Boolean => "Boolean",
            PrimType::Byte => "Byte",
            PrimType::Short => "Short",
            PrimType::Char => "Character",
            PrimType::Int => "Integer",
            PrimType::Long => "Long",
            PrimType::Float => "Float",
            PrimType::Double => "Double",
            PrimType::Void => "Void",
        }
    }

    pub fn from_wrapper_name(name: &str) -> Option<PrimType> {
        PrimType::ALL.into_iter().find(|p| p.wrapper_name() == name)
    }

    pub fn descriptor(self) -> char {
        match self {
            PrimType::Boolean => 'Z',
            PrimType::Byte => 'B',
            PrimType::Short => 'S',
            PrimType::Char => 'C',
            PrimType::Int => 'I',
            PrimType::Long => 'J',
            PrimType::Float => 'F',
            PrimType::Double => 'D',
            PrimType::Void => 'V',
        }
    }

    pub fn from_descriptor(c: char) -> Option<PrimType> {
        PrimType::ALL.into_iter().find(|p| p.descriptor() == c)
    }

    pub fn byte_size(self) -> usize {
        match self {
            PrimType::Boolean | PrimType::Byte => 1,
            PrimType::Short | PrimType::Char => 2,
            PrimType::Int | PrimType::Float => 4,
            PrimType::Long | PrimType::Double => 8,
            PrimType::Void => 0,
        }
    }

    pub fn zero(self) -> Value {
        self.basic_type().zero()
    }
}

/// Reference types known to the runtime.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RefType {
    Object,
    Number,
    String,
    /// Wrapper of a non-void primitive.
    Boxed(PrimType),
    Class(Arc<str>),
    Array(Box<ValueType>),
}

impl RefType {
    /// Maps a class name onto the well-known reference types where one exists.
    pub fn class(name: &str) -> RefType {
        match name {
            "Object" => RefType::Object,
            "Number" => RefType::Number,
            "String" => RefType::String,
            _ => match PrimType::from_wrapper_name(name) {
                Some(p) if p != PrimType::Void => RefType::Boxed(p),
                _ => RefType::Class(Arc::from(name)),
            },
        }
    }

    /// The primitive this type wraps, if it is a wrapper.
    pub fn wrapped(&self) -> Option<PrimType> {
        match self {
            RefType::Boxed(p) => Some(*p),
            _ => None,
        }
    }

    pub fn name(&self) -> String {
        match self {
            RefType::Object => "Object".to_string(),
            RefType::Number => "Number".to_string(),
            RefType::String => "String".to_string(),
            RefType::Boxed(p) => p.wrapper_name().to_string(),
            RefType::Class(name) => name.to_string(),
            RefType::Array(elem) => format!("{elem}[]"),
        }
    }

    /// Static assignability; class hierarchies are only known at runtime.
    pub fn is_assignable_from(&self, other: &RefType) -> bool {
        match self {
            RefType::Object => true,
            RefType::Number => match other {
                RefType::Number => true,
                RefType::Boxed(p) => p.is_numeric(),
                _ => false,
            },
            _ => self == other,
        }
    }
}

/// Declared type of a value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueType {
    Prim(PrimType),
    Ref(RefType),
}

impl ValueType {
    pub const BOOLEAN: ValueType = ValueType::Prim(PrimType::Boolean);
    pub const BYTE: ValueType = ValueType::Prim(PrimType::Byte);
    pub const SHORT: ValueType = ValueType::Prim(PrimType::Short);
    pub const CHAR: ValueType = ValueType::Prim(PrimType::Char);
    pub const INT: ValueType = ValueType::Prim(PrimType::Int);
    pub const LONG: ValueType = ValueType::Prim(PrimType::Long);
    pub const FLOAT: ValueType = ValueType::Prim(PrimType::Float);
    pub const DOUBLE: ValueType = ValueType::Prim(PrimType::Double);
    pub const VOID: ValueType = ValueType::Prim(PrimType::Void);
    pub const OBJECT: ValueType = ValueType::Ref(RefType::Object);
    pub const NUMBER: ValueType = ValueType::Ref(RefType::Number);
    pub const STRING: ValueType = ValueType::Ref(RefType::String);

    pub fn boxed(p: PrimType) -> ValueType {
        ValueType::Ref(RefType::Boxed(p))
    }

    pub fn class(name: &str) -> ValueType {
        ValueType::Ref(RefType::class(name))
    }

    pub fn array(elem: ValueType) -> ValueType {
        ValueType::Ref(RefType::Array(Box::new(elem)))
    }

    /// Parses a source-level type name: `int`, `Integer`, `Point`, `long[]`.
    pub fn from_name(name: &str) -> ValueType {
        if let Some(elem) = name.strip_suffix("[]") {
            return ValueType::array(ValueType::from_name(elem));
        }
        match PrimType::from_name(name) {
            Some(p) => ValueType::Prim(p),
            None => ValueType::class(name),
        }
    }

    pub fn basic_type(&self) -> BasicType {
        match self {
            ValueType::Prim(p) => p.basic_type(),
            ValueType::Ref(_) => BasicType::L,
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, ValueType::Prim(_))
    }

    pub fn is_void(&self) -> bool {
        matches!(self, ValueType::Prim(PrimType::Void))
    }

    pub fn as_prim(&self) -> Option<PrimType> {
        match self {
            ValueType::Prim(p) => Some(*p),
            ValueType::Ref(_) => None,
        }
    }

    pub fn as_ref_type(&self) -> Option<&RefType> {
        match self {
            ValueType::Prim(_) => None,
            ValueType::Ref(r) => Some(r),
        }
    }

    pub fn descriptor(&self) -> String {
        match self {
            ValueType::Prim(p) => p.descriptor().to_string(),
            ValueType::Ref(RefType::Array(elem)) => format!("[{}", elem.descriptor()),
            ValueType::Ref(r) => format!("L{};", r.name()),
        }
    }

    pub fn from_descriptor(desc: &str) -> Option<ValueType> {
        match parse_descriptor(desc) {
            Some((ty, "")) => Some(ty),
            _ => None,
        }
    }
}

/// Parses one type descriptor off the front of `s`, returning the rest.
fn parse_descriptor(s: &str) -> Option<(ValueType, &str)> {
    let mut chars = s.chars();
    let first = chars.next()?;
    match first {
        'L' => {
            let end = s.find(';')?;
            let name = &s[1..end];
            if name.is_empty() {
                return None;
            }
            Some((ValueType::class(name), &s[end + 1..]))
        }
        '[' => {
            let (elem, rest) = parse_descriptor(&s[1..])?;
            Some((ValueType::array(elem), rest))
        }
        c => PrimType::from_descriptor(c).map(|p| (ValueType::Prim(p), &s[1..])),
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Prim(p) => write!(f, "{}", p.name()),
            ValueType::Ref(r) => write!(f, "{}", r.name()),
        }
    }
}

/// Declared parameter and return types of an invocable thing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodType {
    params: Vec<ValueType>,
    ret: ValueType,
}

impl MethodType {
    pub fn new(ret: ValueType, params: Vec<ValueType>) -> Self {
        MethodType { params, ret }
    }

    /// `(Object, ..., Object)Object` with `arity` parameters.
    pub fn generic(arity: usize) -> Self {
        MethodType::new(ValueType::OBJECT, vec![ValueType::OBJECT; arity])
    }

    pub fn params(&self) -> &[ValueType] {
        &self.params
    }

    pub fn param(&self, index: usize) -> Option<&ValueType> {
        self.params.get(index)
    }

    pub fn ret(&self) -> &ValueType {
        &self.ret
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }

    pub fn basic_signature(&self) -> Signature {
        Signature::new(
            self.params.iter().map(ValueType::basic_type).collect(),
            self.ret.basic_type(),
        )
    }

    /// Every type replaced by the most general type of its erasure.
    pub fn erase(&self) -> MethodType {
        self.basic_signature().to_method_type()
    }

    pub fn insert_param(&self, index: usize, ty: ValueType) -> MethodType {
        let mut params = self.params.clone();
        params.insert(index, ty);
        MethodType::new(self.ret.clone(), params)
    }

    /// Drops the parameters in `start..end`.
    pub fn drop_params(&self, start: usize, end: usize) -> MethodType {
        let mut params = self.params.clone();
        params.drain(start..end);
        MethodType::new(self.ret.clone(), params)
    }

    pub fn change_return(&self, ret: ValueType) -> MethodType {
        MethodType::new(ret, self.params.clone())
    }

    pub fn descriptor(&self) -> String {
        let params: String = self.params.iter().map(ValueType::descriptor).collect();
        format!("({params}){}", self.ret.descriptor())
    }

    pub fn from_descriptor(desc: &str) -> Option<MethodType> {
        let mut rest = desc.strip_prefix('(')?;
        let mut params = Vec::new();
        while !rest.starts_with(')') {
            let (ty, tail) = parse_descriptor(rest)?;
            params.push(ty);
            rest = tail;
        }
        let ret = ValueType::from_descriptor(&rest[1..])?;
        Some(MethodType::new(ret, params))
    }
}

impl fmt::Display for MethodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{p}")?;
        }
        write!(f, "){}", self.ret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widening_follows_jls() {
        assert!(PrimType::Int.widens_to(PrimType::Long));
        assert!(PrimType::Char.widens_to(PrimType::Int));
        assert!(PrimType::Long.widens_to(PrimType::Float));
        assert!(!PrimType::Long.widens_to(PrimType::Int));
        assert!(!PrimType::Char.widens_to(PrimType::Short));
        assert!(!PrimType::Boolean.widens_to(PrimType::Int));
        assert!(PrimType::Boolean.widens_to(PrimType::Boolean));
    }

    #[test]
    fn class_names_map_to_wrappers() {
        assert_eq!(RefType::class("Integer"), RefType::Boxed(PrimType::Int));
        assert_eq!(RefType::class("Character"), RefType::Boxed(PrimType::Char));
        assert_eq!(RefType::class("Void"), RefType::Class(Arc::from("Void")));
        assert_eq!(ValueType::from_name("long[]"), ValueType::array(ValueType::LONG));
    }

    #[test]
    fn number_accepts_numeric_wrappers_only() {
        assert!(RefType::Number.is_assignable_from(&RefType::Boxed(PrimType::Double)));
        assert!(!RefType::Number.is_assignable_from(&RefType::Boxed(PrimType::Char)));
        assert!(RefType::Object.is_assignable_from(&RefType::String));
    }

    #[test]
    fn method_type_descriptor_parses_back() {
        let mt = MethodType::new(
            ValueType::boxed(PrimType::Int),
            vec![ValueType::class("Point"), ValueType::INT, ValueType::array(ValueType::DOUBLE)],
        );
        assert_eq!(mt.descriptor(), "(LPoint;I[D)LInteger;");
        assert_eq!(MethodType::from_descriptor(&mt.descriptor()), Some(mt.clone()));
        assert_eq!(mt.to_string(), "(Point,int,double[])Integer");
        assert_eq!(mt.basic_signature().to_string(), "LIL_L");
    }

    #[test]
    fn malformed_descriptors_are_rejected() {
        assert_eq!(MethodType::from_descriptor("(I"), None);
        assert_eq!(MethodType::from_descriptor("(L;)V"), None);
        assert_eq!(ValueType::from_descriptor("IX"), None);
    }
}
