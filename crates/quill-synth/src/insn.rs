// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! The instruction set of emitted entries.

use std::fmt;

use quill_form::{InvokeError, PrimType, RefType, Value};

/// Stack-machine instructions. Locals are indexed by form name.
#[derive(Debug, Clone, PartialEq)]
pub enum Insn {
    Load(u16),
    Store(u16),
    /// Push constant from the entry's constant pool.
    Const(u16),
    /// Call operation from the entry's op pool; pushes the result unless void.
    Call(u16),
    Widen(Widening),
    Box(PrimType),
    /// `owner.xxxValue()` producing `to`.
    Unbox { owner: RefType, to: PrimType },
    CheckCast(RefType),
    Return,
    ReturnVoid,
}

impl fmt::Display for Insn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Insn::Load(i) => write!(f, "load {i}"),
            Insn::Store(i) => write!(f, "store {i}"),
            Insn::Const(i) => write!(f, "const #{i}"),
            Insn::Call(i) => write!(f, "call @{i}"),
            Insn::Widen(w) => write!(f, "{w}"),
            Insn::Box(p) => write!(f, "box {}", p.wrapper_name()),
            Insn::Unbox { owner, to } => write!(f, "unbox {}.{}Value", owner.name(), to.name()),
            Insn::CheckCast(t) => write!(f, "checkcast {}", t.name()),
            Insn::Return => write!(f, "return"),
            Insn::ReturnVoid => write!(f, "return void"),
        }
    }
}

/// Widening primitive conversions between stack kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Widening {
    I2L,
    I2F,
    I2D,
    L2F,
    L2D,
    F2D,
}

impl Widening {
    pub const ALL: [Widening; 6] =
        [Widening::I2L, Widening::I2F, Widening::I2D, Widening::L2F, Widening::L2D, Widening::F2D];

    pub fn apply(self, value: Value) -> Result<Value, InvokeError> {
        let widened = match (self, &value) {
            (Widening::I2L, Value::Int(v)) => Value::Long(*v as i64),
            (Widening::I2F, Value::Int(v)) => Value::Float(*v as f32),
            (Widening::I2D, Value::Int(v)) => Value::Double(*v as f64),
            (Widening::L2F, Value::Long(v)) => Value::Float(*v as f32),
            (Widening::L2D, Value::Long(v)) => Value::Double(*v as f64),
            (Widening::F2D, Value::Float(v)) => Value::Double(*v as f64),
            _ => {
                return Err(InvokeError::Internal(format!(
                    "{self} applied to {}",
                    value.type_name()
                )))
            }
        };
        Ok(widened)
    }

    pub fn to_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(tag: u8) -> Option<Widening> {
        Widening::ALL.get(tag as usize).copied()
    }
}

impl fmt::Display for Widening {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Widening::I2L => "i2l",
            Widening::I2F => "i2f",
            Widening::I2D => "i2d",
            Widening::L2F => "l2f",
            Widening::L2D => "l2d",
            Widening::F2D => "f2d",
        };
        write!(f, "{name}")
    }
}
