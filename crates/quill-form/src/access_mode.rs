// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Access modes of typed-storage accessors and the method types they imply.

use std::fmt;

use crate::types::{MethodType, ValueType};

/// Shape of an access mode's method type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessType {
    /// `(C...)T`
    Get,
    /// `(C..., T)void`
    Set,
    /// `(C..., T, T)boolean`
    CompareAndSet,
    /// `(C..., T, T)T`
    CompareAndExchange,
    /// `(C..., T)T`
    GetAndUpdate,
}

impl AccessType {
    pub fn method_type(self, value: &ValueType, coordinates: &[ValueType]) -> MethodType {
        let mut params = coordinates.to_vec();
        let ret = match self {
            AccessType::Get => value.clone(),
            AccessType::Set => {
                params.push(value.clone());
                ValueType::VOID
            }
            AccessType::CompareAndSet => {
                params.push(value.clone());
                params.push(value.clone());
                ValueType::BOOLEAN
            }
            AccessType::CompareAndExchange => {
                params.push(value.clone());
                params.push(value.clone());
                value.clone()
            }
            AccessType::GetAndUpdate => {
                params.push(value.clone());
                value.clone()
            }
        };
        MethodType::new(ret, params)
    }
}

/// Read-modify-write operation of a get-and-update mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOp {
    Set,
    Add,
    Or,
    And,
    Xor,
}

macro_rules! access_modes {
    ($($variant:ident => $name:literal, $ty:ident;)*) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum AccessMode {
            $($variant,)*
        }

        impl AccessMode {
            pub const ALL: &'static [AccessMode] = &[$(AccessMode::$variant,)*];
            pub const COUNT: usize = AccessMode::ALL.len();

            pub fn method_name(self) -> &'static str {
                match self {
                    $(AccessMode::$variant => $name,)*
                }
            }

            pub const fn access_type(self) -> AccessType {
                match self {
                    $(AccessMode::$variant => AccessType::$ty,)*
                }
            }
        }
    };
}

access_modes! {
    Get => "get", Get;
    Set => "set", Set;
    GetVolatile => "getVolatile", Get;
    SetVolatile => "setVolatile", Set;
    GetAcquire => "getAcquire", Get;
    SetRelease => "setRelease", Set;
    GetOpaque => "getOpaque", Get;
    SetOpaque => "setOpaque", Set;
    CompareAndSet => "compareAndSet", CompareAndSet;
    CompareAndExchange => "compareAndExchange", CompareAndExchange;
    CompareAndExchangeAcquire => "compareAndExchangeAcquire", CompareAndExchange;
    CompareAndExchangeRelease => "compareAndExchangeRelease", CompareAndExchange;
    WeakCompareAndSetPlain => "weakCompareAndSetPlain", CompareAndSet;
    WeakCompareAndSet => "weakCompareAndSet", CompareAndSet;
    WeakCompareAndSetAcquire => "weakCompareAndSetAcquire", CompareAndSet;
    WeakCompareAndSetRelease => "weakCompareAndSetRelease", CompareAndSet;
    GetAndSet => "getAndSet", GetAndUpdate;
    GetAndSetAcquire => "getAndSetAcquire", GetAndUpdate;
    GetAndSetRelease => "getAndSetRelease", GetAndUpdate;
    GetAndAdd => "getAndAdd", GetAndUpdate;
    GetAndAddAcquire => "getAndAddAcquire", GetAndUpdate;
    GetAndAddRelease => "getAndAddRelease", GetAndUpdate;
    GetAndBitwiseOr => "getAndBitwiseOr", GetAndUpdate;
    GetAndBitwiseOrRelease => "getAndBitwiseOrRelease", GetAndUpdate;
    GetAndBitwiseOrAcquire => "getAndBitwiseOrAcquire", GetAndUpdate;
    GetAndBitwiseAnd => "getAndBitwiseAnd", GetAndUpdate;
    GetAndBitwiseAndRelease => "getAndBitwiseAndRelease", GetAndUpdate;
    GetAndBitwiseAndAcquire => "getAndBitwiseAndAcquire", GetAndUpdate;
    GetAndBitwiseXor => "getAndBitwiseXor", GetAndUpdate;
    GetAndBitwiseXorRelease => "getAndBitwiseXorRelease", GetAndUpdate;
    GetAndBitwiseXorAcquire => "getAndBitwiseXorAcquire", GetAndUpdate;
}

impl AccessMode {
    pub fn ordinal(self) -> usize {
        self as usize
    }

    pub fn from_ordinal(ordinal: usize) -> Option<AccessMode> {
        AccessMode::ALL.get(ordinal).copied()
    }

    pub fn from_method_name(name: &str) -> Option<AccessMode> {
        AccessMode::ALL.iter().copied().find(|m| m.method_name() == name)
    }

    /// The operation a get-and-update mode applies; `None` for other types.
    pub fn update_op(self) -> Option<UpdateOp> {
        use AccessMode::*;
        let op = match self {
            GetAndSet | GetAndSetAcquire | GetAndSetRelease => UpdateOp::Set,
            GetAndAdd | GetAndAddAcquire | GetAndAddRelease => UpdateOp::Add,
            GetAndBitwiseOr | GetAndBitwiseOrRelease | GetAndBitwiseOrAcquire => UpdateOp::Or,
            GetAndBitwiseAnd | GetAndBitwiseAndRelease | GetAndBitwiseAndAcquire => UpdateOp::And,
            GetAndBitwiseXor | GetAndBitwiseXorRelease | GetAndBitwiseXorAcquire => UpdateOp::Xor,
            _ => return None,
        };
        Some(op)
    }

    pub fn is_numeric_update(self) -> bool {
        self.update_op() == Some(UpdateOp::Add)
    }

    pub fn is_bitwise_update(self) -> bool {
        matches!(self.update_op(), Some(UpdateOp::Or | UpdateOp::And | UpdateOp::Xor))
    }

    /// Plain `get`/`set`, the only modes unaligned memory supports.
    pub fn is_plain(self) -> bool {
        matches!(self, AccessMode::Get | AccessMode::Set)
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.method_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thirty_one_modes_in_order() {
        assert_eq!(AccessMode::COUNT, 31);
        for (i, mode) in AccessMode::ALL.iter().enumerate() {
            assert_eq!(mode.ordinal(), i);
            assert_eq!(AccessMode::from_ordinal(i), Some(*mode));
            assert_eq!(AccessMode::from_method_name(mode.method_name()), Some(*mode));
        }
        assert_eq!(AccessMode::from_ordinal(31), None);
    }

    #[test]
    fn method_types_per_access_type() {
        let coords = [ValueType::class("Point")];
        let int = ValueType::INT;
        assert_eq!(
            AccessMode::Get.access_type().method_type(&int, &coords).to_string(),
            "(Point)int"
        );
        assert_eq!(
            AccessMode::SetRelease.access_type().method_type(&int, &coords).to_string(),
            "(Point,int)void"
        );
        assert_eq!(
            AccessMode::WeakCompareAndSet.access_type().method_type(&int, &coords).to_string(),
            "(Point,int,int)boolean"
        );
        assert_eq!(
            AccessMode::CompareAndExchangeAcquire.access_type().method_type(&int, &coords).to_string(),
            "(Point,int,int)int"
        );
        assert_eq!(
            AccessMode::GetAndBitwiseXor.access_type().method_type(&int, &[]).to_string(),
            "(int)int"
        );
    }

    #[test]
    fn update_categories() {
        assert!(AccessMode::GetAndAddRelease.is_numeric_update());
        assert!(AccessMode::GetAndBitwiseAndAcquire.is_bitwise_update());
        assert!(!AccessMode::GetAndSet.is_bitwise_update());
        assert_eq!(AccessMode::CompareAndSet.update_op(), None);
    }
}
