// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Capability sets: which access modes a storage kind supports.

use std::fmt;

use quill_form::{AccessMode, AccessType, PrimType, ValueType};

/// A set of access modes, one bit per ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModeSet(u32);

impl ModeSet {
    pub const EMPTY: ModeSet = ModeSet(0);
    pub const ALL: ModeSet = ModeSet((1u32 << AccessMode::COUNT) - 1);

    pub fn of(modes: &[AccessMode]) -> ModeSet {
        modes.iter().fold(ModeSet::EMPTY, |set, mode| set.with(*mode))
    }

    /// The plain `get` and `set` modes only.
    pub fn plain() -> ModeSet {
        ModeSet::of(&[AccessMode::Get, AccessMode::Set])
    }

    /// Every mode whose access type is `Get`.
    pub fn reads() -> ModeSet {
        ModeSet::ALL.filter(|m| m.access_type() == AccessType::Get)
    }

    pub fn contains(self, mode: AccessMode) -> bool {
        self.0 & (1 << mode.ordinal()) != 0
    }

    pub fn with(self, mode: AccessMode) -> ModeSet {
        ModeSet(self.0 | 1 << mode.ordinal())
    }

    pub fn filter(self, keep: impl Fn(AccessMode) -> bool) -> ModeSet {
        ModeSet::of(&self.iter().filter(|m| keep(*m)).collect::<Vec<_>>())
    }

    pub fn iter(self) -> impl Iterator<Item = AccessMode> {
        AccessMode::ALL.iter().copied().filter(move |m| self.contains(*m))
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Modes of a field or array element of type `ty`.
    pub fn for_field(ty: &ValueType, read_only: bool) -> ModeSet {
        if read_only {
            return ModeSet::reads();
        }
        match ty {
            ValueType::Ref(_) => ModeSet::ALL.filter(|m| !m.is_numeric_update() && !m.is_bitwise_update()),
            ValueType::Prim(PrimType::Void) => ModeSet::EMPTY,
            ValueType::Prim(PrimType::Boolean) => ModeSet::ALL.filter(|m| !m.is_numeric_update()),
            ValueType::Prim(p) if p.is_floating() => ModeSet::ALL.filter(|m| !m.is_bitwise_update()),
            ValueType::Prim(_) => ModeSet::ALL,
        }
    }

    /// Modes of a memory view with carrier `carrier`. Only naturally
    /// aligned int and long views get atomic modes.
    pub fn for_memory(carrier: PrimType, aligned: bool) -> ModeSet {
        match carrier {
            PrimType::Int | PrimType::Long if aligned => ModeSet::ALL,
            PrimType::Float | PrimType::Double if aligned => {
                ModeSet::ALL.filter(|m| !m.is_numeric_update() && !m.is_bitwise_update())
            }
            PrimType::Void | PrimType::Boolean => ModeSet::EMPTY,
            _ => ModeSet::plain(),
        }
    }
}

impl fmt::Display for ModeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.iter().map(|m| m.method_name()).collect();
        write!(f, "{{{}}}", names.join(", "))
    }
}
