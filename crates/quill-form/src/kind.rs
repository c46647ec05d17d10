// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Form kinds, operation ids and the entry naming scheme.

use std::fmt;

use crate::access_mode::AccessMode;
use crate::signature::Signature;
use crate::types::BasicType;

/// How a kind derives entry names from a signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamingTemplate {
    /// `method_PARAMS_R`
    Full,
    /// `method_PARAMS`: shapes differing only in return collapse together.
    ParamsOnly,
}

/// Category tag of a form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Kind {
    Identity,
    Zero,
    Add,
    Sub,
    Mul,
    /// Calls the handle in `a0` with the remaining arguments.
    Invoker,
    /// Unpacks a bound holder and re-invokes its target.
    Reinvoker,
    /// Reads one slot of a bound holder.
    BoundGetter,
    /// Fetches an accessor's executable for one access mode and calls it.
    AccessInvoker,
    /// Adapts a handle to another method type.
    Convert,
}

impl Kind {
    pub const ALL: [Kind; 10] = [
        Kind::Identity,
        Kind::Zero,
        Kind::Add,
        Kind::Sub,
        Kind::Mul,
        Kind::Invoker,
        Kind::Reinvoker,
        Kind::BoundGetter,
        Kind::AccessInvoker,
        Kind::Convert,
    ];

    pub fn category(self) -> &'static str {
        match self {
            Kind::Identity | Kind::Zero | Kind::Add | Kind::Sub | Kind::Mul | Kind::Convert => "LF",
            Kind::Invoker => "Invokers",
            Kind::Reinvoker | Kind::BoundGetter => "BMH",
            Kind::AccessInvoker => "VH",
        }
    }

    pub fn method_name(self) -> &'static str {
        match self {
            Kind::Identity => "identity",
            Kind::Zero => "zero",
            Kind::Add => "add",
            Kind::Sub => "sub",
            Kind::Mul => "mul",
            Kind::Invoker => "invoker",
            Kind::Reinvoker => "reinvoke",
            Kind::BoundGetter => "getter",
            Kind::AccessInvoker => "invoke_vh",
            Kind::Convert => "convert",
        }
    }

    pub fn from_method_name(name: &str) -> Option<Kind> {
        Kind::ALL.into_iter().find(|k| k.method_name() == name)
    }

    pub fn template(self) -> NamingTemplate {
        match self {
            Kind::Invoker => NamingTemplate::ParamsOnly,
            _ => NamingTemplate::Full,
        }
    }

    pub fn debug_name(self) -> String {
        format!("{}.{}", self.category(), self.method_name())
    }

    /// Deterministic entry name for `(self, signature, op)`. Pregenerated
    /// holders are probed with exactly this name.
    pub fn entry_name(self, signature: &Signature, op: OpId) -> String {
        let mut name = self.method_name().to_string();
        match self {
            Kind::AccessInvoker => {
                if let Some(mode) = op.access_mode() {
                    name.push('_');
                    name.push_str(mode.method_name());
                }
            }
            Kind::Reinvoker => {
                name.push('_');
                name.extend(op.species_key().iter().map(|b| b.as_char()));
            }
            _ => {}
        }
        name.push('_');
        match self.template() {
            NamingTemplate::Full => name.push_str(&signature.shortened()),
            NamingTemplate::ParamsOnly => name.push_str(&signature.shortened_params()),
        }
        name
    }

    pub fn to_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(tag: u8) -> Option<Kind> {
        Kind::ALL.get(tag as usize).copied()
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.debug_name())
    }
}

/// Distinguishes shapes of one kind that share a signature: the access
/// mode for accessor invokers, the species key for reinvokers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct OpId(pub u64);

impl OpId {
    pub const NONE: OpId = OpId(0);

    pub fn mode(mode: AccessMode) -> OpId {
        OpId(mode.ordinal() as u64)
    }

    pub fn access_mode(self) -> Option<AccessMode> {
        AccessMode::from_ordinal(self.0 as usize)
    }

    /// Encodes a species key as base-6 digits that are never zero (`L`=1 to
    /// `D`=5), so every key up to 24 slots gets a distinct, process-independent id.
    /// `None` for longer keys or keys containing `V`.
    pub fn species(key: &[BasicType]) -> Option<OpId> {
        let mut code: u64 = 0;
        for bt in key {
            if !bt.is_arg() {
                return None;
            }
            code = code.checked_mul(6)?.checked_add(bt.ordinal() as u64 + 1)?;
        }
        Some(OpId(code))
    }

    pub fn species_key(self) -> Vec<BasicType> {
        let mut key = Vec::new();
        let mut code = self.0;
        while code > 0 {
            let digit = (code % 6) as usize;
            key.push(BasicType::ARG_TYPES[digit.saturating_sub(1)]);
            code /= 6;
        }
        key.reverse();
        key
    }
}

impl fmt::Display for OpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(s: &str) -> Signature {
        Signature::parse(s).unwrap()
    }

    #[test]
    fn entry_names() {
        assert_eq!(Kind::Add.entry_name(&sig("II_I"), OpId::NONE), "add_II_I");
        assert_eq!(Kind::Identity.entry_name(&sig("LLLL_L"), OpId::NONE), "identity_L4_L");
        assert_eq!(
            Kind::AccessInvoker.entry_name(&sig("LLI_V"), OpId::mode(AccessMode::SetRelease)),
            "invoke_vh_setRelease_LLI_V"
        );
    }

    #[test]
    fn params_only_template_ignores_return() {
        let a = Kind::Invoker.entry_name(&sig("LII_I"), OpId::NONE);
        let b = Kind::Invoker.entry_name(&sig("LII_V"), OpId::NONE);
        assert_eq!(a, "invoker_LII");
        assert_eq!(a, b);
    }

    #[test]
    fn species_op_ids_round_trip() {
        use BasicType::*;
        for key in [vec![L], vec![L, I, J], vec![D, D, D, F], vec![]] {
            let op = OpId::species(&key).unwrap();
            assert_eq!(op.species_key(), key);
        }
        assert_ne!(OpId::species(&[L, L]), OpId::species(&[J]));
        assert_eq!(OpId::species(&[V]), None);
        assert_eq!(
            Kind::Reinvoker.entry_name(&sig("LI_I"), OpId::species(&[L, I]).unwrap()),
            "reinvoke_LI_LI_I"
        );
    }

    #[test]
    fn kind_tags_round_trip() {
        for kind in Kind::ALL {
            assert_eq!(Kind::from_u8(kind.to_u8()), Some(kind));
            assert_eq!(Kind::from_method_name(kind.method_name()), Some(kind));
        }
    }
}
