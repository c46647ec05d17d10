// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Resolution of member operations when a unit is loaded.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use quill_form::{BootstrapOp, Executable, InvokeError, Linkage, MemberRef, NamedOp, Value};

use crate::bootstrap;
use crate::error::{SynthError, SynthResult};

/// Supplies the executable behind a member reference.
pub trait Linker: Send + Sync {
    fn link(&self, member: &MemberRef) -> Option<Executable>;
}

/// A registry of member executables.
#[derive(Default)]
pub struct MemberTable {
    members: RwLock<HashMap<MemberRef, Executable>>,
}

impl MemberTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers or replaces `member`.
    pub fn register(&self, member: MemberRef, exec: Executable) {
        self.members
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(member, exec);
    }

    pub fn contains(&self, member: &MemberRef) -> bool {
        self.members
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(member)
    }
}

impl Linker for MemberTable {
    fn link(&self, member: &MemberRef) -> Option<Executable> {
        self.members
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(member)
            .cloned()
    }
}

/// What a call instruction or an interpreted name ends up invoking.
#[derive(Clone)]
pub(crate) enum Target {
    Bootstrap(BootstrapOp),
    Linked(Executable),
}

impl Target {
    pub(crate) fn resolve(op: &NamedOp, linker: &dyn Linker) -> SynthResult<Target> {
        match op.linkage() {
            Linkage::Bootstrap(bootstrap) => Ok(Target::Bootstrap(bootstrap.clone())),
            Linkage::Member(member) => {
                let exec = linker
                    .link(member)
                    .ok_or_else(|| SynthError::UnresolvedMember(member.clone()))?;
                let expected = op.method_type().erase();
                let actual = exec.method_type().erase();
                if expected != actual {
                    return Err(SynthError::MemberType { member: member.clone(), expected, actual });
                }
                Ok(Target::Linked(exec))
            }
        }
    }

    pub(crate) fn invoke(&self, args: &[Value]) -> Result<Value, InvokeError> {
        match self {
            Target::Bootstrap(op) => bootstrap::eval(op, args),
            Target::Linked(exec) => exec.invoke(args),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_form::{MethodType, ValueType};

    fn member() -> MemberRef {
        MemberRef::new("Math", "abs")
    }

    fn abs() -> Executable {
        Executable::native("abs", MethodType::new(ValueType::INT, vec![ValueType::INT]), |args| {
            Ok(Value::Int(args[0].as_int().unwrap_or_default().wrapping_abs()))
        })
    }

    #[test]
    fn links_registered_members() {
        let table = MemberTable::new();
        table.register(member(), abs());
        let op = NamedOp::member(member(), MethodType::new(ValueType::INT, vec![ValueType::INT]));
        let target = Target::resolve(&op, &table).ok().unwrap();
        assert_eq!(target.invoke(&[Value::Int(-3)]).unwrap(), Value::Int(3));
    }

    #[test]
    fn missing_member_fails() {
        let op = NamedOp::member(member(), MethodType::new(ValueType::INT, vec![ValueType::INT]));
        assert!(matches!(
            Target::resolve(&op, &MemberTable::new()),
            Err(SynthError::UnresolvedMember(_))
        ));
    }

    #[test]
    fn erased_type_must_match() {
        let table = MemberTable::new();
        table.register(member(), abs());
        let op = NamedOp::member(member(), MethodType::new(ValueType::LONG, vec![ValueType::LONG]));
        assert!(matches!(Target::resolve(&op, &table), Err(SynthError::MemberType { .. })));
    }
}
