// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Names and the operations they apply.

use std::fmt;

use crate::signature::Signature;
use crate::types::{BasicType, MethodType, ValueType};
use crate::value::Value;

/// Symbolic reference to a member procedure, linked when a unit is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemberRef {
    pub owner: String,
    pub name: String,
}

impl MemberRef {
    pub fn new(owner: &str, name: &str) -> Self {
        MemberRef { owner: owner.to_string(), name: name.to_string() }
    }
}

impl fmt::Display for MemberRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.owner, self.name)
    }
}

/// Hand-built primitive operations.
///
/// These are evaluated directly by the backend and never go through form
/// synthesis, which is what lets the synthesis pipeline itself be built out
/// of forms. Anything outside this set is a [`MemberRef`] and must be linked.
#[derive(Debug, Clone, PartialEq)]
pub enum BootstrapOp {
    Identity(BasicType),
    Zero(BasicType),
    Add(BasicType),
    Sub(BasicType),
    Mul(BasicType),
    /// Calls the handle passed first with the remaining arguments, checking
    /// only that the handle's erased signature is `sig`.
    InvokeBasic(Signature),
    /// Reads instance cell `slot` of the object passed first.
    GetField { slot: u16, ty: BasicType },
    /// Applies the conversion rules from `from` to `to`.
    Convert { from: ValueType, to: ValueType, call_site: ValueType },
}

impl BootstrapOp {
    pub fn method_type(&self) -> MethodType {
        match self {
            BootstrapOp::Identity(bt) => MethodType::new(bt.erased(), vec![bt.erased()]),
            BootstrapOp::Zero(bt) => MethodType::new(bt.erased(), vec![]),
            BootstrapOp::Add(bt) | BootstrapOp::Sub(bt) | BootstrapOp::Mul(bt) => {
                MethodType::new(bt.erased(), vec![bt.erased(), bt.erased()])
            }
            BootstrapOp::InvokeBasic(sig) => sig.to_method_type().insert_param(0, ValueType::OBJECT),
            BootstrapOp::GetField { ty, .. } => MethodType::new(ty.erased(), vec![ValueType::OBJECT]),
            BootstrapOp::Convert { from, to, .. } => MethodType::new(to.clone(), vec![from.clone()]),
        }
    }

    pub fn name(&self) -> String {
        match self {
            BootstrapOp::Identity(bt) => format!("identity_{bt}"),
            BootstrapOp::Zero(bt) => format!("zero_{bt}"),
            BootstrapOp::Add(bt) => format!("add_{bt}"),
            BootstrapOp::Sub(bt) => format!("sub_{bt}"),
            BootstrapOp::Mul(bt) => format!("mul_{bt}"),
            BootstrapOp::InvokeBasic(sig) => format!("invokeBasic_{sig}"),
            BootstrapOp::GetField { slot, ty } => format!("getField{slot}_{ty}"),
            BootstrapOp::Convert { from, to, .. } => format!("convert_{from}_{to}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Linkage {
    Bootstrap(BootstrapOp),
    Member(MemberRef),
}

/// An operation a name applies, with the method type it expects.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedOp {
    linkage: Linkage,
    ty: MethodType,
}

impl NamedOp {
    pub fn bootstrap(op: BootstrapOp) -> Self {
        let ty = op.method_type();
        NamedOp { linkage: Linkage::Bootstrap(op), ty }
    }

    pub fn member(member: MemberRef, ty: MethodType) -> Self {
        NamedOp { linkage: Linkage::Member(member), ty }
    }

    pub fn linkage(&self) -> &Linkage {
        &self.linkage
    }

    pub fn method_type(&self) -> &MethodType {
        &self.ty
    }

    pub fn is_bootstrap(&self) -> bool {
        matches!(self.linkage, Linkage::Bootstrap(_))
    }
}

impl fmt::Display for NamedOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.linkage {
            Linkage::Bootstrap(op) => write!(f, "LF.{}", op.name()),
            Linkage::Member(member) => write!(f, "{member}"),
        }
    }
}

/// An argument of a name: an earlier name or an inline constant.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Name(usize),
    Const(Value),
}

#[derive(Debug, Clone, PartialEq)]
pub enum NameDef {
    Param,
    Apply { op: NamedOp, args: Vec<Arg> },
}

/// One entry of a form.
#[derive(Debug, Clone, PartialEq)]
pub struct Name {
    pub(crate) index: usize,
    pub(crate) ty: BasicType,
    pub(crate) def: NameDef,
}

impl Name {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn ty(&self) -> BasicType {
        self.ty
    }

    pub fn def(&self) -> &NameDef {
        &self.def
    }

    pub fn is_param(&self) -> bool {
        matches!(self.def, NameDef::Param)
    }
}
