// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Shape keys and the generators that turn them into forms.

use std::fmt;

use quill_form::{Form, Kind, OpId, Signature};

use crate::error::ResolveResult;

/// Identifies one cached executable.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShapeKey {
    pub signature: Signature,
    pub kind: Kind,
    pub op: OpId,
}

impl ShapeKey {
    pub fn new(signature: Signature, kind: Kind) -> Self {
        ShapeKey { signature, kind, op: OpId::NONE }
    }

    pub fn with_op(signature: Signature, kind: Kind, op: OpId) -> Self {
        ShapeKey { signature, kind, op }
    }

    /// The holder entry this key is looked up under.
    pub fn entry_name(&self) -> String {
        self.kind.entry_name(&self.signature, self.op)
    }
}

impl fmt::Display for ShapeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.kind, self.signature)?;
        if self.op != OpId::NONE {
            write!(f, "{}", self.op)?;
        }
        Ok(())
    }
}

/// Builds the form for a shape. A generator that cannot handle the key
/// reports `UnresolvableShape`.
pub trait ShapeGenerator: Send + Sync {
    fn generate(&self, key: &ShapeKey) -> ResolveResult<Form>;
}
