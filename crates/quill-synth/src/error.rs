// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Emission failures. Every variant indicates a bug in a shape generator or
//! in the backend itself; none of them is retried.

use quill_form::{FormError, MemberRef, MethodType, ValueType};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum SynthError {
    #[error("illegal conversion from {from} to {to}")]
    IllegalConversion { from: ValueType, to: ValueType },

    #[error(transparent)]
    Form(#[from] FormError),

    #[error("unresolved member `{0}`")]
    UnresolvedMember(MemberRef),

    #[error("member `{member}` has erased type {actual}, expected {expected}")]
    MemberType { member: MemberRef, expected: MethodType, actual: MethodType },

    #[error("constant `{0}` cannot be written to a unit file")]
    Unencodable(String),

    #[error("malformed unit: {0}")]
    Malformed(String),
}

pub type SynthResult<T> = Result<T, SynthError>;
