// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Build-time and call-time errors shared by every layer.

use thiserror::Error;

use crate::types::{BasicType, MethodType};

/// A malformed form or signature. Raised eagerly while building; always a
/// bug in whatever generated the form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("invalid basic type signature `{0}`")]
    InvalidSignature(String),

    #[error("name {index} refers to name {target}, which is not defined before it")]
    ForwardReference { index: usize, target: usize },

    #[error("name {index} refers to void name {target}")]
    VoidReference { index: usize, target: usize },

    #[error("name {index} passes {got} argument(s) to `{op}`, which expects {expected}")]
    ArgumentCount { index: usize, op: String, expected: usize, got: usize },

    #[error("name {index} passes {found} as argument {arg} of `{op}`, which expects {expected}")]
    ArgumentType { index: usize, op: String, arg: usize, expected: BasicType, found: BasicType },

    #[error("result name {index} is out of range for a form of {len} names")]
    ResultOutOfRange { index: usize, len: usize },

    #[error("result kind {found} does not match declared return {expected}")]
    ResultKind { expected: BasicType, found: BasicType },
}

/// A failure discovered while running an executable.
#[derive(Debug, Clone, Error)]
pub enum InvokeError {
    #[error("cannot cast {found} to {expected}")]
    TypeMismatch { expected: String, found: String },

    #[error("null reference: {0}")]
    NullPointer(String),

    #[error("expected type {expected} but found {actual}")]
    WrongMethodType { expected: MethodType, actual: MethodType },

    #[error("`{name}` expects {expected} argument(s), got {got}")]
    Arity { name: String, expected: usize, got: usize },

    #[error("misaligned access at address {address:#x} (alignment mask {mask:#x})")]
    MisalignedAccess { address: u64, mask: u64 },

    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: i64, len: usize },

    #[error("access of {len} byte(s) at offset {offset} is outside a segment of {size} byte(s)")]
    OutOfBounds { offset: u64, len: usize, size: u64 },

    #[error("attempt to write a read-only {0}")]
    ReadOnly(String),

    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("initialization of `{scope}` failed: {reason}")]
    InitializationFailed { scope: String, reason: String },

    #[error("internal error: {0}")]
    Internal(String),
}

impl InvokeError {
    pub fn type_mismatch(expected: impl ToString, found: impl ToString) -> Self {
        InvokeError::TypeMismatch { expected: expected.to_string(), found: found.to_string() }
    }
}
