// SPDX-License-Identifier: (MIT OR Apache-2.0)

use quill_form::{AccessMode, InvokeError};
use quill_resolve::ResolveError;
use quill_species::SpeciesError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum AccessError {
    /// Recoverable: the caller may try another mode.
    #[error("{accessor} does not support access mode `{mode}`")]
    UnsupportedAccessMode { mode: AccessMode, accessor: String },

    #[error("scope `{0}` is not yet initialized")]
    ScopeNotYetInitialized(String),

    #[error("no class `{0}`")]
    NoSuchClass(String),

    #[error("no field `{field}` in `{owner}`")]
    NoSuchField { owner: String, field: String },

    #[error("`{owner}.{field}` is {found}, expected {expected}")]
    FieldKind { owner: String, field: String, expected: &'static str, found: &'static str },

    #[error("invalid memory layout: {0}")]
    Layout(String),

    #[error(transparent)]
    Invoke(#[from] InvokeError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Species(#[from] SpeciesError),
}

pub type AccessResult<T> = Result<T, AccessError>;

/// Errors raised while an executable is running surface as invocation errors.
impl From<AccessError> for InvokeError {
    fn from(err: AccessError) -> InvokeError {
        match err {
            AccessError::Invoke(inner) => inner,
            AccessError::UnsupportedAccessMode { .. } => InvokeError::UnsupportedOperation(err.to_string()),
            other => InvokeError::Internal(other.to_string()),
        }
    }
}
