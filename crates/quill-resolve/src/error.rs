// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Resolution failures.

use std::path::PathBuf;

use quill_form::{FormError, Kind, MethodType, Signature};
use quill_synth::SynthError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    /// No generator can produce the shape, or what it produced has the
    /// wrong signature. Not retried.
    #[error("cannot resolve {kind} shape `{signature}`: {reason}")]
    UnresolvableShape { signature: Signature, kind: Kind, reason: String },

    #[error(transparent)]
    IllegalStructure(#[from] FormError),

    #[error(transparent)]
    Emission(#[from] SynthError),

    #[error("cannot adapt {target} to {requested}: {reason}")]
    Adaptation { target: MethodType, requested: MethodType, reason: String },

    #[error("cannot load holder `{}`: {reason}", path.display())]
    Holder { path: PathBuf, reason: String },
}

pub type ResolveResult<T> = Result<T, ResolveError>;
