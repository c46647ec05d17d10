// SPDX-License-Identifier: (MIT OR Apache-2.0)

use quill_form::FormError;
use quill_resolve::ResolveError;
use quill_synth::SynthError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum SpeciesError {
    #[error("invalid species key `{key}`: `{symbol}` at position {position} is not one of L, I, J, F, D")]
    InvalidKey { key: String, symbol: char, position: usize },

    #[error("species key `{0}` is too long to identify")]
    KeyTooLong(String),

    #[error("`{target}` takes {arity} argument(s); cannot bind {got}")]
    TooManyValues { target: String, arity: usize, got: usize },

    #[error("bound value {index} is {found}, but parameter {index} of `{target}` is {expected}")]
    ValueKind { target: String, index: usize, expected: char, found: String },

    #[error(transparent)]
    Form(#[from] FormError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Synth(#[from] SynthError),
}

pub type SpeciesResult<T> = Result<T, SpeciesError>;
