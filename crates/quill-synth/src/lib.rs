// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! The synthesis backend.
//!
//! Forms are lowered to a small stack-machine instruction set, batched into
//! [`Unit`]s that encode to bytes deterministically, and linked against a
//! [`Linker`] when loaded. Freshly generated forms go through
//! [`Synthesizer::prepare`], which interprets them until they cross the
//! compile threshold.

mod bootstrap;
mod config;
mod convert;
mod emit;
mod error;
mod insn;
mod interp;
mod link;
mod machine;
mod synthesizer;
mod unitfile;

pub use config::{SynthConfig, COMPILE_THRESHOLD_VAR, TRACE_INTERPRETER_VAR};
pub use convert::{convert, param_check};
pub use emit::{emit, lower, EntryCode, Unit};
pub use error::{SynthError, SynthResult};
pub use insn::{Insn, Widening};
pub use interp::InterpretedForm;
pub use link::{Linker, MemberTable};
pub use machine::CompiledEntry;
pub use synthesizer::Synthesizer;
