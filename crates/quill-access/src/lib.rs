// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Typed-storage accessors over fields, array elements and raw memory.
//!
//! Everything hangs off a [`Runtime`], which owns the resolver, the
//! specializer and the classes accessors are built against. Invoking an
//! [`Accessor`] goes through an access-invoker form resolved per
//! (signature, mode), so accessors of the same shape share code.

mod accessor;
mod dispatch;
mod error;
mod invoker;
mod lazy;
mod location;
mod modes;
mod ops;
mod runtime;
mod scope;
mod segment;
mod storage;

pub use accessor::{Accessor, AccessorKind, Transform, ACCESSOR_CLASS};
pub use dispatch::{lookup, DispatchTable, ModeFn};
pub use error::{AccessError, AccessResult};
pub use location::{ClassTable, FieldRef, Location, LocationResolver};
pub use modes::ModeSet;
pub use runtime::{Runtime, RuntimeConfig, HOLDER_VAR};
pub use scope::{Initializer, Scope, ScopeState};
pub use segment::{AddressSpace, ByteOrder, MemorySegment, SegmentView, SEGMENT_CLASS};
pub use storage::Storage;
