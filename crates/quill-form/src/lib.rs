// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Structural invocation forms and the runtime vocabulary around them.
//!
//! A [`Form`] describes how to compute a result from arguments as an ordered
//! list of [`Name`]s, each either a parameter or the application of a
//! [`NamedOp`] to earlier names. Forms are interpreted or compiled by
//! `quill-synth`; everything that runs ends up as an [`Executable`].

mod access_mode;
mod class;
mod display;
mod error;
mod exec;
mod form;
mod kind;
mod name;
mod signature;
mod types;
mod value;

pub use access_mode::{AccessMode, AccessType, UpdateOp};
pub use class::{Cell, ClassInfo, FieldDecl, FieldInfo, Instance};
pub use error::{FormError, InvokeError};
pub use exec::{Executable, Invocable};
pub use form::{Form, FormBuilder};
pub use kind::{Kind, NamingTemplate, OpId};
pub use name::{Arg, BootstrapOp, Linkage, MemberRef, Name, NameDef, NamedOp};
pub use signature::Signature;
pub use types::{BasicType, MethodType, PrimType, RefType, ValueType};
pub use value::{ArrayObject, Boxed, ObjRef, Object, Opaque, Value};
