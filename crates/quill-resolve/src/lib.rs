// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Form resolution and caching.
//!
//! A [`Resolver`] maps a [`ShapeKey`] to an executable: published slots
//! first, then a pregenerated holder, then a [`ShapeGenerator`] whose form
//! is handed to the synthesis backend. Results are published once per key.

mod adapt;
mod cache;
mod error;
mod generators;
mod holder;
mod resolver;
mod shape;

pub use cache::{FormCache, ShapeTable};
pub use error::{ResolveError, ResolveResult};
pub use generators::{invoker_signature, Builtins};
pub use holder::{Holder, PregeneratedLookup};
pub use resolver::{common_shapes, Resolver, ResolverStats};
pub use shape::{ShapeGenerator, ShapeKey};
