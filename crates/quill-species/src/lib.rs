// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Species: generated holder layouts for captured values.
//!
//! A species is keyed by the kinds of the values it captures. The layout for
//! a key of length n is derived from the layout for its length n-1 prefix by
//! appending one slot, so all prefix slots keep their position and getter.

mod error;
mod key;
mod species;
mod specializer;

pub use error::{SpeciesError, SpeciesResult};
pub use key::SpeciesKey;
pub use species::{class_name, Getter, SpeciesData, BASE_CLASS};
pub use specializer::Specializer;
