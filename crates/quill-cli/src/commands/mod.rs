// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! CLI command implementations.

pub mod modes;
pub mod pregen;
pub mod shape;
pub mod species;
