// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Species keys: the kinds of the values a holder captures, in order.

use std::borrow::Borrow;
use std::fmt;

use quill_form::{BasicType, OpId};

use crate::error::{SpeciesError, SpeciesResult};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SpeciesKey(Vec<BasicType>);

impl SpeciesKey {
    pub fn parse(text: &str) -> SpeciesResult<SpeciesKey> {
        let mut kinds = Vec::with_capacity(text.len());
        for (position, symbol) in text.chars().enumerate() {
            match BasicType::from_char(symbol).filter(|bt| bt.is_arg()) {
                Some(bt) => kinds.push(bt),
                None => {
                    return Err(SpeciesError::InvalidKey { key: text.to_string(), symbol, position });
                }
            }
        }
        Ok(SpeciesKey(kinds))
    }

    /// `kinds` must not contain `V`.
    pub fn from_kinds(kinds: Vec<BasicType>) -> SpeciesKey {
        debug_assert!(kinds.iter().all(|bt| bt.is_arg()));
        SpeciesKey(kinds)
    }

    pub fn kinds(&self) -> &[BasicType] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn extended(&self, bt: BasicType) -> SpeciesKey {
        let mut kinds = self.0.clone();
        kinds.push(bt);
        SpeciesKey(kinds)
    }

    /// Process-independent id used as the reinvoker op id.
    pub fn op_id(&self) -> SpeciesResult<OpId> {
        OpId::species(&self.0).ok_or_else(|| SpeciesError::KeyTooLong(self.to_string()))
    }
}

impl Borrow<[BasicType]> for SpeciesKey {
    fn borrow(&self) -> &[BasicType] {
        &self.0
    }
}

impl fmt::Display for SpeciesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bt in &self.0 {
            write!(f, "{bt}")?;
        }
        Ok(())
    }
}
