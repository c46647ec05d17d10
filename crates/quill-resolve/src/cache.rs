// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Per-signature shape tables.
//!
//! Each slot is a `OnceLock`: the map locks are only held long enough to
//! find or create the slot, and a published slot is read without locking.

use std::collections::HashMap;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use quill_form::{Executable, Kind, OpId, Signature};

use crate::shape::ShapeKey;

pub(crate) type Slot = Arc<OnceLock<Executable>>;

/// Slots for every (kind, op) resolved under one signature.
#[derive(Default)]
pub struct ShapeTable {
    slots: RwLock<HashMap<(Kind, OpId), Slot>>,
}

impl ShapeTable {
    fn slot(&self, kind: Kind, op: OpId) -> Slot {
        if let Some(slot) = self.slots.read().unwrap_or_else(PoisonError::into_inner).get(&(kind, op)) {
            return slot.clone();
        }
        self.slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry((kind, op))
            .or_default()
            .clone()
    }

    pub fn get(&self, kind: Kind, op: OpId) -> Option<Executable> {
        let slot = self.slots.read().unwrap_or_else(PoisonError::into_inner).get(&(kind, op)).cloned()?;
        slot.get().cloned()
    }

    /// Number of published slots.
    pub fn len(&self) -> usize {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|slot| slot.get().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Default)]
pub struct FormCache {
    tables: RwLock<HashMap<Signature, Arc<ShapeTable>>>,
}

impl FormCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(&self, signature: &Signature) -> Option<Arc<ShapeTable>> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner).get(signature).cloned()
    }

    pub(crate) fn slot(&self, key: &ShapeKey) -> Slot {
        let table = match self.table(&key.signature) {
            Some(table) => table,
            None => self
                .tables
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .entry(key.signature.clone())
                .or_default()
                .clone(),
        };
        table.slot(key.kind, key.op)
    }

    pub fn get(&self, key: &ShapeKey) -> Option<Executable> {
        self.table(&key.signature)?.get(key.kind, key.op)
    }

    /// Published entries across all signatures.
    pub fn len(&self) -> usize {
        self.tables.read().unwrap_or_else(PoisonError::into_inner).values().map(|t| t.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
