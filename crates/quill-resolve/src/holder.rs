// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Ahead-of-time lookup: loaded units probed by entry name.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use quill_form::Executable;
use quill_synth::{Synthesizer, Unit};
use tracing::debug;

use crate::error::{ResolveError, ResolveResult};

/// Fast path consulted before any synthesis.
pub trait PregeneratedLookup: Send + Sync {
    fn lookup(&self, name: &str) -> Option<Executable>;
}

/// A unit loaded and linked as a lookup table.
pub struct Holder {
    name: String,
    entries: HashMap<String, Executable>,
}

impl Holder {
    pub fn from_unit(unit: &Unit, synth: &Synthesizer) -> ResolveResult<Holder> {
        let entries = synth.load(unit)?.into_iter().collect();
        Ok(Holder { name: unit.name().to_string(), entries })
    }

    /// Reads a unit file written by [`Unit::to_bytes`].
    pub fn read(path: &Path, synth: &Synthesizer) -> ResolveResult<Holder> {
        let bytes = fs::read(path)
            .map_err(|e| ResolveError::Holder { path: path.to_path_buf(), reason: e.to_string() })?;
        let unit = Unit::from_bytes(&bytes)
            .map_err(|e| ResolveError::Holder { path: path.to_path_buf(), reason: e.to_string() })?;
        let holder = Holder::from_unit(&unit, synth)?;
        debug!(path = %path.display(), entries = holder.len(), "loaded holder");
        Ok(holder)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }
}

impl PregeneratedLookup for Holder {
    fn lookup(&self, name: &str) -> Option<Executable> {
        self.entries.get(name).cloned()
    }
}
