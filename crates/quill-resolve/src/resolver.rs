// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! The two-tier resolver: holder lookup, then synthesis.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use quill_form::{BasicType, Executable, Form, Kind, MethodType, Signature};
use quill_synth::{emit, Synthesizer, Unit};
use tracing::debug;

use crate::adapt::{adapter_form, Adapted};
use crate::cache::FormCache;
use crate::error::{ResolveError, ResolveResult};
use crate::generators::Builtins;
use crate::holder::PregeneratedLookup;
use crate::shape::{ShapeGenerator, ShapeKey};

/// Counters for observing how requests were served.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolverStats {
    /// Requests answered from an already published slot.
    pub hits: u64,
    pub holder_hits: u64,
    pub syntheses: u64,
    pub adapters: u64,
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    holder_hits: AtomicU64,
    syntheses: AtomicU64,
    adapters: AtomicU64,
}

type AdapterKey = (MethodType, MethodType);

pub struct Resolver {
    synth: Arc<Synthesizer>,
    cache: FormCache,
    holder: Option<Arc<dyn PregeneratedLookup>>,
    generators: RwLock<HashMap<Kind, Arc<dyn ShapeGenerator>>>,
    adapters: RwLock<HashMap<AdapterKey, Arc<OnceLock<Executable>>>>,
    counters: Counters,
}

impl Resolver {
    /// A resolver with the built-in generators installed.
    pub fn new(synth: Arc<Synthesizer>, holder: Option<Arc<dyn PregeneratedLookup>>) -> Self {
        let resolver = Resolver {
            synth,
            cache: FormCache::new(),
            holder,
            generators: RwLock::new(HashMap::new()),
            adapters: RwLock::new(HashMap::new()),
            counters: Counters::default(),
        };
        resolver.register_generator(&Builtins::KINDS, Arc::new(Builtins));
        resolver
    }

    pub fn synth(&self) -> &Arc<Synthesizer> {
        &self.synth
    }

    pub fn cache(&self) -> &FormCache {
        &self.cache
    }

    /// Installs `generator` for each of `kinds`, replacing earlier ones.
    pub fn register_generator(&self, kinds: &[Kind], generator: Arc<dyn ShapeGenerator>) {
        let mut generators = self.generators.write().unwrap_or_else(PoisonError::into_inner);
        for kind in kinds {
            generators.insert(*kind, generator.clone());
        }
    }

    fn generator(&self, kind: Kind) -> Option<Arc<dyn ShapeGenerator>> {
        self.generators.read().unwrap_or_else(PoisonError::into_inner).get(&kind).cloned()
    }

    pub fn resolve(&self, signature: &Signature, kind: Kind) -> ResolveResult<Executable> {
        self.resolve_key(&ShapeKey::new(signature.clone(), kind))
    }

    /// The published executable for `key`, producing it on first request.
    /// Racing callers may each produce one; all of them get the first
    /// one published.
    pub fn resolve_key(&self, key: &ShapeKey) -> ResolveResult<Executable> {
        let slot = self.cache.slot(key);
        if let Some(exec) = slot.get() {
            self.counters.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(exec.clone());
        }
        let produced = self.produce(key)?;
        Ok(slot.get_or_init(|| produced).clone())
    }

    /// Already published executable for `key`, without producing one.
    pub fn cached(&self, key: &ShapeKey) -> Option<Executable> {
        self.cache.get(key)
    }

    fn produce(&self, key: &ShapeKey) -> ResolveResult<Executable> {
        let name = key.entry_name();
        if let Some(exec) = self.holder.as_ref().and_then(|h| h.lookup(&name)) {
            if exec.method_type().basic_signature() == key.signature {
                self.counters.holder_hits.fetch_add(1, Ordering::Relaxed);
                debug!(entry = %name, "resolved from holder");
                return Ok(exec);
            }
            debug!(entry = %name, found = %exec.method_type(), "holder entry has a different signature");
        }

        let form = self.generate(key)?;
        let exec = self.synth.prepare(form)?;
        self.counters.syntheses.fetch_add(1, Ordering::Relaxed);
        debug!(shape = %key, entry = %name, "synthesized");
        Ok(exec)
    }

    /// The form the registered generator builds for `key`. Nothing is
    /// cached or synthesized.
    pub fn generate(&self, key: &ShapeKey) -> ResolveResult<Form> {
        let generator = self.generator(key.kind).ok_or_else(|| ResolveError::UnresolvableShape {
            signature: key.signature.clone(),
            kind: key.kind,
            reason: "no generator for this kind".to_string(),
        })?;
        let form = generator.generate(key)?;
        if *form.signature() != key.signature {
            return Err(ResolveError::UnresolvableShape {
                signature: key.signature.clone(),
                kind: key.kind,
                reason: format!("generator produced `{}`", form.signature()),
            });
        }
        Ok(form)
    }

    /// Emits the forms for `keys` into one unit, named by entry name.
    /// Keys whose entry names collide keep the first form.
    pub fn pregenerate(&self, unit_name: &str, keys: &[ShapeKey]) -> ResolveResult<Unit> {
        let mut forms = Vec::with_capacity(keys.len());
        for key in keys {
            forms.push((key.entry_name(), self.generate(key)?));
        }
        Ok(emit(unit_name, &forms)?)
    }

    /// `target` viewed as `requested`, converting arguments and result.
    /// The conversion form is shared by every target of the same type.
    pub fn adapt(&self, target: &Executable, requested: &MethodType) -> ResolveResult<Executable> {
        if target.method_type() == requested {
            return Ok(target.clone());
        }
        let key = (requested.clone(), target.method_type().clone());
        let slot = {
            let adapters = self.adapters.read().unwrap_or_else(PoisonError::into_inner);
            adapters.get(&key).cloned()
        };
        let slot = match slot {
            Some(slot) => slot,
            None => self
                .adapters
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .entry(key)
                .or_default()
                .clone(),
        };
        let adapter = match slot.get() {
            Some(adapter) => adapter.clone(),
            None => {
                let form = adapter_form(target.method_type(), requested)?;
                let adapter = self.synth.prepare(form)?;
                self.counters.adapters.fetch_add(1, Ordering::Relaxed);
                debug!(from = %target.method_type(), to = %requested, "synthesized adapter");
                slot.get_or_init(|| adapter).clone()
            }
        };
        Ok(Executable::new(Adapted {
            name: format!("{}.asType{}", target.name(), requested),
            target: target.clone(),
            adapter,
            ty: requested.clone(),
        }))
    }

    pub fn stats(&self) -> ResolverStats {
        ResolverStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            holder_hits: self.counters.holder_hits.load(Ordering::Relaxed),
            syntheses: self.counters.syntheses.load(Ordering::Relaxed),
            adapters: self.counters.adapters.load(Ordering::Relaxed),
        }
    }
}

/// Shape keys for the built-in kinds over every basic type; the default
/// contents of a pregenerated holder.
pub fn common_shapes() -> Vec<ShapeKey> {
    let mut keys = Vec::new();
    for bt in BasicType::ARG_TYPES {
        keys.push(ShapeKey::new(Signature::new(vec![bt], bt), Kind::Identity));
        keys.push(ShapeKey::new(Signature::new(vec![], bt), Kind::Zero));
        if bt != BasicType::L {
            for kind in [Kind::Add, Kind::Sub, Kind::Mul] {
                keys.push(ShapeKey::new(Signature::new(vec![bt, bt], bt), kind));
            }
        }
    }
    for arity in 1..=4 {
        keys.push(ShapeKey::new(Signature::new(vec![BasicType::L; arity], BasicType::L), Kind::Invoker));
    }
    keys
}
