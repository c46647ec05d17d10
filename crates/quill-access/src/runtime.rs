// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! The runtime context: owns every cache and builds accessors.

use std::path::PathBuf;
use std::sync::Arc;

use quill_form::{Kind, ValueType};
use quill_resolve::{Holder, PregeneratedLookup, Resolver};
use quill_species::Specializer;
use quill_synth::{MemberTable, SynthConfig, Synthesizer};
use tracing::{debug, warn};

use crate::accessor::{Accessor, Common, DirectAccessor, Transform, Variant};
use crate::error::{AccessError, AccessResult};
use crate::invoker::{register_members, AccessInvokers};
use crate::lazy::{LazyState, LazyStatic};
use crate::location::{ClassTable, FieldRef, Location, LocationResolver};
use crate::modes::ModeSet;
use crate::scope::Scope;
use crate::segment::{AddressSpace, MemorySegment, SegmentView};
use crate::storage::Storage;

pub const HOLDER_VAR: &str = "QUILL_HOLDER";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub synth: SynthConfig,
    /// Pregenerated unit loaded as the holder.
    pub holder: Option<PathBuf>,
}

impl RuntimeConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let holder = lookup(HOLDER_VAR).filter(|path| !path.trim().is_empty()).map(PathBuf::from);
        RuntimeConfig { synth: SynthConfig::from_lookup(lookup), holder }
    }
}

pub struct Runtime {
    members: Arc<MemberTable>,
    synth: Arc<Synthesizer>,
    resolver: Resolver,
    specializer: Arc<Specializer>,
    classes: Arc<ClassTable>,
    memory: AddressSpace,
}

impl Runtime {
    /// A runtime with the access invoker and reinvoker generators installed.
    /// A holder that fails to load is skipped with a warning.
    pub fn new(config: RuntimeConfig) -> Arc<Runtime> {
        let members = Arc::new(MemberTable::new());
        register_members(&members);
        let synth = Arc::new(Synthesizer::new(config.synth, members.clone()));

        let holder = config.holder.as_deref().and_then(|path| match Holder::read(path, &synth) {
            Ok(holder) => {
                debug!(path = %path.display(), entries = holder.len(), "loaded holder");
                Some(Arc::new(holder) as Arc<dyn PregeneratedLookup>)
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "ignoring unusable holder");
                None
            }
        });

        let resolver = Resolver::new(synth.clone(), holder);
        resolver.register_generator(&[Kind::AccessInvoker], Arc::new(AccessInvokers));
        let specializer = Arc::new(Specializer::new());
        specializer.install(&resolver);

        Arc::new(Runtime {
            members,
            synth,
            resolver,
            specializer,
            classes: Arc::new(ClassTable::new()),
            memory: AddressSpace::default(),
        })
    }

    pub fn from_env() -> Arc<Runtime> {
        Runtime::new(RuntimeConfig::from_env())
    }

    pub fn members(&self) -> &Arc<MemberTable> {
        &self.members
    }

    pub fn synth(&self) -> &Arc<Synthesizer> {
        &self.synth
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn specializer(&self) -> &Arc<Specializer> {
        &self.specializer
    }

    pub fn classes(&self) -> &Arc<ClassTable> {
        &self.classes
    }

    pub fn define_class(&self, scope: Scope) -> Arc<Scope> {
        self.classes.define(scope)
    }

    /// A zero-filled segment at a fresh, aligned address.
    pub fn allocate(&self, size: usize) -> Arc<MemorySegment> {
        self.memory.allocate(size)
    }

    fn direct(self: &Arc<Self>, storage: Storage) -> Accessor {
        let common = Common {
            name: storage.describe(),
            value_type: storage.value_type(),
            coordinates: storage.coordinates(),
            runtime: self.clone(),
        };
        Accessor::new(common, Variant::Direct(DirectAccessor::new(storage)))
    }

    pub(crate) fn direct_accessor(self: &Arc<Self>, location: Location) -> Accessor {
        match location {
            Location::Instance { class, field } => self.direct(Storage::InstanceField { class, field }),
            Location::Static { scope, field } => self.direct(Storage::StaticField { scope, field }),
        }
    }

    fn wrapper(self: &Arc<Self>, name: String, value_type: ValueType, coordinates: Vec<ValueType>, variant: Variant) -> Accessor {
        Accessor::new(Common { name, value_type, coordinates, runtime: self.clone() }, variant)
    }

    /// Accessor for instance field `field` of `class`.
    pub fn field_accessor(self: &Arc<Self>, class: &str, field: &str) -> AccessResult<Accessor> {
        let field = FieldRef::new(class, field);
        match self.classes.locate(&field)? {
            location @ Location::Instance { .. } => Ok(self.direct_accessor(location)),
            Location::Static { .. } => Err(field_kind(&field, "an instance field", "static")),
        }
    }

    /// Accessor for static field `field` of `class`. Before the class's
    /// scope is ready the location is resolved on first use, which runs
    /// the scope's initializer.
    pub fn static_field_accessor(self: &Arc<Self>, class: &str, field: &str) -> AccessResult<Accessor> {
        let field = FieldRef::new(class, field);
        match self.classes.resolve(&field) {
            Ok(Location::Instance { .. }) => Err(field_kind(&field, "a static field", "an instance field")),
            Ok(location) => Ok(self.direct_accessor(location)),
            Err(AccessError::ScopeNotYetInitialized(_)) => {
                let info = self.classes.locate(&field)?.field().clone();
                let modes = ModeSet::for_field(&info.ty, info.is_final);
                let resolver: Arc<dyn LocationResolver> = self.classes.clone();
                Ok(self.wrapper(
                    format!("lazy static {field}"),
                    info.ty,
                    Vec::new(),
                    Variant::LazyStatic(LazyStatic::new(field, resolver, modes)),
                ))
            }
            Err(err) => Err(err),
        }
    }

    /// Accessor for static field `field` of `class` whose location is known
    /// now but whose scope is initialized on the first access.
    pub fn initializing_field_accessor(self: &Arc<Self>, class: &str, field: &str) -> AccessResult<Accessor> {
        let field = FieldRef::new(class, field);
        let location = self.classes.locate(&field)?;
        let scope = match &location {
            Location::Static { scope, .. } => scope.clone(),
            Location::Instance { .. } => return Err(field_kind(&field, "a static field", "an instance field")),
        };
        let target = self.direct_accessor(location);
        if scope.is_ready() {
            return Ok(target);
        }
        Ok(self.wrapper(
            format!("initializing {}", target.name()),
            target.value_type().clone(),
            target.coordinates().to_vec(),
            Variant::LazyInitializing(Arc::new(LazyState::new(scope, target))),
        ))
    }

    pub fn array_element_accessor(self: &Arc<Self>, elem: ValueType) -> AccessResult<Accessor> {
        if elem.is_void() {
            return Err(AccessError::Layout("arrays of void have no elements".to_string()));
        }
        Ok(self.direct(Storage::ArrayElement { elem }))
    }

    pub fn memory_accessor(self: &Arc<Self>, view: SegmentView) -> AccessResult<Accessor> {
        view.validate()?;
        Ok(self.direct(Storage::Memory(view)))
    }

    /// An accessor whose executables are `transform` applied to `target`'s.
    pub fn indirect_accessor(self: &Arc<Self>, target: Accessor, transform: Transform) -> Accessor {
        self.wrapper(
            format!("indirect {}", target.name()),
            target.value_type().clone(),
            target.coordinates().to_vec(),
            Variant::Indirect { target, transform },
        )
    }
}

fn field_kind(field: &FieldRef, expected: &'static str, found: &'static str) -> AccessError {
    AccessError::FieldKind { owner: field.owner.clone(), field: field.name.clone(), expected, found }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn config_from_lookup() {
        let vars: HashMap<&str, &str> = [(HOLDER_VAR, "/tmp/holder.quil"), ("QUILL_COMPILE_THRESHOLD", "2")].into();
        let config = RuntimeConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(config.holder, Some(PathBuf::from("/tmp/holder.quil")));
        assert_eq!(config.synth.compile_threshold, 2);

        let config = RuntimeConfig::from_lookup(|_| None);
        assert_eq!(config, RuntimeConfig::default());
    }

    #[test]
    fn missing_holder_is_skipped() {
        let config = RuntimeConfig { holder: Some(PathBuf::from("/nonexistent/holder.quil")), ..Default::default() };
        let runtime = Runtime::new(config);
        assert_eq!(runtime.resolver().stats().holder_hits, 0);
    }

    #[test]
    fn rejects_void_arrays_and_bad_layouts() {
        let runtime = Runtime::new(RuntimeConfig::default());
        assert!(matches!(runtime.array_element_accessor(ValueType::VOID), Err(AccessError::Layout(_))));
        let view = SegmentView::new(quill_form::PrimType::Int).with_alignment_mask(6);
        assert!(matches!(runtime.memory_accessor(view), Err(AccessError::Layout(_))));
    }
}
