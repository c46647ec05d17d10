// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! The species cache, binding and the reinvoker generator.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use quill_form::{
    Arg, BasicType, BootstrapOp, ClassInfo, Executable, Form, FormBuilder, Invocable, InvokeError,
    Kind, MethodType, NamedOp, Signature, Value,
};
use quill_resolve::{ResolveError, ResolveResult, Resolver, ShapeGenerator, ShapeKey};
use quill_synth::emit;
use tracing::debug;

use crate::error::{SpeciesError, SpeciesResult};
use crate::key::SpeciesKey;
use crate::species::{SpeciesData, BASE_CLASS};

pub struct Specializer {
    root: Arc<SpeciesData>,
    index: RwLock<HashMap<SpeciesKey, Arc<SpeciesData>>>,
    generated: AtomicUsize,
}

impl Default for Specializer {
    fn default() -> Self {
        Self::new()
    }
}

impl Specializer {
    pub fn new() -> Self {
        let base = Arc::new(ClassInfo::new(BASE_CLASS, None, Vec::new()));
        Specializer {
            root: Arc::new(SpeciesData::root(base)),
            index: RwLock::new(HashMap::new()),
            generated: AtomicUsize::new(0),
        }
    }

    /// Registers the reinvoker generator that [`Specializer::bind`] relies on.
    pub fn install(self: &Arc<Self>, resolver: &Resolver) {
        resolver.register_generator(&[Kind::Reinvoker], Arc::new(ReinvokerGenerator { specializer: self.clone() }));
    }

    pub fn root(&self) -> &Arc<SpeciesData> {
        &self.root
    }

    /// Species generated so far, not counting the root.
    pub fn generated_count(&self) -> usize {
        self.generated.load(Ordering::Relaxed)
    }

    pub fn find_species(&self, key: &str) -> SpeciesResult<Arc<SpeciesData>> {
        let key = SpeciesKey::parse(key)?;
        self.species_for(key.kinds())
    }

    pub fn species_for(&self, kinds: &[BasicType]) -> SpeciesResult<Arc<SpeciesData>> {
        if kinds.is_empty() {
            return Ok(self.root.clone());
        }
        if let Some(found) = self.index.read().unwrap_or_else(PoisonError::into_inner).get(kinds) {
            return Ok(found.clone());
        }
        let mut species = self.root.clone();
        for bt in kinds {
            species = self.extend(&species, *bt)?;
        }
        Ok(species)
    }

    /// The child of `parent` with `bt` appended, generated at most once.
    pub fn extend(&self, parent: &Arc<SpeciesData>, bt: BasicType) -> SpeciesResult<Arc<SpeciesData>> {
        let slot = parent.extensions.get(bt.ordinal()).ok_or_else(|| SpeciesError::InvalidKey {
            key: parent.key().extended(bt).to_string(),
            symbol: bt.as_char(),
            position: parent.key().len(),
        })?;
        let child = slot.get_or_init(|| {
            let child = Arc::new(SpeciesData::derive(parent, bt));
            self.generated.fetch_add(1, Ordering::Relaxed);
            debug!(species = %child.key(), class = child.class().name(), "generated species");
            self.index
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(child.key().clone(), child.clone());
            child
        });
        Ok(child.clone())
    }

    /// Captures `target` and leading `values` in a holder and returns an
    /// executable taking the remaining arguments.
    pub fn bind(&self, resolver: &Resolver, target: &Executable, values: Vec<Value>) -> SpeciesResult<Executable> {
        let target_sig = target.method_type().basic_signature();
        if values.len() > target_sig.arity() {
            return Err(SpeciesError::TooManyValues {
                target: target.name().to_string(),
                arity: target_sig.arity(),
                got: values.len(),
            });
        }
        for (index, (value, expected)) in values.iter().zip(target_sig.params()).enumerate() {
            if value.basic_type() != *expected {
                return Err(SpeciesError::ValueKind {
                    target: target.name().to_string(),
                    index,
                    expected: expected.as_char(),
                    found: value.type_name(),
                });
            }
        }

        let mut kinds = vec![BasicType::L];
        kinds.extend(values.iter().map(|v| v.basic_type()));
        let species = self.species_for(&kinds)?;

        let remaining = target_sig.drop_leading(values.len());
        let key = ShapeKey::with_op(remaining.with_leading(BasicType::L), Kind::Reinvoker, species.key().op_id()?);
        let reinvoker = resolver.resolve_key(&key)?;

        let count = values.len();
        let mut captured = Vec::with_capacity(count + 1);
        captured.push(target.to_value());
        captured.extend(values);

        Ok(Executable::new(Bound {
            name: format!("{}.bound{}", target.name(), species.key()),
            ty: target.method_type().drop_params(0, count),
            holder: species.instantiate(captured),
            reinvoker,
        }))
    }

    /// The getter forms of `species` emitted into a unit named `name`,
    /// encoded as bytes.
    pub fn generate_layout_source(&self, name: &str, species: &SpeciesData) -> SpeciesResult<Vec<u8>> {
        let mut forms = Vec::with_capacity(species.getters().len());
        for getter in species.getters() {
            forms.push((getter.name.clone(), getter.form()?));
        }
        Ok(emit(name, &forms)?.to_bytes()?)
    }
}

/// A holder plus the reinvoker that unpacks it.
struct Bound {
    name: String,
    ty: MethodType,
    holder: Value,
    reinvoker: Executable,
}

impl Invocable for Bound {
    fn name(&self) -> &str {
        &self.name
    }

    fn method_type(&self) -> &MethodType {
        &self.ty
    }

    fn call(&self, args: &[Value]) -> Result<Value, InvokeError> {
        let mut full = Vec::with_capacity(args.len() + 1);
        full.push(self.holder.clone());
        full.extend_from_slice(args);
        self.reinvoker.invoke(&full)
    }
}

/// Builds `reinvoke_<species>_<sig>`: read every slot of the holder in
/// `a0`, then call the captured handle with the captured values followed
/// by the remaining arguments.
struct ReinvokerGenerator {
    specializer: Arc<Specializer>,
}

impl ShapeGenerator for ReinvokerGenerator {
    fn generate(&self, key: &ShapeKey) -> ResolveResult<Form> {
        let unresolvable = |reason: &str| ResolveError::UnresolvableShape {
            signature: key.signature.clone(),
            kind: key.kind,
            reason: reason.to_string(),
        };
        let kinds = key.op.species_key();
        if kinds.first() != Some(&BasicType::L) {
            return Err(unresolvable("species must capture a handle first"));
        }
        if key.signature.params().first() != Some(&BasicType::L) {
            return Err(unresolvable("the holder must be the first argument"));
        }
        let species = self
            .specializer
            .species_for(&kinds)
            .map_err(|e| unresolvable(&e.to_string()))?;

        let mut builder = FormBuilder::new(Kind::Reinvoker, key.signature.clone()).named(key.entry_name());
        let fields: Vec<usize> = species
            .getters()
            .iter()
            .map(|getter| builder.apply(getter.op(), vec![Arg::Name(0)]))
            .collect();

        let mut invoked = kinds[1..].to_vec();
        invoked.extend_from_slice(&key.signature.params()[1..]);
        let invoked = Signature::new(invoked, key.signature.ret());

        let mut args: Vec<Arg> = fields.iter().map(|i| Arg::Name(*i)).collect();
        args.extend((1..key.signature.arity()).map(Arg::Name));
        builder.apply(NamedOp::bootstrap(BootstrapOp::InvokeBasic(invoked)), args);
        Ok(builder.finish()?)
    }
}
