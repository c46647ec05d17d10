// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Typed-storage accessors.
//!
//! An [`Accessor`] reads and writes one kind of storage through a fixed
//! set of access modes. Direct accessors own their storage; the other
//! variants forward to a direct one, possibly after transforming its
//! executables or initializing the storage's scope.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use quill_form::{
    AccessMode, BasicType, Executable, InvokeError, Kind, MethodType, Object, OpId, Opaque, Value, ValueType,
};
use quill_resolve::ShapeKey;

use crate::dispatch::{lookup, table_for, DispatchTable, ModeExecutable};
use crate::error::{AccessError, AccessResult};
use crate::lazy::{LazyState, LazyStatic};
use crate::modes::ModeSet;
use crate::runtime::Runtime;
use crate::storage::Storage;

/// Class name accessors carry in the value world.
pub const ACCESSOR_CLASS: &str = "VarHandle";

/// Rewrites the executables of an indirect accessor's target.
pub type Transform = Arc<dyn Fn(AccessMode, Executable) -> AccessResult<Executable> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessorKind {
    Direct,
    Indirect,
    LazyInitializing,
    LazyStatic,
}

/// A handle onto typed storage. Cloning shares everything; the exactness
/// flag is per handle.
#[derive(Clone)]
pub struct Accessor {
    inner: Arc<AccessorInner>,
    exact: bool,
}

struct AccessorInner {
    common: Common,
    variant: Variant,
}

/// Attributes every variant has.
pub(crate) struct Common {
    pub(crate) name: String,
    pub(crate) value_type: ValueType,
    pub(crate) coordinates: Vec<ValueType>,
    pub(crate) runtime: Arc<Runtime>,
}

pub(crate) enum Variant {
    Direct(DirectAccessor),
    Indirect { target: Accessor, transform: Transform },
    LazyInitializing(Arc<LazyState>),
    LazyStatic(LazyStatic),
}

pub(crate) struct DirectAccessor {
    storage: Storage,
    modes: ModeSet,
    table: &'static DispatchTable,
    executables: RwLock<Vec<Option<Executable>>>,
}

impl DirectAccessor {
    pub(crate) fn new(storage: Storage) -> DirectAccessor {
        DirectAccessor {
            modes: storage.modes(),
            table: table_for(&storage),
            executables: RwLock::new(vec![None; AccessMode::COUNT]),
            storage,
        }
    }
}

impl Accessor {
    pub(crate) fn new(common: Common, variant: Variant) -> Accessor {
        Accessor { inner: Arc::new(AccessorInner { common, variant }), exact: false }
    }

    pub fn name(&self) -> &str {
        &self.inner.common.name
    }

    pub fn kind(&self) -> AccessorKind {
        match &self.inner.variant {
            Variant::Direct(_) => AccessorKind::Direct,
            Variant::Indirect { .. } => AccessorKind::Indirect,
            Variant::LazyInitializing(_) => AccessorKind::LazyInitializing,
            Variant::LazyStatic(_) => AccessorKind::LazyStatic,
        }
    }

    pub fn value_type(&self) -> &ValueType {
        &self.inner.common.value_type
    }

    pub fn coordinates(&self) -> &[ValueType] {
        &self.inner.common.coordinates
    }

    pub fn runtime(&self) -> &Arc<Runtime> {
        &self.inner.common.runtime
    }

    /// The storage of a direct accessor.
    pub fn storage(&self) -> Option<&Storage> {
        match &self.inner.variant {
            Variant::Direct(direct) => Some(&direct.storage),
            _ => None,
        }
    }

    pub fn access_mode_type(&self, mode: AccessMode) -> MethodType {
        mode.access_type().method_type(self.value_type(), self.coordinates())
    }

    /// Modes the ultimate direct accessor supports. Never initializes.
    pub fn supported_modes(&self) -> ModeSet {
        match &self.inner.variant {
            Variant::Direct(direct) => direct.modes,
            Variant::Indirect { target, .. } => target.supported_modes(),
            Variant::LazyInitializing(state) => state.target().supported_modes(),
            Variant::LazyStatic(lazy) => lazy.modes(),
        }
    }

    pub fn is_access_mode_supported(&self, mode: AccessMode) -> bool {
        self.supported_modes().contains(mode)
    }

    fn unsupported(&self, mode: AccessMode) -> AccessError {
        AccessError::UnsupportedAccessMode { mode, accessor: self.name().to_string() }
    }

    /// The executable implementing `mode`. It takes the direct receiver
    /// first, then the coordinates and values of
    /// [`access_mode_type`](Self::access_mode_type).
    pub fn get_executable(&self, mode: AccessMode) -> AccessResult<Executable> {
        if !self.is_access_mode_supported(mode) {
            return Err(self.unsupported(mode));
        }
        match &self.inner.variant {
            Variant::Direct(direct) => self.direct_executable(direct, mode),
            Variant::Indirect { target, transform } => transform(mode, target.get_executable(mode)?),
            Variant::LazyInitializing(state) => state.get_executable(mode, self.receiver_type(mode)),
            Variant::LazyStatic(lazy) => lazy.delegate(self.runtime())?.get_executable(mode),
        }
    }

    fn receiver_type(&self, mode: AccessMode) -> MethodType {
        self.access_mode_type(mode).insert_param(0, ValueType::class(ACCESSOR_CLASS))
    }

    /// Slots fill on first use with the entry named by the owning table
    /// and the mode's method name.
    fn direct_executable(&self, direct: &DirectAccessor, mode: AccessMode) -> AccessResult<Executable> {
        let slot = mode.ordinal();
        if let Some(exec) = &direct.executables.read().unwrap_or_else(PoisonError::into_inner)[slot] {
            return Ok(exec.clone());
        }
        let owner = direct.table.owner();
        let entry = lookup(owner, mode.method_name()).ok_or_else(|| self.unsupported(mode))?;
        let mut executables = direct.executables.write().unwrap_or_else(PoisonError::into_inner);
        let exec = executables[slot].get_or_insert_with(|| {
            Executable::new(ModeExecutable {
                name: format!("{owner}.{}", mode.method_name()),
                mode,
                ty: self.receiver_type(mode),
                entry,
            })
        });
        Ok(exec.clone())
    }

    /// The direct accessor the executables of this one run against.
    pub fn as_direct(&self) -> AccessResult<Accessor> {
        match &self.inner.variant {
            Variant::Direct(_) => Ok(self.clone()),
            Variant::Indirect { target, .. } => target.as_direct(),
            Variant::LazyInitializing(state) => Ok(state.target().clone()),
            Variant::LazyStatic(lazy) => lazy.delegate(self.runtime()),
        }
    }

    pub fn has_invoke_exact_behavior(&self) -> bool {
        self.exact
    }

    pub fn with_invoke_exact_behavior(&self) -> Accessor {
        Accessor { inner: self.inner.clone(), exact: true }
    }

    pub fn with_invoke_behavior(&self) -> Accessor {
        Accessor { inner: self.inner.clone(), exact: false }
    }

    /// Same underlying accessor and same exactness.
    pub fn same_handle(a: &Accessor, b: &Accessor) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner) && a.exact == b.exact
    }

    /// Runs `mode` with `args` (coordinates then values) as seen from a
    /// call site of type `call_type`.
    pub fn invoke(&self, mode: AccessMode, call_type: &MethodType, args: &[Value]) -> AccessResult<Value> {
        let ty = self.access_mode_type(mode);
        let wrong_type = || InvokeError::WrongMethodType { expected: ty.clone(), actual: call_type.clone() };
        if self.exact && *call_type != ty {
            return Err(wrong_type().into());
        }
        let invoker = self.access_invoker(mode, &ty)?;
        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push(self.to_value());
        argv.extend_from_slice(args);
        if *call_type == ty {
            return Ok(invoker.invoke(&argv)?);
        }

        let receiver = ValueType::class(ACCESSOR_CLASS);
        let name = invoker.name().to_string();
        let typed = Executable::native(&name, ty.insert_param(0, receiver.clone()), move |args| invoker.invoke(args));
        let adapted = self
            .runtime()
            .resolver()
            .adapt(&typed, &call_type.insert_param(0, receiver))
            .map_err(|_| wrong_type())?;
        Ok(adapted.invoke(&argv)?)
    }

    fn access_invoker(&self, mode: AccessMode, ty: &MethodType) -> AccessResult<Executable> {
        let signature = ty.basic_signature().with_leading(BasicType::L);
        let key = ShapeKey::with_op(signature, Kind::AccessInvoker, OpId::mode(mode));
        Ok(self.runtime().resolver().resolve_key(&key)?)
    }

    /// `mode` as a standalone executable of type
    /// [`access_mode_type`](Self::access_mode_type). For an unsupported
    /// mode the failure is reported when the executable is called.
    pub fn to_executable_handle(&self, mode: AccessMode) -> AccessResult<Executable> {
        let runtime = self.runtime();
        let (target, receiver) = if self.is_access_mode_supported(mode) {
            (self.get_executable(mode)?, self.as_direct()?.to_value())
        } else {
            (self.access_invoker(mode, &self.access_mode_type(mode))?, self.to_value())
        };
        Ok(runtime.specializer().bind(runtime.resolver(), &target, vec![receiver])?)
    }

    pub fn to_value(&self) -> Value {
        Value::object(Object::Opaque(Opaque::new(ACCESSOR_CLASS, Arc::new(self.clone()))))
    }

    pub fn from_value(value: &Value) -> Result<Accessor, InvokeError> {
        match value {
            Value::Ref(None) => Err(InvokeError::NullPointer("accessor".to_string())),
            Value::Ref(Some(obj)) => match obj.as_ref() {
                Object::Opaque(o) => o
                    .downcast::<Accessor>()
                    .cloned()
                    .ok_or_else(|| InvokeError::type_mismatch(ACCESSOR_CLASS, o.class())),
                other => Err(InvokeError::type_mismatch(ACCESSOR_CLASS, other.type_name())),
            },
            other => Err(InvokeError::type_mismatch(ACCESSOR_CLASS, other.type_name())),
        }
    }
}

impl fmt::Debug for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accessor")
            .field("name", &self.name())
            .field("kind", &self.kind())
            .field("value_type", &self.value_type().to_string())
            .field("exact", &self.exact)
            .finish()
    }
}
