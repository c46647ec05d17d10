// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Accessors that defer initialization of their scope until first use.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError, RwLock};

use quill_form::{AccessMode, Executable, Invocable, InvokeError, MethodType, Value};
use tracing::debug;

use crate::accessor::Accessor;
use crate::error::AccessResult;
use crate::location::{FieldRef, LocationResolver};
use crate::modes::ModeSet;
use crate::runtime::Runtime;
use crate::scope::Scope;

/// State of a lazily initializing accessor: a direct target over static
/// storage whose scope may not have run yet.
pub(crate) struct LazyState {
    scope: Arc<Scope>,
    target: Accessor,
    ready: AtomicBool,
    /// Initializing wrappers until ready; the target's executables after.
    executables: RwLock<Vec<Option<Executable>>>,
}

impl LazyState {
    pub(crate) fn new(scope: Arc<Scope>, target: Accessor) -> LazyState {
        LazyState {
            scope,
            target,
            ready: AtomicBool::new(false),
            executables: RwLock::new(vec![None; AccessMode::COUNT]),
        }
    }

    pub(crate) fn target(&self) -> &Accessor {
        &self.target
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Flips to ready and swaps every cached wrapper for the target's
    /// executable. Only the thread that wins the flip rewrites.
    fn mark_ready(&self) {
        let mut executables = self.executables.write().unwrap_or_else(PoisonError::into_inner);
        if self.ready.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_err() {
            return;
        }
        for (ordinal, slot) in executables.iter_mut().enumerate() {
            if slot.is_some() {
                *slot = AccessMode::from_ordinal(ordinal).and_then(|mode| self.target.get_executable(mode).ok());
            }
        }
        debug!(scope = self.scope.name(), accessor = self.target.name(), "lazy accessor ready");
    }

    fn ensure_initialized(&self) -> Result<(), InvokeError> {
        if self.is_ready() {
            return Ok(());
        }
        self.scope.initialize()?;
        self.mark_ready();
        Ok(())
    }

    pub(crate) fn get_executable(self: &Arc<Self>, mode: AccessMode, ty: MethodType) -> AccessResult<Executable> {
        if !self.is_ready() && self.scope.is_ready() {
            self.mark_ready();
        }
        let slot = mode.ordinal();
        if let Some(exec) = &self.executables.read().unwrap_or_else(PoisonError::into_inner)[slot] {
            return Ok(exec.clone());
        }
        if self.is_ready() {
            return self.target.get_executable(mode);
        }

        let mut executables = self.executables.write().unwrap_or_else(PoisonError::into_inner);
        if self.is_ready() {
            drop(executables);
            return self.target.get_executable(mode);
        }
        let wrapper = executables[slot].get_or_insert_with(|| {
            Executable::new(Initializing {
                name: format!("{}.{}", self.target.name(), mode.method_name()),
                mode,
                ty,
                state: self.clone(),
            })
        });
        Ok(wrapper.clone())
    }
}

/// Runs the scope initializer, then the target's executable. Keeps the
/// state alive for handles that outlive their accessor; the slot holding
/// this wrapper is released by `mark_ready`.
struct Initializing {
    name: String,
    mode: AccessMode,
    ty: MethodType,
    state: Arc<LazyState>,
}

impl Invocable for Initializing {
    fn name(&self) -> &str {
        &self.name
    }

    fn method_type(&self) -> &MethodType {
        &self.ty
    }

    fn call(&self, args: &[Value]) -> Result<Value, InvokeError> {
        self.state.ensure_initialized()?;
        self.state.target.get_executable(self.mode)?.invoke(args)
    }
}

/// A static field whose location is only resolved on first use.
pub(crate) struct LazyStatic {
    field: FieldRef,
    resolver: Arc<dyn LocationResolver>,
    modes: ModeSet,
    delegate: OnceLock<Accessor>,
    lock: Mutex<()>,
}

impl LazyStatic {
    pub(crate) fn new(field: FieldRef, resolver: Arc<dyn LocationResolver>, modes: ModeSet) -> LazyStatic {
        LazyStatic { field, resolver, modes, delegate: OnceLock::new(), lock: Mutex::new(()) }
    }

    pub(crate) fn modes(&self) -> ModeSet {
        self.modes
    }

    /// The direct accessor for the field, initializing its scope the first
    /// time through.
    pub(crate) fn delegate(&self, runtime: &Arc<Runtime>) -> AccessResult<Accessor> {
        if let Some(delegate) = self.delegate.get() {
            return Ok(delegate.clone());
        }
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(delegate) = self.delegate.get() {
            return Ok(delegate.clone());
        }
        let scope = self.resolver.scope(&self.field)?;
        scope.initialize()?;
        let location = self.resolver.resolve(&self.field)?;
        let direct = runtime.direct_accessor(location);
        debug!(field = %self.field, "resolved lazy static field");
        Ok(self.delegate.get_or_init(|| direct).clone())
    }
}
