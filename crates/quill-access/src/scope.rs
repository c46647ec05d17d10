// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Initialization scopes: the owners of static storage.

use std::fmt;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use quill_form::{Cell, ClassInfo, InvokeError};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeState {
    Uninitialized,
    Initializing,
    Ready,
    Erroneous,
}

impl ScopeState {
    fn from_u8(raw: u8) -> ScopeState {
        match raw {
            0 => ScopeState::Uninitialized,
            1 => ScopeState::Initializing,
            2 => ScopeState::Ready,
            _ => ScopeState::Erroneous,
        }
    }
}

/// Runs once, with the static cells zeroed, to give them their initial values.
pub type Initializer = Box<dyn Fn(&Scope) -> Result<(), String> + Send + Sync>;

/// A class's static storage plus the initializer that must run before
/// that storage is handed out.
pub struct Scope {
    class: Arc<ClassInfo>,
    statics: Vec<Cell>,
    initializer: Option<Initializer>,
    state: AtomicU8,
    outcome: OnceLock<Result<(), String>>,
    runs: AtomicUsize,
}

impl Scope {
    pub fn new(class: Arc<ClassInfo>, initializer: Option<Initializer>) -> Scope {
        let statics = class.static_fields().map(|f| Cell::new(f.ty.basic_type().zero())).collect();
        Scope {
            class,
            statics,
            initializer,
            state: AtomicU8::new(ScopeState::Uninitialized as u8),
            outcome: OnceLock::new(),
            runs: AtomicUsize::new(0),
        }
    }

    /// A scope with nothing to run, already `Ready`.
    pub fn ready(class: Arc<ClassInfo>) -> Scope {
        let scope = Scope::new(class, None);
        let _ = scope.outcome.set(Ok(()));
        scope.state.store(ScopeState::Ready as u8, Ordering::Release);
        scope
    }

    pub fn class(&self) -> &Arc<ClassInfo> {
        &self.class
    }

    pub fn name(&self) -> &str {
        self.class.name()
    }

    pub fn state(&self) -> ScopeState {
        ScopeState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_ready(&self) -> bool {
        self.state() == ScopeState::Ready
    }

    /// How many times the initializer has run: zero or one.
    pub fn initializer_runs(&self) -> usize {
        self.runs.load(Ordering::Relaxed)
    }

    pub fn static_cell(&self, slot: usize) -> Option<&Cell> {
        self.statics.get(slot)
    }

    /// Cell of the static field `name`, for initializers.
    pub fn static_field(&self, name: &str) -> Option<&Cell> {
        let field = self.class.field(name).filter(|f| f.is_static)?;
        self.static_cell(field.slot)
    }

    /// Runs the initializer if nobody has yet. Racing callers wait for the
    /// one that runs it; a failure is sticky.
    pub fn initialize(&self) -> Result<(), InvokeError> {
        let outcome = self.outcome.get_or_init(|| {
            self.state.store(ScopeState::Initializing as u8, Ordering::Release);
            self.runs.fetch_add(1, Ordering::Relaxed);
            let outcome = match &self.initializer {
                Some(init) => init(self),
                None => Ok(()),
            };
            let state = match &outcome {
                Ok(()) => {
                    debug!(scope = self.name(), "scope initialized");
                    ScopeState::Ready
                }
                Err(reason) => {
                    warn!(scope = self.name(), reason = %reason, "scope initialization failed");
                    ScopeState::Erroneous
                }
            };
            self.state.store(state as u8, Ordering::Release);
            outcome
        });
        outcome.clone().map_err(|reason| InvokeError::InitializationFailed {
            scope: self.name().to_string(),
            reason,
        })
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope").field("class", &self.name()).field("state", &self.state()).finish()
    }
}
