// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Finding where a named field lives.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use quill_form::{ClassInfo, FieldInfo};

use crate::error::{AccessError, AccessResult};
use crate::scope::Scope;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldRef {
    pub owner: String,
    pub name: String,
}

impl FieldRef {
    pub fn new(owner: &str, name: &str) -> Self {
        FieldRef { owner: owner.to_string(), name: name.to_string() }
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.owner, self.name)
    }
}

#[derive(Debug, Clone)]
pub enum Location {
    Instance { class: Arc<ClassInfo>, field: FieldInfo },
    Static { scope: Arc<Scope>, field: FieldInfo },
}

impl Location {
    pub fn field(&self) -> &FieldInfo {
        match self {
            Location::Instance { field, .. } | Location::Static { field, .. } => field,
        }
    }
}

pub trait LocationResolver: Send + Sync {
    /// The scope that owns `field`.
    fn scope(&self, field: &FieldRef) -> AccessResult<Arc<Scope>>;

    /// Where `field` lives, once its scope is ready. Static fields of an
    /// uninitialized scope give `ScopeNotYetInitialized`.
    fn resolve(&self, field: &FieldRef) -> AccessResult<Location>;

    /// Where `field` lives, whatever the state of its scope.
    fn locate(&self, field: &FieldRef) -> AccessResult<Location>;
}

/// The classes a runtime knows about, each with its scope.
#[derive(Default)]
pub struct ClassTable {
    scopes: RwLock<HashMap<String, Arc<Scope>>>,
}

impl ClassTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `scope` under its class name, replacing any earlier class
    /// of that name.
    pub fn define(&self, scope: Scope) -> Arc<Scope> {
        let scope = Arc::new(scope);
        self.scopes
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(scope.name().to_string(), scope.clone());
        scope
    }

    pub fn lookup(&self, class: &str) -> Option<Arc<Scope>> {
        self.scopes.read().unwrap_or_else(PoisonError::into_inner).get(class).cloned()
    }

    pub fn class(&self, class: &str) -> Option<Arc<ClassInfo>> {
        self.lookup(class).map(|scope| scope.class().clone())
    }
}

impl LocationResolver for ClassTable {
    fn scope(&self, field: &FieldRef) -> AccessResult<Arc<Scope>> {
        self.lookup(&field.owner).ok_or_else(|| AccessError::NoSuchClass(field.owner.clone()))
    }

    fn resolve(&self, field: &FieldRef) -> AccessResult<Location> {
        let location = self.locate(field)?;
        if let Location::Static { scope, .. } = &location {
            if !scope.is_ready() {
                return Err(AccessError::ScopeNotYetInitialized(scope.name().to_string()));
            }
        }
        Ok(location)
    }

    fn locate(&self, field: &FieldRef) -> AccessResult<Location> {
        let scope = self.scope(field)?;
        let info = scope.class().field(&field.name).cloned().ok_or_else(|| AccessError::NoSuchField {
            owner: field.owner.clone(),
            field: field.name.clone(),
        })?;
        Ok(if info.is_static {
            Location::Static { scope, field: info }
        } else {
            Location::Instance { class: scope.class().clone(), field: info }
        })
    }
}
