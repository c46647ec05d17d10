// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Static dispatch tables and the per-mode executables built from them.

use quill_form::{AccessMode, AccessType, Invocable, InvokeError, MethodType, Value};

use crate::accessor::Accessor;
use crate::storage::{self, Storage};

/// Implementation of one access mode over one kind of storage. Receives the
/// coordinates followed by the mode's value arguments.
pub type ModeFn = fn(&Storage, AccessMode, &[Value]) -> Result<Value, InvokeError>;

pub struct DispatchTable {
    owner: &'static str,
    entries: [ModeFn; AccessMode::COUNT],
}

impl DispatchTable {
    /// Plain reads go to `read`; every mode that may write goes to `update`.
    const fn split(owner: &'static str, read: ModeFn, update: ModeFn) -> DispatchTable {
        let mut entries = [update; AccessMode::COUNT];
        let mut i = 0;
        while i < AccessMode::COUNT {
            if matches!(AccessMode::ALL[i].access_type(), AccessType::Get) {
                entries[i] = read;
            }
            i += 1;
        }
        DispatchTable { owner, entries }
    }

    pub fn owner(&self) -> &'static str {
        self.owner
    }

    pub fn entry(&self, mode: AccessMode) -> ModeFn {
        self.entries[mode.ordinal()]
    }
}

pub static INSTANCE_FIELD: DispatchTable = DispatchTable::split(
    "FieldInstanceReadWrite",
    storage::read_instance_field,
    storage::update_instance_field,
);
pub static STATIC_FIELD: DispatchTable =
    DispatchTable::split("FieldStaticReadWrite", storage::read_static_field, storage::update_static_field);
pub static ARRAY_ELEMENT: DispatchTable =
    DispatchTable::split("ArrayElement", storage::read_array_element, storage::update_array_element);
pub static MEMORY: DispatchTable = DispatchTable::split("MemoryAccess", storage::read_memory, storage::update_memory);

static TABLES: [&DispatchTable; 4] = [&INSTANCE_FIELD, &STATIC_FIELD, &ARRAY_ELEMENT, &MEMORY];

/// The entry for mode `method_name` in the table of `owner`.
pub fn lookup(owner: &str, method_name: &str) -> Option<ModeFn> {
    let table = TABLES.iter().find(|t| t.owner == owner)?;
    AccessMode::from_method_name(method_name).map(|mode| table.entry(mode))
}

pub(crate) fn table_for(storage: &Storage) -> &'static DispatchTable {
    match storage {
        Storage::InstanceField { .. } => &INSTANCE_FIELD,
        Storage::StaticField { .. } => &STATIC_FIELD,
        Storage::ArrayElement { .. } => &ARRAY_ELEMENT,
        Storage::Memory(_) => &MEMORY,
    }
}

/// A mode executable. Its first argument is the direct receiver, whose
/// storage the entry runs against.
pub(crate) struct ModeExecutable {
    pub(crate) name: String,
    pub(crate) mode: AccessMode,
    pub(crate) ty: MethodType,
    pub(crate) entry: ModeFn,
}

impl Invocable for ModeExecutable {
    fn name(&self) -> &str {
        &self.name
    }

    fn method_type(&self) -> &MethodType {
        &self.ty
    }

    fn call(&self, args: &[Value]) -> Result<Value, InvokeError> {
        let (receiver, rest) = args
            .split_first()
            .ok_or_else(|| InvokeError::Internal(format!("`{}` called without a receiver", self.name)))?;
        let direct = Accessor::from_value(receiver)?.as_direct()?;
        let storage = direct
            .storage()
            .ok_or_else(|| InvokeError::Internal(format!("`{}` is not a direct accessor", direct.name())))?;
        (self.entry)(storage, self.mode, rest)
    }
}
