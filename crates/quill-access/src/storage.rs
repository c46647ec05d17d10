// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! The storage behind a direct accessor and how each kind is reached.

use std::sync::Arc;

use quill_form::{AccessMode, Cell, ClassInfo, FieldInfo, InvokeError, Object, Value, ValueType};

use crate::modes::ModeSet;
use crate::ops::{apply, check_value};
use crate::scope::Scope;
use crate::segment::{self, MemorySegment, SegmentView};

#[derive(Debug, Clone)]
pub enum Storage {
    InstanceField { class: Arc<ClassInfo>, field: FieldInfo },
    StaticField { scope: Arc<Scope>, field: FieldInfo },
    ArrayElement { elem: ValueType },
    Memory(SegmentView),
}

impl Storage {
    pub fn value_type(&self) -> ValueType {
        match self {
            Storage::InstanceField { field, .. } | Storage::StaticField { field, .. } => field.ty.clone(),
            Storage::ArrayElement { elem } => elem.clone(),
            Storage::Memory(view) => ValueType::Prim(view.carrier),
        }
    }

    pub fn coordinates(&self) -> Vec<ValueType> {
        match self {
            Storage::InstanceField { class, .. } => vec![ValueType::class(class.name())],
            Storage::StaticField { .. } => Vec::new(),
            Storage::ArrayElement { elem } => vec![ValueType::array(elem.clone()), ValueType::INT],
            Storage::Memory(view) => view.coordinates(),
        }
    }

    pub fn modes(&self) -> ModeSet {
        match self {
            Storage::InstanceField { field, .. } | Storage::StaticField { field, .. } => {
                ModeSet::for_field(&field.ty, field.is_final)
            }
            Storage::ArrayElement { elem } => ModeSet::for_field(elem, false),
            Storage::Memory(view) => ModeSet::for_memory(view.carrier, view.is_aligned()),
        }
    }

    /// A readable name for diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Storage::InstanceField { class, field } => format!("{}.{}", class.name(), field.name),
            Storage::StaticField { scope, field } => format!("static {}.{}", scope.name(), field.name),
            Storage::ArrayElement { elem } => format!("{elem}[]"),
            Storage::Memory(view) => format!("memory {} ({:?})", view.carrier.name(), view.order),
        }
    }
}

fn mismatched(storage: &Storage) -> InvokeError {
    InvokeError::Internal(format!("dispatch entry does not handle {}", storage.describe()))
}

fn checked_values(ty: &ValueType, values: &[Value]) -> Result<Vec<Value>, InvokeError> {
    values.iter().map(|v| check_value(ty, v)).collect()
}

fn split_coordinate<'a>(args: &'a [Value], what: &str) -> Result<(&'a Value, &'a [Value]), InvokeError> {
    args.split_first()
        .ok_or_else(|| InvokeError::Internal(format!("missing {what} coordinate")))
}

fn object<'a>(value: &'a Value, expected: &str) -> Result<&'a Object, InvokeError> {
    match value {
        Value::Ref(None) => Err(InvokeError::NullPointer(expected.to_string())),
        Value::Ref(Some(obj)) => Ok(obj.as_ref()),
        other => Err(InvokeError::type_mismatch(expected, other.type_name())),
    }
}

fn instance_slot<'a>(
    class: &ClassInfo,
    field: &FieldInfo,
    args: &'a [Value],
) -> Result<(&'a Cell, &'a [Value]), InvokeError> {
    let (receiver, values) = split_coordinate(args, "receiver")?;
    let instance = match object(receiver, class.name())? {
        Object::Instance(i) if i.class().is_subclass_of(class.name()) => i,
        other => return Err(InvokeError::type_mismatch(class.name(), other.type_name())),
    };
    let cell = instance
        .cell(field.slot)
        .ok_or_else(|| InvokeError::Internal(format!("{} has no slot {}", instance.class().name(), field.slot)))?;
    Ok((cell, values))
}

fn static_slot<'a>(scope: &'a Scope, field: &FieldInfo) -> Result<&'a Cell, InvokeError> {
    scope
        .static_cell(field.slot)
        .ok_or_else(|| InvokeError::Internal(format!("{} has no static slot {}", scope.name(), field.slot)))
}

fn array_slot<'a>(elem: &ValueType, args: &'a [Value]) -> Result<(&'a Cell, &'a [Value]), InvokeError> {
    let array_type = ValueType::array(elem.clone());
    let (array, rest) = split_coordinate(args, "array")?;
    let array = match object(array, &array_type.to_string())? {
        Object::Array(a) if a.elem() == elem => a,
        other => return Err(InvokeError::type_mismatch(&array_type, other.type_name())),
    };
    let (index, values) = split_coordinate(rest, "index")?;
    let index = index.as_int().ok_or_else(|| InvokeError::type_mismatch("int", index.type_name()))?;
    let cell = usize::try_from(index)
        .ok()
        .and_then(|i| array.cell(i))
        .ok_or(InvokeError::IndexOutOfBounds { index: index as i64, len: array.len() })?;
    Ok((cell, values))
}

/// Bounds, then alignment. Yields the segment, the checked byte offset and
/// the value arguments.
fn memory_window<'a>(
    view: &SegmentView,
    args: &'a [Value],
) -> Result<(Arc<MemorySegment>, usize, &'a [Value]), InvokeError> {
    let (segment, rest) = split_coordinate(args, "segment")?;
    let segment = MemorySegment::from_value(segment)?;
    let coordinate_count = view.coordinates().len() - 1;
    if rest.len() < coordinate_count {
        return Err(InvokeError::Internal("missing memory coordinate".to_string()));
    }
    let (coords, values) = rest.split_at(coordinate_count);

    let offset = view.offset_of(coords)?;
    let address = segment.check_access(offset, view.carrier.byte_size())?;
    if address & view.alignment_mask != 0 {
        return Err(InvokeError::MisalignedAccess { address, mask: view.alignment_mask });
    }
    Ok((segment, offset as usize, values))
}

pub(crate) fn read_instance_field(storage: &Storage, _mode: AccessMode, args: &[Value]) -> Result<Value, InvokeError> {
    let Storage::InstanceField { class, field } = storage else {
        return Err(mismatched(storage));
    };
    let (cell, _) = instance_slot(class, field, args)?;
    Ok(cell.load())
}

pub(crate) fn update_instance_field(storage: &Storage, mode: AccessMode, args: &[Value]) -> Result<Value, InvokeError> {
    let Storage::InstanceField { class, field } = storage else {
        return Err(mismatched(storage));
    };
    let (cell, values) = instance_slot(class, field, args)?;
    let values = checked_values(&field.ty, values)?;
    cell.update(|current| apply(mode, &field.ty, current, &values))
}

pub(crate) fn read_static_field(storage: &Storage, _mode: AccessMode, _args: &[Value]) -> Result<Value, InvokeError> {
    let Storage::StaticField { scope, field } = storage else {
        return Err(mismatched(storage));
    };
    Ok(static_slot(scope, field)?.load())
}

pub(crate) fn update_static_field(storage: &Storage, mode: AccessMode, args: &[Value]) -> Result<Value, InvokeError> {
    let Storage::StaticField { scope, field } = storage else {
        return Err(mismatched(storage));
    };
    let cell = static_slot(scope, field)?;
    let values = checked_values(&field.ty, args)?;
    cell.update(|current| apply(mode, &field.ty, current, &values))
}

pub(crate) fn read_array_element(storage: &Storage, _mode: AccessMode, args: &[Value]) -> Result<Value, InvokeError> {
    let Storage::ArrayElement { elem } = storage else {
        return Err(mismatched(storage));
    };
    let (cell, _) = array_slot(elem, args)?;
    Ok(cell.load())
}

pub(crate) fn update_array_element(storage: &Storage, mode: AccessMode, args: &[Value]) -> Result<Value, InvokeError> {
    let Storage::ArrayElement { elem } = storage else {
        return Err(mismatched(storage));
    };
    let (cell, values) = array_slot(elem, args)?;
    let values = checked_values(elem, values)?;
    cell.update(|current| apply(mode, elem, current, &values))
}

pub(crate) fn read_memory(storage: &Storage, _mode: AccessMode, args: &[Value]) -> Result<Value, InvokeError> {
    let Storage::Memory(view) = storage else {
        return Err(mismatched(storage));
    };
    let (segment, start, _) = memory_window(view, args)?;
    let bytes = segment.lock();
    Ok(segment::read(&bytes[start..start + view.carrier.byte_size()], view.carrier, view.order))
}

/// Every mode that writes. Read-only segments reject them all, including
/// a compare-and-set whose comparison fails.
pub(crate) fn update_memory(storage: &Storage, mode: AccessMode, args: &[Value]) -> Result<Value, InvokeError> {
    let Storage::Memory(view) = storage else {
        return Err(mismatched(storage));
    };
    let (segment, start, values) = memory_window(view, args)?;
    if segment.is_read_only() {
        return Err(InvokeError::ReadOnly(format!("segment at {:#x}", segment.address())));
    }

    let ty = ValueType::Prim(view.carrier);
    let values = checked_values(&ty, values)?;
    let mut bytes = segment.lock();
    let window = &mut bytes[start..start + view.carrier.byte_size()];
    let mut current = segment::read(window, view.carrier, view.order);
    let result = apply(mode, &ty, &mut current, &values)?;
    segment::write(window, view.carrier, view.order, &current);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_form::{AccessType, ArrayObject, FieldDecl, Instance, PrimType};

    fn instance_field(storage: &Storage, mode: AccessMode, args: &[Value]) -> Result<Value, InvokeError> {
        match mode.access_type() {
            AccessType::Get => read_instance_field(storage, mode, args),
            _ => update_instance_field(storage, mode, args),
        }
    }

    fn array_element(storage: &Storage, mode: AccessMode, args: &[Value]) -> Result<Value, InvokeError> {
        match mode.access_type() {
            AccessType::Get => read_array_element(storage, mode, args),
            _ => update_array_element(storage, mode, args),
        }
    }

    fn memory(storage: &Storage, mode: AccessMode, args: &[Value]) -> Result<Value, InvokeError> {
        match mode.access_type() {
            AccessType::Get => read_memory(storage, mode, args),
            _ => update_memory(storage, mode, args),
        }
    }

    fn point() -> Arc<ClassInfo> {
        Arc::new(ClassInfo::new(
            "Point",
            None,
            vec![FieldDecl::instance("x", ValueType::INT), FieldDecl::instance("label", ValueType::STRING)],
        ))
    }

    fn field(class: &Arc<ClassInfo>, name: &str) -> Storage {
        Storage::InstanceField { class: class.clone(), field: class.field(name).unwrap().clone() }
    }

    #[test]
    fn instance_fields() {
        let class = point();
        let p = Value::object(Object::Instance(Instance::new(class.clone())));
        let x = field(&class, "x");
        assert_eq!(x.coordinates(), vec![ValueType::class("Point")]);
        instance_field(&x, AccessMode::Set, &[p.clone(), Value::Int(4)]).unwrap();
        assert_eq!(instance_field(&x, AccessMode::GetAndAdd, &[p.clone(), Value::Int(3)]).unwrap(), Value::Int(4));
        assert_eq!(instance_field(&x, AccessMode::GetVolatile, &[p.clone()]).unwrap(), Value::Int(7));

        assert!(matches!(instance_field(&x, AccessMode::Get, &[Value::NULL]), Err(InvokeError::NullPointer(_))));
        assert!(matches!(
            instance_field(&x, AccessMode::Get, &[Value::string("p")]),
            Err(InvokeError::TypeMismatch { .. })
        ));
        let label = field(&class, "label");
        assert!(matches!(
            instance_field(&label, AccessMode::Set, &[p, Value::Int(1)]),
            Err(InvokeError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn array_elements() {
        let storage = Storage::ArrayElement { elem: ValueType::LONG };
        let array = Value::object(Object::Array(ArrayObject::new(ValueType::LONG, 3)));
        array_element(&storage, AccessMode::SetRelease, &[array.clone(), Value::Int(2), Value::Long(9)]).unwrap();
        assert_eq!(array_element(&storage, AccessMode::Get, &[array.clone(), Value::Int(2)]).unwrap(), Value::Long(9));
        assert!(matches!(
            array_element(&storage, AccessMode::Get, &[array.clone(), Value::Int(3)]),
            Err(InvokeError::IndexOutOfBounds { index: 3, len: 3 })
        ));
        assert!(matches!(
            array_element(&storage, AccessMode::Get, &[array, Value::Int(-1)]),
            Err(InvokeError::IndexOutOfBounds { index: -1, .. })
        ));
        let ints = Value::object(Object::Array(ArrayObject::new(ValueType::INT, 1)));
        assert!(matches!(
            array_element(&storage, AccessMode::Get, &[ints, Value::Int(0)]),
            Err(InvokeError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn memory_checks_bounds_before_alignment() {
        let storage = Storage::Memory(SegmentView::new(PrimType::Int).with_alignment_mask(7));
        let segment = MemorySegment::at(0x2000, vec![0; 12]).to_value();
        memory(&storage, AccessMode::Set, &[segment.clone(), Value::Long(8), Value::Int(5)]).unwrap();
        assert_eq!(memory(&storage, AccessMode::Get, &[segment.clone(), Value::Long(8)]).unwrap(), Value::Int(5));
        assert!(matches!(
            memory(&storage, AccessMode::Get, &[segment.clone(), Value::Long(4)]),
            Err(InvokeError::MisalignedAccess { address: 0x2004, mask: 7 })
        ));
        assert!(matches!(
            memory(&storage, AccessMode::Get, &[segment, Value::Long(12)]),
            Err(InvokeError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn read_only_segments_reject_writes() {
        let storage = Storage::Memory(SegmentView::new(PrimType::Byte));
        let segment = MemorySegment::at(0x40, vec![7]).read_only_copy().to_value();
        assert_eq!(memory(&storage, AccessMode::Get, &[segment.clone(), Value::Long(0)]).unwrap(), Value::Int(7));
        assert!(matches!(
            memory(&storage, AccessMode::Set, &[segment, Value::Long(0), Value::Int(1)]),
            Err(InvokeError::ReadOnly(_))
        ));
    }
}
