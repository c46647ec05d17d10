// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Raw memory segments and typed views over them.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use quill_form::{InvokeError, Object, Opaque, PrimType, Value, ValueType};

use crate::error::{AccessError, AccessResult};

/// Class name segments carry in the value world.
pub const SEGMENT_CLASS: &str = "MemorySegment";

const ALLOCATION_ALIGN: u64 = 64;

/// Hands out distinct, 64-byte aligned segment addresses so alignment
/// checks behave as they would on real allocations.
#[derive(Debug)]
pub struct AddressSpace {
    next: AtomicU64,
}

impl AddressSpace {
    pub fn new(base: u64) -> AddressSpace {
        AddressSpace { next: AtomicU64::new(base.next_multiple_of(ALLOCATION_ALIGN)) }
    }

    /// A zero-filled segment of `size` bytes.
    pub fn allocate(&self, size: usize) -> Arc<MemorySegment> {
        let span = (size as u64).max(1).next_multiple_of(ALLOCATION_ALIGN);
        let address = self.next.fetch_add(span, Ordering::Relaxed);
        MemorySegment::at(address, vec![0; size])
    }
}

impl Default for AddressSpace {
    fn default() -> Self {
        AddressSpace::new(0x1000)
    }
}

/// A contiguous block of bytes at a fixed address. Every access locks the
/// whole segment, so read-modify-write modes are atomic.
pub struct MemorySegment {
    address: u64,
    bytes: Mutex<Vec<u8>>,
    read_only: bool,
}

impl MemorySegment {
    /// A segment at a caller-chosen address.
    pub fn at(address: u64, bytes: Vec<u8>) -> Arc<MemorySegment> {
        Arc::new(MemorySegment { address, bytes: Mutex::new(bytes), read_only: false })
    }

    /// A copy of this segment's contents that rejects writes.
    pub fn read_only_copy(&self) -> Arc<MemorySegment> {
        Arc::new(MemorySegment { address: self.address, bytes: Mutex::new(self.to_vec()), read_only: true })
    }

    pub fn address(&self) -> u64 {
        self.address
    }

    pub fn size(&self) -> u64 {
        self.lock().len() as u64
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.lock().clone()
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, Vec<u8>> {
        self.bytes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Address of `len` bytes at `offset`, after checking they lie inside
    /// the segment.
    pub fn check_access(&self, offset: u64, len: usize) -> Result<u64, InvokeError> {
        let size = self.size();
        match offset.checked_add(len as u64) {
            Some(end) if end <= size => Ok(self.address + offset),
            _ => Err(InvokeError::OutOfBounds { offset, len, size }),
        }
    }

    pub fn to_value(self: &Arc<Self>) -> Value {
        Value::object(Object::Opaque(Opaque::new(SEGMENT_CLASS, Arc::new(self.clone()))))
    }

    pub fn from_value(value: &Value) -> Result<Arc<MemorySegment>, InvokeError> {
        match value {
            Value::Ref(None) => Err(InvokeError::NullPointer("memory segment".to_string())),
            Value::Ref(Some(obj)) => match obj.as_ref() {
                Object::Opaque(o) => o
                    .downcast::<Arc<MemorySegment>>()
                    .cloned()
                    .ok_or_else(|| InvokeError::type_mismatch(SEGMENT_CLASS, o.class())),
                other => Err(InvokeError::type_mismatch(SEGMENT_CLASS, other.type_name())),
            },
            other => Err(InvokeError::type_mismatch(SEGMENT_CLASS, other.type_name())),
        }
    }
}

impl fmt::Debug for MemorySegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MemorySegment({:#x}, {} bytes)", self.address, self.size())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    #[default]
    Little,
    Big,
}

impl ByteOrder {
    pub fn native() -> ByteOrder {
        if cfg!(target_endian = "big") {
            ByteOrder::Big
        } else {
            ByteOrder::Little
        }
    }
}

/// How a memory accessor maps coordinates to an address.
///
/// The byte offset is `offset` when fixed, otherwise a `long` coordinate,
/// plus one `long` index coordinate per stride.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentView {
    pub carrier: PrimType,
    pub order: ByteOrder,
    pub offset: Option<u64>,
    pub alignment_mask: u64,
    pub strides: Vec<u64>,
}

impl SegmentView {
    /// A naturally aligned view with a variable offset coordinate.
    pub fn new(carrier: PrimType) -> SegmentView {
        SegmentView {
            carrier,
            order: ByteOrder::native(),
            offset: None,
            alignment_mask: carrier.byte_size().saturating_sub(1) as u64,
            strides: Vec::new(),
        }
    }

    pub fn with_order(mut self, order: ByteOrder) -> SegmentView {
        self.order = order;
        self
    }

    pub fn with_fixed_offset(mut self, offset: u64) -> SegmentView {
        self.offset = Some(offset);
        self
    }

    pub fn with_alignment_mask(mut self, mask: u64) -> SegmentView {
        self.alignment_mask = mask;
        self
    }

    pub fn with_stride(mut self, stride: u64) -> SegmentView {
        self.strides.push(stride);
        self
    }

    /// Whether every access is naturally aligned for the carrier.
    pub fn is_aligned(&self) -> bool {
        let natural = self.carrier.byte_size().saturating_sub(1) as u64;
        self.alignment_mask & natural == natural
    }

    pub(crate) fn validate(&self) -> AccessResult<()> {
        match self.carrier {
            PrimType::Void | PrimType::Boolean => {
                Err(AccessError::Layout(format!("no memory carrier for {}", self.carrier.name())))
            }
            _ if self.alignment_mask.checked_add(1).is_some_and(u64::is_power_of_two) => Ok(()),
            _ => Err(AccessError::Layout(format!("alignment mask {:#x} is not 2^n - 1", self.alignment_mask))),
        }
    }

    pub fn coordinates(&self) -> Vec<ValueType> {
        let mut coords = vec![ValueType::class(SEGMENT_CLASS)];
        if self.offset.is_none() {
            coords.push(ValueType::LONG);
        }
        coords.extend(self.strides.iter().map(|_| ValueType::LONG));
        coords
    }

    /// Byte offset addressed by `coords` (the coordinates after the segment).
    pub(crate) fn offset_of(&self, coords: &[Value]) -> Result<u64, InvokeError> {
        let mut rest = coords.iter();
        let mut offset = match self.offset {
            Some(fixed) => fixed,
            None => non_negative(rest.next())?,
        };
        for stride in &self.strides {
            let index = non_negative(rest.next())?;
            offset = index
                .checked_mul(*stride)
                .and_then(|step| offset.checked_add(step))
                .ok_or(InvokeError::OutOfBounds { offset: u64::MAX, len: 0, size: 0 })?;
        }
        Ok(offset)
    }
}

fn non_negative(value: Option<&Value>) -> Result<u64, InvokeError> {
    match value {
        Some(Value::Long(v)) if *v >= 0 => Ok(*v as u64),
        Some(Value::Long(v)) => Err(InvokeError::IndexOutOfBounds { index: *v, len: 0 }),
        Some(other) => Err(InvokeError::type_mismatch("long", other.type_name())),
        None => Err(InvokeError::Internal("missing memory coordinate".to_string())),
    }
}

/// Decodes a carrier value from `bytes`.
pub(crate) fn read(bytes: &[u8], carrier: PrimType, order: ByteOrder) -> Value {
    macro_rules! decode {
        ($ty:ty) => {{
            let mut raw = [0u8; std::mem::size_of::<$ty>()];
            raw.copy_from_slice(&bytes[..std::mem::size_of::<$ty>()]);
            match order {
                ByteOrder::Little => <$ty>::from_le_bytes(raw),
                ByteOrder::Big => <$ty>::from_be_bytes(raw),
            }
        }};
    }
    match carrier {
        PrimType::Byte => Value::Int(decode!(i8) as i32),
        PrimType::Short => Value::Int(decode!(i16) as i32),
        PrimType::Char => Value::Int(decode!(u16) as i32),
        PrimType::Int => Value::Int(decode!(i32)),
        PrimType::Long => Value::Long(decode!(i64)),
        PrimType::Float => Value::Float(f32::from_bits(decode!(u32))),
        PrimType::Double => Value::Double(f64::from_bits(decode!(u64))),
        PrimType::Boolean => Value::Int((bytes[0] & 1) as i32),
        PrimType::Void => Value::Void,
    }
}

/// Encodes `value` as a carrier value into `bytes`.
pub(crate) fn write(bytes: &mut [u8], carrier: PrimType, order: ByteOrder, value: &Value) {
    macro_rules! encode {
        ($v:expr) => {{
            let v = $v;
            let raw = match order {
                ByteOrder::Little => v.to_le_bytes(),
                ByteOrder::Big => v.to_be_bytes(),
            };
            bytes[..raw.len()].copy_from_slice(&raw);
        }};
    }
    match (carrier, value) {
        (PrimType::Byte | PrimType::Boolean, Value::Int(v)) => encode!(*v as i8),
        (PrimType::Short, Value::Int(v)) => encode!(*v as i16),
        (PrimType::Char, Value::Int(v)) => encode!(*v as u16),
        (PrimType::Int, Value::Int(v)) => encode!(*v),
        (PrimType::Long, Value::Long(v)) => encode!(*v),
        (PrimType::Float, Value::Float(v)) => encode!(v.to_bits()),
        (PrimType::Double, Value::Double(v)) => encode!(v.to_bits()),
        _ => {}
    }
}
