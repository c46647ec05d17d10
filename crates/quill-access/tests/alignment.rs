// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Raw memory access: bounds first, then alignment.

mod common;

use quill_access::{AccessError, SegmentView};
use quill_form::{AccessMode, InvokeError, PrimType, Value};

use common::runtime;

#[test]
fn mask_seven_rejects_offset_four() {
    let rt = runtime();
    let ints = rt.memory_accessor(SegmentView::new(PrimType::Int).with_alignment_mask(7)).unwrap();
    assert!(ints.is_access_mode_supported(AccessMode::GetAndAdd));
    let segment = rt.allocate(16);
    let get = ints.access_mode_type(AccessMode::Get);

    for offset in [0, 8] {
        assert_eq!(ints.invoke(AccessMode::Get, &get, &[segment.to_value(), Value::Long(offset)]).unwrap(), Value::Int(0));
    }
    match ints.invoke(AccessMode::Get, &get, &[segment.to_value(), Value::Long(4)]) {
        Err(AccessError::Invoke(InvokeError::MisalignedAccess { address, mask })) => {
            assert_eq!(address, segment.address() + 4);
            assert_eq!(mask, 7);
        }
        other => panic!("expected a misaligned access, got {other:?}"),
    }
}

#[test]
fn bounds_errors_come_first_and_unchanged() {
    let rt = runtime();
    let ints = rt.memory_accessor(SegmentView::new(PrimType::Int).with_alignment_mask(7)).unwrap();
    let segment = rt.allocate(16);
    let get = ints.access_mode_type(AccessMode::Get);
    assert!(matches!(
        ints.invoke(AccessMode::Get, &get, &[segment.to_value(), Value::Long(14)]),
        Err(AccessError::Invoke(InvokeError::OutOfBounds { offset: 14, len: 4, size: 16 }))
    ));
}

#[test]
fn unaligned_views_only_allow_plain_access() {
    let rt = runtime();
    let longs = rt.memory_accessor(SegmentView::new(PrimType::Long).with_alignment_mask(0)).unwrap();
    assert!(!longs.is_access_mode_supported(AccessMode::CompareAndSet));
    assert!(!longs.is_access_mode_supported(AccessMode::GetVolatile));

    let segment = rt.allocate(16);
    let set = longs.access_mode_type(AccessMode::Set);
    longs.invoke(AccessMode::Set, &set, &[segment.to_value(), Value::Long(3), Value::Long(-1)]).unwrap();
    let get = longs.access_mode_type(AccessMode::Get);
    assert_eq!(longs.invoke(AccessMode::Get, &get, &[segment.to_value(), Value::Long(3)]).unwrap(), Value::Long(-1));
}

#[test]
fn strided_views_index_elements() {
    let rt = runtime();
    let shorts = rt
        .memory_accessor(SegmentView::new(PrimType::Short).with_fixed_offset(2).with_stride(4))
        .unwrap();
    assert_eq!(shorts.coordinates().len(), 2);
    let segment = rt.allocate(16);
    let set = shorts.access_mode_type(AccessMode::Set);
    shorts.invoke(AccessMode::Set, &set, &[segment.to_value(), Value::Long(3), Value::Int(-3)]).unwrap();
    let get = shorts.access_mode_type(AccessMode::Get);
    assert_eq!(shorts.invoke(AccessMode::Get, &get, &[segment.to_value(), Value::Long(3)]).unwrap(), Value::Int(-3));
    assert!(matches!(
        shorts.invoke(AccessMode::Get, &get, &[segment.to_value(), Value::Long(4)]),
        Err(AccessError::Invoke(InvokeError::OutOfBounds { .. }))
    ));
}

#[test]
fn full_width_alignment_mask_is_a_layout_error() {
    let rt = runtime();
    for mask in [u64::MAX, 6] {
        match rt.memory_accessor(SegmentView::new(PrimType::Long).with_alignment_mask(mask)) {
            Err(AccessError::Layout(message)) => assert!(message.contains("alignment mask"), "{message}"),
            other => panic!("expected a layout error for mask {mask:#x}, got {other:?}"),
        }
    }
}
