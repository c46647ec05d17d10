// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Accessors over static storage whose scope initializes on first use.

mod common;

use std::sync::{Arc, Barrier};
use std::thread;

use quill_access::{AccessError, AccessorKind, Scope, ScopeState};
use quill_form::{AccessMode, ClassInfo, Executable, FieldDecl, InvokeError, Value, ValueType};

use common::{define_counter, runtime};

#[test]
fn initializing_accessor_defers_until_first_access() {
    let rt = runtime();
    let scope = define_counter(&rt);
    let total = rt.initializing_field_accessor("Counter", "total").unwrap();
    assert_eq!(total.kind(), AccessorKind::LazyInitializing);

    assert!(total.is_access_mode_supported(AccessMode::GetAndAdd));
    let wrapper = total.get_executable(AccessMode::Get).unwrap();
    let _ = total.with_invoke_exact_behavior();
    assert_eq!(scope.initializer_runs(), 0);
    assert_eq!(scope.state(), ScopeState::Uninitialized);

    let get = total.access_mode_type(AccessMode::Get);
    assert_eq!(total.invoke(AccessMode::Get, &get, &[]).unwrap(), Value::Long(100));
    assert_eq!(scope.initializer_runs(), 1);
    assert!(scope.is_ready());

    // Requests after the transition get the target's own executable.
    let direct = total.as_direct().unwrap();
    let after = total.get_executable(AccessMode::Get).unwrap();
    assert!(Executable::ptr_eq(&after, &direct.get_executable(AccessMode::Get).unwrap()));

    // A wrapper handed out earlier keeps working.
    assert_eq!(wrapper.invoke(&[direct.to_value()]).unwrap(), Value::Long(100));
    assert_eq!(scope.initializer_runs(), 1);
}

#[test]
fn racing_first_accesses_initialize_once() {
    let rt = runtime();
    let scope = define_counter(&rt);
    let total = rt.initializing_field_accessor("Counter", "total").unwrap();
    let add = total.access_mode_type(AccessMode::GetAndAdd);

    let barrier = Arc::new(Barrier::new(8));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let total = total.clone();
            let add = add.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                total.invoke(AccessMode::GetAndAdd, &add, &[Value::Long(1)]).unwrap();
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(scope.initializer_runs(), 1);
    let get = total.access_mode_type(AccessMode::Get);
    assert_eq!(total.invoke(AccessMode::Get, &get, &[]).unwrap(), Value::Long(108));
}

#[test]
fn handles_outlive_their_initializing_accessor() {
    let rt = runtime();
    let scope = define_counter(&rt);
    let (handle, wrapper, direct) = {
        let total = rt.initializing_field_accessor("Counter", "total").unwrap();
        let handle = total.to_executable_handle(AccessMode::Get).unwrap();
        let wrapper = total.get_executable(AccessMode::GetAndAdd).unwrap();
        (handle, wrapper, total.as_direct().unwrap())
    };
    assert_eq!(scope.initializer_runs(), 0);

    assert_eq!(handle.invoke(&[]).unwrap(), Value::Long(100));
    assert_eq!(scope.initializer_runs(), 1);
    assert_eq!(wrapper.invoke(&[direct.to_value(), Value::Long(5)]).unwrap(), Value::Long(100));
    assert_eq!(handle.invoke(&[]).unwrap(), Value::Long(105));
    assert_eq!(scope.initializer_runs(), 1);
}

#[test]
fn lazy_static_resolves_its_delegate_once() {
    let rt = runtime();
    let scope = define_counter(&rt);
    let limit = rt.static_field_accessor("Counter", "limit").unwrap();
    assert_eq!(limit.kind(), AccessorKind::LazyStatic);
    assert!(limit.coordinates().is_empty());

    // Capabilities come from the field's declaration alone.
    assert!(!limit.is_access_mode_supported(AccessMode::Set));
    assert!(matches!(
        limit.get_executable(AccessMode::Set),
        Err(AccessError::UnsupportedAccessMode { .. })
    ));
    assert_eq!(scope.initializer_runs(), 0);

    let get = limit.access_mode_type(AccessMode::GetVolatile);
    assert_eq!(limit.invoke(AccessMode::GetVolatile, &get, &[]).unwrap(), Value::Int(7));
    assert_eq!(scope.initializer_runs(), 1);

    let first = limit.as_direct().unwrap();
    let second = limit.as_direct().unwrap();
    assert_eq!(first.kind(), AccessorKind::Direct);
    assert!(quill_access::Accessor::same_handle(&first, &second));

    // Once the scope is ready, new accessors are direct.
    let total = rt.static_field_accessor("Counter", "total").unwrap();
    assert_eq!(total.kind(), AccessorKind::Direct);
    assert_eq!(rt.initializing_field_accessor("Counter", "total").unwrap().kind(), AccessorKind::Direct);
}

#[test]
fn racing_lazy_static_accesses_share_one_delegate() {
    let rt = runtime();
    let scope = define_counter(&rt);
    let limit = rt.static_field_accessor("Counter", "limit").unwrap();
    assert_eq!(limit.kind(), AccessorKind::LazyStatic);
    let get = limit.access_mode_type(AccessMode::GetVolatile);

    let barrier = Arc::new(Barrier::new(8));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let limit = limit.clone();
            let get = get.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                assert_eq!(limit.invoke(AccessMode::GetVolatile, &get, &[]).unwrap(), Value::Int(7));
                limit.as_direct().unwrap()
            })
        })
        .collect();
    let delegates: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(scope.initializer_runs(), 1);
    for delegate in &delegates {
        assert!(quill_access::Accessor::same_handle(delegate, &delegates[0]));
    }
    assert!(quill_access::Accessor::same_handle(&limit.as_direct().unwrap(), &delegates[0]));
}

#[test]
fn failed_initialization_is_reported_every_time() {
    let rt = runtime();
    let class = Arc::new(ClassInfo::new("Broken", None, vec![FieldDecl::of_static("value", ValueType::INT)]));
    let scope = rt.define_class(Scope::new(
        class,
        Some(Box::new(|_: &Scope| -> Result<(), String> { Err("missing resource".to_string()) })),
    ));

    for accessor in [
        rt.static_field_accessor("Broken", "value").unwrap(),
        rt.initializing_field_accessor("Broken", "value").unwrap(),
    ] {
        let get = accessor.access_mode_type(AccessMode::Get);
        for _ in 0..2 {
            match accessor.invoke(AccessMode::Get, &get, &[]) {
                Err(AccessError::Invoke(InvokeError::InitializationFailed { scope, reason })) => {
                    assert_eq!(scope, "Broken");
                    assert_eq!(reason, "missing resource");
                }
                other => panic!("expected an initialization failure, got {other:?}"),
            }
        }
    }
    assert_eq!(scope.state(), ScopeState::Erroneous);
    assert_eq!(scope.initializer_runs(), 1);
}

#[test]
fn static_accessors_reject_instance_fields() {
    let rt = runtime();
    common::define_point(&rt);
    assert!(matches!(rt.static_field_accessor("Point", "x"), Err(AccessError::FieldKind { .. })));
    assert!(matches!(rt.initializing_field_accessor("Point", "x"), Err(AccessError::FieldKind { .. })));
    define_counter(&rt);
    assert!(matches!(rt.field_accessor("Counter", "total"), Err(AccessError::FieldKind { .. })));
}
