// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Shape resolution through a full runtime.

mod common;

use std::sync::{Arc, Barrier};
use std::thread;

use quill_form::{AccessMode, Executable, Kind, OpId, Signature, Value};
use quill_resolve::ShapeKey;

use common::{define_point, new_point, runtime};

#[test]
fn two_threads_resolve_one_add() {
    let rt = runtime();
    let sig = Signature::parse("II_I").unwrap();
    let barrier = Arc::new(Barrier::new(2));
    let handles: Vec<_> = (0..2)
        .map(|_| {
            let rt = rt.clone();
            let sig = sig.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                let add = rt.resolver().resolve(&sig, Kind::Add).unwrap();
                assert_eq!(add.invoke(&[Value::Int(2), Value::Int(3)]).unwrap(), Value::Int(5));
                add
            })
        })
        .collect();
    let execs: Vec<Executable> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(Executable::ptr_eq(&execs[0], &execs[1]));
    assert_eq!(rt.resolver().cache().table(&sig).map(|t| t.len()), Some(1));
}

#[test]
fn accessors_of_one_shape_share_an_invoker() {
    let rt = runtime();
    let class = define_point(&rt);
    let x = rt.field_accessor("Point", "x").unwrap();
    let ints = rt.array_element_accessor(quill_form::ValueType::INT).unwrap();
    let p = new_point(&class);

    let get = x.access_mode_type(AccessMode::Get);
    x.invoke(AccessMode::Get, &get, &[p.clone()]).unwrap();
    x.invoke(AccessMode::Get, &get, &[p]).unwrap();

    let key = ShapeKey::with_op(Signature::parse("LL_I").unwrap(), Kind::AccessInvoker, OpId::mode(AccessMode::Get));
    let invoker = rt.resolver().cached(&key).unwrap();
    assert_eq!(invoker.name(), "invoke_vh_get_LL_I");

    // The array accessor's get is (int[], int)int: a different shape.
    let array_get = ints.access_mode_type(AccessMode::Get);
    assert_eq!(array_get.basic_signature().to_string(), "LI_I");
    assert!(rt.resolver().stats().syntheses >= 1);
}

#[test]
fn concurrent_invocations_agree() {
    let rt = runtime();
    let class = define_point(&rt);
    let x = rt.field_accessor("Point", "x").unwrap();
    let p = new_point(&class);
    let add = x.access_mode_type(AccessMode::GetAndAdd);

    let barrier = Arc::new(Barrier::new(6));
    let handles: Vec<_> = (0..6)
        .map(|_| {
            let (x, p, add, barrier) = (x.clone(), p.clone(), add.clone(), barrier.clone());
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..50 {
                    x.invoke(AccessMode::GetAndAdd, &add, &[p.clone(), Value::Int(1)]).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    let get = x.access_mode_type(AccessMode::Get);
    assert_eq!(x.invoke(AccessMode::Get, &get, &[p]).unwrap(), Value::Int(300));
}
