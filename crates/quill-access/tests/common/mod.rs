// SPDX-License-Identifier: (MIT OR Apache-2.0)
#![allow(dead_code)]

use std::sync::Arc;

use quill_access::{Runtime, RuntimeConfig, Scope};
use quill_form::{ClassInfo, FieldDecl, Instance, Object, Value, ValueType};

pub fn runtime() -> Arc<Runtime> {
    Runtime::new(RuntimeConfig::default())
}

/// `Point { int x; String name; final long id; }`, already initialized.
pub fn define_point(runtime: &Runtime) -> Arc<ClassInfo> {
    let class = Arc::new(ClassInfo::new(
        "Point",
        None,
        vec![
            FieldDecl::instance("x", ValueType::INT),
            FieldDecl::instance("name", ValueType::STRING),
            FieldDecl::instance("id", ValueType::LONG).final_(),
        ],
    ));
    runtime.define_class(Scope::ready(class.clone()));
    class
}

pub fn new_point(class: &Arc<ClassInfo>) -> Value {
    Value::object(Object::Instance(Instance::new(class.clone())))
}

/// `Counter { static long total = 100; static final int limit = 7; }`,
/// not yet initialized.
pub fn define_counter(runtime: &Runtime) -> Arc<Scope> {
    let class = Arc::new(ClassInfo::new(
        "Counter",
        None,
        vec![
            FieldDecl::of_static("total", ValueType::LONG),
            FieldDecl::of_static("limit", ValueType::INT).final_(),
        ],
    ));
    runtime.define_class(Scope::new(
        class,
        Some(Box::new(|scope: &Scope| -> Result<(), String> {
            scope.static_field("total").ok_or("no total")?.store(Value::Long(100));
            scope.static_field("limit").ok_or("no limit")?.store(Value::Int(7));
            Ok(())
        })),
    ))
}
