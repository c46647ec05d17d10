// SPDX-License-Identifier: (MIT OR Apache-2.0)

//! Executables: anything that can be invoked with a list of values.

use std::fmt;
use std::sync::Arc;

use crate::error::InvokeError;
use crate::types::MethodType;
use crate::value::{Object, Value};

/// An invocable implementation with a declared method type.
///
/// Implementations receive arguments already checked for arity; they are
/// responsible for anything finer than that.
pub trait Invocable: Send + Sync {
    fn name(&self) -> &str;
    fn method_type(&self) -> &MethodType;
    fn call(&self, args: &[Value]) -> Result<Value, InvokeError>;
}

/// Shared handle to an [`Invocable`]. Cloning is cheap; identity is the
/// pointer of the underlying implementation.
#[derive(Clone)]
pub struct Executable(Arc<dyn Invocable>);

impl Executable {
    pub fn new(inner: impl Invocable + 'static) -> Self {
        Executable(Arc::new(inner))
    }

    /// Wraps a plain closure.
    pub fn native<F>(name: &str, ty: MethodType, f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, InvokeError> + Send + Sync + 'static,
    {
        Executable::new(Native { name: name.to_string(), ty, f })
    }

    pub fn name(&self) -> &str {
        self.0.name()
    }

    pub fn method_type(&self) -> &MethodType {
        self.0.method_type()
    }

    /// Invokes with arity checking only ("invokeBasic").
    pub fn invoke(&self, args: &[Value]) -> Result<Value, InvokeError> {
        let expected = self.method_type().arity();
        if args.len() != expected {
            return Err(InvokeError::Arity {
                name: self.name().to_string(),
                expected,
                got: args.len(),
            });
        }
        self.0.call(args)
    }

    /// Invokes only if the call site's type is exactly this executable's.
    pub fn invoke_exact(&self, call_type: &MethodType, args: &[Value]) -> Result<Value, InvokeError> {
        if call_type != self.method_type() {
            return Err(InvokeError::WrongMethodType {
                expected: self.method_type().clone(),
                actual: call_type.clone(),
            });
        }
        self.invoke(args)
    }

    pub fn ptr_eq(a: &Executable, b: &Executable) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    /// This executable as a reference value.
    pub fn to_value(&self) -> Value {
        Value::object(Object::Handle(self.clone()))
    }

    pub fn from_value(value: &Value) -> Result<Executable, InvokeError> {
        match value {
            Value::Ref(None) => Err(InvokeError::NullPointer("method handle".to_string())),
            Value::Ref(Some(obj)) => match obj.as_ref() {
                Object::Handle(exec) => Ok(exec.clone()),
                other => Err(InvokeError::type_mismatch("MethodHandle", other.type_name())),
            },
            other => Err(InvokeError::type_mismatch("MethodHandle", other.type_name())),
        }
    }
}

impl fmt::Debug for Executable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Executable({}{})", self.name(), self.method_type())
    }
}

struct Native<F> {
    name: String,
    ty: MethodType,
    f: F,
}

impl<F> Invocable for Native<F>
where
    F: Fn(&[Value]) -> Result<Value, InvokeError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn method_type(&self) -> &MethodType {
        &self.ty
    }

    fn call(&self, args: &[Value]) -> Result<Value, InvokeError> {
        (self.f)(args)
    }
}
