//! Native function storage and call context.
//!
//! Every host function, method, property getter and operator the compiler can
//! bind to is backed by a [`NativeFn`]. The evaluator builds a [`CallContext`]
//! over the argument values and the optional instance, then invokes the
//! callable; the callable stores its result with [`CallContext::set_return`].

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::value::{FromValue, HostObject, Value};

/// Errors raised by native functions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NativeError {
    /// An argument index past the end of the argument list.
    #[error("argument index {index} out of bounds ({count} arguments)")]
    ArgumentIndexOutOfBounds { index: usize, count: usize },

    /// An argument had an unexpected runtime type.
    #[error("argument {index}: expected {expected}, got {actual}")]
    ArgumentType {
        index: usize,
        expected: &'static str,
        actual: String,
    },

    /// A method was called without an instance, or on null.
    #[error("instance is null or of the wrong type")]
    InvalidThis,

    /// Any other failure reported by host code.
    #[error("{0}")]
    Other(String),
}

impl NativeError {
    /// Failure with a free-form message.
    pub fn other(message: impl Into<String>) -> Self {
        NativeError::Other(message.into())
    }
}

/// Type-erased native function.
///
/// The callable is shared, so cloning a `NativeFn` is cheap and entries that
/// refer to the same host function share one implementation.
#[derive(Clone)]
pub struct NativeFn {
    inner: Arc<dyn NativeCallable + Send + Sync>,
}

impl NativeFn {
    /// Wrap a callable.
    pub fn new<F>(f: F) -> Self
    where
        F: NativeCallable + Send + Sync + 'static,
    {
        Self { inner: Arc::new(f) }
    }

    /// Invoke with a prepared context.
    pub fn call(&self, ctx: &mut CallContext<'_>) -> Result<(), NativeError> {
        self.inner.call(ctx)
    }

    /// Invoke with an optional instance and arguments, returning the result.
    pub fn invoke(&self, this: Option<&Value>, args: &[Value]) -> Result<Value, NativeError> {
        let mut ctx = CallContext::new(this, args);
        self.call(&mut ctx)?;
        Ok(ctx.take_return())
    }

    /// Whether two handles share the same callable.
    pub fn ptr_eq(&self, other: &NativeFn) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for NativeFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFn").finish_non_exhaustive()
    }
}

/// Trait for callable native functions.
pub trait NativeCallable {
    /// Call this function with the given context.
    fn call(&self, ctx: &mut CallContext<'_>) -> Result<(), NativeError>;
}

impl<F> NativeCallable for F
where
    F: Fn(&mut CallContext<'_>) -> Result<(), NativeError>,
{
    fn call(&self, ctx: &mut CallContext<'_>) -> Result<(), NativeError> {
        (self)(ctx)
    }
}

/// Arguments, instance and return slot for one native call.
pub struct CallContext<'a> {
    this: Option<&'a Value>,
    args: &'a [Value],
    return_value: Value,
}

impl<'a> CallContext<'a> {
    /// Create a call context. `this` is `None` for static functions.
    pub fn new(this: Option<&'a Value>, args: &'a [Value]) -> Self {
        Self {
            this,
            args,
            return_value: Value::Null,
        }
    }

    /// Number of arguments (excluding the instance).
    pub fn arg_count(&self) -> usize {
        self.args.len()
    }

    /// All arguments.
    pub fn args(&self) -> &'a [Value] {
        self.args
    }

    /// Borrow one argument.
    pub fn arg(&self, index: usize) -> Result<&'a Value, NativeError> {
        self.args
            .get(index)
            .ok_or(NativeError::ArgumentIndexOutOfBounds {
                index,
                count: self.args.len(),
            })
    }

    /// Extract one argument as a Rust type.
    pub fn arg_as<T: FromValue>(&self, index: usize) -> Result<T, NativeError> {
        let value = self.arg(index)?;
        T::from_value(value.clone()).ok_or_else(|| NativeError::ArgumentType {
            index,
            expected: std::any::type_name::<T>(),
            actual: value.type_name(),
        })
    }

    /// The instance, for methods.
    pub fn this(&self) -> Result<&'a Value, NativeError> {
        match self.this {
            Some(value) if !value.is_null() => Ok(value),
            _ => Err(NativeError::InvalidThis),
        }
    }

    /// The instance downcast to a host object type.
    pub fn this_as<T: HostObject>(&self) -> Result<&'a T, NativeError> {
        match self.this()? {
            Value::Object(object) => object.downcast_ref::<T>().ok_or(NativeError::InvalidThis),
            _ => Err(NativeError::InvalidThis),
        }
    }

    /// Store the return value.
    pub fn set_return(&mut self, value: impl Into<Value>) {
        self.return_value = value.into();
    }

    /// Take the return value, leaving null behind.
    pub fn take_return(&mut self) -> Value {
        std::mem::take(&mut self.return_value)
    }
}
