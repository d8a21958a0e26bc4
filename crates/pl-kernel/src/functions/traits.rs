//! Core function traits and types.

use pl_types::{Signature, Value};
use thiserror::Error;

/// Failure reported by a function body through its error channel.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct FunctionError {
    message: String,
}

impl FunctionError {
    pub fn new(message: impl std::fmt::Display) -> Self {
        Self {
            message: message.to_string(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A callable that pipelines can invoke by name.
///
/// `call` receives arguments already reconciled against `signature()`: the
/// count matches and every value is of the declared parameter type.
pub trait Function: Send + Sync {
    fn signature(&self) -> &Signature;

    /// Run the function. Only fallible signatures should return `Err`; the
    /// engine surfaces it either way.
    fn call(&self, args: Vec<Value>) -> Result<Value, FunctionError>;
}

/// A function backed by a closure.
pub struct NativeFn<F> {
    signature: Signature,
    body: F,
}

impl<F> NativeFn<F>
where
    F: Fn(Vec<Value>) -> Result<Value, FunctionError> + Send + Sync,
{
    pub fn new(signature: Signature, body: F) -> Self {
        Self { signature, body }
    }
}

impl<F> Function for NativeFn<F>
where
    F: Fn(Vec<Value>) -> Result<Value, FunctionError> + Send + Sync,
{
    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn call(&self, args: Vec<Value>) -> Result<Value, FunctionError> {
        (self.body)(args)
    }
}

/// Borrow argument `index` as text.
pub fn str_arg(args: &[Value], index: usize) -> Result<&str, FunctionError> {
    match args.get(index) {
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(FunctionError::new(format!(
            "arg[{index}]: expected string but got {}",
            other.value_type()
        ))),
        None => Err(FunctionError::new(format!("arg[{index}]: missing"))),
    }
}

/// Read argument `index` as an integer.
pub fn int_arg(args: &[Value], index: usize) -> Result<i64, FunctionError> {
    match args.get(index) {
        Some(Value::Int(n)) => Ok(*n),
        Some(other) => Err(FunctionError::new(format!(
            "arg[{index}]: expected int but got {}",
            other.value_type()
        ))),
        None => Err(FunctionError::new(format!("arg[{index}]: missing"))),
    }
}
