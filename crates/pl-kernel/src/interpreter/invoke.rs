//! Function invocation: arity checks and argument type reconciliation.
//!
//! Each argument is reconciled against its parameter type in order:
//!
//! 1. A value the parameter type already accepts passes unchanged.
//! 2. Otherwise the registered direct conversion is used.
//! 3. Only if no direct conversion exists, the value is bridged through
//!    text: source to string, then string to target.

use pl_types::{SignatureError, Value, ValueType};
use thiserror::Error;

use crate::convert::{ConversionTable, ConvertError};
use crate::functions::{Function, FunctionError};

/// Why a function could not be invoked, or what it reported.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvokeError {
    #[error(transparent)]
    Signature(#[from] SignatureError),
    #[error("expected {expected} args but {given} args are given")]
    ArgCount { expected: usize, given: usize },
    #[error("expected at least {expected} args but {given} args are given")]
    ArgCountAtLeast { expected: usize, given: usize },
    #[error("arg[{index}]: convert to {to} from {from}: {cause}")]
    Argument {
        index: usize,
        to: ValueType,
        from: ValueType,
        #[source]
        cause: ConvertError,
    },
    /// The function ran and reported an error.
    #[error(transparent)]
    Failed(FunctionError),
}

/// Invoke `function` with already-evaluated `args`.
pub fn invoke(
    function: &dyn Function,
    args: Vec<Value>,
    conversions: &ConversionTable,
) -> Result<Value, InvokeError> {
    let signature = function.signature();
    signature.validate()?;

    let given = args.len();
    let expected = signature.fixed_len();
    if signature.is_variadic() {
        if given < expected {
            return Err(InvokeError::ArgCountAtLeast { expected, given });
        }
    } else if given != expected {
        return Err(InvokeError::ArgCount { expected, given });
    }

    let mut reconciled = Vec::with_capacity(given);
    for (index, value) in args.into_iter().enumerate() {
        let Some(target) = signature.param_type(index) else {
            return Err(InvokeError::ArgCount { expected, given });
        };
        let from = value.value_type();
        let value = reconcile(target, value, conversions).map_err(|cause| {
            InvokeError::Argument {
                index,
                to: target.clone(),
                from,
                cause,
            }
        })?;
        reconciled.push(value);
    }

    function.call(reconciled).map_err(InvokeError::Failed)
}

/// Make `value` fit `target`, converting it if needed.
pub fn reconcile(
    target: &ValueType,
    value: Value,
    conversions: &ConversionTable,
) -> Result<Value, ConvertError> {
    let source = value.value_type();
    if target.accepts(&source) {
        return Ok(value);
    }

    match conversions.convert(target, &source, &value) {
        Err(e) if e.is_not_found() => {
            tracing::trace!(%source, %target, "no direct conversion, bridging through text");
            bridge(target, &source, &value, conversions)
        }
        result => result,
    }
}

/// Convert through the intermediate string type.
fn bridge(
    target: &ValueType,
    source: &ValueType,
    value: &Value,
    conversions: &ConversionTable,
) -> Result<Value, ConvertError> {
    let not_found = || ConvertError::NotFound {
        from: source.clone(),
        to: target.clone(),
    };

    // Text bridged through itself would be a self-conversion.
    if source.is_text() {
        return Err(not_found());
    }
    if !target.is_text() && !conversions.contains(&ValueType::String, target) {
        return Err(not_found());
    }

    let text = if conversions.contains(source, &ValueType::String) {
        conversions
            .convert(&ValueType::String, source, value)
            .map_err(|e| ConvertError::ToIntermediate(Box::new(e)))?
    } else {
        match value.as_handle().and_then(|h| h.text()) {
            Some(text) => Value::String(text),
            None => return Err(not_found()),
        }
    };

    if target.is_text() {
        return Ok(text);
    }
    conversions
        .convert(target, &ValueType::String, &text)
        .map_err(|e| ConvertError::FromIntermediate(Box::new(e)))
}
