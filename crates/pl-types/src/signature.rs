//! Function signature descriptors.

use std::fmt;

use thiserror::Error;

use crate::value::ValueType;

/// One declared return value of a function.
#[derive(Debug, Clone, PartialEq)]
pub enum ReturnSlot {
    /// A regular value of the given type.
    Value(ValueType),
    /// The error channel.
    Error,
}

impl fmt::Display for ReturnSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReturnSlot::Value(t) => write!(f, "{t}"),
            ReturnSlot::Error => write!(f, "error"),
        }
    }
}

/// A signature that can never be invoked.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SignatureError {
    #[error("function have to return one or two values but {0} values are returned")]
    ReturnArity(usize),
    #[error("type of second return value of the function must be an error but it was {0}")]
    SecondNotError(ValueType),
    #[error("first return value of the function must be a value but it was an error")]
    FirstIsError,
}

/// Describes how a native function is called.
///
/// Fixed parameters come first; an optional variadic parameter type absorbs
/// all trailing arguments. A function returns one value, or one value plus an
/// error channel.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Signature {
    /// Fixed parameter types, in order.
    pub params: Vec<ValueType>,
    /// Element type of the trailing variadic parameter.
    pub variadic: Option<ValueType>,
    /// Declared return values.
    pub returns: Vec<ReturnSlot>,
}

impl Signature {
    /// An empty signature: no parameters, no return values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a fixed parameter.
    pub fn param(mut self, param_type: ValueType) -> Self {
        self.params.push(param_type);
        self
    }

    /// Set the trailing variadic parameter type.
    pub fn variadic(mut self, param_type: ValueType) -> Self {
        self.variadic = Some(param_type);
        self
    }

    /// Add a value return slot.
    pub fn returns(mut self, return_type: ValueType) -> Self {
        self.returns.push(ReturnSlot::Value(return_type));
        self
    }

    /// Add the error return slot.
    pub fn fallible(mut self) -> Self {
        self.returns.push(ReturnSlot::Error);
        self
    }

    /// Number of fixed parameters.
    pub fn fixed_len(&self) -> usize {
        self.params.len()
    }

    pub fn is_variadic(&self) -> bool {
        self.variadic.is_some()
    }

    /// Whether the function declares an error channel.
    pub fn is_fallible(&self) -> bool {
        matches!(self.returns.get(1), Some(ReturnSlot::Error))
    }

    /// The parameter type argument `index` binds to.
    ///
    /// Arguments past the fixed parameters bind to the variadic type; `None`
    /// when there is no such parameter.
    pub fn param_type(&self, index: usize) -> Option<&ValueType> {
        self.params.get(index).or(self.variadic.as_ref())
    }

    /// Check the return shape: one value, or a value followed by the error channel.
    pub fn validate(&self) -> Result<(), SignatureError> {
        match self.returns.as_slice() {
            [ReturnSlot::Value(_)] | [ReturnSlot::Value(_), ReturnSlot::Error] => Ok(()),
            [ReturnSlot::Error] | [ReturnSlot::Error, ReturnSlot::Error] => Err(SignatureError::FirstIsError),
            [_, ReturnSlot::Value(t)] => Err(SignatureError::SecondNotError(t.clone())),
            other => Err(SignatureError::ReturnArity(other.len())),
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut params: Vec<String> = self.params.iter().map(ToString::to_string).collect();
        if let Some(v) = &self.variadic {
            params.push(format!("...{v}"));
        }
        write!(f, "({})", params.join(", "))?;
        match self.returns.as_slice() {
            [] => Ok(()),
            [single] => write!(f, " -> {single}"),
            many => {
                let returns: Vec<String> = many.iter().map(ToString::to_string).collect();
                write!(f, " -> ({})", returns.join(", "))
            }
        }
    }
}
