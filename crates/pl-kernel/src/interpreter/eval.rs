//! Pipeline evaluation.
//!
//! Calls run left to right. Each call receives its own arguments first,
//! followed by everything the previous call produced. Nested pipelines are
//! evaluated in place and their outputs spliced into the argument list, so a
//! nested call returning three values fills three argument slots.

use pl_types::Value;
use thiserror::Error;

use crate::ast::{Argument, Call, Pipeline};
use crate::convert::ConversionTable;
use crate::functions::FunctionTable;
use crate::parser::MAX_NESTING;
use crate::resolve::{ResolveError, resolve};

use super::invoke::{InvokeError, invoke};

/// Errors that abort a pipeline.
///
/// The chain of `Call` and `CallError::Nested` levels spells out the path from
/// the top-level pipeline down to the failing leaf. Each level also exposes the
/// next one through [`std::error::Error::source`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// Call `index` of the pipeline, named `name`, failed.
    #[error("fn[{index}] {name}: {cause}")]
    Call {
        index: usize,
        name: String,
        #[source]
        cause: Box<CallError>,
    },
    /// The pipeline nests deeper than the configured limit.
    #[error("pipeline nests {depth} levels deep, limit is {limit}")]
    DepthExceeded { depth: usize, limit: usize },
    /// The pipeline holds more calls than the configured limit.
    #[error("pipeline has {count} calls, limit is {limit}")]
    TooManyCalls { count: usize, limit: usize },
}

/// Why a single call failed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CallError {
    /// No function is registered under the call's name.
    #[error("not defined")]
    NotDefined,
    /// Argument `index` is a reference that did not resolve.
    #[error("arg[{index}]: reference: {cause}")]
    Reference {
        index: usize,
        #[source]
        cause: ResolveError,
    },
    /// Argument `index` is a nested pipeline that failed.
    #[error("arg[{index}]: {cause}")]
    Nested {
        index: usize,
        #[source]
        cause: Box<EvalError>,
    },
    #[error(transparent)]
    Invoke(#[from] InvokeError),
}

/// One level of an error path: which call failed, and through which argument
/// the failure continued into a nested pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub call: usize,
    pub name: String,
    pub arg: Option<usize>,
}

impl EvalError {
    /// The error path from the top-level pipeline down to the failing call.
    pub fn frames(&self) -> Vec<Frame> {
        let mut frames = Vec::new();
        let mut current = self;
        while let EvalError::Call { index, name, cause } = current {
            let arg = match cause.as_ref() {
                CallError::Reference { index, .. } | CallError::Nested { index, .. } => {
                    Some(*index)
                }
                _ => None,
            };
            frames.push(Frame {
                call: *index,
                name: name.clone(),
                arg,
            });
            match cause.as_ref() {
                CallError::Nested { cause, .. } => current = cause,
                _ => break,
            }
        }
        frames
    }

    /// The innermost call failure, below any nesting.
    pub fn leaf(&self) -> Option<&CallError> {
        let mut current = self;
        loop {
            match current {
                EvalError::Call { cause, .. } => match cause.as_ref() {
                    CallError::Nested { cause, .. } => current = cause,
                    leaf => return Some(leaf),
                },
                _ => return None,
            }
        }
    }
}

/// Result type for evaluation.
pub type EvalResult<T> = Result<T, EvalError>;

/// Evaluates pipelines against a context with fixed function and conversion tables.
///
/// Evaluation only reads the tables, the context and the AST; evaluating the
/// same pipeline twice yields the same result.
pub struct Evaluator<'a> {
    functions: &'a FunctionTable,
    conversions: &'a ConversionTable,
    context: &'a Value,
    max_depth: Option<usize>,
    max_calls: Option<usize>,
}

impl<'a> Evaluator<'a> {
    pub fn new(
        functions: &'a FunctionTable,
        conversions: &'a ConversionTable,
        context: &'a Value,
    ) -> Self {
        Self {
            functions,
            conversions,
            context,
            max_depth: None,
            max_calls: None,
        }
    }

    /// Reject pipelines nesting deeper than `limit` before running anything.
    ///
    /// Without a limit, and for limits above it, [`MAX_NESTING`] applies.
    pub fn with_max_depth(mut self, limit: Option<usize>) -> Self {
        self.max_depth = limit;
        self
    }

    /// Reject pipelines with more than `limit` calls in total before running anything.
    pub fn with_max_calls(mut self, limit: Option<usize>) -> Self {
        self.max_calls = limit;
        self
    }

    /// Evaluate `pipeline`, returning the last call's outputs.
    pub fn eval(&self, pipeline: &Pipeline) -> EvalResult<Vec<Value>> {
        let limit = self.max_depth.map_or(MAX_NESTING, |limit| limit.min(MAX_NESTING));
        let depth = pipeline.depth();
        if depth > limit {
            return Err(EvalError::DepthExceeded { depth, limit });
        }
        if let Some(limit) = self.max_calls {
            let count = pipeline.call_count();
            if count > limit {
                return Err(EvalError::TooManyCalls { count, limit });
            }
        }
        self.eval_pipeline(pipeline)
    }

    fn eval_pipeline(&self, pipeline: &Pipeline) -> EvalResult<Vec<Value>> {
        let mut piped = Vec::new();
        for (index, call) in pipeline.calls.iter().enumerate() {
            piped = self
                .eval_call(call, piped)
                .map_err(|cause| EvalError::Call {
                    index,
                    name: call.name.clone(),
                    cause: Box::new(cause),
                })?;
        }
        Ok(piped)
    }

    fn eval_call(&self, call: &Call, piped: Vec<Value>) -> Result<Vec<Value>, CallError> {
        let function = self.functions.get(&call.name).ok_or(CallError::NotDefined)?;

        let mut args = self.eval_args(call)?;
        args.extend(piped);

        tracing::trace!(name = %call.name, argc = args.len(), "invoke");
        let output = invoke(function.as_ref(), args, self.conversions)?;
        Ok(match output {
            Value::List(items) => items,
            single => vec![single],
        })
    }

    /// The call's own arguments in declaration order, nested outputs spliced.
    fn eval_args(&self, call: &Call) -> Result<Vec<Value>, CallError> {
        let mut args = Vec::with_capacity(call.args.len());
        for (index, arg) in call.args.iter().enumerate() {
            match arg {
                Argument::String(s) => args.push(Value::String(s.clone())),
                Argument::Float(f) => args.push(Value::Float(*f)),
                Argument::Int(n) => args.push(Value::Int(*n)),
                Argument::Reference(reference) => {
                    let value = resolve(self.context, reference)
                        .map_err(|cause| CallError::Reference { index, cause })?;
                    args.push(value.clone());
                }
                Argument::Nested(nested) => {
                    let outputs = self
                        .eval_pipeline(nested)
                        .map_err(|cause| CallError::Nested {
                            index,
                            cause: Box::new(cause),
                        })?;
                    args.extend(outputs);
                }
            }
        }
        Ok(args)
    }
}
