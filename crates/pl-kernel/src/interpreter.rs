//! Interpreter for pl pipelines.
//!
//! # Architecture
//!
//! - **Invocation**: checks arity and reconciles each argument with its
//!   parameter type, bridging through text when no direct conversion exists
//! - **Evaluator**: runs a pipeline call by call, piping outputs forward and
//!   splicing nested pipeline outputs into argument lists
//!
//! # Example
//!
//! ```
//! use pl_kernel::ast::{Argument, Call, Pipeline};
//! use pl_kernel::convert::ConversionTable;
//! use pl_kernel::functions::FunctionTable;
//! use pl_kernel::interpreter::Evaluator;
//! use pl_types::Value;
//!
//! let functions = FunctionTable::with_builtins();
//! let conversions = ConversionTable::with_defaults();
//! let context = Value::Null;
//!
//! let pipeline = Pipeline::new([Call::new("pass", [Argument::from(1), Argument::from("a")])]);
//! let out = Evaluator::new(&functions, &conversions, &context).eval(&pipeline).unwrap();
//! assert_eq!(out, vec![Value::Int(1), Value::from("a")]);
//! ```

mod eval;
mod invoke;

pub use eval::{CallError, EvalError, EvalResult, Evaluator, Frame};
pub use invoke::{InvokeError, invoke, reconcile};
