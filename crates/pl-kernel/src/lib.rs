//! pl-kernel: parser and execution engine for pl pipeline expressions.
//!
//! This crate provides:
//!
//! - **Lexer**: Tokenizes expressions using logos
//! - **Parser**: Builds the AST from tokens using chumsky
//! - **AST**: Pipelines, calls, arguments and references
//! - **Resolve**: Looks references up in the evaluation context
//! - **Convert**: The conversion table between value types
//! - **Functions**: Function trait, registry, and builtins
//! - **Interpreter**: Invocation and pipeline evaluation
//! - **Kernel**: The embedding facade tying it together

pub mod ast;
pub mod convert;
pub mod functions;
pub mod interpreter;
pub mod kernel;
pub mod lexer;
pub mod parser;
pub mod resolve;

pub use ast::{Argument, Call, Key, Pipeline, Reference, key};
pub use convert::{ConversionTable, ConvertError};
pub use functions::{Function, FunctionError, FunctionTable, NativeFn};
pub use interpreter::{CallError, EvalError, InvokeError};
pub use kernel::{Error, Kernel, KernelConfig};
pub use parser::{MAX_NESTING, ParseError, parse, parse_reference};
pub use resolve::{ResolveError, resolve};

// Data types, so embedders need only one dependency
pub use pl_types::{Signature, SignatureError, Value, ValueType};
