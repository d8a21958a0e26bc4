//! Kernel: the embedding facade for pl.
//!
//! A `Kernel` owns a function table and a conversion table, and evaluates
//! pipelines against caller-supplied contexts:
//!
//! ```
//! use pl_kernel::{Kernel, KernelConfig};
//! use pl_types::Value;
//!
//! let kernel = Kernel::new(KernelConfig::default());
//! let ctx = Value::map([("name", "world")]);
//! let out = kernel.execute_expr(r#"(printf "hello, %s" $.name)"#, &ctx).unwrap();
//! assert_eq!(out, vec![Value::from("hello, world")]);
//! ```
//!
//! Configure the tables before sharing the kernel. Evaluation only needs
//! `&self`, so one kernel can serve any number of evaluations.

use pl_types::{Signature, SignatureError, Value};
use thiserror::Error;

use crate::ast::Pipeline;
use crate::convert::ConversionTable;
use crate::functions::{Function, FunctionError, FunctionTable};
use crate::interpreter::{EvalError, Evaluator};
use crate::parser::{ParseError, parse};

/// Configuration for initializing a kernel.
#[derive(Debug, Clone)]
pub struct KernelConfig {
    /// Name of this kernel (for identification in logs).
    pub name: String,

    /// Register the builtin functions (`pass`, `printf`, `regex`).
    pub builtins: bool,

    /// Seed the conversion table with the default conversions.
    pub default_conversions: bool,

    /// Reject pipelines that nest deeper than this. Unset, or above
    /// [`MAX_NESTING`](crate::parser::MAX_NESTING), the parser's bound applies.
    pub max_depth: Option<usize>,

    /// Reject pipelines with more calls than this, nested calls included.
    pub max_calls: Option<usize>,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            builtins: true,
            default_conversions: true,
            max_depth: None,
            max_calls: None,
        }
    }
}

impl KernelConfig {
    /// Create a transient kernel config (for one-off evaluations).
    pub fn transient() -> Self {
        Self {
            name: "transient".to_string(),
            ..Self::default()
        }
    }

    /// Create a kernel config with the given name.
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    /// Create a config with no builtins and an empty conversion table.
    ///
    /// The host registers everything itself.
    pub fn bare() -> Self {
        Self {
            name: "bare".to_string(),
            builtins: false,
            default_conversions: false,
            max_depth: None,
            max_calls: None,
        }
    }

    pub fn with_builtins(mut self, builtins: bool) -> Self {
        self.builtins = builtins;
        self
    }

    pub fn with_default_conversions(mut self, enabled: bool) -> Self {
        self.default_conversions = enabled;
        self
    }

    /// Set the nesting limit. Depth 0 means no nested pipelines at all.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_max_calls(mut self, calls: usize) -> Self {
        self.max_calls = Some(calls);
        self
    }
}

/// Failure of [`Kernel::execute_expr`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("{}", join_parse_errors(.0))]
    Parse(Vec<ParseError>),
    #[error(transparent)]
    Eval(#[from] EvalError),
}

fn join_parse_errors(errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// The pl kernel.
#[derive(Debug)]
pub struct Kernel {
    name: String,
    functions: FunctionTable,
    conversions: ConversionTable,
    max_depth: Option<usize>,
    max_calls: Option<usize>,
}

impl Kernel {
    /// Create a new kernel with the given configuration.
    pub fn new(config: KernelConfig) -> Self {
        let functions = if config.builtins {
            FunctionTable::with_builtins()
        } else {
            FunctionTable::new()
        };
        let conversions = if config.default_conversions {
            ConversionTable::with_defaults()
        } else {
            ConversionTable::new()
        };

        tracing::debug!(
            name = %config.name,
            functions = functions.len(),
            conversions = conversions.len(),
            "kernel created"
        );

        Self {
            name: config.name,
            functions,
            conversions,
            max_depth: config.max_depth,
            max_calls: config.max_calls,
        }
    }

    /// Create a transient kernel with builtins and default conversions.
    pub fn transient() -> Self {
        Self::new(KernelConfig::transient())
    }

    /// Get the kernel name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn functions(&self) -> &FunctionTable {
        &self.functions
    }

    pub fn functions_mut(&mut self) -> &mut FunctionTable {
        &mut self.functions
    }

    pub fn conversions(&self) -> &ConversionTable {
        &self.conversions
    }

    pub fn conversions_mut(&mut self) -> &mut ConversionTable {
        &mut self.conversions
    }

    /// Register a function under `name`.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        function: impl Function + 'static,
    ) -> Result<(), SignatureError> {
        self.functions.register(name, function)
    }

    /// Register a closure under `name`.
    pub fn register_fn<F>(
        &mut self,
        name: impl Into<String>,
        signature: Signature,
        body: F,
    ) -> Result<(), SignatureError>
    where
        F: Fn(Vec<Value>) -> Result<Value, FunctionError> + Send + Sync + 'static,
    {
        self.functions.register_fn(name, signature, body)
    }

    /// Evaluate a parsed pipeline against `context`.
    #[tracing::instrument(level = "debug", skip_all, fields(kernel = %self.name, calls = pipeline.call_count()))]
    pub fn execute(&self, pipeline: &Pipeline, context: &Value) -> Result<Vec<Value>, EvalError> {
        let result = Evaluator::new(&self.functions, &self.conversions, context)
            .with_max_depth(self.max_depth)
            .with_max_calls(self.max_calls)
            .eval(pipeline);
        if let Err(e) = &result {
            tracing::debug!(error = %e, "pipeline failed");
        }
        result
    }

    /// Parse `expr` and evaluate it against `context`.
    #[tracing::instrument(level = "debug", skip_all, fields(kernel = %self.name, len = expr.len()))]
    pub fn execute_expr(&self, expr: &str, context: &Value) -> Result<Vec<Value>, Error> {
        let pipeline = parse(expr).map_err(Error::Parse)?;
        Ok(self.execute(&pipeline, context)?)
    }
}

impl Default for Kernel {
    fn default() -> Self {
        Self::new(KernelConfig::default())
    }
}
