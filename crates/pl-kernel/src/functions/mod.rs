//! Function system.
//!
//! Every name a pipeline can call resolves to a [`Function`] in the
//! [`FunctionTable`]. A function declares its [`Signature`](pl_types::Signature)
//! up front; the invocation engine checks arity and reconciles argument types
//! against it before the function body runs.
//!
//! # Architecture
//!
//! ```text
//! FunctionTable
//! ├── Builtins (pass, printf, regex)
//! └── Host functions (registered by the embedding application)
//! ```

mod builtin;
mod registry;
mod traits;

pub use builtin::{REGEX_MATCH, RegexMatch, register_builtins, sprintf};
pub use registry::FunctionTable;
pub use traits::{Function, FunctionError, NativeFn, int_arg, str_arg};
