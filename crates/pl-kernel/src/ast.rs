//! Abstract syntax tree for pipeline expressions.

pub mod sexpr;
mod types;

pub use types::*;
