//! Pure data types for pl — runtime values and function signatures.
//!
//! This crate is a leaf dependency with no parser and no evaluator. Hosts that
//! only need to build contexts or describe native functions can depend on it
//! without pulling in the kernel.

pub mod json;
pub mod signature;
pub mod value;

pub use json::*;
pub use signature::*;
pub use value::*;
