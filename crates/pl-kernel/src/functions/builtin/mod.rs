//! Builtin functions available in every kernel created with builtins enabled.

mod pass;
mod printf;
mod regex;

use std::sync::Arc;

use super::registry::FunctionTable;

pub use self::printf::sprintf;
pub use self::regex::{REGEX_MATCH, RegexMatch};

/// Register all builtin functions.
pub fn register_builtins(registry: &mut FunctionTable) {
    registry.insert("pass".into(), Arc::new(pass::Pass));
    registry.insert("printf".into(), Arc::new(printf::Printf));
    registry.insert("regex".into(), Arc::new(regex::Regex));
}
