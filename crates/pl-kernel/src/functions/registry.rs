//! Function registry: name to callable lookup.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use pl_types::{Signature, SignatureError, Value};

use super::builtin::register_builtins;
use super::traits::{Function, FunctionError, NativeFn};

/// Maps call names to functions.
///
/// Registration validates the signature, so everything in the table can be
/// invoked. Cloning shares the functions themselves.
#[derive(Clone, Default)]
pub struct FunctionTable {
    functions: HashMap<String, Arc<dyn Function>>,
}

impl FunctionTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// A table holding the builtin functions.
    pub fn with_builtins() -> Self {
        let mut table = Self::new();
        register_builtins(&mut table);
        table
    }

    /// Register `function` under `name`, replacing any previous entry.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        function: impl Function + 'static,
    ) -> Result<(), SignatureError> {
        self.register_arc(name, Arc::new(function))
    }

    /// Register a shared function under `name`.
    pub fn register_arc(
        &mut self,
        name: impl Into<String>,
        function: Arc<dyn Function>,
    ) -> Result<(), SignatureError> {
        let name = name.into();
        let signature = function.signature();
        if let Err(e) = signature.validate() {
            tracing::warn!(%name, %signature, error = %e, "rejected function");
            return Err(e);
        }
        self.insert(name, function);
        Ok(())
    }

    /// Register a closure with the given signature.
    pub fn register_fn<F>(
        &mut self,
        name: impl Into<String>,
        signature: Signature,
        body: F,
    ) -> Result<(), SignatureError>
    where
        F: Fn(Vec<Value>) -> Result<Value, FunctionError> + Send + Sync + 'static,
    {
        self.register(name, NativeFn::new(signature, body))
    }

    /// Insert without validating; for functions whose signatures are known good.
    pub(crate) fn insert(&mut self, name: String, function: Arc<dyn Function>) {
        if self.functions.insert(name.clone(), function).is_some() {
            tracing::debug!(%name, "function replaced");
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Function>> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Arc<dyn Function>> {
        self.functions.remove(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Add every function of `other`; entries from `other` win on collisions.
    pub fn extend(&mut self, other: &FunctionTable) {
        for (name, function) in &other.functions {
            self.insert(name.clone(), Arc::clone(function));
        }
    }
}

impl fmt::Debug for FunctionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionTable")
            .field("functions", &self.names())
            .finish()
    }
}
