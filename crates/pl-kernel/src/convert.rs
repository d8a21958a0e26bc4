//! Conversion table: registered value conversions keyed by (source, target) type.
//!
//! The table is an explicit value owned by the host and handed to every
//! evaluation. [`ConversionTable::convert`] reports a missing pair as
//! [`ConvertError::NotFound`], which callers keep distinct from a conversion
//! that exists but failed.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use pl_types::{Value, ValueType};
use thiserror::Error;

/// A registered conversion function.
pub type ConvertFn = Arc<dyn Fn(&Value) -> Result<Value, ConvertError> + Send + Sync>;

/// Conversion failures.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConvertError {
    /// No conversion is registered for the pair.
    #[error("not found")]
    NotFound { from: ValueType, to: ValueType },
    /// The conversion function ran and failed.
    #[error("{0}")]
    Failed(String),
    /// The conversion returned a value of the wrong type.
    #[error("conversion produced {found} but {expected} was expected")]
    Mismatch { expected: ValueType, found: ValueType },
    #[error("failed to convert to intermediate type string from argument type: {0}")]
    ToIntermediate(#[source] Box<ConvertError>),
    #[error("failed to convert to parameter type from intermediate type string: {0}")]
    FromIntermediate(#[source] Box<ConvertError>),
}

impl ConvertError {
    pub fn failed(message: impl fmt::Display) -> Self {
        ConvertError::Failed(message.to_string())
    }

    /// Whether this is the "no such conversion" outcome rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ConvertError::NotFound { .. })
    }
}

/// Conversions keyed by source type, then target type.
#[derive(Clone, Default)]
pub struct ConversionTable {
    entries: HashMap<ValueType, HashMap<ValueType, ConvertFn>>,
}

impl ConversionTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// A table seeded with the default conversions: int to string, int to float.
    pub fn with_defaults() -> Self {
        let mut table = Self::new();
        table.set(ValueType::Int, ValueType::String, |v| match v {
            Value::Int(n) => Ok(Value::String(n.to_string())),
            other => Err(unexpected(ValueType::Int, other)),
        });
        table.set(ValueType::Int, ValueType::Float, |v| match v {
            Value::Int(n) => Ok(Value::Float(*n as f64)),
            other => Err(unexpected(ValueType::Int, other)),
        });
        table
    }

    /// Register or replace the conversion from `from` to `to`.
    pub fn set<F>(&mut self, from: ValueType, to: ValueType, convert: F)
    where
        F: Fn(&Value) -> Result<Value, ConvertError> + Send + Sync + 'static,
    {
        tracing::trace!(%from, %to, "conversion registered");
        self.entries
            .entry(from)
            .or_default()
            .insert(to, Arc::new(convert));
    }

    /// Union with `other`; entries from `other` win on collisions.
    pub fn merge_with(&mut self, other: &ConversionTable) {
        for (from, targets) in &other.entries {
            let mine = self.entries.entry(from.clone()).or_default();
            for (to, convert) in targets {
                mine.insert(to.clone(), Arc::clone(convert));
            }
        }
    }

    pub fn get(&self, from: &ValueType, to: &ValueType) -> Option<&ConvertFn> {
        self.entries.get(from)?.get(to)
    }

    pub fn contains(&self, from: &ValueType, to: &ValueType) -> bool {
        self.get(from, to).is_some()
    }

    /// Remove a conversion, returning whether it existed.
    pub fn remove(&mut self, from: &ValueType, to: &ValueType) -> bool {
        self.entries
            .get_mut(from)
            .is_some_and(|targets| targets.remove(to).is_some())
    }

    /// All registered (source, target) pairs, sorted.
    pub fn pairs(&self) -> Vec<(ValueType, ValueType)> {
        let mut pairs: Vec<_> = self
            .entries
            .iter()
            .flat_map(|(from, targets)| targets.keys().map(|to| (from.clone(), to.clone())))
            .collect();
        pairs.sort();
        pairs
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Convert `value` of type `from` into type `to` using the registered entry.
    ///
    /// A converted value whose type `to` does not accept is a [`ConvertError::Mismatch`].
    pub fn convert(
        &self,
        to: &ValueType,
        from: &ValueType,
        value: &Value,
    ) -> Result<Value, ConvertError> {
        let convert = self.get(from, to).ok_or_else(|| ConvertError::NotFound {
            from: from.clone(),
            to: to.clone(),
        })?;
        let converted = convert(value)?;
        let found = converted.value_type();
        if !to.accepts(&found) {
            return Err(ConvertError::Mismatch {
                expected: to.clone(),
                found,
            });
        }
        Ok(converted)
    }

    /// [`convert`](Self::convert) using the value's own type as the source.
    pub fn convert_to(&self, to: &ValueType, value: &Value) -> Result<Value, ConvertError> {
        self.convert(to, &value.value_type(), value)
    }
}

fn unexpected(expected: ValueType, value: &Value) -> ConvertError {
    ConvertError::failed(format!("expected {expected} but got {}", value.value_type()))
}

impl fmt::Debug for ConversionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(
                self.pairs()
                    .iter()
                    .map(|(from, to)| format!("{from} -> {to}")),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let table = ConversionTable::with_defaults();
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.convert(&ValueType::String, &ValueType::Int, &Value::Int(42)),
            Ok(Value::from("42"))
        );
        assert_eq!(
            table.convert_to(&ValueType::Float, &Value::Int(42)),
            Ok(Value::Float(42.0))
        );
    }

    #[test]
    fn missing_pair_is_not_found() {
        let table = ConversionTable::with_defaults();
        let err = table
            .convert_to(&ValueType::Int, &Value::Float(1.5))
            .expect_err("no float to int");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "not found");

        let err = table
            .convert_to(&ValueType::Bool, &Value::Int(1))
            .expect_err("no int to bool");
        assert_eq!(
            err,
            ConvertError::NotFound {
                from: ValueType::Int,
                to: ValueType::Bool
            }
        );
    }

    #[test]
    fn failing_conversion_is_not_not_found() {
        let mut table = ConversionTable::new();
        table.set(ValueType::String, ValueType::Int, |v| {
            let s = v.as_str().unwrap_or_default();
            s.parse::<i64>()
                .map(Value::Int)
                .map_err(ConvertError::failed)
        });
        let err = table
            .convert_to(&ValueType::Int, &Value::from("x"))
            .expect_err("not a number");
        assert!(!err.is_not_found());
        assert_eq!(
            table.convert_to(&ValueType::Int, &Value::from("12")),
            Ok(Value::Int(12))
        );
    }

    #[test]
    fn wrong_result_type_is_mismatch() {
        let mut table = ConversionTable::new();
        table.set(ValueType::Bool, ValueType::Int, |_| Ok(Value::from("oops")));
        let err = table
            .convert_to(&ValueType::Int, &Value::Bool(true))
            .expect_err("mismatch");
        assert_eq!(
            err,
            ConvertError::Mismatch {
                expected: ValueType::Int,
                found: ValueType::String
            }
        );
    }

    #[test]
    fn merge_prefers_other() {
        let mut base = ConversionTable::with_defaults();
        let mut other = ConversionTable::new();
        other.set(ValueType::Int, ValueType::String, |_| Ok(Value::from("int")));
        other.set(ValueType::Bool, ValueType::String, |v| {
            Ok(Value::from(v.to_string()))
        });
        base.merge_with(&other);

        assert_eq!(base.len(), 3);
        assert_eq!(
            base.convert_to(&ValueType::String, &Value::Int(1)),
            Ok(Value::from("int"))
        );
        assert_eq!(
            base.convert_to(&ValueType::Float, &Value::Int(1)),
            Ok(Value::Float(1.0))
        );
        assert_eq!(
            base.convert_to(&ValueType::String, &Value::Bool(true)),
            Ok(Value::from("true"))
        );
    }

    #[test]
    fn set_overwrites_and_remove() {
        let mut table = ConversionTable::with_defaults();
        table.set(ValueType::Int, ValueType::Float, |_| Ok(Value::Float(0.5)));
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.convert_to(&ValueType::Float, &Value::Int(9)),
            Ok(Value::Float(0.5))
        );

        assert!(table.remove(&ValueType::Int, &ValueType::Float));
        assert!(!table.remove(&ValueType::Int, &ValueType::Float));
        assert!(!table.contains(&ValueType::Int, &ValueType::Float));
    }

    #[test]
    fn debug_lists_pairs() {
        let table = ConversionTable::with_defaults();
        assert_eq!(
            format!("{table:?}"),
            r#"["int -> float", "int -> string"]"#
        );
    }
}
