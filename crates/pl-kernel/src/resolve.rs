//! Reference resolution against a context value.
//!
//! A [`Reference`] is a chain of keys; each key steps one level into the
//! current node. Names step into maps and records, indexes step into lists
//! and integer-keyed maps. Errors name the prefix that was resolved before
//! the failing key, e.g. `$.a: out of range`.

use pl_types::{Value, ValueType};
use thiserror::Error;

use crate::ast::{Key, Reference};

/// Why a reference could not be resolved.
///
/// `at` is the already-resolved prefix, rendered the way it is written after `$`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolveError {
    #[error("${at} has no key {key}")]
    NoKey { at: String, key: String },
    #[error("${at} has no field {field}")]
    NoField { at: String, field: String },
    #[error("${at} is a map but key type is not a string")]
    NotStringKeyed { at: String },
    #[error("${at} is a map but key type is not an integer")]
    NotIntKeyed { at: String },
    #[error("${at} is not an object but {found}")]
    NotAnObject { at: String, found: ValueType },
    #[error("${at} is not a list but {found}")]
    NotAList { at: String, found: ValueType },
    #[error("${at}: out of range")]
    OutOfRange { at: String },
    #[error("invalid key at {position}")]
    InvalidKey { position: usize },
    #[error("key {key} not exists at ${at}")]
    KeyNotExists { key: Key, at: String },
}

fn path(keys: &[Key]) -> String {
    keys.iter().map(ToString::to_string).collect()
}

/// Resolve `reference` against `context`.
///
/// An empty reference resolves to the context itself.
pub fn resolve<'v>(context: &'v Value, reference: &Reference) -> Result<&'v Value, ResolveError> {
    resolve_keys(context, &reference.keys)
}

fn resolve_keys<'v>(context: &'v Value, keys: &[Key]) -> Result<&'v Value, ResolveError> {
    let mut cursor = context;
    for (position, key) in keys.iter().enumerate() {
        cursor = step(cursor, key, position, || path(&keys[..position]))?;
    }
    Ok(cursor)
}

fn step<'v>(
    node: &'v Value,
    key: &Key,
    position: usize,
    at: impl Fn() -> String,
) -> Result<&'v Value, ResolveError> {
    match key {
        Key::Name(name) => match node {
            Value::Map(entries) => entries.get(name).ok_or_else(|| ResolveError::NoKey {
                at: at(),
                key: name.clone(),
            }),
            Value::Record(record) => record.get(name).ok_or_else(|| ResolveError::NoField {
                at: at(),
                field: name.clone(),
            }),
            Value::IntMap(_) => Err(ResolveError::NotStringKeyed { at: at() }),
            other => Err(ResolveError::NotAnObject {
                at: at(),
                found: other.value_type(),
            }),
        },
        Key::Index(index) => match node {
            Value::IntMap(entries) => entries.get(index).ok_or_else(|| ResolveError::NoKey {
                at: at(),
                key: index.to_string(),
            }),
            Value::Map(_) => Err(ResolveError::NotIntKeyed { at: at() }),
            Value::List(items) => usize::try_from(*index)
                .ok()
                .and_then(|i| items.get(i))
                .ok_or_else(|| ResolveError::OutOfRange { at: at() }),
            other => Err(ResolveError::NotAList {
                at: at(),
                found: other.value_type(),
            }),
        },
        Key::Unset => Err(ResolveError::InvalidKey { position }),
    }
}

/// Store `value` at `reference`, the write-side companion of [`resolve`].
///
/// Every key but the last must already resolve. The last key may add a new
/// map entry; list indexes and record fields must already exist. An empty
/// reference replaces the whole context.
pub fn set(context: &mut Value, reference: &Reference, value: Value) -> Result<(), ResolveError> {
    let Some((last, parents)) = reference.keys.split_last() else {
        *context = value;
        return Ok(());
    };

    let parent = resolve_keys(context, parents)?;
    if !is_container(parent) {
        let at = path(parents);
        return Err(match last {
            Key::Index(_) => ResolveError::NotAList {
                at,
                found: parent.value_type(),
            },
            _ => ResolveError::NotAnObject {
                at,
                found: parent.value_type(),
            },
        });
    }

    let mut cursor = context;
    for (position, key) in parents.iter().enumerate() {
        cursor = child_mut(cursor, key).ok_or(ResolveError::InvalidKey { position })?;
    }

    let mut props = Props::new(cursor).ok_or(ResolveError::InvalidKey {
        position: parents.len(),
    })?;
    if props.set(last, value) {
        Ok(())
    } else {
        Err(ResolveError::KeyNotExists {
            key: last.clone(),
            at: path(parents),
        })
    }
}

/// A mutable view over one container node of a context.
///
/// Containers are maps, integer-keyed maps, records and lists. Useful for
/// hosts that assemble a context step by step.
#[derive(Debug)]
pub struct Props<'a> {
    node: &'a mut Value,
}

impl<'a> Props<'a> {
    /// Wrap `node`, or `None` if it is not a container.
    pub fn new(node: &'a mut Value) -> Option<Self> {
        is_container(node).then_some(Self { node })
    }

    pub fn get(&self, key: &Key) -> Option<&Value> {
        child(&*self.node, key)
    }

    pub fn get_mut(&mut self, key: &Key) -> Option<&mut Value> {
        child_mut(self.node, key)
    }

    /// Store `value` under `key`; returns false if the key does not fit this node.
    ///
    /// Maps accept new keys. Lists only replace in-range items and records only
    /// replace declared fields.
    pub fn set(&mut self, key: &Key, value: Value) -> bool {
        match (&mut *self.node, key) {
            (Value::Map(entries), Key::Name(name)) => {
                entries.insert(name.clone(), value);
                return true;
            }
            (Value::IntMap(entries), Key::Index(index)) => {
                entries.insert(*index, value);
                return true;
            }
            _ => {}
        }
        match child_mut(self.node, key) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Step into the container stored under `key`.
    pub fn next(&mut self, key: &Key) -> Option<Props<'_>> {
        child_mut(self.node, key).and_then(Props::new)
    }

    /// Walk `keys` from this node.
    pub fn resolve(&self, keys: &[Key]) -> Result<&Value, ResolveError> {
        let mut cursor: &Value = &*self.node;
        for (i, key) in keys.iter().enumerate() {
            cursor = child(cursor, key).ok_or_else(|| ResolveError::KeyNotExists {
                key: key.clone(),
                at: path(&keys[..i]),
            })?;
        }
        Ok(cursor)
    }
}

fn is_container(node: &Value) -> bool {
    matches!(
        node,
        Value::Map(_) | Value::IntMap(_) | Value::Record(_) | Value::List(_)
    )
}

fn child<'v>(node: &'v Value, key: &Key) -> Option<&'v Value> {
    match (node, key) {
        (Value::Map(entries), Key::Name(name)) => entries.get(name),
        (Value::Record(record), Key::Name(name)) => record.get(name),
        (Value::IntMap(entries), Key::Index(index)) => entries.get(index),
        (Value::List(items), Key::Index(index)) => {
            usize::try_from(*index).ok().and_then(|i| items.get(i))
        }
        _ => None,
    }
}

fn child_mut<'v>(node: &'v mut Value, key: &Key) -> Option<&'v mut Value> {
    match (node, key) {
        (Value::Map(entries), Key::Name(name)) => entries.get_mut(name),
        (Value::Record(record), Key::Name(name)) => record.get_mut(name),
        (Value::IntMap(entries), Key::Index(index)) => entries.get_mut(index),
        (Value::List(items), Key::Index(index)) => {
            usize::try_from(*index).ok().and_then(|i| items.get_mut(i))
        }
        _ => None,
    }
}
