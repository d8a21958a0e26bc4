//! AST type definitions.

use std::fmt;

/// A parenthesized sequence of calls joined by `|`: `(a 1 | b | c)`.
///
/// Values flow left to right; the last call's outputs are the pipeline's
/// result. An empty pipeline `()` evaluates to no values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Pipeline {
    pub calls: Vec<Call>,
}

impl Pipeline {
    pub fn new(calls: impl IntoIterator<Item = Call>) -> Self {
        Self {
            calls: calls.into_iter().collect(),
        }
    }

    /// Deepest nesting of pipelines within this one; a flat pipeline has depth 0.
    ///
    /// Walks the tree with an explicit stack, so any depth can be measured.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 0)];
        while let Some((pipeline, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            stack.extend(pipeline.nested().map(|p| (p, depth + 1)));
        }
        deepest
    }

    /// Number of calls in this pipeline and every nested pipeline.
    pub fn call_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(pipeline) = stack.pop() {
            count += pipeline.calls.len();
            stack.extend(pipeline.nested());
        }
        count
    }

    fn nested(&self) -> impl Iterator<Item = &Pipeline> {
        self.calls.iter().flat_map(|call| {
            call.args.iter().filter_map(|arg| match arg {
                Argument::Nested(p) => Some(p),
                _ => None,
            })
        })
    }
}

/// A function call: name plus arguments in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub name: String,
    pub args: Vec<Argument>,
}

impl Call {
    pub fn new(name: impl Into<String>, args: impl IntoIterator<Item = Argument>) -> Self {
        Self {
            name: name.into(),
            args: args.into_iter().collect(),
        }
    }
}

/// One argument of a call.
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    /// Quoted text: `"foo"` or `` `foo` ``
    String(String),
    Float(f64),
    Int(i64),
    /// Context lookup: `$.a[0]`
    Reference(Reference),
    /// Parenthesized pipeline whose outputs are spliced in place
    Nested(Pipeline),
}

impl From<&str> for Argument {
    fn from(s: &str) -> Self {
        Argument::String(s.to_string())
    }
}

impl From<String> for Argument {
    fn from(s: String) -> Self {
        Argument::String(s)
    }
}

impl From<f64> for Argument {
    fn from(f: f64) -> Self {
        Argument::Float(f)
    }
}

impl From<i64> for Argument {
    fn from(n: i64) -> Self {
        Argument::Int(n)
    }
}

impl From<i32> for Argument {
    fn from(n: i32) -> Self {
        Argument::Int(n.into())
    }
}

impl From<Reference> for Argument {
    fn from(r: Reference) -> Self {
        Argument::Reference(r)
    }
}

impl From<Pipeline> for Argument {
    fn from(p: Pipeline) -> Self {
        Argument::Nested(p)
    }
}

/// A path into the context, one key per step.
///
/// Displays the way it is written after `$`: `.a[0].b`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Reference {
    pub keys: Vec<Key>,
}

impl Reference {
    pub fn new(keys: impl IntoIterator<Item = Key>) -> Self {
        Self {
            keys: keys.into_iter().collect(),
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for key in &self.keys {
            write!(f, "{key}")?;
        }
        Ok(())
    }
}

/// One step of a reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// `.name`, `."quoted"` or `[name]`
    Name(String),
    /// `[3]`
    Index(i64),
    /// A key carrying neither a name nor an index; only constructible by hand.
    Unset,
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Name(name) => write!(f, ".{name}"),
            Key::Index(index) => write!(f, "[{index}]"),
            Key::Unset => write!(f, ".?"),
        }
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Name(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Name(s)
    }
}

impl From<i64> for Key {
    fn from(n: i64) -> Self {
        Key::Index(n)
    }
}

impl From<i32> for Key {
    fn from(n: i32) -> Self {
        Key::Index(n.into())
    }
}

/// Shorthand for building keys: `key("a")`, `key(0)`.
pub fn key(k: impl Into<Key>) -> Key {
    k.into()
}
