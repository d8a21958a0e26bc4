//! Runtime values for pl.
//!
//! Every argument, context node and return value flowing through the engine is
//! a [`Value`]. The set of shapes is closed so the resolver and the invocation
//! engine can pattern match instead of inspecting types at runtime. Host data
//! that does not fit one of the data shapes travels as an opaque [`Handle`].

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The runtime type of a value.
///
/// Types key the conversion table and describe function parameters. `Any` only
/// makes sense as a parameter type: every value is assignable to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueType {
    Any,
    Null,
    Bool,
    Int,
    Float,
    String,
    List,
    Map,
    IntMap,
    /// A named-field record, identified by its type name.
    Record(String),
    /// An opaque host value, identified by its type name.
    Handle(String),
}

impl ValueType {
    /// Type of records with the given name.
    pub fn record(name: impl Into<String>) -> Self {
        ValueType::Record(name.into())
    }

    /// Type of opaque handles with the given name.
    pub fn handle(name: impl Into<String>) -> Self {
        ValueType::Handle(name.into())
    }

    /// Whether a value of type `other` can be passed as-is where `self` is expected.
    pub fn accepts(&self, other: &ValueType) -> bool {
        matches!(self, ValueType::Any) || self == other
    }

    /// Whether this is the textual type.
    pub fn is_text(&self) -> bool {
        matches!(self, ValueType::String)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Any => write!(f, "any"),
            ValueType::Null => write!(f, "null"),
            ValueType::Bool => write!(f, "bool"),
            ValueType::Int => write!(f, "int"),
            ValueType::Float => write!(f, "float"),
            ValueType::String => write!(f, "string"),
            ValueType::List => write!(f, "list"),
            ValueType::Map => write!(f, "map"),
            ValueType::IntMap => write!(f, "intmap"),
            ValueType::Record(name) | ValueType::Handle(name) => write!(f, "{name}"),
        }
    }
}

/// The "render as text" capability.
///
/// Opaque values opt into it to take part in the text bridge of the
/// invocation engine: a value that renders as text can be passed to a
/// `string` parameter, or converted further from that text.
pub trait TextRender {
    fn render_text(&self) -> String;
}

/// A host value carried through pipelines without the engine looking inside.
pub trait Opaque: fmt::Debug + Send + Sync + 'static {
    /// Name of the host type, used as the `ValueType::Handle` key.
    fn type_name(&self) -> &str;

    fn as_any(&self) -> &dyn Any;

    /// The text rendering capability, if the type has one.
    fn as_text_render(&self) -> Option<&dyn TextRender> {
        None
    }
}

/// Shared pointer to an opaque host value.
///
/// Cloning is cheap. Two handles are equal only if they point at the same value.
#[derive(Debug, Clone)]
pub struct Handle(Arc<dyn Opaque>);

impl Handle {
    pub fn new<T: Opaque>(value: T) -> Self {
        Self(Arc::new(value))
    }

    pub fn type_name(&self) -> &str {
        self.0.type_name()
    }

    pub fn downcast_ref<T: Opaque>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }

    pub fn as_text_render(&self) -> Option<&dyn TextRender> {
        self.0.as_text_render()
    }

    /// Render the handle as text, if it has the capability.
    pub fn text(&self) -> Option<String> {
        self.as_text_render().map(|r| r.render_text())
    }
}

impl PartialEq for Handle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// A record with named fields, like a struct in the host language.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Type name of the record.
    pub name: String,
    /// Fields in declaration order.
    pub fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Add a field.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.fields.iter_mut().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

/// A runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// Ordered sequence, indexable by position.
    List(Vec<Value>),
    /// String-keyed map.
    Map(BTreeMap<String, Value>),
    /// Integer-keyed map.
    IntMap(BTreeMap<i64, Value>),
    Record(Record),
    Handle(Handle),
}

impl Value {
    /// The runtime type of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Null => ValueType::Null,
            Value::Bool(_) => ValueType::Bool,
            Value::Int(_) => ValueType::Int,
            Value::Float(_) => ValueType::Float,
            Value::String(_) => ValueType::String,
            Value::List(_) => ValueType::List,
            Value::Map(_) => ValueType::Map,
            Value::IntMap(_) => ValueType::IntMap,
            Value::Record(r) => ValueType::Record(r.name.clone()),
            Value::Handle(h) => ValueType::Handle(h.type_name().to_string()),
        }
    }

    /// Shape name of this value as it appears in messages: the lowercase
    /// type name, or the type name of a record or handle.
    pub fn kind_name(&self) -> &str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::IntMap(_) => "intmap",
            Value::Record(r) => &r.name,
            Value::Handle(h) => h.type_name(),
        }
    }

    /// Wrap a host value in a handle.
    pub fn handle<T: Opaque>(value: T) -> Self {
        Value::Handle(Handle::new(value))
    }

    /// Build a string-keyed map from pairs.
    pub fn map<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Value::Map(entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_handle(&self) -> Option<&Handle> {
        match self {
            Value::Handle(h) => Some(h),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::String(s) => write!(f, "{s}"),
            Value::Handle(h) => match h.text() {
                Some(text) => write!(f, "{text}"),
                None => write!(f, "<{}>", h.type_name()),
            },
            Value::List(_) | Value::Map(_) | Value::IntMap(_) | Value::Record(_) => {
                write!(f, "{}", crate::json::value_to_json(self))
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<Record> for Value {
    fn from(r: Record) -> Self {
        Value::Record(r)
    }
}

impl From<Handle> for Value {
    fn from(h: Handle) -> Self {
        Value::Handle(h)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        crate::json::value_to_json(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let json = serde_json::Value::deserialize(deserializer)?;
        Ok(crate::json::json_to_value(json))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Shout(String);

    impl TextRender for Shout {
        fn render_text(&self) -> String {
            self.0.to_uppercase()
        }
    }

    impl Opaque for Shout {
        fn type_name(&self) -> &str {
            "shout"
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_text_render(&self) -> Option<&dyn TextRender> {
            Some(self)
        }
    }

    #[derive(Debug)]
    struct Silent;

    impl Opaque for Silent {
        fn type_name(&self) -> &str {
            "silent"
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn serde_goes_through_json() {
        let value = Value::map([
            ("name", Value::from("jo")),
            ("xs", Value::List(vec![Value::Int(1), Value::Float(0.5)])),
        ]);
        let text = serde_json::to_string(&value).expect("serializes");
        assert_eq!(text, r#"{"name":"jo","xs":[1,0.5]}"#);
        let back: Value = serde_json::from_str(&text).expect("deserializes");
        assert_eq!(back, value);

        let record = Value::from(Record::new("point").field("x", 1));
        assert_eq!(serde_json::to_string(&record).expect("serializes"), r#"{"x":1}"#);
        let shout = Value::handle(Shout("hi".into()));
        assert_eq!(serde_json::to_string(&shout).expect("serializes"), r#""HI""#);
        let silent = Value::handle(Silent);
        assert_eq!(serde_json::to_string(&silent).expect("serializes"), "null");
    }

    #[test]
    fn value_types() {
        assert_eq!(Value::Int(1).value_type(), ValueType::Int);
        assert_eq!(Value::from("x").value_type(), ValueType::String);
        assert_eq!(
            Value::Record(Record::new("point")).value_type(),
            ValueType::record("point")
        );
        assert_eq!(Value::handle(Silent).value_type(), ValueType::handle("silent"));
    }

    #[test]
    fn kind_names_match_type_names() {
        let values = [
            Value::Null,
            Value::Int(1),
            Value::from("s"),
            Value::map([("k", 1)]),
            Value::IntMap(BTreeMap::new()),
            Record::new("person").into(),
            Value::handle(Silent),
        ];
        for v in values {
            assert_eq!(v.kind_name(), v.value_type().to_string());
        }
    }

    #[test]
    fn any_accepts_everything() {
        assert!(ValueType::Any.accepts(&ValueType::Int));
        assert!(ValueType::Any.accepts(&ValueType::handle("silent")));
        assert!(ValueType::Int.accepts(&ValueType::Int));
        assert!(!ValueType::Int.accepts(&ValueType::Float));
        assert!(!ValueType::String.accepts(&ValueType::Any));
    }

    #[test]
    fn handle_text_capability_is_opt_in() {
        let loud = Handle::new(Shout("hey".into()));
        assert_eq!(loud.text(), Some("HEY".to_string()));
        assert_eq!(Handle::new(Silent).text(), None);
    }

    #[test]
    fn handle_equality_is_identity() {
        let a = Handle::new(Silent);
        let b = a.clone();
        assert_eq!(a, b);
        assert_ne!(a, Handle::new(Silent));
    }

    #[test]
    fn downcast_handle() {
        let h = Handle::new(Shout("x".into()));
        assert_eq!(h.downcast_ref::<Shout>().map(|s| s.0.as_str()), Some("x"));
        assert!(h.downcast_ref::<Silent>().is_none());
    }

    #[test]
    fn record_fields() {
        let r = Record::new("person").field("name", "josuke").field("age", 16);
        assert_eq!(r.get("name"), Some(&Value::from("josuke")));
        assert_eq!(r.get("missing"), None);
    }

    #[test]
    fn display() {
        assert_eq!(Value::Int(42).to_string(), "42");
        assert_eq!(Value::Float(2.5).to_string(), "2.5");
        assert_eq!(Value::from("hi").to_string(), "hi");
        assert_eq!(Value::List(vec![Value::Int(1), Value::from("a")]).to_string(), r#"[1,"a"]"#);
        assert_eq!(Value::handle(Silent).to_string(), "<silent>");
        assert_eq!(Value::handle(Shout("a".into())).to_string(), "A");
    }
}
