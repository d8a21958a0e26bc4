//! Conversion between [`Value`] and `serde_json::Value`.
//!
//! Hosts usually hold their evaluation context as JSON; these two functions
//! move it in and out of the engine's value model.

use std::collections::BTreeMap;

use crate::value::Value;

/// Convert a JSON value into a pl value.
///
/// Objects become string-keyed maps and arrays become lists. Numbers that fit
/// an `i64` become `Int`, everything else `Float`.
pub fn json_to_value(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                Value::String(n.to_string())
            }
        }
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(items) => Value::List(items.into_iter().map(json_to_value).collect()),
        serde_json::Value::Object(map) => Value::Map(
            map.into_iter()
                .map(|(k, v)| (k, json_to_value(v)))
                .collect::<BTreeMap<_, _>>(),
        ),
    }
}

/// Convert a pl value into JSON.
///
/// Integer-keyed maps and records become objects. Handles become their text
/// rendering, or `null` when they cannot render as text.
pub fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int(i) => serde_json::Value::Number((*i).into()),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::List(items) => serde_json::Value::Array(items.iter().map(value_to_json).collect()),
        Value::Map(map) => serde_json::Value::Object(
            map.iter().map(|(k, v)| (k.clone(), value_to_json(v))).collect(),
        ),
        Value::IntMap(map) => serde_json::Value::Object(
            map.iter().map(|(k, v)| (k.to_string(), value_to_json(v))).collect(),
        ),
        Value::Record(record) => serde_json::Value::Object(
            record
                .fields
                .iter()
                .map(|(k, v)| (k.clone(), value_to_json(v)))
                .collect(),
        ),
        Value::Handle(h) => h
            .text()
            .map(serde_json::Value::String)
            .unwrap_or(serde_json::Value::Null),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Record;
    use serde_json::json;

    #[test]
    fn objects_and_arrays_become_maps_and_lists() {
        let value = json_to_value(json!({"a": [{"b": "foo"}], "n": 1.5, "i": 7}));
        let Value::Map(map) = &value else {
            panic!("expected map, got {value:?}");
        };
        assert_eq!(map.get("n"), Some(&Value::Float(1.5)));
        assert_eq!(map.get("i"), Some(&Value::Int(7)));
        assert_eq!(
            map.get("a"),
            Some(&Value::List(vec![Value::map([("b", "foo")])]))
        );
    }

    #[test]
    fn json_roundtrip_of_plain_data() {
        let original = json!({"list": [1, "two", null, true], "nested": {"x": 2.5}});
        assert_eq!(value_to_json(&json_to_value(original.clone())), original);
    }

    #[test]
    fn records_and_int_maps_render_as_objects() {
        let record = Record::new("point").field("x", 1).field("y", 2);
        assert_eq!(value_to_json(&Value::Record(record)), json!({"x": 1, "y": 2}));

        let int_map = Value::IntMap([(3, Value::from("c"))].into_iter().collect());
        assert_eq!(value_to_json(&int_map), json!({"3": "c"}));
    }

    #[test]
    fn nan_becomes_null() {
        assert_eq!(value_to_json(&Value::Float(f64::NAN)), serde_json::Value::Null);
    }
}
