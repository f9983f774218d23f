//! Conversion from JSON documents
//!
//! JSON objects become maps keyed by string and JSON arrays become ordered
//! collections, so JSON fixtures can be compared like any other graph.

use crate::value::{MapKey, Value};
use serde_json::Value as Json;

impl From<Json> for Value {
    fn from(json: Json) -> Self {
        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Json::String(s) => Value::Str(s),
            Json::Array(items) => Value::List(items.into_iter().map(Value::from).collect()),
            Json::Object(entries) => Value::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (MapKey::Str(k), Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&Json> for Value {
    fn from(json: &Json) -> Self {
        Value::from(json.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_numbers() {
        assert_eq!(Value::from(json!(42)), Value::Int(42));
        assert_eq!(Value::from(json!(1.5)), Value::Float(1.5));
        assert_eq!(Value::from(json!(u64::MAX)), Value::Float(u64::MAX as f64));
    }

    #[test]
    fn test_nested_document() {
        let value = Value::from(json!({
            "name": "kitchen",
            "tags": ["a", "b"],
            "owner": null
        }));
        match value {
            Value::Map(entries) => {
                let mut keys: Vec<_> = entries.keys().map(|k| k.to_string()).collect();
                keys.sort();
                assert_eq!(keys, vec!["name", "owner", "tags"]);
                assert_eq!(entries[&MapKey::from("tags")], Value::list(["a", "b"]));
                assert!(entries[&MapKey::from("owner")].is_null());
            }
            other => panic!("expected a map, got {:?}", other),
        }
    }
}
