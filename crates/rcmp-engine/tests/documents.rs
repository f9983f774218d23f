//! JSON documents compared under policies loaded from YAML settings

mod common;

use common::*;
use rcmp_engine::{compare, ComparisonSettings, DifferenceKind, Value};
use serde_json::json;
use std::fs;
use tempfile::TempDir;

fn device(id: &str, state: &str, updated: &str) -> Value {
    Value::from(json!({
        "id": id,
        "state": state,
        "attributes": {
            "friendly_name": "Kitchen light",
            "supported_modes": ["brightness", "color_temp"]
        },
        "last_updated": updated
    }))
}

#[test]
fn test_json_documents() {
    let result = compare_default(
        &device("light.kitchen", "on", "2024-01-01"),
        &device("light.kitchen", "off", "2024-01-01"),
    );
    assert_eq!(paths(&result), vec!["state"]);
}

#[test]
fn test_json_nested_arrays() {
    let actual = Value::from(json!({"rooms": [{"name": "kitchen"}, {"name": "bath"}]}));
    let expected = Value::from(json!({"rooms": [{"name": "kitchen"}, {"name": "hall"}]}));
    let result = compare_default(&actual, &expected);
    assert_eq!(paths(&result), vec!["rooms[1].name"]);
}

#[test]
fn test_settings_from_file() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("comparison.yaml");
    fs::write(
        &path,
        r#"
ignored_fields: [id]
ignored_fields_matching: ["last_.*"]
unordered_fields: [attributes.supported_modes]
field_messages:
  state: state must match
"#,
    )
    .unwrap();

    let registry = ComparisonSettings::load(&path).unwrap().build().unwrap();

    let actual = device("light.kitchen", "on", "2024-01-01");
    let mut expected = json!({
        "id": "light.other",
        "state": "on",
        "attributes": {
            "friendly_name": "Kitchen light",
            "supported_modes": ["color_temp", "brightness"]
        },
        "last_updated": "2024-02-02"
    });
    assert!(compare(&actual, &Value::from(&expected), &registry)
        .unwrap()
        .is_equal());

    expected["state"] = json!("off");
    let result = compare(&actual, &Value::from(&expected), &registry).unwrap();
    assert_eq!(kinds(&result), vec![DifferenceKind::Mismatch]);
    assert_eq!(result.differences()[0].message.as_deref(), Some("state must match"));
}

#[test]
fn test_settings_extended_with_closures() {
    let settings = ComparisonSettings::from_yaml_str("ignore_collection_order: true\n").unwrap();
    let registry = settings
        .into_builder()
        .with_equals_for_fields(
            |a, b| match (a, b) {
                (Value::Str(x), Value::Str(y)) => x.eq_ignore_ascii_case(y),
                _ => false,
            },
            ["state"],
        )
        .build()
        .unwrap();

    let actual = Value::from(json!({"state": "ON", "modes": [1, 2]}));
    let expected = Value::from(json!({"state": "on", "modes": [2, 1]}));
    assert!(compare(&actual, &expected, &registry).unwrap().is_equal());
}

#[test]
fn test_difference_summaries_serialize() {
    let result = compare_default(
        &Value::from(json!({"a": 1, "c": [1]})),
        &Value::from(json!({"a": "1", "b": true})),
    );
    let summaries: Vec<_> = result.differences().iter().map(|d| d.summary()).collect();
    let json = serde_json::to_value(&summaries).unwrap();

    assert_eq!(
        json,
        json!([
            {"path": "a", "kind": "mismatch", "actual_type": "i64", "expected_type": "String"},
            {"path": "c", "kind": "missing", "actual_type": "list"},
            {"path": "b", "kind": "extra", "expected_type": "bool"}
        ])
    );
}
