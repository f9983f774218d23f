//! Shared fixtures for comparison tests
//!
//! Builders for small object graphs (people, homes, linked nodes) and
//! helpers to run a comparison and inspect its differences.

#![allow(dead_code)]

use rcmp_engine::{
    compare, ComparisonResult, DifferenceKind, EquivalenceRegistry, Object, ObjectRef,
    RegistryBuilder, Value,
};
use tracing_subscriber::EnvFilter;

/// Install a test subscriber; set `RUST_LOG=rcmp_engine=trace` to see the traversal
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn address(street: &str, city: &str) -> ObjectRef {
    Object::new("Address")
        .with_field("street", street)
        .with_field("city", city)
        .into_ref()
}

pub fn home(street: &str, city: &str) -> ObjectRef {
    Object::new("Home")
        .with_field("address", address(street, city))
        .into_ref()
}

pub fn person(name: &str, age: i64) -> Object {
    Object::new("Person")
        .with_field("name", name)
        .with_field("age", age)
}

/// A person living at the given address
pub fn resident(name: &str, age: i64, street: &str) -> Value {
    person(name, age)
        .with_field("home", home(street, "Paris"))
        .into_ref()
        .into()
}

/// A node whose `next` field points back to itself
pub fn self_loop(name: &str) -> Value {
    let node = Object::new("Node")
        .with_field("name", name)
        .with_field("next", Value::Null)
        .into_ref();
    node.set_field("next", node.clone()).unwrap();
    node.into()
}

/// Two nodes pointing at each other
pub fn two_cycle(first: &str, second: &str) -> Value {
    let a = Object::new("Node")
        .with_field("name", first)
        .with_field("next", Value::Null)
        .into_ref();
    let b = Object::new("Node")
        .with_field("name", second)
        .with_field("next", a.clone())
        .into_ref();
    a.set_field("next", b).unwrap();
    a.into()
}

pub fn compare_default(actual: &Value, expected: &Value) -> ComparisonResult {
    init_tracing();
    compare(actual, expected, &EquivalenceRegistry::default()).unwrap()
}

pub fn compare_using(actual: &Value, expected: &Value, builder: RegistryBuilder) -> ComparisonResult {
    init_tracing();
    let registry = builder.build().unwrap();
    compare(actual, expected, &registry).unwrap()
}

/// Display paths of the differences, in order
pub fn paths(result: &ComparisonResult) -> Vec<String> {
    result
        .differences()
        .iter()
        .map(|d| d.path.to_string())
        .collect()
}

pub fn kinds(result: &ComparisonResult) -> Vec<DifferenceKind> {
    result.differences().iter().map(|d| d.kind).collect()
}
