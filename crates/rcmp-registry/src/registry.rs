//! The immutable equivalence registry

use crate::builder::RegistryBuilder;
use crate::strategy::{EqualityStrategy, Equivalence};
use rcmp_core::{ComparisonPath, TypeName, Value};
use regex::Regex;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};

/// Global behavior switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RegistryFlags {
    /// Compare every ordered collection regardless of element order
    pub ignore_collection_order: bool,
    /// Compare arrays regardless of element order
    pub ignore_array_order: bool,
    /// Values of different runtime types are never equal
    pub strict_type_checking: bool,
    /// Let the default accessor expose private fields
    pub introspect_private_fields: bool,
    /// Compare an optional against a plain value through its content
    pub unwrap_optional_like_types: bool,
    /// Honor the native equality hook of every object that has one
    pub use_overridden_equals: bool,
    pub ignore_actual_null_fields: bool,
    pub ignore_expected_null_fields: bool,
    pub ignore_actual_empty_optional_fields: bool,
    /// A null value equals an empty collection
    pub treat_null_and_empty_collections_as_equal: bool,
    /// An enum equals a string holding its variant name
    pub allow_enum_string_comparison: bool,
}

impl RegistryFlags {
    /// Names of the flags, as written in settings files
    pub const NAMES: &'static [&'static str] = &[
        "ignore_collection_order",
        "ignore_array_order",
        "strict_type_checking",
        "introspect_private_fields",
        "unwrap_optional_like_types",
        "use_overridden_equals",
        "ignore_actual_null_fields",
        "ignore_expected_null_fields",
        "ignore_actual_empty_optional_fields",
        "treat_null_and_empty_collections_as_equal",
        "allow_enum_string_comparison",
    ];
}

/// Comparison policy
///
/// Built by [`RegistryBuilder`]; immutable once built. Every lookup is keyed
/// by the rule key of a [`ComparisonPath`] (element indices removed), so a
/// rule for `friends.name` applies to the name of every friend.
///
/// Precedence, most specific first: field comparator, ignored field,
/// ignored type, type comparator, native-equality type, structural
/// recursion.
#[derive(Debug, Default)]
pub struct EquivalenceRegistry {
    pub(crate) flags: RegistryFlags,
    pub(crate) field_comparators: HashMap<String, Equivalence>,
    pub(crate) field_pattern_comparators: Vec<(Regex, Equivalence)>,
    pub(crate) type_comparators: HashMap<TypeName, Equivalence>,
    pub(crate) native_equality_types: HashSet<TypeName>,
    pub(crate) ignored_paths: HashSet<String>,
    pub(crate) ignored_types: HashSet<TypeName>,
    pub(crate) ignored_patterns: Vec<Regex>,
    pub(crate) compared_paths: Vec<String>,
    pub(crate) compared_types: HashSet<TypeName>,
    pub(crate) unordered_paths: HashSet<String>,
    pub(crate) unordered_patterns: Vec<Regex>,
    pub(crate) overridden_equals_excluded_paths: HashSet<String>,
    pub(crate) overridden_equals_excluded_types: HashSet<TypeName>,
    pub(crate) overridden_equals_excluded_patterns: Vec<Regex>,
    pub(crate) field_messages: HashMap<String, String>,
    pub(crate) type_messages: HashMap<TypeName, String>,
}

impl EquivalenceRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub fn flags(&self) -> &RegistryFlags {
        &self.flags
    }

    /// Paths restricting the comparison, empty when everything is compared
    pub fn compared_paths(&self) -> &[String] {
        &self.compared_paths
    }

    /// Whether the comparison is restricted to values of some types
    pub fn has_compared_types(&self) -> bool {
        !self.compared_types.is_empty()
    }

    pub fn is_compared_type(&self, type_name: &TypeName) -> bool {
        self.compared_types.contains(type_name)
    }

    /// Resolve the strategy for the node at `path`
    ///
    /// `declared_type` is the type the enclosing field declares, if any;
    /// `runtime_type` is the type of the value found there.
    pub fn resolve_strategy(
        &self,
        path: &ComparisonPath,
        declared_type: Option<&TypeName>,
        runtime_type: Option<&TypeName>,
    ) -> EqualityStrategy<'_> {
        if let Some(equivalence) = self.field_comparator(path) {
            return EqualityStrategy::Custom(equivalence);
        }
        if self.is_ignored_path(path) {
            return EqualityStrategy::Skip;
        }

        let candidates = [runtime_type, declared_type];
        let mut types = candidates.iter().flatten();
        if types.clone().any(|t| self.ignored_types.contains(*t)) {
            return EqualityStrategy::Skip;
        }
        if let Some(equivalence) = types.clone().find_map(|t| self.type_comparators.get(*t)) {
            return EqualityStrategy::Custom(equivalence);
        }
        if types.any(|t| self.native_equality_types.contains(*t)) {
            return EqualityStrategy::NativeEquals;
        }
        EqualityStrategy::Structural
    }

    fn field_comparator(&self, path: &ComparisonPath) -> Option<&Equivalence> {
        if path.is_root() {
            return None;
        }
        let key = path.rule_key();
        self.field_comparators.get(&key).or_else(|| {
            self.field_pattern_comparators
                .iter()
                .find(|(regex, _)| regex.is_match(&key))
                .map(|(_, equivalence)| equivalence)
        })
    }

    /// Whether the node at `path` is excluded from the comparison
    ///
    /// True when the path or one of its ancestors is ignored (by name or by
    /// pattern), or when it lies outside the compared fields.
    pub fn is_ignored_path(&self, path: &ComparisonPath) -> bool {
        if path.is_root() {
            return false;
        }
        let hierarchy = path.rule_hierarchy();
        if hierarchy.iter().any(|key| self.ignored_paths.contains(key)) {
            return true;
        }
        if hierarchy
            .iter()
            .any(|key| self.ignored_patterns.iter().any(|regex| regex.is_match(key)))
        {
            return true;
        }
        self.is_outside_compared_paths(path)
    }

    /// Whether `path` is neither a compared path, nor an ancestor or
    /// descendant of one
    ///
    /// Nothing is pruned while compared types are set: fields of those
    /// types may sit anywhere in the graph, so differences are filtered
    /// once found instead.
    fn is_outside_compared_paths(&self, path: &ComparisonPath) -> bool {
        if self.compared_paths.is_empty() || self.has_compared_types() {
            return false;
        }
        !self.is_within_compared_paths(path)
    }

    /// Whether `path` is a compared path, or an ancestor or descendant of one
    pub fn is_within_compared_paths(&self, path: &ComparisonPath) -> bool {
        let key = path.rule_key();
        self.compared_paths
            .iter()
            .any(|compared| path.is_within(compared) || is_ancestor_key(&key, compared))
    }

    /// Whether the value pair is dropped by the null/empty-optional flags
    pub fn ignores_values(&self, actual: &Value, expected: &Value) -> bool {
        (self.flags.ignore_actual_null_fields && actual.is_null())
            || (self.flags.ignore_expected_null_fields && expected.is_null())
            || (self.flags.ignore_actual_empty_optional_fields
                && matches!(actual, Value::Optional(None)))
    }

    /// Whether ordered collections at `path` are compared as unordered
    pub fn ignores_collection_order(&self, path: &ComparisonPath) -> bool {
        if self.flags.ignore_collection_order {
            return true;
        }
        let hierarchy = path.rule_hierarchy();
        hierarchy.iter().any(|key| self.unordered_paths.contains(key))
            || hierarchy
                .iter()
                .any(|key| self.unordered_patterns.iter().any(|regex| regex.is_match(key)))
    }

    /// Whether arrays are compared as unordered
    pub fn ignores_array_order(&self) -> bool {
        self.flags.ignore_array_order
    }

    /// Whether the native equality hook of an object at `path` is honored
    pub fn honors_overridden_equals(&self, path: &ComparisonPath, type_name: &TypeName) -> bool {
        if !self.flags.use_overridden_equals
            || self.overridden_equals_excluded_types.contains(type_name)
        {
            return false;
        }
        !path.rule_hierarchy().iter().any(|key| {
            self.overridden_equals_excluded_paths.contains(key)
                || self
                    .overridden_equals_excluded_patterns
                    .iter()
                    .any(|regex| regex.is_match(key))
        })
    }

    /// Custom message for differences at `path`; field messages win over
    /// type messages
    pub fn message_for(&self, path: &ComparisonPath, type_name: Option<&TypeName>) -> Option<&str> {
        if !path.is_root() {
            if let Some(message) = self.field_messages.get(&path.rule_key()) {
                return Some(message);
            }
        }
        type_name
            .and_then(|t| self.type_messages.get(t))
            .map(String::as_str)
    }
}

/// Whether `key` is a strict ancestor of `descendant` (root included)
fn is_ancestor_key(key: &str, descendant: &str) -> bool {
    if key.is_empty() {
        return true;
    }
    descendant
        .strip_prefix(key)
        .map(|rest| rest.starts_with('.'))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> ComparisonPath {
        s.parse().unwrap()
    }

    #[test]
    fn test_default_is_structural() {
        let registry = EquivalenceRegistry::default();
        let strategy = registry.resolve_strategy(&path("name"), None, Some(&TypeName::STRING));
        assert!(matches!(strategy, EqualityStrategy::Structural));
    }

    #[test]
    fn test_compared_types_disable_path_pruning() {
        let registry = RegistryBuilder::new()
            .comparing_only_fields(["name"])
            .comparing_only_fields_of_types(["Address"])
            .build()
            .unwrap();
        assert!(registry.has_compared_types());
        assert!(registry.is_compared_type(&TypeName::from("Address")));
        assert!(!registry.is_ignored_path(&path("home.address")));
        assert!(registry.is_within_compared_paths(&path("name")));
        assert!(!registry.is_within_compared_paths(&path("home")));
    }

    #[test]
    fn test_ancestor_key() {
        assert!(is_ancestor_key("", "home"));
        assert!(is_ancestor_key("home", "home.address"));
        assert!(!is_ancestor_key("home", "homes.address"));
        assert!(!is_ancestor_key("home.address", "home.address"));
    }
}
