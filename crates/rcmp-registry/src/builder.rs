//! Fluent construction and validation of an equivalence registry

use crate::error::{ConfigError, ConfigResult};
use crate::registry::{EquivalenceRegistry, RegistryFlags};
use crate::strategy::Equivalence;
use rcmp_core::{ComparisonPath, TypeName, Value};
use regex::Regex;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Builder for [`EquivalenceRegistry`]
///
/// Rules are only collected here; paths are parsed, regexes compiled and
/// conflicts detected in [`RegistryBuilder::build`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    flags: RegistryFlags,
    ignored_paths: Vec<String>,
    ignored_patterns: Vec<String>,
    ignored_types: Vec<TypeName>,
    field_comparators: Vec<(String, Equivalence)>,
    field_pattern_comparators: Vec<(String, Equivalence)>,
    type_comparators: Vec<(TypeName, Equivalence)>,
    native_equality_types: Vec<TypeName>,
    compared_paths: Vec<String>,
    compared_types: Vec<TypeName>,
    unordered_paths: Vec<String>,
    unordered_patterns: Vec<String>,
    overridden_equals_excluded_paths: Vec<String>,
    overridden_equals_excluded_types: Vec<TypeName>,
    overridden_equals_excluded_patterns: Vec<String>,
    field_messages: Vec<(String, String)>,
    type_messages: Vec<(TypeName, String)>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all flags at once
    pub fn with_flags(mut self, flags: RegistryFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Ignore the given field paths and everything underneath them
    pub fn ignoring_fields<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored_paths.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Ignore fields whose value (or declared type) is one of `types`
    pub fn ignoring_fields_of_types<I, T>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TypeName>,
    {
        self.ignored_types.extend(types.into_iter().map(Into::into));
        self
    }

    /// Ignore fields whose path fully matches one of the regexes
    pub fn ignoring_fields_matching_regexes<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored_patterns.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Compare values of `type_name` with `equals`
    pub fn with_equals_for_type<F>(mut self, type_name: impl Into<TypeName>, equals: F) -> Self
    where
        F: Fn(&Value, &Value) -> bool + Send + Sync + 'static,
    {
        self.type_comparators
            .push((type_name.into(), Equivalence::new(equals)));
        self
    }

    /// Compare values of `type_name` with an ordering comparator
    pub fn with_comparator_for_type<F>(mut self, type_name: impl Into<TypeName>, comparator: F) -> Self
    where
        F: Fn(&Value, &Value) -> Ordering + Send + Sync + 'static,
    {
        self.type_comparators
            .push((type_name.into(), Equivalence::from_comparator(comparator)));
        self
    }

    /// Compare the given field paths with `equals`
    pub fn with_equals_for_fields<F, I, S>(self, equals: F, paths: I) -> Self
    where
        F: Fn(&Value, &Value) -> bool + Send + Sync + 'static,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_equivalence_for_fields(Equivalence::new(equals), paths)
    }

    /// Compare the given field paths with an ordering comparator
    pub fn with_comparator_for_fields<F, I, S>(self, comparator: F, paths: I) -> Self
    where
        F: Fn(&Value, &Value) -> Ordering + Send + Sync + 'static,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.with_equivalence_for_fields(Equivalence::from_comparator(comparator), paths)
    }

    /// Compare the given field paths with a prepared equivalence
    pub fn with_equivalence_for_fields<I, S>(mut self, equivalence: Equivalence, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for path in paths {
            self.field_comparators.push((path.into(), equivalence.clone()));
        }
        self
    }

    /// Compare fields whose path fully matches one of the regexes with `equals`
    pub fn with_equals_for_fields_matching_regexes<F, I, S>(mut self, equals: F, patterns: I) -> Self
    where
        F: Fn(&Value, &Value) -> bool + Send + Sync + 'static,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let equivalence = Equivalence::new(equals);
        for pattern in patterns {
            self.field_pattern_comparators
                .push((pattern.into(), equivalence.clone()));
        }
        self
    }

    /// Compare values of the given types with their native equality
    pub fn using_overridden_equals_for_types<I, T>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TypeName>,
    {
        self.native_equality_types
            .extend(types.into_iter().map(Into::into));
        self
    }

    /// Honor the native equality hook of every object that has one
    pub fn using_overridden_equals(mut self) -> Self {
        self.flags.use_overridden_equals = true;
        self
    }

    /// Never honor equality hooks at these paths
    pub fn ignoring_overridden_equals_for_fields<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.overridden_equals_excluded_paths
            .extend(paths.into_iter().map(Into::into));
        self
    }

    /// Never honor equality hooks of these types
    pub fn ignoring_overridden_equals_for_types<I, T>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TypeName>,
    {
        self.overridden_equals_excluded_types
            .extend(types.into_iter().map(Into::into));
        self
    }

    /// Never honor equality hooks at paths fully matching one of the regexes
    pub fn ignoring_overridden_equals_for_fields_matching_regexes<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.overridden_equals_excluded_patterns
            .extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Compare only these paths (plus what leads to them and lies under them)
    pub fn comparing_only_fields<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.compared_paths.extend(paths.into_iter().map(Into::into));
        self
    }

    /// Only report differences found in values of these types
    ///
    /// The whole graph is still walked, since fields of these types can
    /// appear at any depth. Combined with [`comparing_only_fields`], a
    /// difference is kept when either rule selects it.
    ///
    /// [`comparing_only_fields`]: RegistryBuilder::comparing_only_fields
    pub fn comparing_only_fields_of_types<I, T>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TypeName>,
    {
        self.compared_types.extend(types.into_iter().map(Into::into));
        self
    }

    pub fn ignoring_collection_order(mut self) -> Self {
        self.flags.ignore_collection_order = true;
        self
    }

    pub fn ignoring_collection_order_in_fields<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unordered_paths.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn ignoring_collection_order_in_fields_matching_regexes<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unordered_patterns
            .extend(patterns.into_iter().map(Into::into));
        self
    }

    pub fn ignoring_array_order(mut self) -> Self {
        self.flags.ignore_array_order = true;
        self
    }

    pub fn with_strict_type_checking(mut self) -> Self {
        self.flags.strict_type_checking = true;
        self
    }

    pub fn introspecting_private_fields(mut self) -> Self {
        self.flags.introspect_private_fields = true;
        self
    }

    pub fn unwrapping_optional_like_types(mut self) -> Self {
        self.flags.unwrap_optional_like_types = true;
        self
    }

    pub fn ignoring_actual_null_fields(mut self) -> Self {
        self.flags.ignore_actual_null_fields = true;
        self
    }

    pub fn ignoring_expected_null_fields(mut self) -> Self {
        self.flags.ignore_expected_null_fields = true;
        self
    }

    pub fn ignoring_actual_empty_optional_fields(mut self) -> Self {
        self.flags.ignore_actual_empty_optional_fields = true;
        self
    }

    pub fn treating_null_and_empty_collections_as_equal(mut self) -> Self {
        self.flags.treat_null_and_empty_collections_as_equal = true;
        self
    }

    pub fn allowing_enum_string_comparison(mut self) -> Self {
        self.flags.allow_enum_string_comparison = true;
        self
    }

    /// Attach `message` to differences reported at these paths
    pub fn with_error_message_for_fields<I, S>(mut self, message: impl Into<String>, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let message = message.into();
        for path in paths {
            self.field_messages.push((path.into(), message.clone()));
        }
        self
    }

    /// Attach `message` to differences on values of `type_name`
    pub fn with_error_message_for_type(mut self, message: impl Into<String>, type_name: impl Into<TypeName>) -> Self {
        self.type_messages.push((type_name.into(), message.into()));
        self
    }

    /// Validate every rule and freeze the registry
    pub fn build(self) -> ConfigResult<EquivalenceRegistry> {
        let ignored_paths: HashSet<String> = normalize_paths(&self.ignored_paths)?.into_iter().collect();
        let ignored_types: HashSet<TypeName> = self.ignored_types.into_iter().collect();

        let mut field_comparators = HashMap::new();
        for (path, equivalence) in self.field_comparators {
            let key = normalize_path(&path)?;
            if ignored_paths.contains(&key) {
                return Err(ConfigError::ConflictingRules {
                    target: key,
                    reason: "field is both ignored and given a comparator".to_string(),
                });
            }
            if field_comparators.insert(key.clone(), equivalence).is_some() {
                return Err(ConfigError::ConflictingRules {
                    target: key,
                    reason: "field is given more than one comparator".to_string(),
                });
            }
        }

        let mut type_comparators = HashMap::new();
        for (type_name, equivalence) in self.type_comparators {
            if ignored_types.contains(&type_name) {
                return Err(ConfigError::ConflictingRules {
                    target: type_name.to_string(),
                    reason: "type is both ignored and given a comparator".to_string(),
                });
            }
            if type_comparators.insert(type_name.clone(), equivalence).is_some() {
                return Err(ConfigError::ConflictingRules {
                    target: type_name.to_string(),
                    reason: "type is given more than one comparator".to_string(),
                });
            }
        }

        let field_pattern_comparators = self
            .field_pattern_comparators
            .into_iter()
            .map(|(pattern, equivalence)| Ok((compile_pattern(&pattern)?, equivalence)))
            .collect::<ConfigResult<Vec<_>>>()?;

        let mut field_messages = HashMap::new();
        for (path, message) in self.field_messages {
            field_messages.insert(normalize_path(&path)?, message);
        }

        let registry = EquivalenceRegistry {
            flags: self.flags,
            field_comparators,
            field_pattern_comparators,
            type_comparators,
            native_equality_types: self.native_equality_types.into_iter().collect(),
            ignored_paths,
            ignored_types,
            ignored_patterns: compile_patterns(&self.ignored_patterns)?,
            compared_paths: normalize_paths(&self.compared_paths)?,
            compared_types: self.compared_types.into_iter().collect(),
            unordered_paths: normalize_paths(&self.unordered_paths)?.into_iter().collect(),
            unordered_patterns: compile_patterns(&self.unordered_patterns)?,
            overridden_equals_excluded_paths: normalize_paths(&self.overridden_equals_excluded_paths)?
                .into_iter()
                .collect(),
            overridden_equals_excluded_types: self.overridden_equals_excluded_types.into_iter().collect(),
            overridden_equals_excluded_patterns: compile_patterns(&self.overridden_equals_excluded_patterns)?,
            field_messages,
            type_messages: self.type_messages.into_iter().collect(),
        };

        debug!(
            ignored_paths = registry.ignored_paths.len(),
            ignored_types = registry.ignored_types.len(),
            field_comparators = registry.field_comparators.len(),
            type_comparators = registry.type_comparators.len(),
            flags = ?registry.flags,
            "Built equivalence registry"
        );

        Ok(registry)
    }
}

/// Parse a dotted path and return its rule key
fn normalize_path(path: &str) -> ConfigResult<String> {
    ComparisonPath::parse(path)
        .map(|parsed| parsed.rule_key())
        .map_err(|source| ConfigError::InvalidPath {
            path: path.to_string(),
            source,
        })
}

fn normalize_paths(paths: &[String]) -> ConfigResult<Vec<String>> {
    paths.iter().map(|path| normalize_path(path)).collect()
}

/// Compile a regex anchored at both ends, so it must match a whole path
fn compile_pattern(pattern: &str) -> ConfigResult<Regex> {
    Regex::new(&format!("^(?:{})$", pattern)).map_err(|source| ConfigError::InvalidPattern {
        pattern: pattern.to_string(),
        source,
    })
}

fn compile_patterns(patterns: &[String]) -> ConfigResult<Vec<Regex>> {
    patterns.iter().map(|pattern| compile_pattern(pattern)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::EqualityStrategy;

    fn path(s: &str) -> ComparisonPath {
        s.parse().unwrap()
    }

    #[test]
    fn test_field_comparator_wins_over_type_comparator() {
        let registry = RegistryBuilder::new()
            .with_equals_for_type(TypeName::STRING, |_, _| true)
            .with_equals_for_fields(|_, _| false, ["name"])
            .build()
            .unwrap();

        match registry.resolve_strategy(&path("name"), None, Some(&TypeName::STRING)) {
            EqualityStrategy::Custom(eq) => assert!(!eq.equals(&Value::Null, &Value::Null)),
            other => panic!("unexpected strategy {:?}", other),
        }
        match registry.resolve_strategy(&path("email"), None, Some(&TypeName::STRING)) {
            EqualityStrategy::Custom(eq) => assert!(eq.equals(&Value::Null, &Value::Null)),
            other => panic!("unexpected strategy {:?}", other),
        }
    }

    #[test]
    fn test_field_comparator_wins_over_ignored_ancestor() {
        let registry = RegistryBuilder::new()
            .ignoring_fields(["home"])
            .with_equals_for_fields(|_, _| true, ["home.address"])
            .build()
            .unwrap();
        assert!(matches!(
            registry.resolve_strategy(&path("home.address"), None, None),
            EqualityStrategy::Custom(_)
        ));
        assert!(registry
            .resolve_strategy(&path("home.owner"), None, None)
            .is_skip());
    }

    #[test]
    fn test_ignored_type_wins_over_type_comparator_and_native() {
        let registry = RegistryBuilder::new()
            .ignoring_fields_of_types(["Timestamp"])
            .using_overridden_equals_for_types(["Timestamp", "Money"])
            .build()
            .unwrap();
        let timestamp = TypeName::from("Timestamp");
        let money = TypeName::from("Money");
        assert!(registry
            .resolve_strategy(&path("created"), None, Some(&timestamp))
            .is_skip());
        assert!(matches!(
            registry.resolve_strategy(&path("price"), Some(&money), None),
            EqualityStrategy::NativeEquals
        ));
    }

    #[test]
    fn test_declared_type_is_consulted() {
        let registry = RegistryBuilder::new()
            .with_comparator_for_type("Score", |_, _| Ordering::Equal)
            .build()
            .unwrap();
        let score = TypeName::from("Score");
        assert!(matches!(
            registry.resolve_strategy(&path("best"), Some(&score), Some(&TypeName::INT)),
            EqualityStrategy::Custom(_)
        ));
    }

    #[test]
    fn test_ignored_paths_cover_descendants_and_elements() {
        let registry = RegistryBuilder::new()
            .ignoring_fields(["friends.age"])
            .build()
            .unwrap();
        let element = ComparisonPath::root().field("friends").index(2).field("age");
        assert!(registry.is_ignored_path(&element));
        assert!(registry.is_ignored_path(&element.field("years")));
        assert!(!registry.is_ignored_path(&path("friends.name")));
        assert!(!registry.is_ignored_path(&ComparisonPath::root()));
    }

    #[test]
    fn test_patterns_must_match_whole_path() {
        let registry = RegistryBuilder::new()
            .ignoring_fields_matching_regexes([".*id"])
            .build()
            .unwrap();
        assert!(registry.is_ignored_path(&path("id")));
        assert!(registry.is_ignored_path(&path("owner.id")));
        assert!(!registry.is_ignored_path(&path("identity")));
    }

    #[test]
    fn test_compared_fields_restrict_comparison() {
        let registry = RegistryBuilder::new()
            .comparing_only_fields(["home.address.street"])
            .build()
            .unwrap();
        assert!(!registry.is_ignored_path(&path("home")));
        assert!(!registry.is_ignored_path(&path("home.address")));
        assert!(!registry.is_ignored_path(&path("home.address.street")));
        assert!(!registry.is_ignored_path(&path("home.address.street.number")));
        assert!(registry.is_ignored_path(&path("home.owner")));
        assert!(registry.is_ignored_path(&path("name")));
    }

    #[test]
    fn test_collection_order_per_field() {
        let registry = RegistryBuilder::new()
            .ignoring_collection_order_in_fields(["tags"])
            .ignoring_collection_order_in_fields_matching_regexes(["friends\\..*"])
            .build()
            .unwrap();
        assert!(registry.ignores_collection_order(&path("tags")));
        assert!(registry.ignores_collection_order(&path("friends.pets")));
        assert!(!registry.ignores_collection_order(&path("friends")));
        assert!(!registry.ignores_collection_order(&path("labels")));
    }

    #[test]
    fn test_overridden_equals_exclusions() {
        let registry = RegistryBuilder::new()
            .using_overridden_equals()
            .ignoring_overridden_equals_for_fields(["owner"])
            .ignoring_overridden_equals_for_types(["Address"])
            .build()
            .unwrap();
        let person = TypeName::from("Person");
        assert!(registry.honors_overridden_equals(&path("friend"), &person));
        assert!(!registry.honors_overridden_equals(&path("owner.friend"), &person));
        assert!(!registry.honors_overridden_equals(&path("home"), &TypeName::from("Address")));
    }

    #[test]
    fn test_overridden_equals_excluded_by_pattern() {
        let registry = RegistryBuilder::new()
            .using_overridden_equals()
            .ignoring_overridden_equals_for_fields_matching_regexes(["friends\\..*", "b.s"])
            .build()
            .unwrap();
        let person = TypeName::from("Person");
        assert!(!registry.honors_overridden_equals(&path("friends.home"), &person));
        assert!(!registry.honors_overridden_equals(&path("friends.home.owner"), &person));
        assert!(!registry.honors_overridden_equals(&path("bus"), &person));
        assert!(registry.honors_overridden_equals(&path("friends"), &person));
        assert!(registry.honors_overridden_equals(&path("buses"), &person));

        let err = RegistryBuilder::new()
            .ignoring_overridden_equals_for_fields_matching_regexes(["[a-"])
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { .. }));
    }

    #[test]
    fn test_messages_prefer_fields() {
        let registry = RegistryBuilder::new()
            .with_error_message_for_fields("name differs", ["name"])
            .with_error_message_for_type("strings differ", TypeName::STRING)
            .build()
            .unwrap();
        assert_eq!(
            registry.message_for(&path("name"), Some(&TypeName::STRING)),
            Some("name differs")
        );
        assert_eq!(
            registry.message_for(&path("email"), Some(&TypeName::STRING)),
            Some("strings differ")
        );
        assert_eq!(registry.message_for(&path("email"), None), None);
    }

    #[test]
    fn test_invalid_pattern_fails_fast() {
        let err = RegistryBuilder::new()
            .ignoring_fields_matching_regexes(["(unclosed"])
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { ref pattern, .. } if pattern == "(unclosed"));
    }

    #[test]
    fn test_invalid_path_fails_fast() {
        let err = RegistryBuilder::new()
            .ignoring_fields(["home..street"])
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPath { .. }));
    }

    #[test]
    fn test_conflicting_field_rules() {
        let err = RegistryBuilder::new()
            .ignoring_fields(["name"])
            .with_equals_for_fields(|_, _| true, ["name"])
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::ConflictingRules { ref target, .. } if target == "name"));

        let err = RegistryBuilder::new()
            .with_equals_for_fields(|_, _| true, ["name"])
            .with_comparator_for_fields(|_, _| Ordering::Equal, ["name"])
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::ConflictingRules { .. }));
    }

    #[test]
    fn test_conflicting_type_rules() {
        let err = RegistryBuilder::new()
            .ignoring_fields_of_types([TypeName::FLOAT])
            .with_equals_for_type(TypeName::FLOAT, |_, _| true)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::ConflictingRules { ref target, .. } if target == "f64"));

        let err = RegistryBuilder::new()
            .with_equals_for_type(TypeName::FLOAT, |_, _| true)
            .with_comparator_for_type(TypeName::FLOAT, |_, _| Ordering::Equal)
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::ConflictingRules { .. }));
    }
}
