//! Recursive traversal of two object graphs
//!
//! Each node pair goes through the same steps:
//!
//! 1. value filters (ignored null fields, ignored empty optionals) and
//!    compared-type scoping
//! 2. strategy resolution: skipped nodes stop here, custom equivalences
//!    decide on their own
//! 3. identity and null checks
//! 4. cycle check against the ancestor pairs
//! 5. native equality, strict type checking
//! 6. dispatch on the kind of value: optionals, enums, sequences, sets,
//!    maps, objects and scalars
//!
//! Field reads that fail are recorded as differences; only introspection
//! errors abort the traversal.

use crate::collector::DifferenceCollector;
use crate::error::EngineResult;
use crate::model::{ComparisonResult, Difference, DifferenceKind, TraversalIssue};
use crate::tracker::VisitedPairTracker;
use indexmap::IndexMap;
use rcmp_core::{
    Accessor, ComparisonPath, EnumValue, FieldRead, MapKey, ObjectRef, TypeName, Value,
    FIELD_SEPARATOR,
};
use rcmp_registry::{EqualityStrategy, EquivalenceRegistry};
use std::mem;
use tracing::trace;

type Entries = IndexMap<MapKey, Value>;

/// State of a single comparison
///
/// Created fresh for every top-level call and consumed by
/// [`Comparator::run`].
pub struct Comparator<'a> {
    registry: &'a EquivalenceRegistry,
    accessor: &'a dyn Accessor,
    tracker: VisitedPairTracker,
    collector: DifferenceCollector,
    /// Set while testing a pair for equality without reporting
    probing: bool,
    /// Number of enclosing nodes whose type is one of the compared types
    compared_type_depth: usize,
}

impl<'a> Comparator<'a> {
    pub fn new(registry: &'a EquivalenceRegistry, accessor: &'a dyn Accessor) -> Self {
        Self {
            registry,
            accessor,
            tracker: VisitedPairTracker::new(),
            collector: DifferenceCollector::new(),
            probing: false,
            compared_type_depth: 0,
        }
    }

    /// Compare `actual` against `expected` and return every difference
    pub fn run(mut self, actual: &Value, expected: &Value) -> EngineResult<ComparisonResult> {
        self.check_compared_fields(actual)?;
        self.compare_node(actual, expected, &ComparisonPath::root(), None)?;
        Ok(self.collector.into_result())
    }

    fn compare_node(
        &mut self,
        actual: &Value,
        expected: &Value,
        path: &ComparisonPath,
        declared_type: Option<&TypeName>,
    ) -> EngineResult<()> {
        let registry = self.registry;

        // A probe only needs to know whether the pair differs at all
        if self.probing && !self.collector.is_empty() {
            return Ok(());
        }

        if !path.is_root() && registry.ignores_values(actual, expected) {
            trace!(path = %path, "Ignoring value pair");
            return Ok(());
        }

        let entered = registry.has_compared_types()
            && [actual.type_name(), expected.type_name()]
                .iter()
                .flatten()
                .any(|t| registry.is_compared_type(t));
        if entered {
            self.compared_type_depth += 1;
        }
        let outcome = self.compare_entered_node(actual, expected, path, declared_type);
        if entered {
            self.compared_type_depth -= 1;
        }
        outcome
    }

    fn compare_entered_node(
        &mut self,
        actual: &Value,
        expected: &Value,
        path: &ComparisonPath,
        declared_type: Option<&TypeName>,
    ) -> EngineResult<()> {
        let registry = self.registry;
        let runtime_type = actual.type_name().or_else(|| expected.type_name());
        let strategy = registry.resolve_strategy(path, declared_type, runtime_type.as_ref());
        trace!(path = %path, strategy = ?strategy, "Comparing node");

        let native = match strategy {
            EqualityStrategy::Skip => return Ok(()),
            EqualityStrategy::Custom(equivalence) => {
                if !equivalence.equals(actual, expected) {
                    self.record(
                        Difference::mismatch(path.clone(), actual, expected)
                            .with_description(format!(
                                "values differ according to {}",
                                equivalence.name()
                            )),
                    );
                }
                return Ok(());
            }
            EqualityStrategy::NativeEquals => true,
            EqualityStrategy::Structural => false,
        };

        if is_same_node(actual, expected) {
            return Ok(());
        }

        if registry.flags().treat_null_and_empty_collections_as_equal
            && ((actual.is_null() && expected.is_empty_collection())
                || (expected.is_null() && actual.is_empty_collection()))
        {
            return Ok(());
        }

        match (actual.is_null(), expected.is_null()) {
            (true, _) => {
                self.record(Difference::extra(path.clone(), expected.clone()));
                return Ok(());
            }
            (_, true) => {
                self.record(Difference::missing(path.clone(), actual.clone()));
                return Ok(());
            }
            _ => {}
        }

        if let (Value::Object(a), Value::Object(e)) = (actual, expected) {
            if self.tracker.contains((a.identity(), e.identity())) {
                trace!(path = %path, "Back-edge to an ancestor pair, assuming equal");
                return Ok(());
            }
        }

        if native {
            if !actual.native_eq(expected) {
                self.record(
                    Difference::mismatch(path.clone(), actual, expected)
                        .with_description("values differ according to native equality"),
                );
            }
            return Ok(());
        }

        if registry.flags().strict_type_checking {
            let actual_type = actual.type_name();
            let expected_type = expected.type_name();
            if actual_type != expected_type {
                let description = format!(
                    "actual value is of type '{}' while expected value is of type '{}'",
                    display_type(actual_type.as_ref()),
                    display_type(expected_type.as_ref())
                );
                self.record(
                    Difference::new(
                        DifferenceKind::UnexpectedType,
                        path.clone(),
                        Some(actual.clone()),
                        Some(expected.clone()),
                    )
                    .with_description(description),
                );
                return Ok(());
            }
        }

        self.dispatch(actual, expected, path)
    }

    fn dispatch(&mut self, actual: &Value, expected: &Value, path: &ComparisonPath) -> EngineResult<()> {
        let flags = *self.registry.flags();

        match (actual, expected) {
            (Value::Optional(a), Value::Optional(e)) => {
                self.compare_optionals(a.as_deref(), e.as_deref(), actual, expected, path)
            }
            (Value::Optional(a), other) if flags.unwrap_optional_like_types => match a {
                Some(inner) => self.compare_node(inner, other, path, None),
                None => {
                    self.record(
                        Difference::mismatch(path.clone(), actual, expected)
                            .with_description("actual optional is empty"),
                    );
                    Ok(())
                }
            },
            (other, Value::Optional(e)) if flags.unwrap_optional_like_types => match e {
                Some(inner) => self.compare_node(other, inner, path, None),
                None => {
                    self.record(
                        Difference::mismatch(path.clone(), actual, expected)
                            .with_description("expected optional is empty"),
                    );
                    Ok(())
                }
            },
            (Value::Enum(a), Value::Enum(e)) => {
                self.compare_enums(a, e, actual, expected, path, flags.strict_type_checking);
                Ok(())
            }
            (Value::Enum(a), Value::Str(s)) | (Value::Str(s), Value::Enum(a))
                if flags.allow_enum_string_comparison =>
            {
                if a.variant != *s {
                    self.record(Difference::mismatch(path.clone(), actual, expected));
                }
                Ok(())
            }
            (Value::Array(a), Value::Array(e)) => {
                if self.registry.ignores_array_order() {
                    self.compare_unordered(a, e, path)
                } else {
                    self.compare_ordered(a, e, actual, expected, path, "arrays")
                }
            }
            (Value::List(a), Value::List(e)) => {
                if self.registry.ignores_collection_order(path) {
                    self.compare_unordered(a, e, path)
                } else {
                    self.compare_ordered(a, e, actual, expected, path, "ordered collections")
                }
            }
            (Value::Set(a), Value::Set(e)) => self.compare_unordered(a, e, path),
            (Value::Map(a), Value::Map(e)) => self.compare_maps(a, e, path),
            (Value::Object(a), Value::Object(e)) => self.compare_objects(a, e, path),
            _ => {
                self.compare_leaves(actual, expected, path);
                Ok(())
            }
        }
    }

    fn compare_optionals(
        &mut self,
        actual_content: Option<&Value>,
        expected_content: Option<&Value>,
        actual: &Value,
        expected: &Value,
        path: &ComparisonPath,
    ) -> EngineResult<()> {
        match (actual_content, expected_content) {
            (Some(a), Some(e)) => self.compare_node(a, e, path, None),
            (None, None) => Ok(()),
            (None, Some(_)) => {
                self.record(
                    Difference::mismatch(path.clone(), actual, expected)
                        .with_description("actual optional is empty while expected optional has a value"),
                );
                Ok(())
            }
            (Some(_), None) => {
                self.record(
                    Difference::mismatch(path.clone(), actual, expected)
                        .with_description("actual optional has a value while expected optional is empty"),
                );
                Ok(())
            }
        }
    }

    fn compare_enums(
        &mut self,
        a: &EnumValue,
        e: &EnumValue,
        actual: &Value,
        expected: &Value,
        path: &ComparisonPath,
        strict: bool,
    ) {
        let equal = if strict { a == e } else { a.variant == e.variant };
        if !equal {
            self.record(Difference::mismatch(path.clone(), actual, expected));
        }
    }

    /// Scalars and pairs of values of different kinds
    fn compare_leaves(&mut self, actual: &Value, expected: &Value, path: &ComparisonPath) {
        if actual.native_eq(expected) {
            return;
        }
        let actual_kind = actual.kind_description();
        let expected_kind = expected.kind_description();
        let difference = Difference::mismatch(path.clone(), actual, expected);
        if actual_kind == expected_kind {
            self.record(difference);
        } else {
            self.record(difference.with_description(format!(
                "expected value is {} but actual value is {}",
                expected_kind, actual_kind
            )));
        }
    }

    /// Order-sensitive comparison of arrays and ordered collections
    ///
    /// A size mismatch is recorded once, then the shared prefix is compared
    /// elementwise. When equally sized sequences only differ by the order of
    /// their elements, a single difference is recorded for the sequence.
    /// Reorderings are not looked for while probing, so nested sequences
    /// are matched at most once per level.
    fn compare_ordered(
        &mut self,
        actual: &[Value],
        expected: &[Value],
        actual_value: &Value,
        expected_value: &Value,
        path: &ComparisonPath,
        label: &str,
    ) -> EngineResult<()> {
        if actual.len() != expected.len() {
            self.record(
                Difference::mismatch(path.clone(), actual_value, expected_value)
                    .with_description(format!(
                        "actual and expected values are {} of different size, actual size={} when expected size={}",
                        label,
                        actual.len(),
                        expected.len()
                    )),
            );
        }

        let mark = self.collector.len();
        for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
            self.compare_node(a, e, &path.index(i), None)?;
        }

        if !self.probing
            && actual.len() == expected.len()
            && self.collector.len() > mark
            && self.matches_unordered(actual, expected, path)?
        {
            self.collector.truncate(mark);
            self.record(
                Difference::mismatch(path.clone(), actual_value, expected_value)
                    .with_description(format!(
                        "actual and expected {} contain the same elements in a different order",
                        label
                    )),
            );
        }
        Ok(())
    }

    /// Greedy bipartite matching of two element sequences
    ///
    /// Each actual element, in order, is paired with the first unmatched
    /// expected element it compares equal to. Unmatched actual elements are
    /// missing from expected, unmatched expected elements are extra.
    fn compare_unordered(&mut self, actual: &[Value], expected: &[Value], path: &ComparisonPath) -> EngineResult<()> {
        let (unmatched_actual, matched_expected) = self.greedy_match(actual, expected, path)?;

        for i in unmatched_actual {
            self.record(Difference::missing(path.position(i), actual[i].clone()));
        }
        for (j, e) in expected.iter().enumerate() {
            if !matched_expected[j] {
                self.record(Difference::extra(path.position(j), e.clone()));
            }
        }
        Ok(())
    }

    fn matches_unordered(&mut self, actual: &[Value], expected: &[Value], path: &ComparisonPath) -> EngineResult<bool> {
        let (unmatched_actual, _) = self.greedy_match(actual, expected, path)?;
        Ok(unmatched_actual.is_empty() && actual.len() == expected.len())
    }

    fn greedy_match(
        &mut self,
        actual: &[Value],
        expected: &[Value],
        path: &ComparisonPath,
    ) -> EngineResult<(Vec<usize>, Vec<bool>)> {
        let mut matched = vec![false; expected.len()];
        let mut unmatched = Vec::new();

        for (i, a) in actual.iter().enumerate() {
            let mut found = None;
            for (j, e) in expected.iter().enumerate() {
                if matched[j] {
                    continue;
                }
                if self.probe(a, e, &path.position(i))? {
                    found = Some(j);
                    break;
                }
            }
            match found {
                Some(j) => matched[j] = true,
                None => unmatched.push(i),
            }
        }
        Ok((unmatched, matched))
    }

    /// Compare a pair without recording anything, returning whether it is equal
    fn probe(&mut self, actual: &Value, expected: &Value, path: &ComparisonPath) -> EngineResult<bool> {
        let saved = mem::take(&mut self.collector);
        let was_probing = mem::replace(&mut self.probing, true);
        let outcome = self.compare_node(actual, expected, path, None);
        self.probing = was_probing;
        let probe = mem::replace(&mut self.collector, saved);
        outcome?;
        Ok(probe.is_empty())
    }

    /// Maps are compared key by key
    ///
    /// Actual keys absent from expected are missing, expected keys absent
    /// from actual are extra, shared keys are compared recursively.
    fn compare_maps(&mut self, actual: &Entries, expected: &Entries, path: &ComparisonPath) -> EngineResult<()> {
        let flags = *self.registry.flags();
        for (key, a) in actual {
            let child = path.key(key.to_string());
            match expected.get(key) {
                Some(e) => self.compare_node(a, e, &child, None)?,
                None if self.registry.is_ignored_path(&child) => {}
                None if flags.ignore_actual_null_fields && a.is_null() => {}
                None => self.record(Difference::missing(child, a.clone())),
            }
        }
        for (key, e) in expected {
            if actual.contains_key(key) {
                continue;
            }
            let child = path.key(key.to_string());
            if self.registry.is_ignored_path(&child)
                || (flags.ignore_expected_null_fields && e.is_null())
            {
                continue;
            }
            self.record(Difference::extra(child, e.clone()));
        }
        Ok(())
    }

    fn compare_objects(&mut self, actual: &ObjectRef, expected: &ObjectRef, path: &ComparisonPath) -> EngineResult<()> {
        if self.registry.honors_overridden_equals(path, actual.type_name()) && actual.has_native_equality()? {
            if !actual.native_eq(expected) {
                self.record(
                    Difference::mismatch(
                        path.clone(),
                        &Value::Object(actual.clone()),
                        &Value::Object(expected.clone()),
                    )
                    .with_description("values differ according to overridden equals"),
                );
            }
            return Ok(());
        }

        self.tracker.push((actual.identity(), expected.identity()));
        let outcome = self.compare_fields(actual, expected, path);
        self.tracker.pop();
        outcome
    }

    /// Field-by-field comparison in the actual's declaration order
    fn compare_fields(&mut self, actual: &ObjectRef, expected: &ObjectRef, path: &ComparisonPath) -> EngineResult<()> {
        let registry = self.registry;
        let actual_fields = self.accessor.list_fields(actual)?;
        let expected_fields = self.accessor.list_fields(expected)?;

        for field in &actual_fields {
            let child = path.field(&field.name);
            let counterpart = expected_fields.iter().find(|f| f.name == field.name);
            let declared_type = field
                .declared_type
                .as_ref()
                .or_else(|| counterpart.and_then(|f| f.declared_type.as_ref()));

            if registry.resolve_strategy(&child, declared_type, None).is_skip() {
                continue;
            }

            let Some(counterpart) = counterpart else {
                let read = self.accessor.read_field(actual, field)?;
                let value = read.value().cloned().unwrap_or(Value::Null);
                if !(registry.flags().ignore_actual_null_fields && value.is_null()) {
                    self.record(Difference::missing(child, value));
                }
                continue;
            };

            let actual_read = self.accessor.read_field(actual, field)?;
            let expected_read = self.accessor.read_field(expected, counterpart)?;
            match (actual_read, expected_read) {
                (FieldRead::Value(a), FieldRead::Value(e)) => {
                    self.compare_node(&a, &e, &child, declared_type)?;
                }
                (a, e) => self.record_unreadable(child, a, e),
            }
        }

        for field in &expected_fields {
            if actual_fields.iter().any(|f| f.name == field.name) {
                continue;
            }
            let child = path.field(&field.name);
            if registry
                .resolve_strategy(&child, field.declared_type.as_ref(), None)
                .is_skip()
            {
                continue;
            }
            let read = self.accessor.read_field(expected, field)?;
            let value = read.value().cloned().unwrap_or(Value::Null);
            if !(registry.flags().ignore_expected_null_fields && value.is_null()) {
                self.record(Difference::extra(child, value));
            }
        }
        Ok(())
    }

    fn record_unreadable(&mut self, path: ComparisonPath, actual: FieldRead, expected: FieldRead) {
        let reasons: Vec<String> = [("actual", &actual), ("expected", &expected)]
            .iter()
            .filter_map(|(side, read)| read.unreadable_reason().map(|r| format!("{}: {}", side, r)))
            .collect();
        let difference = Difference::new(
            DifferenceKind::Unreadable,
            path,
            actual.value().cloned(),
            expected.value().cloned(),
        )
        .with_description(reasons.join("; "));
        self.record(difference);
    }

    /// Report compared fields that cannot be found on the root actual value
    fn check_compared_fields(&mut self, root: &Value) -> EngineResult<()> {
        let registry = self.registry;
        for compared in registry.compared_paths() {
            let segments: Vec<&str> = compared.split(FIELD_SEPARATOR).collect();
            if !self.resolves(root, &segments)? {
                self.collector.report_issue(TraversalIssue::UnknownComparedField {
                    path: compared.clone(),
                });
            }
        }
        Ok(())
    }

    /// Whether the field names in `segments` can be followed from `value`
    ///
    /// Only objects, maps and present optionals are followed; anything else
    /// (collections, nulls, unreadable fields) gives the benefit of the doubt.
    fn resolves(&self, value: &Value, segments: &[&str]) -> EngineResult<bool> {
        let Some((name, rest)) = segments.split_first() else {
            return Ok(true);
        };
        match value {
            Value::Object(object) => {
                let fields = self.accessor.list_fields(object)?;
                let Some(field) = fields.iter().find(|f| f.name == *name) else {
                    return Ok(false);
                };
                match self.accessor.read_field(object, field)? {
                    FieldRead::Value(child) => self.resolves(&child, rest),
                    FieldRead::Unreadable(_) => Ok(true),
                }
            }
            Value::Map(entries) => match entries.iter().find(|(key, _)| key.to_string() == *name) {
                Some((_, child)) => self.resolves(child, rest),
                None => Ok(false),
            },
            Value::Optional(Some(inner)) => self.resolves(inner, segments),
            _ => Ok(true),
        }
    }

    /// Record a difference, attaching the custom message registered for it
    ///
    /// When only fields of some types are compared, differences outside
    /// values of those types (and outside the compared fields) are dropped.
    fn record(&mut self, difference: Difference) {
        if self.registry.has_compared_types()
            && self.compared_type_depth == 0
            && !self.registry.is_within_compared_paths(&difference.path)
        {
            trace!(path = %difference.path, "Dropping difference outside the compared types");
            return;
        }
        let type_name = difference
            .actual
            .as_ref()
            .or(difference.expected.as_ref())
            .and_then(Value::type_name);
        let message = self
            .registry
            .message_for(&difference.path, type_name.as_ref())
            .map(str::to_string);
        match message {
            Some(message) => self.collector.record(difference.with_message(message)),
            None => self.collector.record(difference),
        }
    }
}

/// Same object, or both null
fn is_same_node(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Null, Value::Null) => true,
        (Value::Object(a), Value::Object(e)) => a.ptr_eq(e),
        _ => false,
    }
}

fn display_type(type_name: Option<&TypeName>) -> &str {
    type_name.map(TypeName::as_str).unwrap_or("null")
}
