//! Equality strategies resolved per node

use rcmp_core::Value;
use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

type EqualsFn = dyn Fn(&Value, &Value) -> bool + Send + Sync;

/// A user supplied equality between two values
///
/// Built either from an equality predicate or from an ordering comparator
/// (equal iff the comparator returns [`Ordering::Equal`]).
#[derive(Clone)]
pub struct Equivalence {
    name: Cow<'static, str>,
    equals: Arc<EqualsFn>,
}

impl Equivalence {
    /// Equivalence from an equality predicate
    pub fn new<F>(equals: F) -> Self
    where
        F: Fn(&Value, &Value) -> bool + Send + Sync + 'static,
    {
        Self::named("custom equals", equals)
    }

    /// Equivalence from an equality predicate, with a name used in logs and
    /// difference descriptions
    pub fn named<F>(name: impl Into<Cow<'static, str>>, equals: F) -> Self
    where
        F: Fn(&Value, &Value) -> bool + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            equals: Arc::new(equals),
        }
    }

    /// Equivalence from an ordering comparator
    pub fn from_comparator<F>(comparator: F) -> Self
    where
        F: Fn(&Value, &Value) -> Ordering + Send + Sync + 'static,
    {
        Self::named("custom comparator", move |a, b| {
            comparator(a, b) == Ordering::Equal
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn equals(&self, actual: &Value, expected: &Value) -> bool {
        (self.equals)(actual, expected)
    }
}

impl fmt::Debug for Equivalence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Equivalence").field(&self.name).finish()
    }
}

/// How a node pair must be compared
#[derive(Debug, Clone, Copy)]
pub enum EqualityStrategy<'a> {
    /// Do not compare, record nothing
    Skip,
    /// Compare with the values' native equality, no field breakdown
    NativeEquals,
    /// Compare with a user supplied equivalence
    Custom(&'a Equivalence),
    /// Recurse into containers and fields
    Structural,
}

impl EqualityStrategy<'_> {
    pub fn is_skip(&self) -> bool {
        matches!(self, EqualityStrategy::Skip)
    }
}
