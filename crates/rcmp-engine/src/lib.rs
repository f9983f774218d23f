//! Recursive structural comparison of object graphs
//!
//! Given an actual and an expected [`Value`], [`compare`] walks both graphs
//! side by side and reports every located [`Difference`] under the policy of
//! an [`EquivalenceRegistry`]. Comparisons always run to completion: missing
//! fields, cycles and type disagreements are differences, not errors. Only a
//! failing introspection layer aborts with a [`CompareError`].
//!
//! # Example
//!
//! ```ignore
//! use rcmp_engine::{compare, EquivalenceRegistry, Object, Value};
//!
//! let registry = EquivalenceRegistry::builder()
//!     .ignoring_fields(["id"])
//!     .build()?;
//!
//! let actual = Value::from(Object::new("Person").with_field("id", 1).with_field("name", "Jack").into_ref());
//! let expected = Value::from(Object::new("Person").with_field("id", 2).with_field("name", "Jack").into_ref());
//!
//! assert!(compare(&actual, &expected, &registry)?.is_equal());
//! ```

mod collector;
mod comparator;
mod error;
mod model;
mod tracker;

pub use collector::DifferenceCollector;
pub use comparator::Comparator;
pub use error::{CompareError, EngineResult};
pub use model::{ComparisonResult, Difference, DifferenceKind, DifferenceSummary, TraversalIssue};
pub use tracker::{NodePair, VisitedPairTracker};

pub use rcmp_core::{
    Accessor, ComparisonPath, FieldAccessor, FieldDescriptor, FieldRead, IntrospectionError,
    MapKey, Object, ObjectRef, TypeName, Value,
};
pub use rcmp_registry::{
    ComparisonSettings, ConfigError, EquivalenceRegistry, Equivalence, RegistryBuilder,
};

use tracing::{debug, instrument};

/// Compare two graphs with the default field accessor
///
/// Private fields are visible to the comparison when the registry enables
/// private field introspection.
#[instrument(skip_all)]
pub fn compare(
    actual: &Value,
    expected: &Value,
    registry: &EquivalenceRegistry,
) -> EngineResult<ComparisonResult> {
    let accessor = FieldAccessor::including_private(registry.flags().introspect_private_fields);
    compare_with(actual, expected, registry, &accessor)
}

/// Compare two graphs, listing and reading fields through `accessor`
#[instrument(skip_all)]
pub fn compare_with(
    actual: &Value,
    expected: &Value,
    registry: &EquivalenceRegistry,
    accessor: &dyn Accessor,
) -> EngineResult<ComparisonResult> {
    debug!("Starting recursive comparison");

    let result = Comparator::new(registry, accessor).run(actual, expected)?;

    debug!(
        differences = result.differences().len(),
        issues = result.issues().len(),
        "Finished recursive comparison"
    );
    Ok(result)
}
