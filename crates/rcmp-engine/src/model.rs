//! Differences and comparison results

use rcmp_core::{ComparisonPath, TypeName, Value};
use serde::Serialize;
use std::fmt;

/// Category of a structural difference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DifferenceKind {
    /// Present in actual, absent in expected
    Missing,
    /// Absent in actual, present in expected
    Extra,
    /// Present on both sides with different values
    Mismatch,
    /// Runtime types differ under strict type checking
    UnexpectedType,
    /// A field could not be read on at least one side
    Unreadable,
}

impl fmt::Display for DifferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DifferenceKind::Missing => write!(f, "MISSING"),
            DifferenceKind::Extra => write!(f, "EXTRA"),
            DifferenceKind::Mismatch => write!(f, "MISMATCH"),
            DifferenceKind::UnexpectedType => write!(f, "UNEXPECTED_TYPE"),
            DifferenceKind::Unreadable => write!(f, "UNREADABLE"),
        }
    }
}

/// A located difference between the actual and expected graphs
#[derive(Debug, Clone)]
pub struct Difference {
    pub path: ComparisonPath,
    pub actual: Option<Value>,
    pub expected: Option<Value>,
    pub kind: DifferenceKind,
    /// Why the values were found different, when it is not obvious
    pub description: Option<String>,
    /// User supplied message registered for this field or type
    pub message: Option<String>,
}

impl Difference {
    pub fn new(
        kind: DifferenceKind,
        path: ComparisonPath,
        actual: Option<Value>,
        expected: Option<Value>,
    ) -> Self {
        Self {
            path,
            actual,
            expected,
            kind,
            description: None,
            message: None,
        }
    }

    /// `actual` has no counterpart in the expected graph
    pub fn missing(path: ComparisonPath, actual: Value) -> Self {
        Self::new(DifferenceKind::Missing, path, Some(actual), None)
    }

    /// `expected` has no counterpart in the actual graph
    pub fn extra(path: ComparisonPath, expected: Value) -> Self {
        Self::new(DifferenceKind::Extra, path, None, Some(expected))
    }

    pub fn mismatch(path: ComparisonPath, actual: &Value, expected: &Value) -> Self {
        Self::new(
            DifferenceKind::Mismatch,
            path,
            Some(actual.clone()),
            Some(expected.clone()),
        )
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Serializable digest of this difference
    pub fn summary(&self) -> DifferenceSummary {
        DifferenceSummary {
            path: self.path.clone(),
            kind: self.kind,
            actual_type: self.actual.as_ref().and_then(Value::type_name),
            expected_type: self.expected.as_ref().and_then(Value::type_name),
            description: self.description.clone(),
            message: self.message.clone(),
        }
    }
}

impl fmt::Display for Difference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_root() {
            write!(f, "{} at root", self.kind)?;
        } else {
            write!(f, "{} at '{}'", self.kind, self.path)?;
        }
        if let Some(description) = &self.description {
            write!(f, ": {}", description)?;
        }
        Ok(())
    }
}

/// Serializable view of a [`Difference`]
///
/// Values themselves are not serialized (objects may be cyclic); their
/// runtime types are.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DifferenceSummary {
    pub path: ComparisonPath,
    pub kind: DifferenceKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual_type: Option<TypeName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_type: Option<TypeName>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// A traversal-level problem that is not a difference in the data
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum TraversalIssue {
    /// A compared field does not exist on the root actual value
    UnknownComparedField { path: String },
}

impl fmt::Display for TraversalIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraversalIssue::UnknownComparedField { path } => {
                write!(f, "compared field '{}' does not exist on the actual value", path)
            }
        }
    }
}

/// Outcome of a comparison
#[derive(Debug, Clone, Default)]
pub struct ComparisonResult {
    differences: Vec<Difference>,
    issues: Vec<TraversalIssue>,
}

impl ComparisonResult {
    pub fn new(differences: Vec<Difference>, issues: Vec<TraversalIssue>) -> Self {
        Self {
            differences,
            issues,
        }
    }

    /// Whether the graphs are structurally equal
    pub fn is_equal(&self) -> bool {
        self.differences.is_empty()
    }

    /// Differences in traversal order
    pub fn differences(&self) -> &[Difference] {
        &self.differences
    }

    pub fn issues(&self) -> &[TraversalIssue] {
        &self.issues
    }

    pub fn into_differences(self) -> Vec<Difference> {
        self.differences
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serializes_as_snake_case() {
        let json = serde_json::to_string(&DifferenceKind::UnexpectedType).unwrap();
        assert_eq!(json, "\"unexpected_type\"");
    }

    #[test]
    fn test_summary() {
        let path = ComparisonPath::root().field("friends").index(1).field("age");
        let difference = Difference::mismatch(path, &Value::Int(30), &Value::from("30"))
            .with_description("expected a string");

        let json = serde_json::to_value(difference.summary()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "path": "friends[1].age",
                "kind": "mismatch",
                "actual_type": "i64",
                "expected_type": "String",
                "description": "expected a string"
            })
        );
    }

    #[test]
    fn test_display() {
        let missing = Difference::missing(ComparisonPath::root().key("b"), Value::Int(2));
        assert_eq!(missing.to_string(), "MISSING at 'b'");

        let root = Difference::mismatch(ComparisonPath::root(), &Value::Int(1), &Value::Int(2))
            .with_description("values differ");
        assert_eq!(root.to_string(), "MISMATCH at root: values differ");
    }

    #[test]
    fn test_issue_serialization() {
        let issue = TraversalIssue::UnknownComparedField {
            path: "home.garden".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&issue).unwrap(),
            serde_json::json!({"issue": "unknown_compared_field", "path": "home.garden"})
        );
    }
}
