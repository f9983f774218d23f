//! Accumulation of differences during a traversal

use crate::model::{ComparisonResult, Difference, TraversalIssue};

/// Append-only record of differences, owned by a single comparison
#[derive(Debug, Default)]
pub struct DifferenceCollector {
    differences: Vec<Difference>,
    issues: Vec<TraversalIssue>,
}

impl DifferenceCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, difference: Difference) {
        self.differences.push(difference);
    }

    pub fn report_issue(&mut self, issue: TraversalIssue) {
        self.issues.push(issue);
    }

    /// Whether no difference has been recorded
    pub fn is_empty(&self) -> bool {
        self.differences.is_empty()
    }

    pub fn len(&self) -> usize {
        self.differences.len()
    }

    /// Drop the differences recorded after the first `len`
    pub(crate) fn truncate(&mut self, len: usize) {
        self.differences.truncate(len);
    }

    pub fn into_result(self) -> ComparisonResult {
        ComparisonResult::new(self.differences, self.issues)
    }
}
