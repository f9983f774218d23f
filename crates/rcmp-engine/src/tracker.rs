//! Cycle detection for object pairs under comparison

use std::collections::HashSet;

/// Identity of an (actual, expected) object pair
pub type NodePair = (usize, usize);

/// Object pairs currently on the recursion stack
///
/// Only ancestors of the node being compared are tracked: a pair is popped
/// once its subtree is done, so sibling subtrees sharing objects are still
/// compared in full.
#[derive(Debug, Default)]
pub struct VisitedPairTracker {
    stack: Vec<NodePair>,
    on_stack: HashSet<NodePair>,
}

impl VisitedPairTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the pair is an ancestor of the current node
    pub fn contains(&self, pair: NodePair) -> bool {
        self.on_stack.contains(&pair)
    }

    /// Enter a pair; returns false if it was already on the stack
    pub fn push(&mut self, pair: NodePair) -> bool {
        if !self.on_stack.insert(pair) {
            return false;
        }
        self.stack.push(pair);
        true
    }

    /// Leave the innermost pair
    pub fn pop(&mut self) -> Option<NodePair> {
        let pair = self.stack.pop()?;
        self.on_stack.remove(&pair);
        Some(pair)
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stack_discipline() {
        let mut tracker = VisitedPairTracker::new();
        assert!(tracker.push((1, 2)));
        assert!(tracker.push((3, 4)));
        assert!(!tracker.push((1, 2)));
        assert_eq!(tracker.depth(), 2);

        assert_eq!(tracker.pop(), Some((3, 4)));
        assert!(!tracker.contains((3, 4)));
        assert!(tracker.contains((1, 2)));

        assert_eq!(tracker.pop(), Some((1, 2)));
        assert_eq!(tracker.pop(), None);
        assert_eq!(tracker.depth(), 0);
    }

    #[test]
    fn test_pairs_are_ordered() {
        let mut tracker = VisitedPairTracker::new();
        tracker.push((1, 2));
        assert!(!tracker.contains((2, 1)));
    }
}
