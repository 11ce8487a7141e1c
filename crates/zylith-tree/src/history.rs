//! Ring of recently confirmed roots.
//!
//! Proofs are accepted only against a root in this history, so a client
//! holding a path from a slightly stale tree can still spend.

use std::collections::VecDeque;

use zylith_core::FieldElement;

/// Default number of roots retained.
pub const DEFAULT_HISTORY_SIZE: usize = 128;

/// Append-only ring of the most recent roots, oldest evicted first.
#[derive(Debug, Clone)]
pub struct RootHistory {
    roots: VecDeque<FieldElement>,
    capacity: usize,
}

impl RootHistory {
    /// Create a history retaining `capacity` roots (at least 1).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            roots: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record a new root. Consecutive duplicates are kept once.
    pub fn push(&mut self, root: FieldElement) {
        if self.roots.back() == Some(&root) {
            return;
        }
        if self.roots.len() == self.capacity {
            self.roots.pop_front();
        }
        self.roots.push_back(root);
    }

    /// Whether `root` is still accepted.
    #[must_use]
    pub fn contains(&self, root: &FieldElement) -> bool {
        self.roots.contains(root)
    }

    /// Most recent root, if any.
    #[must_use]
    pub fn latest(&self) -> Option<FieldElement> {
        self.roots.back().copied()
    }

    /// Number of retained roots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    /// Whether no root has been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

impl Default for RootHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fe(v: u64) -> FieldElement {
        FieldElement::from_u64(v)
    }

    #[test]
    fn retains_and_reports_roots() {
        let mut history = RootHistory::new(3);
        history.push(fe(1));
        history.push(fe(2));
        assert!(history.contains(&fe(1)));
        assert!(history.contains(&fe(2)));
        assert_eq!(history.latest(), Some(fe(2)));
    }

    #[test]
    fn evicts_oldest_at_capacity() {
        let mut history = RootHistory::new(2);
        history.push(fe(1));
        history.push(fe(2));
        history.push(fe(3));
        assert!(!history.contains(&fe(1)));
        assert!(history.contains(&fe(2)));
        assert!(history.contains(&fe(3)));
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn consecutive_duplicates_collapse() {
        let mut history = RootHistory::new(4);
        history.push(fe(7));
        history.push(fe(7));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let mut history = RootHistory::new(0);
        history.push(fe(1));
        assert!(history.contains(&fe(1)));
    }
}
