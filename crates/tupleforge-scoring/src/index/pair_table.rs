//! Bidirectional table of matched `(left, right)` tuple pairs.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::tuple::TupleId;

/// Records which left and right tuples currently match, with a payload per
/// pair (the join output tuple, or nothing for existential nodes).
///
/// Both directions are kept so that retracting either side finds its pairs
/// without scanning.
#[derive(Debug)]
pub(crate) struct PairTable<V> {
    by_left: HashMap<TupleId, BTreeMap<TupleId, V>>,
    by_right: HashMap<TupleId, BTreeSet<TupleId>>,
}

impl<V> Default for PairTable<V> {
    fn default() -> Self {
        Self {
            by_left: HashMap::new(),
            by_right: HashMap::new(),
        }
    }
}

impl<V> PairTable<V> {
    pub(crate) fn insert(&mut self, left: TupleId, right: TupleId, value: V) {
        self.by_left.entry(left).or_default().insert(right, value);
        self.by_right.entry(right).or_default().insert(left);
    }

    /// Removes every pair of `left`, returning `(right, value)` ordered by
    /// right id.
    pub(crate) fn remove_left(&mut self, left: TupleId) -> Vec<(TupleId, V)> {
        let Some(rights) = self.by_left.remove(&left) else {
            return Vec::new();
        };
        for right in rights.keys() {
            if let Some(lefts) = self.by_right.get_mut(right) {
                lefts.remove(&left);
                if lefts.is_empty() {
                    self.by_right.remove(right);
                }
            }
        }
        rights.into_iter().collect()
    }

    /// Removes every pair of `right`, returning `(left, value)` ordered by
    /// left id.
    pub(crate) fn remove_right(&mut self, right: TupleId) -> Vec<(TupleId, V)> {
        let Some(lefts) = self.by_right.remove(&right) else {
            return Vec::new();
        };
        let mut removed = Vec::with_capacity(lefts.len());
        for left in lefts {
            if let Some(rights) = self.by_left.get_mut(&left) {
                if let Some(value) = rights.remove(&right) {
                    removed.push((left, value));
                }
                if rights.is_empty() {
                    self.by_left.remove(&left);
                }
            }
        }
        removed
    }

    /// Number of pairs `left` currently takes part in.
    pub(crate) fn count_left(&self, left: TupleId) -> usize {
        self.by_left.get(&left).map_or(0, BTreeMap::len)
    }

    pub(crate) fn len(&self) -> usize {
        self.by_left.values().map(BTreeMap::len).sum()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.by_left.is_empty() && self.by_right.is_empty()
    }
}
