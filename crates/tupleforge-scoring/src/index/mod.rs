//! Join indexes.
//!
//! An [`Indexer`] stores tuples under one key per joiner level. Equal
//! levels are hash maps, comparison levels are ordered maps scanned by
//! range, and the leaf keeps tuples ordered by id so lookups are
//! deterministic.

mod joiner;
mod pair_table;

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;

use tupleforge_core::Value;

use crate::tuple::{Tuple, TupleId};

pub use joiner::{JoinerDef, JoinerType, KeyFn, PairPredicate, RightType};
pub(crate) use joiner::{IndexKeys, JoinerSet};
pub(crate) use pair_table::PairTable;

/// A multi-level index over one side of a join.
///
/// A stored key `s` at a level with kind `op` matches a query key `q`
/// when `s op q` holds.
#[derive(Debug)]
pub(crate) struct Indexer {
    kinds: Vec<JoinerType>,
    root: IndexNode,
}

#[derive(Debug)]
enum IndexNode {
    Leaf(BTreeMap<TupleId, Tuple>),
    Equal(HashMap<Value, IndexNode>),
    Ordered(BTreeMap<Value, IndexNode>),
}

impl IndexNode {
    fn empty(kinds: &[JoinerType]) -> Self {
        match kinds.first() {
            None => IndexNode::Leaf(BTreeMap::new()),
            Some(JoinerType::Equal) => IndexNode::Equal(HashMap::new()),
            Some(_) => IndexNode::Ordered(BTreeMap::new()),
        }
    }

    fn is_empty(&self) -> bool {
        match self {
            IndexNode::Leaf(m) => m.is_empty(),
            IndexNode::Equal(m) => m.is_empty(),
            IndexNode::Ordered(m) => m.is_empty(),
        }
    }

    fn put(&mut self, kinds: &[JoinerType], keys: &[Value], tuple: Tuple) {
        match self {
            IndexNode::Leaf(m) => {
                m.insert(tuple.id(), tuple);
            }
            IndexNode::Equal(m) => m
                .entry(keys[0].clone())
                .or_insert_with(|| IndexNode::empty(&kinds[1..]))
                .put(&kinds[1..], &keys[1..], tuple),
            IndexNode::Ordered(m) => m
                .entry(keys[0].clone())
                .or_insert_with(|| IndexNode::empty(&kinds[1..]))
                .put(&kinds[1..], &keys[1..], tuple),
        }
    }

    fn remove(&mut self, keys: &[Value], id: TupleId) -> bool {
        match self {
            IndexNode::Leaf(m) => m.remove(&id).is_some(),
            IndexNode::Equal(m) => {
                let Some(child) = m.get_mut(&keys[0]) else {
                    return false;
                };
                let removed = child.remove(&keys[1..], id);
                if child.is_empty() {
                    m.remove(&keys[0]);
                }
                removed
            }
            IndexNode::Ordered(m) => {
                let Some(child) = m.get_mut(&keys[0]) else {
                    return false;
                };
                let removed = child.remove(&keys[1..], id);
                if child.is_empty() {
                    m.remove(&keys[0]);
                }
                removed
            }
        }
    }

    fn visit(&self, kinds: &[JoinerType], query: &[Value], f: &mut dyn FnMut(&Tuple)) {
        match self {
            IndexNode::Leaf(m) => m.values().for_each(|t| f(t)),
            IndexNode::Equal(m) => {
                if let Some(child) = m.get(&query[0]) {
                    child.visit(&kinds[1..], &query[1..], f);
                }
            }
            IndexNode::Ordered(m) => {
                let q = &query[0];
                let range = match kinds[0] {
                    JoinerType::LessThan => {
                        m.range::<Value, _>((Bound::Unbounded, Bound::Excluded(q)))
                    }
                    JoinerType::LessThanOrEqual => {
                        m.range::<Value, _>((Bound::Unbounded, Bound::Included(q)))
                    }
                    JoinerType::GreaterThan => {
                        m.range::<Value, _>((Bound::Excluded(q), Bound::Unbounded))
                    }
                    JoinerType::GreaterThanOrEqual | JoinerType::Equal => {
                        m.range::<Value, _>((Bound::Included(q), Bound::Unbounded))
                    }
                };
                for (_, child) in range {
                    child.visit(&kinds[1..], &query[1..], f);
                }
            }
        }
    }
}

impl Indexer {
    pub(crate) fn new(kinds: Vec<JoinerType>) -> Self {
        let root = IndexNode::empty(&kinds);
        Self { kinds, root }
    }

    pub(crate) fn put(&mut self, keys: &[Value], tuple: Tuple) {
        debug_assert_eq!(keys.len(), self.kinds.len());
        self.root.put(&self.kinds, keys, tuple);
    }

    /// Removes a tuple stored under `keys`. Returns false if it was absent.
    pub(crate) fn remove(&mut self, keys: &[Value], id: TupleId) -> bool {
        self.root.remove(keys, id)
    }

    /// Returns every stored tuple matching `query`, ordered by level keys
    /// and then by tuple id.
    pub(crate) fn matches(&self, query: &[Value]) -> Vec<Tuple> {
        let mut found = Vec::new();
        self.root.visit(&self.kinds, query, &mut |t| found.push(t.clone()));
        found
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.root.is_empty()
    }
}
