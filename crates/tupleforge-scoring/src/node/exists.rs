use std::collections::HashMap;

use tupleforge_core::Result;

use super::Emit;
use crate::graph::InputSide;
use crate::index::{IndexKeys, Indexer, JoinerSet, PairTable};
use crate::tuple::{Tuple, TupleId};

struct LeftEntry {
    tuple: Tuple,
    keys: IndexKeys,
    /// Whether the tuple is currently passed downstream.
    propagated: bool,
}

/// `IfExists` / `IfNotExists`: passes left tuples through unchanged
/// depending on whether any right tuple matches them.
///
/// The number of matching right tuples per left tuple is the pair count
/// in `pairs`; emissions happen only on 0 <-> 1 transitions.
pub(crate) struct ExistsNode {
    should_exist: bool,
    joiners: JoinerSet,
    left_index: Indexer,
    right_index: Indexer,
    left: HashMap<TupleId, LeftEntry>,
    right_keys: HashMap<TupleId, IndexKeys>,
    pairs: PairTable<()>,
}

impl ExistsNode {
    pub(crate) fn new(should_exist: bool, joiners: JoinerSet) -> Self {
        Self {
            should_exist,
            left_index: Indexer::new(joiners.left_kinds()),
            right_index: Indexer::new(joiners.right_kinds()),
            joiners,
            left: HashMap::new(),
            right_keys: HashMap::new(),
            pairs: PairTable::default(),
        }
    }

    pub(crate) fn insert(
        &mut self,
        side: InputSide,
        tuple: Tuple,
        emit: &mut Emit<'_>,
    ) -> Result<()> {
        match side {
            InputSide::Left => self.insert_left(tuple, emit),
            InputSide::Right => self.insert_right(tuple, emit),
        }
    }

    pub(crate) fn retract(
        &mut self,
        side: InputSide,
        tuple: Tuple,
        emit: &mut Emit<'_>,
    ) -> Result<()> {
        match side {
            InputSide::Left => self.retract_left(tuple, emit),
            InputSide::Right => self.retract_right(tuple, emit),
        }
    }

    fn insert_left(&mut self, tuple: Tuple, emit: &mut Emit<'_>) -> Result<()> {
        if self.left.contains_key(&tuple.id()) {
            return Err(emit.duplicate(&tuple).into());
        }
        let keys = self.joiners.left_keys(&tuple);
        let mut count = 0;
        for right in self.right_index.matches(&keys) {
            if self.joiners.accepts(&tuple, &right) {
                self.pairs.insert(tuple.id(), right.id(), ());
                count += 1;
            }
        }
        let propagated = (count > 0) == self.should_exist;
        if propagated {
            emit.insert(tuple.clone());
        }
        self.left_index.put(&keys, tuple.clone());
        self.left.insert(
            tuple.id(),
            LeftEntry {
                tuple,
                keys,
                propagated,
            },
        );
        Ok(())
    }

    fn retract_left(&mut self, tuple: Tuple, emit: &mut Emit<'_>) -> Result<()> {
        let entry = self
            .left
            .remove(&tuple.id())
            .ok_or_else(|| emit.unknown(&tuple))?;
        self.left_index.remove(&entry.keys, tuple.id());
        self.pairs.remove_left(tuple.id());
        if entry.propagated {
            emit.retract(entry.tuple);
        }
        Ok(())
    }

    fn insert_right(&mut self, tuple: Tuple, emit: &mut Emit<'_>) -> Result<()> {
        if self.right_keys.contains_key(&tuple.id()) {
            return Err(emit.duplicate(&tuple).into());
        }
        let keys = self.joiners.right_keys(&tuple);
        for left in self.left_index.matches(&keys) {
            if !self.joiners.accepts(&left, &tuple) {
                continue;
            }
            self.pairs.insert(left.id(), tuple.id(), ());
            if self.pairs.count_left(left.id()) == 1 {
                self.flip(left.id(), emit);
            }
        }
        self.right_index.put(&keys, tuple.clone());
        self.right_keys.insert(tuple.id(), keys);
        Ok(())
    }

    fn retract_right(&mut self, tuple: Tuple, emit: &mut Emit<'_>) -> Result<()> {
        let keys = self
            .right_keys
            .remove(&tuple.id())
            .ok_or_else(|| emit.unknown(&tuple))?;
        self.right_index.remove(&keys, tuple.id());
        for (left, ()) in self.pairs.remove_right(tuple.id()) {
            if self.pairs.count_left(left) == 0 {
                self.flip(left, emit);
            }
        }
        Ok(())
    }

    /// Toggles whether a left tuple is propagated after its match count
    /// crossed zero.
    fn flip(&mut self, left: TupleId, emit: &mut Emit<'_>) {
        let Some(entry) = self.left.get_mut(&left) else {
            return;
        };
        let should_propagate = (self.pairs.count_left(left) > 0) == self.should_exist;
        if should_propagate == entry.propagated {
            return;
        }
        entry.propagated = should_propagate;
        if should_propagate {
            emit.insert(entry.tuple.clone());
        } else {
            emit.retract(entry.tuple.clone());
        }
    }

    #[cfg(test)]
    pub(crate) fn match_count(&self, left: TupleId) -> usize {
        self.pairs.count_left(left)
    }
}
