use std::collections::HashMap;

use tupleforge_core::Result;

use super::Emit;
use crate::graph::InputSide;
use crate::index::{IndexKeys, Indexer, JoinerSet, PairTable};
use crate::tuple::{Tuple, TupleId};

/// Emits `left ++ right` for every pair satisfying the joiners.
///
/// Each side is indexed by its own keys; an arriving tuple looks up the
/// opposite index. Produced tuples are recorded per pair so a retract on
/// either side replays exactly those outputs.
pub(crate) struct JoinNode {
    joiners: JoinerSet,
    left_index: Indexer,
    right_index: Indexer,
    left_keys: HashMap<TupleId, IndexKeys>,
    right_keys: HashMap<TupleId, IndexKeys>,
    outputs: PairTable<Tuple>,
}

impl JoinNode {
    pub(crate) fn new(joiners: JoinerSet) -> Self {
        Self {
            left_index: Indexer::new(joiners.left_kinds()),
            right_index: Indexer::new(joiners.right_kinds()),
            joiners,
            left_keys: HashMap::new(),
            right_keys: HashMap::new(),
            outputs: PairTable::default(),
        }
    }

    pub(crate) fn insert(
        &mut self,
        side: InputSide,
        tuple: Tuple,
        emit: &mut Emit<'_>,
    ) -> Result<()> {
        match side {
            InputSide::Left => {
                if self.left_keys.contains_key(&tuple.id()) {
                    return Err(emit.duplicate(&tuple).into());
                }
                let keys = self.joiners.left_keys(&tuple);
                for right in self.right_index.matches(&keys) {
                    self.emit_pair(&tuple, &right, emit);
                }
                self.left_index.put(&keys, tuple.clone());
                self.left_keys.insert(tuple.id(), keys);
            }
            InputSide::Right => {
                if self.right_keys.contains_key(&tuple.id()) {
                    return Err(emit.duplicate(&tuple).into());
                }
                let keys = self.joiners.right_keys(&tuple);
                for left in self.left_index.matches(&keys) {
                    self.emit_pair(&left, &tuple, emit);
                }
                self.right_index.put(&keys, tuple.clone());
                self.right_keys.insert(tuple.id(), keys);
            }
        }
        Ok(())
    }

    pub(crate) fn retract(
        &mut self,
        side: InputSide,
        tuple: Tuple,
        emit: &mut Emit<'_>,
    ) -> Result<()> {
        let removed = match side {
            InputSide::Left => {
                let keys = self
                    .left_keys
                    .remove(&tuple.id())
                    .ok_or_else(|| emit.unknown(&tuple))?;
                self.left_index.remove(&keys, tuple.id());
                self.outputs.remove_left(tuple.id())
            }
            InputSide::Right => {
                let keys = self
                    .right_keys
                    .remove(&tuple.id())
                    .ok_or_else(|| emit.unknown(&tuple))?;
                self.right_index.remove(&keys, tuple.id());
                self.outputs.remove_right(tuple.id())
            }
        };
        for (_, output) in removed {
            emit.retract(output);
        }
        Ok(())
    }

    fn emit_pair(&mut self, left: &Tuple, right: &Tuple, emit: &mut Emit<'_>) {
        if !self.joiners.accepts(left, right) {
            return;
        }
        let output = emit.create(left.concat(right));
        self.outputs.insert(left.id(), right.id(), output.clone());
        emit.insert(output);
    }

    #[cfg(test)]
    pub(crate) fn pair_count(&self) -> usize {
        self.outputs.len()
    }
}
