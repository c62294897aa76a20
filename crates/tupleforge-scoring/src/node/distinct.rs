use std::collections::HashMap;

use tupleforge_core::{InvariantViolation, Result, Value};

use super::Emit;
use crate::tuple::{Tuple, TupleId};

struct DistinctEntry {
    count: usize,
    output: Tuple,
}

/// Collapses structurally equal tuples into one output tuple, kept alive
/// while any of them is.
#[derive(Default)]
pub(crate) struct DistinctNode {
    seen: HashMap<Vec<Value>, DistinctEntry>,
    inputs: HashMap<TupleId, Vec<Value>>,
}

impl DistinctNode {
    pub(crate) fn insert(&mut self, tuple: Tuple, emit: &mut Emit<'_>) -> Result<()> {
        if self.inputs.contains_key(&tuple.id()) {
            return Err(emit.duplicate(&tuple).into());
        }
        let key = tuple.elements().to_vec();
        match self.seen.get_mut(&key) {
            Some(entry) => entry.count += 1,
            None => {
                let output = emit.create(tuple.elements().iter().cloned().collect());
                emit.insert(output.clone());
                self.seen
                    .insert(key.clone(), DistinctEntry { count: 1, output });
            }
        }
        self.inputs.insert(tuple.id(), key);
        Ok(())
    }

    pub(crate) fn retract(&mut self, tuple: Tuple, emit: &mut Emit<'_>) -> Result<()> {
        let key = self
            .inputs
            .remove(&tuple.id())
            .ok_or_else(|| emit.unknown(&tuple))?;
        let entry = self
            .seen
            .get_mut(&key)
            .ok_or_else(|| InvariantViolation::NegativeUseCount {
                what: format!("distinct tuple {:?} of node {}", key, emit.node()),
            })?;
        entry.count -= 1;
        if entry.count == 0 {
            if let Some(entry) = self.seen.remove(&key) {
                emit.retract(entry.output);
            }
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.seen.len()
    }
}
