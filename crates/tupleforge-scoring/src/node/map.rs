use std::collections::HashMap;

use tupleforge_core::Result;

use super::Emit;
use crate::graph::FlattenFn;
use crate::index::KeyFn;
use crate::tuple::{Elements, Tuple, TupleId};

/// 1:1 transform. Equal outputs of different inputs stay separate tuples.
pub(crate) struct MapNode {
    mappings: Vec<KeyFn>,
    outputs: HashMap<TupleId, Tuple>,
}

impl MapNode {
    pub(crate) fn new(mappings: Vec<KeyFn>) -> Self {
        Self {
            mappings,
            outputs: HashMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, tuple: Tuple, emit: &mut Emit<'_>) -> Result<()> {
        if self.outputs.contains_key(&tuple.id()) {
            return Err(emit.duplicate(&tuple).into());
        }
        let elements: Elements = self.mappings.iter().map(|m| m(&tuple)).collect();
        let output = emit.create(elements);
        self.outputs.insert(tuple.id(), output.clone());
        emit.insert(output);
        Ok(())
    }

    pub(crate) fn retract(&mut self, tuple: Tuple, emit: &mut Emit<'_>) -> Result<()> {
        let output = self
            .outputs
            .remove(&tuple.id())
            .ok_or_else(|| emit.unknown(&tuple))?;
        emit.retract(output);
        Ok(())
    }
}

/// 1:n transform replacing the last element by each produced item.
///
/// Outputs are tracked per input, so retracting one input retracts
/// exactly the tuples it produced, duplicates included.
pub(crate) struct FlattenNode {
    flatten: FlattenFn,
    outputs: HashMap<TupleId, Vec<Tuple>>,
}

impl FlattenNode {
    pub(crate) fn new(flatten: FlattenFn) -> Self {
        Self {
            flatten,
            outputs: HashMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, tuple: Tuple, emit: &mut Emit<'_>) -> Result<()> {
        if self.outputs.contains_key(&tuple.id()) {
            return Err(emit.duplicate(&tuple).into());
        }
        let prefix = &tuple.elements()[..tuple.arity() - 1];
        let items = (self.flatten)(&tuple);
        let mut produced = Vec::with_capacity(items.len());
        for item in items {
            let mut elements: Elements = prefix.iter().cloned().collect();
            elements.push(item);
            let output = emit.create(elements);
            produced.push(output.clone());
            emit.insert(output);
        }
        self.outputs.insert(tuple.id(), produced);
        Ok(())
    }

    pub(crate) fn retract(&mut self, tuple: Tuple, emit: &mut Emit<'_>) -> Result<()> {
        let produced = self
            .outputs
            .remove(&tuple.id())
            .ok_or_else(|| emit.unknown(&tuple))?;
        for output in produced {
            emit.retract(output);
        }
        Ok(())
    }
}
