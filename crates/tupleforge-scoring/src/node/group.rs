//! Group/accumulate node.
//!
//! Input tuples are partitioned by their key values. Each live group holds
//! one container per collector and a use count of contributing tuples;
//! each contribution keeps the undo tokens its collectors returned.
//!
//! Emission is batched: inserts and retracts only mark a group dirty, and
//! [`GroupNode::flush`] emits at most one retract/insert pair per dirty
//! group once the session has drained the node's layer.

use std::collections::HashMap;

use smallvec::SmallVec;
use tupleforge_core::{InvariantViolation, Result, Value};

use super::Emit;
use crate::collector::{CollectorFn, ErasedState};
use crate::index::KeyFn;
use crate::tuple::{Elements, Tuple, TupleId};

struct GroupEntry {
    key_parts: SmallVec<[Value; 3]>,
    containers: Vec<ErasedState>,
    use_count: usize,
    output: Option<Tuple>,
    dirty: bool,
}

struct Contribution {
    key: Value,
    undos: Vec<ErasedState>,
}

pub(crate) struct GroupNode {
    keys: Vec<KeyFn>,
    collectors: Vec<CollectorFn>,
    groups: HashMap<Value, GroupEntry>,
    contributions: HashMap<TupleId, Contribution>,
    /// Dirty group keys in the order they were first touched.
    dirty: Vec<Value>,
}

impl GroupNode {
    pub(crate) fn new(keys: Vec<KeyFn>, collectors: Vec<CollectorFn>) -> Self {
        Self {
            keys,
            collectors,
            groups: HashMap::new(),
            contributions: HashMap::new(),
            dirty: Vec::new(),
        }
    }

    fn supply(&self) -> Vec<ErasedState> {
        self.collectors.iter().map(|c| c.supply()).collect()
    }

    fn group_key(parts: &[Value]) -> Value {
        match parts {
            [] => Value::unit(),
            [single] => single.clone(),
            _ => Value::new(parts.to_vec()),
        }
    }

    pub(crate) fn insert(&mut self, tuple: Tuple, emit: &mut Emit<'_>) -> Result<()> {
        if self.contributions.contains_key(&tuple.id()) {
            return Err(emit.duplicate(&tuple).into());
        }
        let key_parts: SmallVec<[Value; 3]> = self.keys.iter().map(|k| k(&tuple)).collect();
        let key = Self::group_key(&key_parts);

        let fresh = if self.groups.contains_key(&key) {
            None
        } else {
            Some(self.supply())
        };
        let entry = self.groups.entry(key.clone()).or_insert_with(|| GroupEntry {
            key_parts,
            containers: fresh.unwrap_or_default(),
            use_count: 0,
            output: None,
            dirty: false,
        });

        let mut undos = Vec::with_capacity(self.collectors.len());
        for (collector, container) in self.collectors.iter().zip(entry.containers.iter_mut()) {
            let undo = collector
                .accumulate(container.as_mut(), &tuple)
                .ok_or(InvariantViolation::CollectorState {
                    node: emit.node().0,
                })?;
            undos.push(undo);
        }
        entry.use_count += 1;
        if !entry.dirty {
            entry.dirty = true;
            self.dirty.push(key.clone());
        }
        self.contributions
            .insert(tuple.id(), Contribution { key, undos });
        Ok(())
    }

    pub(crate) fn retract(&mut self, tuple: Tuple, emit: &mut Emit<'_>) -> Result<()> {
        let contribution = self
            .contributions
            .remove(&tuple.id())
            .ok_or_else(|| emit.unknown(&tuple))?;
        let node = emit.node().0;
        let entry = self
            .groups
            .get_mut(&contribution.key)
            .ok_or_else(|| InvariantViolation::NegativeUseCount {
                what: format!("group {:?} of node {}", contribution.key, node),
            })?;

        for ((collector, container), undo) in self
            .collectors
            .iter()
            .zip(entry.containers.iter_mut())
            .zip(contribution.undos)
        {
            collector
                .undo(container.as_mut(), undo)
                .ok_or(InvariantViolation::CollectorState { node })?;
        }
        entry.use_count = entry.use_count.checked_sub(1).ok_or_else(|| {
            InvariantViolation::NegativeUseCount {
                what: format!("group {:?} of node {}", contribution.key, node),
            }
        })?;
        if entry.use_count == 0 {
            // Start over from empty containers if the group comes back
            // within the same batch.
            entry.containers = self.collectors.iter().map(|c| c.supply()).collect();
        }
        if !entry.dirty {
            entry.dirty = true;
            self.dirty.push(contribution.key);
        }
        Ok(())
    }

    /// Emits the net change of every dirty group since the last flush.
    pub(crate) fn flush(&mut self, emit: &mut Emit<'_>) -> Result<()> {
        for key in std::mem::take(&mut self.dirty) {
            let Some(entry) = self.groups.get_mut(&key) else {
                continue;
            };
            entry.dirty = false;

            if entry.use_count == 0 {
                if let Some(output) = entry.output.take() {
                    emit.retract(output);
                }
                self.groups.remove(&key);
                continue;
            }

            let mut elements: Elements = entry.key_parts.iter().cloned().collect();
            for (collector, container) in self.collectors.iter().zip(&entry.containers) {
                let result = collector
                    .finish(container.as_ref())
                    .ok_or(InvariantViolation::CollectorState {
                        node: emit.node().0,
                    })?;
                elements.push(result);
            }

            if let Some(old) = &entry.output {
                if old.elements() == elements.as_slice() {
                    continue;
                }
            }
            if let Some(old) = entry.output.take() {
                emit.retract(old);
            }
            let output = emit.create(elements);
            entry.output = Some(output.clone());
            emit.insert(output);
        }
        Ok(())
    }

    pub(crate) fn has_pending(&self) -> bool {
        !self.dirty.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn group_count(&self) -> usize {
        self.groups.len()
    }
}
