use std::collections::HashMap;

use smallvec::smallvec;
use tupleforge_core::{FactHandle, FactId, InvariantViolation, Result, Value};

use super::Emit;
use crate::tuple::Tuple;

/// Source node: one uni-tuple per live fact of its type.
#[derive(Debug, Default)]
pub(crate) struct FromNode {
    tuples: HashMap<FactId, Tuple>,
}

impl FromNode {
    pub(crate) fn insert_fact(&mut self, fact: &FactHandle, emit: &mut Emit<'_>) -> Result<()> {
        if self.tuples.contains_key(&fact.id()) {
            return Err(InvariantViolation::DuplicateFact(fact.id().0).into());
        }
        let tuple = emit.create(smallvec![Value::from(fact.clone())]);
        self.tuples.insert(fact.id(), tuple.clone());
        emit.insert(tuple);
        Ok(())
    }

    pub(crate) fn retract_fact(&mut self, fact: FactId, emit: &mut Emit<'_>) -> Result<()> {
        let tuple = self
            .tuples
            .remove(&fact)
            .ok_or(InvariantViolation::UnknownFact(fact.0))?;
        emit.retract(tuple);
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.tuples.len()
    }
}
