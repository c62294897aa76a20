use std::collections::HashMap;

use tupleforge_core::Result;

use super::Emit;
use crate::graph::TuplePredicate;
use crate::tuple::{Tuple, TupleId};

pub(crate) struct FilterNode {
    predicate: TuplePredicate,
    /// Every input tuple and whether it passed.
    passed: HashMap<TupleId, bool>,
}

impl FilterNode {
    pub(crate) fn new(predicate: TuplePredicate) -> Self {
        Self {
            predicate,
            passed: HashMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, tuple: Tuple, emit: &mut Emit<'_>) -> Result<()> {
        if self.passed.contains_key(&tuple.id()) {
            return Err(emit.duplicate(&tuple).into());
        }
        let ok = (self.predicate)(&tuple);
        self.passed.insert(tuple.id(), ok);
        if ok {
            emit.insert(tuple);
        }
        Ok(())
    }

    pub(crate) fn retract(&mut self, tuple: Tuple, emit: &mut Emit<'_>) -> Result<()> {
        match self.passed.remove(&tuple.id()) {
            Some(true) => emit.retract(tuple),
            Some(false) => {}
            None => return Err(emit.unknown(&tuple).into()),
        }
        Ok(())
    }
}
