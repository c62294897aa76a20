//! Collectors gathering mapped values into collections.

use std::collections::BTreeSet;

use tupleforge_core::ValueType;

use super::{Collector, Multiset};
use crate::function::TupleFn;
use crate::tuple::Tuple;

/// Creates a collector yielding every mapped value, sorted, duplicates kept.
pub fn to_list<F>(mapper: F) -> ToList<F> {
    ToList { mapper }
}

/// Creates a collector yielding the set of mapped values.
pub fn to_set<F>(mapper: F) -> ToSet<F> {
    ToSet { mapper }
}

pub struct ToList<F> {
    mapper: F,
}

pub struct ToSet<F> {
    mapper: F,
}

impl<Args, F> Collector<Args> for ToList<F>
where
    Args: 'static,
    F: TupleFn<Args>,
    F::Output: ValueType + Clone,
{
    type Container = Multiset<F::Output>;
    type Undo = F::Output;
    type Result = Vec<F::Output>;

    fn supply(&self) -> Self::Container {
        Multiset::new()
    }

    fn accumulate(&self, container: &mut Self::Container, tuple: &Tuple) -> F::Output {
        let value = self.mapper.call(tuple);
        container.add(value.clone());
        value
    }

    fn undo(&self, container: &mut Self::Container, undo: F::Output) {
        container.remove(&undo);
    }

    fn finish(&self, container: &Self::Container) -> Vec<F::Output> {
        container.iter().cloned().collect()
    }
}

impl<Args, F> Collector<Args> for ToSet<F>
where
    Args: 'static,
    F: TupleFn<Args>,
    F::Output: ValueType + Clone,
{
    type Container = Multiset<F::Output>;
    type Undo = F::Output;
    type Result = BTreeSet<F::Output>;

    fn supply(&self) -> Self::Container {
        Multiset::new()
    }

    fn accumulate(&self, container: &mut Self::Container, tuple: &Tuple) -> F::Output {
        let value = self.mapper.call(tuple);
        container.add(value.clone());
        value
    }

    fn undo(&self, container: &mut Self::Container, undo: F::Output) {
        container.remove(&undo);
    }

    fn finish(&self, container: &Self::Container) -> BTreeSet<F::Output> {
        container.distinct().cloned().collect()
    }
}
