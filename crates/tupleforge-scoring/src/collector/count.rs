//! Counting collectors.

use tupleforge_core::ValueType;

use super::{Collector, Multiset};
use crate::function::TupleFn;
use crate::tuple::Tuple;

/// Creates a collector that counts contributing tuples.
pub fn count() -> Count {
    Count
}

/// Counts contributions. Created by [`count()`].
#[derive(Debug, Clone, Copy)]
pub struct Count;

impl<Args: 'static> Collector<Args> for Count {
    type Container = usize;
    type Undo = ();
    type Result = usize;

    fn supply(&self) -> usize {
        0
    }

    #[inline]
    fn accumulate(&self, container: &mut usize, _tuple: &Tuple) {
        *container += 1;
    }

    #[inline]
    fn undo(&self, container: &mut usize, _undo: ()) {
        *container -= 1;
    }

    fn finish(&self, container: &usize) -> usize {
        *container
    }
}

/// Creates a collector that counts the distinct values `mapper` produces.
pub fn count_distinct<F>(mapper: F) -> CountDistinct<F> {
    CountDistinct { mapper }
}

/// Counts distinct mapped values. Created by [`count_distinct()`].
pub struct CountDistinct<F> {
    mapper: F,
}

impl<Args, F> Collector<Args> for CountDistinct<F>
where
    Args: 'static,
    F: TupleFn<Args>,
    F::Output: ValueType + Clone,
{
    type Container = Multiset<F::Output>;
    type Undo = F::Output;
    type Result = usize;

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

    fn finish(&self, container: &Self::Container) -> usize {
        container.distinct_len()
    }
}
