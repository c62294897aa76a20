//! Minimum and maximum collectors.
//!
//! Both keep every contributed value in a [`Multiset`] so retracting the
//! current extreme falls back to the next one.

use tupleforge_core::ValueType;

use super::{Collector, Multiset};
use crate::function::TupleFn;
use crate::tuple::Tuple;

/// Creates a collector yielding the smallest mapped value, or `None` for
/// an empty group.
pub fn min<F>(mapper: F) -> Min<F> {
    Min { mapper }
}

/// Creates a collector yielding the largest mapped value.
pub fn max<F>(mapper: F) -> Max<F> {
    Max { mapper }
}

pub struct Min<F> {
    mapper: F,
}

pub struct Max<F> {
    mapper: F,
}

macro_rules! extreme_collector {
    ($name:ident, $pick:ident) => {
        impl<Args, F> Collector<Args> for $name<F>
        where
            Args: 'static,
            F: TupleFn<Args>,
            F::Output: ValueType + Clone,
        {
            type Container = Multiset<F::Output>;
            type Undo = F::Output;
            type Result = Option<F::Output>;

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

            fn finish(&self, container: &Self::Container) -> Option<F::Output> {
                container.$pick().cloned()
            }
        }
    };
}

extreme_collector!(Min, first);
extreme_collector!(Max, last);
