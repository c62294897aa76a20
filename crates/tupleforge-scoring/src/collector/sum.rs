//! Sum collector.

use std::ops::{AddAssign, SubAssign};

use num_traits::Zero;
use tupleforge_core::ValueType;

use super::Collector;
use crate::function::TupleFn;
use crate::tuple::Tuple;

/// Creates a collector that sums the values `mapper` extracts.
///
/// Each contribution remembers its own summand, so retraction subtracts
/// exactly what was added even if the source data changed since.
pub fn sum<F>(mapper: F) -> Sum<F> {
    Sum { mapper }
}

/// Sums mapped values. Created by [`sum()`].
pub struct Sum<F> {
    mapper: F,
}

impl<Args, F> Collector<Args> for Sum<F>
where
    Args: 'static,
    F: TupleFn<Args>,
    F::Output: ValueType + Zero + Copy + AddAssign + SubAssign,
{
    type Container = F::Output;
    type Undo = F::Output;
    type Result = F::Output;

    fn supply(&self) -> F::Output {
        F::Output::zero()
    }

    #[inline]
    fn accumulate(&self, container: &mut F::Output, tuple: &Tuple) -> F::Output {
        let value = self.mapper.call(tuple);
        *container += value;
        value
    }

    #[inline]
    fn undo(&self, container: &mut F::Output, undo: F::Output) {
        *container -= undo;
    }

    fn finish(&self, container: &F::Output) -> F::Output {
        *container
    }
}
