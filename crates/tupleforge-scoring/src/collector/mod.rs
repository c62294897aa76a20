//! Collectors for grouping and aggregating tuples.
//!
//! A collector owns no state itself. The group node asks it for a fresh
//! container per group, feeds contributions through
//! [`accumulate`](Collector::accumulate) and keeps the returned undo token
//! until the contributing tuple is retracted.

mod collection;
mod count;
mod min_max;
mod sum;


use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tupleforge_core::{Value, ValueType};

use crate::tuple::Tuple;

pub use collection::{to_list, to_set, ToList, ToSet};
pub use count::{count, count_distinct, Count, CountDistinct};
pub use min_max::{max, min, Max, Min};
pub use sum::{sum, Sum};

/// Aggregates tuples with element types `Args` into a single result.
pub trait Collector<Args>: Send + Sync + 'static {
    /// Running state for one group.
    type Container: Send + 'static;
    /// Reverses a single contribution.
    type Undo: Send + 'static;
    /// Finished value emitted in the group's output tuple.
    type Result: ValueType;

    fn supply(&self) -> Self::Container;

    fn accumulate(&self, container: &mut Self::Container, tuple: &Tuple) -> Self::Undo;

    fn undo(&self, container: &mut Self::Container, undo: Self::Undo);

    fn finish(&self, container: &Self::Container) -> Self::Result;
}

pub(crate) type ErasedState = Box<dyn Any + Send>;

/// Type-erased collector as stored in a group node.
///
/// Downcasts of containers and undo tokens return `None` on a type
/// mismatch; the group node reports that as an invariant violation.
pub trait DynCollector: Send + Sync {
    fn supply(&self) -> Box<dyn Any + Send>;

    fn accumulate(&self, container: &mut (dyn Any + Send), tuple: &Tuple)
        -> Option<Box<dyn Any + Send>>;

    fn undo(&self, container: &mut (dyn Any + Send), undo: Box<dyn Any + Send>) -> Option<()>;

    fn finish(&self, container: &(dyn Any + Send)) -> Option<Value>;

    fn result_type_name(&self) -> &'static str;
}

/// Shared handle to an erased collector.
pub type CollectorFn = Arc<dyn DynCollector>;

struct Erased<C, Args> {
    collector: C,
    _phantom: PhantomData<fn(Args)>,
}

impl<C, Args> DynCollector for Erased<C, Args>
where
    C: Collector<Args>,
    Args: 'static,
{
    fn supply(&self) -> Box<dyn Any + Send> {
        Box::new(self.collector.supply())
    }

    fn accumulate(
        &self,
        container: &mut (dyn Any + Send),
        tuple: &Tuple,
    ) -> Option<Box<dyn Any + Send>> {
        let container = container.downcast_mut::<C::Container>()?;
        Some(Box::new(self.collector.accumulate(container, tuple)))
    }

    fn undo(&self, container: &mut (dyn Any + Send), undo: Box<dyn Any + Send>) -> Option<()> {
        let container = container.downcast_mut::<C::Container>()?;
        let undo = undo.downcast::<C::Undo>().ok()?;
        self.collector.undo(container, *undo);
        Some(())
    }

    fn finish(&self, container: &(dyn Any + Send)) -> Option<Value> {
        let container = container.downcast_ref::<C::Container>()?;
        Some(Value::new(self.collector.finish(container)))
    }

    fn result_type_name(&self) -> &'static str {
        std::any::type_name::<C::Result>()
    }
}

/// Erases a typed collector for use with the untyped graph builder.
pub fn erase<Args, C>(collector: C) -> CollectorFn
where
    Args: 'static,
    C: Collector<Args>,
{
    Arc::new(Erased {
        collector,
        _phantom: PhantomData,
    })
}

impl fmt::Debug for dyn DynCollector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Collector<{}>", self.result_type_name())
    }
}

/// Ordered multiset used by the value-keeping collectors.
#[derive(Debug)]
pub struct Multiset<K> {
    counts: BTreeMap<K, usize>,
}

impl<K: Ord> Multiset<K> {
    fn new() -> Self {
        Self {
            counts: BTreeMap::new(),
        }
    }

    fn add(&mut self, key: K) {
        *self.counts.entry(key).or_insert(0) += 1;
    }

    fn remove(&mut self, key: &K) {
        if let Some(n) = self.counts.get_mut(key) {
            *n -= 1;
            if *n == 0 {
                self.counts.remove(key);
            }
        }
    }

    /// Number of distinct elements.
    pub fn distinct_len(&self) -> usize {
        self.counts.len()
    }

    pub fn first(&self) -> Option<&K> {
        self.counts.keys().next()
    }

    pub fn last(&self) -> Option<&K> {
        self.counts.keys().next_back()
    }

    /// Iterates elements in order, repeating duplicates.
    pub fn iter(&self) -> impl Iterator<Item = &K> {
        self.counts
            .iter()
            .flat_map(|(k, n)| std::iter::repeat(k).take(*n))
    }

    pub fn distinct(&self) -> impl Iterator<Item = &K> {
        self.counts.keys()
    }
}
