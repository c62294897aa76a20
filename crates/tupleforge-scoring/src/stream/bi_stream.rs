//! Bi-constraint stream over pairs.

use std::sync::Arc;

use tupleforge_core::{Fact, Score, Value, ValueType};

use super::joiner::{into_defs, Joiner};
use super::{TriStream, UniStream};
use crate::tuple::Tuple;

impl_arity_stream!(
    BiStream,
    "A stream of `(A, B)` tuples, produced by a join, a two-value group or `map2`.",
    (A, B)
);

impl<Sc: Score, A: 'static, B: 'static> BiStream<Sc, A, B> {
    /// Joins every fact of type `E` matching `joiner`.
    pub fn join<E: Fact>(self, joiner: impl Joiner<(A, B), E>) -> TriStream<Sc, A, B, E> {
        let other = self.factory.for_each::<E>();
        self.join_with(other, joiner)
    }

    pub fn join_with<E: 'static>(
        self,
        other: UniStream<Sc, E>,
        joiner: impl Joiner<(A, B), E>,
    ) -> TriStream<Sc, A, B, E> {
        let node = self
            .factory
            .join_nodes(self.node, other.node, into_defs(joiner));
        TriStream::new(self.factory, node)
    }

    /// Replaces the last element by every item `f` produces for it.
    pub fn flatten_last<T, I, F>(self, f: F) -> BiStream<Sc, A, T>
    where
        T: ValueType,
        I: IntoIterator<Item = T>,
        F: Fn(&B) -> I + Send + Sync + 'static,
    {
        let parent = self.node;
        let node = self.factory.add(|g| {
            g.flatten_last(
                parent,
                Arc::new(move |t: &Tuple| {
                    f(t.element::<B>(1)).into_iter().map(Value::new).collect()
                }),
            )
        });
        BiStream::new(self.factory, node)
    }
}
