//! Tri-constraint stream.

use std::sync::Arc;

use tupleforge_core::{Fact, Score, Value, ValueType};

use super::joiner::{into_defs, Joiner};
use super::{QuadStream, UniStream};
use crate::tuple::Tuple;

impl_arity_stream!(
    TriStream,
    "A stream of `(A, B, C)` tuples.",
    (A, B, C)
);

impl<Sc: Score, A: 'static, B: 'static, C: 'static> TriStream<Sc, A, B, C> {
    pub fn join<E: Fact>(
        self,
        joiner: impl Joiner<(A, B, C), E>,
    ) -> QuadStream<Sc, A, B, C, E> {
        let other = self.factory.for_each::<E>();
        self.join_with(other, joiner)
    }

    pub fn join_with<E: 'static>(
        self,
        other: UniStream<Sc, E>,
        joiner: impl Joiner<(A, B, C), E>,
    ) -> QuadStream<Sc, A, B, C, E> {
        let node = self
            .factory
            .join_nodes(self.node, other.node, into_defs(joiner));
        QuadStream::new(self.factory, node)
    }

    pub fn flatten_last<T, I, F>(self, f: F) -> TriStream<Sc, A, B, T>
    where
        T: ValueType,
        I: IntoIterator<Item = T>,
        F: Fn(&C) -> I + Send + Sync + 'static,
    {
        let parent = self.node;
        let node = self.factory.add(|g| {
            g.flatten_last(
                parent,
                Arc::new(move |t: &Tuple| {
                    f(t.element::<C>(2)).into_iter().map(Value::new).collect()
                }),
            )
        });
        TriStream::new(self.factory, node)
    }
}
