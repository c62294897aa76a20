//! Uni-constraint stream over one element per tuple.

use std::sync::Arc;

use tupleforge_core::{Fact, Score, Value, ValueType};

use super::joiner::{into_defs, Joiner};
use super::BiStream;
use crate::tuple::Tuple;

impl_arity_stream!(
    UniStream,
    "A stream of single elements, started by `ConstraintFactory::for_each`.",
    (A)
);

impl<Sc: Score, A: 'static> UniStream<Sc, A> {
    /// Joins every fact of type `E` matching `joiner`.
    pub fn join<E: Fact>(self, joiner: impl Joiner<(A,), E>) -> BiStream<Sc, A, E> {
        let other = self.factory.for_each::<E>();
        self.join_with(other, joiner)
    }

    /// Joins the elements of another stream matching `joiner`.
    pub fn join_with<E: 'static>(
        self,
        other: UniStream<Sc, E>,
        joiner: impl Joiner<(A,), E>,
    ) -> BiStream<Sc, A, E> {
        let node = self
            .factory
            .join_nodes(self.node, other.node, into_defs(joiner));
        BiStream::new(self.factory, node)
    }

    /// Replaces each element by every item `f` produces for it.
    pub fn flatten_last<T, I, F>(self, f: F) -> UniStream<Sc, T>
    where
        T: ValueType,
        I: IntoIterator<Item = T>,
        F: Fn(&A) -> I + Send + Sync + 'static,
    {
        let parent = self.node;
        let node = self.factory.add(|g| {
            g.flatten_last(
                parent,
                Arc::new(move |t: &Tuple| {
                    f(t.element::<A>(0)).into_iter().map(Value::new).collect()
                }),
            )
        });
        UniStream::new(self.factory, node)
    }
}
