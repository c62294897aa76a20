//! Quad-constraint stream, the widest supported arity.

use std::sync::Arc;

use tupleforge_core::{Score, Value, ValueType};

use crate::tuple::Tuple;

impl_arity_stream!(
    QuadStream,
    "A stream of `(A, B, C, D)` tuples. Quad streams cannot be joined further.",
    (A, B, C, D)
);

impl<Sc: Score, A: 'static, B: 'static, C: 'static, D: 'static> QuadStream<Sc, A, B, C, D> {
    pub fn flatten_last<T, I, F>(self, f: F) -> QuadStream<Sc, A, B, C, T>
    where
        T: ValueType,
        I: IntoIterator<Item = T>,
        F: Fn(&D) -> I + Send + Sync + 'static,
    {
        let parent = self.node;
        let node = self.factory.add(|g| {
            g.flatten_last(
                parent,
                Arc::new(move |t: &Tuple| {
                    f(t.element::<D>(3)).into_iter().map(Value::new).collect()
                }),
            )
        });
        QuadStream::new(self.factory, node)
    }
}
