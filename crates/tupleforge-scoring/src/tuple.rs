//! Immutable tuples flowing through the node graph.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use smallvec::SmallVec;
use tupleforge_core::Value;

/// Maximum number of elements a tuple can carry.
pub const MAX_ARITY: usize = 4;

/// Identity of a tuple within one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TupleId(pub u64);

pub(crate) type Elements = SmallVec<[Value; MAX_ARITY]>;

/// A fixed-arity group of values with an identity.
///
/// Equality and hashing use the id only. Use [`Tuple::elements`] for
/// structural comparisons.
#[derive(Clone)]
pub struct Tuple(Arc<TupleInner>);

struct TupleInner {
    id: TupleId,
    elements: Elements,
}

impl Tuple {
    pub(crate) fn new(id: TupleId, elements: Elements) -> Self {
        debug_assert!(!elements.is_empty() && elements.len() <= MAX_ARITY);
        Tuple(Arc::new(TupleInner { id, elements }))
    }

    #[inline]
    pub fn id(&self) -> TupleId {
        self.0.id
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.0.elements.len()
    }

    #[inline]
    pub fn elements(&self) -> &[Value] {
        &self.0.elements
    }

    #[inline]
    pub fn value(&self, index: usize) -> &Value {
        &self.0.elements[index]
    }

    /// Returns element `index` as a `T`.
    ///
    /// # Panics
    ///
    /// Panics if the element holds another type. The typed stream API
    /// never produces such a tuple.
    pub fn element<T: 'static>(&self, index: usize) -> &T {
        let value = self.value(index);
        match value.get::<T>() {
            Some(v) => v,
            None => panic!(
                "tuple element {} is a {}, not a {}",
                index,
                value.type_name(),
                std::any::type_name::<T>()
            ),
        }
    }

    /// Returns this tuple's elements followed by `other`'s.
    pub(crate) fn concat(&self, other: &Tuple) -> Elements {
        self.elements()
            .iter()
            .chain(other.elements())
            .cloned()
            .collect()
    }
}

impl PartialEq for Tuple {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}

impl Eq for Tuple {}

impl Hash for Tuple {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Debug for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tuple#{}", self.0.id.0)?;
        f.debug_list().entries(self.0.elements.iter()).finish()
    }
}

/// Per-session tuple id sequence.
#[derive(Debug, Default)]
pub(crate) struct TupleIds {
    next: u64,
}

impl TupleIds {
    pub(crate) fn next(&mut self) -> TupleId {
        let id = TupleId(self.next);
        self.next += 1;
        id
    }

    pub(crate) fn tuple(&mut self, elements: Elements) -> Tuple {
        Tuple::new(self.next(), elements)
    }
}
