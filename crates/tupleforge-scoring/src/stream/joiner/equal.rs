// Equal joiner for matching on property equality.

use std::marker::PhantomData;

use tupleforge_core::ValueType;

use super::{left_key, right_key, Joiner};
use crate::function::TupleFn;
use crate::index::{JoinerDef, JoinerType};

// Creates a joiner that matches when a property is equal on both sides.
//
// This is the joiner for self-joins, where the left stream and the joined
// type are the same.
pub fn equal<A, K, F>(key: F) -> EqualJoiner<F, F, K>
where
    K: ValueType,
    F: Fn(&A) -> K + Clone + Send + Sync + 'static,
{
    EqualJoiner {
        left: key.clone(),
        right: key,
        _phantom: PhantomData,
    }
}

// Creates a joiner that matches when `left(l...) == right(r)`.
//
// `left` takes every element of the left tuple, `right` the joined element.
pub fn equal_bi<R, K, Fl, Fr>(left: Fl, right: Fr) -> EqualJoiner<Fl, Fr, K>
where
    K: ValueType,
    Fr: Fn(&R) -> K + Send + Sync + 'static,
{
    EqualJoiner {
        left,
        right,
        _phantom: PhantomData,
    }
}

// A joiner that matches when extracted values are equal.
//
// Consecutive equal joiners share one hash index level.
pub struct EqualJoiner<Fl, Fr, K> {
    left: Fl,
    right: Fr,
    _phantom: PhantomData<fn() -> K>,
}

impl<L, R, K, Fl, Fr> Joiner<L, R> for EqualJoiner<Fl, Fr, K>
where
    R: 'static,
    K: ValueType,
    Fl: TupleFn<L, Output = K>,
    Fr: Fn(&R) -> K + Send + Sync + 'static,
{
    fn push_defs(self, defs: &mut Vec<JoinerDef>) {
        defs.push(
            JoinerDef::indexed(
                JoinerType::Equal,
                left_key(self.left),
                right_key(self.right),
            )
            .reading::<R>(),
        );
    }
}
