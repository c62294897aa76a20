//! Typed functions over tuples.
//!
//! [`TupleFn`] lets the typed stream API accept plain closures such as
//! `|a: &Shift, b: &Employee| ...` and call them on erased [`Tuple`]s.

use crate::tuple::Tuple;

/// A function taking the elements of a tuple with types `Args`.
///
/// Implemented for every `Fn(&A) -> R` through `Fn(&A, &B, &C, &D) -> R`.
pub trait TupleFn<Args>: Send + Sync + 'static {
    type Output;

    fn call(&self, tuple: &Tuple) -> Self::Output;
}

macro_rules! impl_tuple_fn {
    ($($t:ident: $i:tt),+) => {
        impl<$($t: 'static,)+ R, F> TupleFn<($($t,)+)> for F
        where
            F: Fn($(&$t),+) -> R + Send + Sync + 'static,
        {
            type Output = R;

            #[inline]
            fn call(&self, tuple: &Tuple) -> R {
                (self)($(tuple.element::<$t>($i)),+)
            }
        }
    };
}

impl_tuple_fn!(A: 0);
impl_tuple_fn!(A: 0, B: 1);
impl_tuple_fn!(A: 0, B: 1, C: 2);
impl_tuple_fn!(A: 0, B: 1, C: 2, D: 3);

/// A predicate over a left tuple with element types `L` and a uni right
/// tuple of type `R`.
///
/// Implemented for `Fn(&A, &R) -> bool` through `Fn(&A, &B, &C, &D, &R) -> bool`,
/// so quad streams can filter existence checks too.
pub trait JoinFilter<L, R>: Send + Sync + 'static {
    fn test(&self, left: &Tuple, right: &Tuple) -> bool;
}

macro_rules! impl_join_filter {
    ($($t:ident: $i:tt),+) => {
        impl<$($t: 'static,)+ R: 'static, F> JoinFilter<($($t,)+), R> for F
        where
            F: Fn($(&$t,)+ &R) -> bool + Send + Sync + 'static,
        {
            #[inline]
            fn test(&self, left: &Tuple, right: &Tuple) -> bool {
                (self)($(left.element::<$t>($i),)+ right.element::<R>(0))
            }
        }
    };
}

impl_join_filter!(A: 0);
impl_join_filter!(A: 0, B: 1);
impl_join_filter!(A: 0, B: 1, C: 2);
impl_join_filter!(A: 0, B: 1, C: 2, D: 3);
