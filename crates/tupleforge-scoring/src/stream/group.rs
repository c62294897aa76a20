//! Type-level plumbing for `group_by`.
//!
//! Keys and collectors are passed as tuples: `((key,), (count(),))`.
//! [`GroupKeys`] and [`GroupCollectors`] erase them and report their
//! output types; [`GroupShape`] picks the stream type for
//! `(keys..., results...)`.

use std::sync::Arc;

use tupleforge_core::{Score, Value, ValueType};

use super::{BiStream, ConstraintFactory, QuadStream, TriStream, UniStream};
use crate::collector::{erase, Collector, CollectorFn};
use crate::function::TupleFn;
use crate::graph::NodeId;
use crate::index::KeyFn;
use crate::tuple::Tuple;

/// Zero to three group key functions over tuples with element types `L`.
pub trait GroupKeys<L> {
    /// The key types, as a tuple.
    type Keys;

    fn into_key_fns(self) -> Vec<KeyFn>;
}

/// Zero to four collectors over tuples with element types `L`.
pub trait GroupCollectors<L> {
    /// The collector result types, as a tuple.
    type Results;

    fn into_collector_fns(self) -> Vec<CollectorFn>;
}

/// Maps `(Keys, Results)` to the stream carrying `(keys..., results...)`.
pub trait GroupShape<Sc: Score> {
    type Stream;

    fn stream(factory: ConstraintFactory<Sc>, node: NodeId) -> Self::Stream;
}

pub(crate) fn key_fn<L, F>(f: F) -> KeyFn
where
    F: TupleFn<L>,
    F::Output: ValueType,
{
    Arc::new(move |t: &Tuple| Value::new(f.call(t)))
}

impl<L> GroupKeys<L> for () {
    type Keys = ();

    fn into_key_fns(self) -> Vec<KeyFn> {
        Vec::new()
    }
}

impl<L> GroupCollectors<L> for () {
    type Results = ();

    fn into_collector_fns(self) -> Vec<CollectorFn> {
        Vec::new()
    }
}

macro_rules! impl_group_keys {
    ($($k:ident $v:ident),+) => {
        impl<L, $($k),+> GroupKeys<L> for ($($k,)+)
        where
            $($k: TupleFn<L>, <$k as TupleFn<L>>::Output: ValueType,)+
        {
            type Keys = ($(<$k as TupleFn<L>>::Output,)+);

            fn into_key_fns(self) -> Vec<KeyFn> {
                let ($($v,)+) = self;
                vec![$(key_fn::<L, $k>($v)),+]
            }
        }
    };
}

impl_group_keys!(K1 k1);
impl_group_keys!(K1 k1, K2 k2);
impl_group_keys!(K1 k1, K2 k2, K3 k3);

macro_rules! impl_group_collectors {
    ($($c:ident $v:ident),+) => {
        impl<L: 'static, $($c),+> GroupCollectors<L> for ($($c,)+)
        where
            $($c: Collector<L>,)+
        {
            type Results = ($(<$c as Collector<L>>::Result,)+);

            fn into_collector_fns(self) -> Vec<CollectorFn> {
                let ($($v,)+) = self;
                vec![$(erase::<L, $c>($v)),+]
            }
        }
    };
}

impl_group_collectors!(C1 c1);
impl_group_collectors!(C1 c1, C2 c2);
impl_group_collectors!(C1 c1, C2 c2, C3 c3);
impl_group_collectors!(C1 c1, C2 c2, C3 c3, C4 c4);

macro_rules! impl_group_shape {
    ($stream:ident; ($($k:ident),*); ($($r:ident),*)) => {
        impl<Sc: Score, $($k: ValueType,)* $($r: ValueType,)*> GroupShape<Sc>
            for (($($k,)*), ($($r,)*))
        {
            type Stream = $stream<Sc, $($k,)* $($r,)*>;

            fn stream(factory: ConstraintFactory<Sc>, node: NodeId) -> Self::Stream {
                $stream::new(factory, node)
            }
        }
    };
}

impl_group_shape!(UniStream; (); (R1));
impl_group_shape!(BiStream; (); (R1, R2));
impl_group_shape!(TriStream; (); (R1, R2, R3));
impl_group_shape!(QuadStream; (); (R1, R2, R3, R4));
impl_group_shape!(UniStream; (K1); ());
impl_group_shape!(BiStream; (K1); (R1));
impl_group_shape!(TriStream; (K1); (R1, R2));
impl_group_shape!(QuadStream; (K1); (R1, R2, R3));
impl_group_shape!(BiStream; (K1, K2); ());
impl_group_shape!(TriStream; (K1, K2); (R1));
impl_group_shape!(QuadStream; (K1, K2); (R1, R2));
impl_group_shape!(TriStream; (K1, K2, K3); ());
impl_group_shape!(QuadStream; (K1, K2, K3); (R1));
