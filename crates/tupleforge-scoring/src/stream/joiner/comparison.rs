//! Comparison joiners for less than / greater than matching.

use std::marker::PhantomData;

use tupleforge_core::ValueType;

use super::{left_key, right_key, Joiner};
use crate::function::TupleFn;
use crate::index::{JoinerDef, JoinerType};

/// Creates a joiner that matches when `left(l...) < right(r)`.
///
/// # Example
///
/// ```
/// use tupleforge_scoring::stream::joiner::less_than;
///
/// #[derive(Debug)]
/// struct Task { end: i64, start: i64 }
///
/// // Task A must end before Task B starts
/// let sequential = less_than(|a: &Task| a.end, |b: &Task| b.start);
/// ```
pub fn less_than<R, K, Fl, Fr>(left: Fl, right: Fr) -> ComparisonJoiner<Fl, Fr, K>
where
    K: ValueType,
    Fr: Fn(&R) -> K + Send + Sync + 'static,
{
    ComparisonJoiner::new(JoinerType::LessThan, left, right)
}

/// Creates a joiner that matches when `left(l...) <= right(r)`.
pub fn less_than_or_equal<R, K, Fl, Fr>(left: Fl, right: Fr) -> ComparisonJoiner<Fl, Fr, K>
where
    K: ValueType,
    Fr: Fn(&R) -> K + Send + Sync + 'static,
{
    ComparisonJoiner::new(JoinerType::LessThanOrEqual, left, right)
}

/// Creates a joiner that matches when `left(l...) > right(r)`.
pub fn greater_than<R, K, Fl, Fr>(left: Fl, right: Fr) -> ComparisonJoiner<Fl, Fr, K>
where
    K: ValueType,
    Fr: Fn(&R) -> K + Send + Sync + 'static,
{
    ComparisonJoiner::new(JoinerType::GreaterThan, left, right)
}

/// Creates a joiner that matches when `left(l...) >= right(r)`.
pub fn greater_than_or_equal<R, K, Fl, Fr>(left: Fl, right: Fr) -> ComparisonJoiner<Fl, Fr, K>
where
    K: ValueType,
    Fr: Fn(&R) -> K + Send + Sync + 'static,
{
    ComparisonJoiner::new(JoinerType::GreaterThanOrEqual, left, right)
}

/// A joiner comparing extracted values with an ordering.
///
/// Each comparison joiner gets its own ordered index level, scanned by
/// range.
pub struct ComparisonJoiner<Fl, Fr, K> {
    joiner_type: JoinerType,
    left: Fl,
    right: Fr,
    _phantom: PhantomData<fn() -> K>,
}

impl<Fl, Fr, K> ComparisonJoiner<Fl, Fr, K> {
    fn new(joiner_type: JoinerType, left: Fl, right: Fr) -> Self {
        Self {
            joiner_type,
            left,
            right,
            _phantom: PhantomData,
        }
    }

    pub fn joiner_type(&self) -> JoinerType {
        self.joiner_type
    }
}

impl<L, R, K, Fl, Fr> Joiner<L, R> for ComparisonJoiner<Fl, Fr, K>
where
    R: 'static,
    K: ValueType,
    Fl: TupleFn<L, Output = K>,
    Fr: Fn(&R) -> K + Send + Sync + 'static,
{
    fn push_defs(self, defs: &mut Vec<JoinerDef>) {
        defs.push(
            JoinerDef::indexed(
                self.joiner_type,
                left_key(self.left),
                right_key(self.right),
            )
            .reading::<R>(),
        );
    }
}
