//! Filtering joiner for custom predicate matching.

use std::sync::Arc;

use super::Joiner;
use crate::function::JoinFilter;
use crate::index::JoinerDef;
use crate::tuple::Tuple;

/// Creates a joiner that matches based on a custom predicate.
///
/// The predicate is evaluated on pairs that already satisfy every indexed
/// joiner, so it must be the last joiner of a chain.
///
/// # Example
///
/// ```
/// use tupleforge_scoring::stream::joiner::filtering;
///
/// #[derive(Debug)]
/// struct Task { priority: i32 }
///
/// let higher_priority = filtering(|a: &Task, b: &Task| a.priority > b.priority);
/// ```
pub fn filtering<F>(predicate: F) -> FilteringJoiner<F> {
    FilteringJoiner { predicate }
}

/// A joiner that matches based on a custom predicate.
pub struct FilteringJoiner<F> {
    predicate: F,
}

impl<L, R, F> Joiner<L, R> for FilteringJoiner<F>
where
    R: 'static,
    F: JoinFilter<L, R>,
{
    fn push_defs(self, defs: &mut Vec<JoinerDef>) {
        let predicate = self.predicate;
        defs.push(
            JoinerDef::filtering(Arc::new(move |l: &Tuple, r: &Tuple| predicate.test(l, r)))
                .reading::<R>(),
        );
    }
}
