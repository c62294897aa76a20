// Joiner functions for constraint stream joins and existential checks.
//
// A joiner relates a left tuple with element types `L` to a right element of
// type `R`. Indexed joiners (`equal`, `less_than`, ...) are compiled into
// index levels; `filtering` joiners run on the pairs the index produces and
// must come last.
//
// # Self-joins
//
// Use [`equal()`] with a single extractor when both sides are the same type:
//
// ```
// use tupleforge_scoring::stream::joiner::equal;
//
// #[derive(Debug)]
// struct Shift { employee_id: usize }
//
// let same_employee = equal(|s: &Shift| s.employee_id);
// ```
//
// # Cross-joins
//
// Use [`equal_bi()`] for cross-joins between different types. The left
// extractor takes every element of the left tuple:
//
// ```
// use tupleforge_scoring::stream::joiner::equal_bi;
//
// #[derive(Debug)]
// struct Employee { id: usize }
// #[derive(Debug)]
// struct Shift { employee_id: usize }
//
// let by_id = equal_bi(|shift: &Shift| shift.employee_id, |emp: &Employee| emp.id);
// ```

mod comparison;
mod equal;
mod filtering;

use std::sync::Arc;

use tupleforge_core::{Value, ValueType};

pub use comparison::{
    greater_than, greater_than_or_equal, less_than, less_than_or_equal, ComparisonJoiner,
};
pub use equal::{equal, equal_bi, EqualJoiner};
pub use filtering::{filtering, FilteringJoiner};

use crate::index::{JoinerDef, KeyFn};
use crate::stream::group::key_fn as left_key;
use crate::tuple::Tuple;

/// A matching condition between a left tuple `L` and a right element `R`.
///
/// `()` is the empty joiner: every pair matches.
pub trait Joiner<L, R>: Send + Sync + 'static {
    /// Appends the erased definitions of this joiner in order.
    fn push_defs(self, defs: &mut Vec<JoinerDef>);

    /// Combines this joiner with another; both must hold.
    fn and<J>(self, other: J) -> AndJoiner<Self, J>
    where
        Self: Sized,
        J: Joiner<L, R>,
    {
        AndJoiner {
            first: self,
            second: other,
        }
    }
}

impl<L, R> Joiner<L, R> for () {
    fn push_defs(self, _defs: &mut Vec<JoinerDef>) {}
}

// A joiner that combines two joiners with AND semantics.
//
// Created by calling `joiner.and(other)`.
pub struct AndJoiner<J1, J2> {
    first: J1,
    second: J2,
}

impl<L, R, J1, J2> Joiner<L, R> for AndJoiner<J1, J2>
where
    J1: Joiner<L, R>,
    J2: Joiner<L, R>,
{
    fn push_defs(self, defs: &mut Vec<JoinerDef>) {
        self.first.push_defs(defs);
        self.second.push_defs(defs);
    }
}

pub(crate) fn into_defs<L, R, J: Joiner<L, R>>(joiner: J) -> Vec<JoinerDef> {
    let mut defs = Vec::new();
    joiner.push_defs(&mut defs);
    defs
}

fn right_key<R, K, F>(f: F) -> KeyFn
where
    R: 'static,
    K: ValueType,
    F: Fn(&R) -> K + Send + Sync + 'static,
{
    Arc::new(move |t: &Tuple| Value::new(f(t.element::<R>(0))))
}
