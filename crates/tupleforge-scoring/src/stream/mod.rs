//! Fluent, typed constraint stream API.
//!
//! Streams record nodes into the [`ConstraintFactory`]'s graph builder; the
//! element types of each stream are tracked at compile time, so closures
//! receive `&Shift`, `&Employee` and so on instead of erased values.
//!
//! # Example
//!
//! ```
//! use tupleforge_config::SessionConfig;
//! use tupleforge_core::HardSoftScore;
//! use tupleforge_scoring::collector::count;
//! use tupleforge_scoring::stream::{joiner::equal_bi, ConstraintFactory};
//!
//! #[derive(Debug)]
//! struct Employee { id: u32 }
//!
//! #[derive(Debug)]
//! struct Shift { employee: u32 }
//!
//! let factory = ConstraintFactory::<HardSoftScore>::new();
//! factory
//!     .for_each::<Employee>()
//!     .join(equal_bi(|e: &Employee| e.id, |s: &Shift| s.employee))
//!     .group_by((|e: &Employee, _: &Shift| e.id,), (count(),))
//!     .filter(|_: &u32, shifts: &usize| *shifts > 1)
//!     .penalize_with(HardSoftScore::ONE_SOFT, |_: &u32, shifts: &usize| *shifts - 1)
//!     .as_constraint("Too many shifts");
//!
//! let mut session = factory.build_session(&SessionConfig::default()).unwrap();
//! session.insert(Employee { id: 1 }).unwrap();
//! for _ in 0..3 {
//!     session.insert(Shift { employee: 1 }).unwrap();
//! }
//! assert_eq!(session.score(), HardSoftScore::of_soft(-2));
//! ```
//!
//! # Architecture
//!
//! ```text
//! ConstraintFactory::new()
//!     .for_each::<A>()          -> UniStream<Sc, A>
//!     .join(joiner)             -> BiStream<Sc, A, B>
//!     .group_by(keys, coll)     -> stream of (keys..., results...)
//!     .penalize(weight)         -> ConstraintBuilder<Sc, (A, B)>
//!     .as_constraint(name)      -> terminal node in the graph
//! factory.build_session(cfg)    -> ConstraintSession<Sc>
//! ```

#[macro_use]
mod arity_stream_macros;
mod bi_stream;
pub(crate) mod constraint_builder;
mod factory;
pub(crate) mod group;
pub mod joiner;
mod quad_stream;
mod tri_stream;
mod uni_stream;

#[cfg(test)]
mod tests;

pub use bi_stream::BiStream;
pub use constraint_builder::ConstraintBuilder;
pub use factory::ConstraintFactory;
pub use group::{GroupCollectors, GroupKeys, GroupShape};
pub use quad_stream::QuadStream;
pub use tri_stream::TriStream;
pub use uni_stream::UniStream;
