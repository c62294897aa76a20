//! Score types for representing constraint impact
//!
//! All score types are immutable and totally ordered. Weight scaling and
//! accumulation are checked: a level that would leave the `i64` range is
//! reported as an overflow instead of wrapping.

#[macro_use]
mod macros;

mod hard_soft;
mod hard_soft_decimal;
mod simple;
mod traits;
pub(crate) mod weight;


pub use hard_soft::HardSoftScore;
pub use hard_soft_decimal::HardSoftDecimalScore;
pub use simple::SimpleScore;
pub use traits::{ParseableScore, Score, ScoreParseError};
pub use weight::MatchWeight;

/// Kind of a score level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoreLevel {
    /// Must not be negative for a feasible score.
    Hard,
    Soft,
}
