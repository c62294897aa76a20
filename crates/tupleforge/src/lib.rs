//! TupleForge - Incremental Constraint Scoring in Rust
//!
//! Declare constraints as typed streams, insert facts, and read a score that
//! is kept up to date after every insert, update and retract.
//!
//! # Example
//!
//! ```rust
//! use tupleforge::prelude::*;
//!
//! #[derive(Debug)]
//! struct Lesson { room: Option<u32> }
//!
//! let factory = ConstraintFactory::<HardSoftScore>::new();
//! factory
//!     .for_each::<Lesson>()
//!     .filter(|l: &Lesson| l.room.is_none())
//!     .penalize(HardSoftScore::ONE_HARD)
//!     .as_constraint("Room required");
//!
//! let mut session = factory.build_session(&SessionConfig::default()).unwrap();
//! let lesson = session.insert(Lesson { room: None }).unwrap();
//! assert_eq!(session.score(), HardSoftScore::of_hard(-1));
//!
//! session.update(&lesson, Lesson { room: Some(2) }).unwrap();
//! assert_eq!(session.score(), HardSoftScore::ZERO);
//! ```

// Score types
pub use tupleforge_core::{HardSoftDecimalScore, HardSoftScore, MatchWeight, Score, SimpleScore};

// Facts and errors
pub use tupleforge_core::{Fact, FactHandle, FactId, Result, TupleForgeError};

// Configuration
pub use tupleforge_config::{EnvironmentMode, SessionConfig};

// Constraint stream API
pub use tupleforge_scoring::{collector, stream};

// Sessions and analysis
pub use tupleforge_scoring::{
    ConstraintSession, ConstraintWeightOverrides, FactListener, IndictmentMap, ScoreExplanation,
};

#[cfg(feature = "console")]
pub use tupleforge_console as console;

pub mod prelude {
    pub use super::collector::{count, count_distinct, max, min, sum, to_list, to_set};
    pub use super::stream::{joiner, ConstraintFactory};
    pub use super::{ConstraintSession, EnvironmentMode, FactListener, SessionConfig};
    pub use super::{HardSoftDecimalScore, HardSoftScore, Score, SimpleScore};
}
