//! TupleForge Core - Core types for incremental constraint evaluation
//!
//! This crate provides the fundamental abstractions shared by the TupleForge
//! crates:
//! - Score types and match weights
//! - Fact handles and type-erased tuple values
//! - Constraint identification
//! - The error taxonomy (build errors, invariant violations, weight errors)

pub mod constraint;
pub mod error;
pub mod fact;
pub mod score;
pub mod value;

pub use constraint::{ConstraintRef, ImpactType};
pub use error::{BuildError, InvariantViolation, Result, TupleForgeError, WeightError};
pub use fact::{Fact, FactData, FactHandle, FactId};
pub use score::{
    HardSoftDecimalScore, HardSoftScore, MatchWeight, ParseableScore, Score, ScoreLevel,
    ScoreParseError, SimpleScore,
};
pub use value::{DynValue, Value, ValueType};
