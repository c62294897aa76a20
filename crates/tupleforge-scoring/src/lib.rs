//! Incremental tuple-dataflow constraint scoring for TupleForge.
//!
//! This crate maintains the matches and score of a set of constraints while
//! facts are inserted, updated and retracted one at a time:
//! - Typed constraint streams (`ConstraintFactory`, `UniStream`, ...)
//! - An untyped graph builder and plan compiler (`GraphBuilder`, `ExecutionPlan`)
//! - Node state with undo records: joins, existential checks, groups, maps
//! - Sessions propagating deltas layer by layer (`ConstraintSession`)
//!
//! # Architecture
//!
//! Streams record nodes into an arena indexed by `NodeId`. Building compiles
//! the arena into an immutable plan with shared nodes and layers. A session
//! owns the state of every node and drives each mutation to completion
//! before returning.

// Typed streams carry long generic signatures.
#![allow(clippy::type_complexity)]

pub mod api;
pub mod collector;
pub mod function;
pub mod graph;
pub mod index;
mod node;
pub mod score_inliner;
pub mod session;
pub mod stream;
pub mod tuple;

// ============================================================================
// Fluent Constraint Stream API
// ============================================================================

pub use stream::{
    BiStream, ConstraintBuilder, ConstraintFactory, QuadStream, TriStream, UniStream,
};

// ============================================================================
// Graph and Plan
// ============================================================================

pub use graph::{ConstraintDef, ExecutionPlan, GraphBuilder, NodeId, NodeType, PlanTree};

// ============================================================================
// Sessions
// ============================================================================

pub use score_inliner::{ScoreImpact, ScoreInliner};
pub use session::{ConstraintSession, FactListener};
pub use tuple::{Tuple, TupleId, MAX_ARITY};

// ============================================================================
// Analysis (for score explanation)
// ============================================================================

pub use api::{
    ConstraintAnalysis, ConstraintJustification, ConstraintMatch, ConstraintWeightOverrides,
    EntityRef, Indictment, IndictmentMap, ScoreExplanation,
};
