//! Error types for TupleForge

use thiserror::Error;

/// Errors detected while building a constraint graph.
///
/// All of these are reported by the builder's `build` step; nothing is
/// executed until the graph validates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    /// A stream was created but never reached a terminal scoring node.
    #[error("stream node {node} ({node_type}) does not lead to any constraint")]
    UnterminatedStream { node: usize, node_type: String },

    /// An existential node's candidate type differs from a joiner's right type.
    #[error("exists node expects candidates of type {expected}, but a joiner reads {actual}")]
    ExistsTypeMismatch { expected: String, actual: String },

    /// A filtering joiner was followed by an indexing joiner.
    #[error("filtering joiner at position {position} is followed by an indexing joiner")]
    FilteringBeforeIndexing { position: usize },

    /// A join or exists node has a left input narrower than its right input.
    #[error("left input cardinality {left} is lower than right input cardinality {right}")]
    JoinCardinality { left: usize, right: usize },

    /// Two constraints share the same fully qualified name.
    #[error("constraint {0} is defined more than once")]
    DuplicateConstraint(String),

    /// A non-source node has no parent.
    #[error("node {node} ({node_type}) has no source")]
    MissingSource { node: usize, node_type: String },

    /// A node would produce tuples outside the supported arity range 1..=4.
    #[error("tuple arity {0} is outside the supported range 1..=4")]
    Arity(usize),
}

/// Internal consistency failures. Any of these indicates an engine bug or a
/// misuse of the fact listener protocol.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("tuple {tuple} is not known to node {node}")]
    UnknownTuple { node: usize, tuple: u64 },

    #[error("tuple {tuple} was already inserted into node {node}")]
    DuplicateTuple { node: usize, tuple: u64 },

    #[error("fact {0} is not present in the session")]
    UnknownFact(u64),

    #[error("fact {0} was already inserted")]
    DuplicateFact(u64),

    #[error("use count of {what} would become negative")]
    NegativeUseCount { what: String },

    #[error("fact {0} cannot change its type in an update")]
    FactTypeChanged(u64),

    #[error("fact {0} received an after-update without a matching before-update")]
    UpdateNotStarted(u64),

    #[error("fact {0} is already being updated")]
    UpdateInProgress(u64),

    #[error("collector state in node {node} has an unexpected type")]
    CollectorState { node: usize },

    #[error("score corruption: incremental score {actual} differs from recalculated {expected}")]
    ScoreCorruption { expected: String, actual: String },

    #[error("session is poisoned by an earlier failure")]
    Poisoned,
}

/// A match weight that the scoring sink refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeightError {
    #[error("match weight {0} is negative for a penalty or reward constraint")]
    Negative(String),

    #[error("match weight {0} is not integral, but the score type has integer levels")]
    NonIntegral(String),

    #[error("match weight overflows the score range")]
    Overflow,
}

/// Main error type for TupleForge operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TupleForgeError {
    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    #[error("Invariant violation: {0}")]
    Invariant(#[from] InvariantViolation),

    #[error("Weight error in constraint {constraint}: {source}")]
    Weight {
        constraint: String,
        #[source]
        source: WeightError,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for TupleForge operations
pub type Result<T> = std::result::Result<T, TupleForgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weight_error_names_constraint() {
        let err = TupleForgeError::Weight {
            constraint: "rooms/Capacity".to_string(),
            source: WeightError::Negative("-3".to_string()),
        };
        let text = err.to_string();
        assert!(text.contains("rooms/Capacity"));
        assert!(text.contains("-3"));
    }

    #[test]
    fn test_build_error_converts() {
        let err: TupleForgeError = BuildError::DuplicateConstraint("a".into()).into();
        assert!(matches!(err, TupleForgeError::Build(_)));
    }
}
