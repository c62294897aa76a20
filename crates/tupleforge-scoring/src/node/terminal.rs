use std::collections::BTreeMap;

use tracing::trace;
use tupleforge_core::{InvariantViolation, MatchWeight, Result, Score, TupleForgeError};

use crate::graph::{MatchWeightFn, NodeId};
use crate::score_inliner::{ScoreImpact, ScoreInliner};
use crate::tuple::{Tuple, TupleId};

/// Scores matched tuples and keeps each match's undo token.
pub(crate) struct TerminalNode<Sc: Score> {
    constraint: usize,
    match_weight: Option<MatchWeightFn>,
    matches: BTreeMap<TupleId, (Tuple, ScoreImpact<Sc>)>,
}

impl<Sc: Score> TerminalNode<Sc> {
    pub(crate) fn new(constraint: usize, match_weight: Option<MatchWeightFn>) -> Self {
        Self {
            constraint,
            match_weight,
            matches: BTreeMap::new(),
        }
    }

    pub(crate) fn insert(
        &mut self,
        node: NodeId,
        tuple: Tuple,
        inliner: &mut ScoreInliner<Sc>,
    ) -> Result<()> {
        if self.matches.contains_key(&tuple.id()) {
            return Err(InvariantViolation::DuplicateTuple {
                node: node.0,
                tuple: tuple.id().0,
            }
            .into());
        }
        let weight = self
            .match_weight
            .as_ref()
            .map_or(MatchWeight::ONE, |f| f(&tuple));
        let impact = inliner
            .impact(self.constraint, &weight)
            .map_err(|source| TupleForgeError::Weight {
                constraint: inliner.constraint_ref(self.constraint).full_name(),
                source,
            })?;
        trace!(
            event = "match_inserted",
            node = node.0,
            constraint = self.constraint,
            delta = %impact.delta(),
        );
        self.matches.insert(tuple.id(), (tuple, impact));
        Ok(())
    }

    pub(crate) fn retract(
        &mut self,
        node: NodeId,
        tuple: &Tuple,
        inliner: &mut ScoreInliner<Sc>,
    ) -> Result<()> {
        let (_, impact) = self
            .matches
            .remove(&tuple.id())
            .ok_or(InvariantViolation::UnknownTuple {
                node: node.0,
                tuple: tuple.id().0,
            })?;
        trace!(
            event = "match_retracted",
            node = node.0,
            constraint = self.constraint,
            delta = %impact.delta(),
        );
        inliner
            .undo(impact)
            .map_err(|source| TupleForgeError::Weight {
                constraint: inliner.constraint_ref(self.constraint).full_name(),
                source,
            })
    }

    pub(crate) fn constraint(&self) -> usize {
        self.constraint
    }

    /// Live matches ordered by tuple id.
    pub(crate) fn matches(&self) -> impl Iterator<Item = (&Tuple, &ScoreImpact<Sc>)> {
        self.matches.values().map(|(t, i)| (t, i))
    }

    pub(crate) fn len(&self) -> usize {
        self.matches.len()
    }
}
