//! Incremental constraint sessions.
//!
//! A [`ConstraintSession`] owns the runtime state of every node of an
//! [`ExecutionPlan`] and drives fact mutations through it. Deltas are
//! queued per plan layer and processed in ascending layer order, FIFO
//! within a layer; group nodes flush after their layer is drained.

mod listener;

#[cfg(test)]
mod tests;

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::Arc;

use tracing::{debug, info, trace, warn};
use tupleforge_config::EnvironmentMode;
use tupleforge_core::{
    Fact, FactHandle, FactId, InvariantViolation, Result, Score, TupleForgeError,
};

use crate::api::{
    ConstraintAnalysis, ConstraintJustification, ConstraintMatch, EntityRef, IndictmentMap,
    ScoreExplanation,
};
use crate::graph::{ConstraintDef, ExecutionPlan, InputSide, NodeId};
use crate::node::{Change, Emit, NodeState, TerminalNode};
use crate::score_inliner::{ScoreImpact, ScoreInliner};
use crate::tuple::{Tuple, TupleIds};

pub use listener::FactListener;

struct Delta {
    node: NodeId,
    side: InputSide,
    change: Change,
}

/// Incrementally maintained matches and score of a constraint set.
///
/// Any error aborts the running mutation and poisons the session: all
/// later mutations fail with [`InvariantViolation::Poisoned`]. Read-only
/// introspection keeps working.
pub struct ConstraintSession<Sc: Score> {
    plan: Arc<ExecutionPlan<Sc>>,
    states: Vec<NodeState<Sc>>,
    queues: Vec<VecDeque<Delta>>,
    inliner: ScoreInliner<Sc>,
    ids: TupleIds,
    facts: BTreeMap<FactId, FactHandle>,
    updating: HashSet<FactId>,
    next_fact_id: u64,
    environment_mode: EnvironmentMode,
    poisoned: bool,
}

impl<Sc: Score> ConstraintSession<Sc> {
    pub fn new(plan: Arc<ExecutionPlan<Sc>>, environment_mode: EnvironmentMode) -> Self {
        let mut inliner = ScoreInliner::new();
        let mut constraint_of = vec![None; plan.nodes.len()];
        for (i, terminal) in plan.terminals.iter().enumerate() {
            if let Some(c) = plan.constraint(*terminal) {
                let index = inliner.register(c.constraint_ref.clone(), c.impact_type, c.weight);
                debug_assert_eq!(index, i);
                constraint_of[terminal.0] = Some(index);
            }
        }
        let states = plan
            .nodes
            .iter()
            .zip(constraint_of)
            .map(|(node, constraint)| NodeState::new(&node.def, constraint))
            .collect();
        let queues = (0..plan.layer_count()).map(|_| VecDeque::new()).collect();

        info!(
            event = "session_built",
            nodes = plan.node_count(),
            layers = plan.layer_count(),
            constraints = plan.constraint_count(),
            environment_mode = ?environment_mode,
        );

        Self {
            plan,
            states,
            queues,
            inliner,
            ids: TupleIds::default(),
            facts: BTreeMap::new(),
            updating: HashSet::new(),
            next_fact_id: 0,
            environment_mode,
            poisoned: false,
        }
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Inserts a new fact and returns its handle.
    pub fn insert<T: Fact>(&mut self, data: T) -> Result<FactHandle> {
        let handle = FactHandle::new(FactId(self.next_fact_id), data);
        self.on_fact_inserted(handle.clone())?;
        Ok(handle)
    }

    /// Replaces the data of a live fact, keeping its id.
    pub fn update<T: Fact>(&mut self, fact: &FactHandle, data: T) -> Result<FactHandle> {
        let Some(updated) = fact.with_data(data) else {
            let id = fact.id().0;
            return self.guarded(|_| Err(InvariantViolation::FactTypeChanged(id).into()));
        };
        self.on_fact_before_update(fact)?;
        self.on_fact_after_update(updated.clone())?;
        Ok(updated)
    }

    pub fn retract(&mut self, fact: &FactHandle) -> Result<()> {
        self.on_fact_retracted(fact)
    }

    fn guarded<R>(&mut self, op: impl FnOnce(&mut Self) -> Result<R>) -> Result<R> {
        if self.poisoned {
            return Err(InvariantViolation::Poisoned.into());
        }
        match op(self) {
            Ok(r) => Ok(r),
            Err(e) => self.fail(e),
        }
    }

    fn fail<R>(&mut self, error: TupleForgeError) -> Result<R> {
        self.poisoned = true;
        warn!(event = "session_poisoned", error = %error);
        Err(error)
    }

    fn push_fact_insert(&mut self, fact: &FactHandle) -> Result<()> {
        let plan = Arc::clone(&self.plan);
        for node in plan.source_nodes(fact.fact_type()) {
            let mut changes = Vec::new();
            if let NodeState::From(from) = &mut self.states[node.0] {
                let mut emit = Emit::new(*node, &mut self.ids, &mut changes);
                from.insert_fact(fact, &mut emit)?;
            }
            self.route(*node, changes);
        }
        Ok(())
    }

    fn push_fact_retract(&mut self, fact: &FactHandle) -> Result<()> {
        let plan = Arc::clone(&self.plan);
        for node in plan.source_nodes(fact.fact_type()) {
            let mut changes = Vec::new();
            if let NodeState::From(from) = &mut self.states[node.0] {
                let mut emit = Emit::new(*node, &mut self.ids, &mut changes);
                from.retract_fact(fact.id(), &mut emit)?;
            }
            self.route(*node, changes);
        }
        Ok(())
    }

    fn route(&mut self, from: NodeId, changes: Vec<Change>) {
        let plan = &self.plan;
        let children = &plan.nodes[from.0].children;
        for change in changes {
            for (child, side) in children {
                self.queues[plan.nodes[child.0].layer].push_back(Delta {
                    node: *child,
                    side: *side,
                    change: change.clone(),
                });
            }
        }
    }

    /// Drains every layer in order, flushing group nodes as their layer
    /// completes.
    fn settle(&mut self) -> Result<()> {
        let plan = Arc::clone(&self.plan);
        for layer in 0..self.queues.len() {
            while let Some(delta) = self.queues[layer].pop_front() {
                self.apply(delta)?;
            }
            for group in &plan.group_layers[layer] {
                let mut changes = Vec::new();
                if let NodeState::Group(state) = &mut self.states[group.0] {
                    if !state.has_pending() {
                        continue;
                    }
                    let mut emit = Emit::new(*group, &mut self.ids, &mut changes);
                    state.flush(&mut emit)?;
                }
                self.route(*group, changes);
            }
        }
        self.check()
    }

    fn apply(&mut self, delta: Delta) -> Result<()> {
        let Delta { node, side, change } = delta;
        trace!(
            event = "delta",
            node = node.0,
            side = ?side,
            insert = matches!(change, Change::Insert(_)),
            tuple = change.tuple().id().0,
        );
        let mut changes = Vec::new();
        match &mut self.states[node.0] {
            NodeState::Terminal(terminal) => {
                return match change {
                    Change::Insert(t) => terminal.insert(node, t, &mut self.inliner),
                    Change::Retract(t) => terminal.retract(node, &t, &mut self.inliner),
                };
            }
            state => {
                let mut emit = Emit::new(node, &mut self.ids, &mut changes);
                state.apply(side, change, &mut emit)?;
            }
        }
        self.route(node, changes);
        Ok(())
    }

    /// Self-checks selected by the environment mode.
    fn check(&self) -> Result<()> {
        if !self.environment_mode.is_asserted() {
            return Ok(());
        }
        self.inliner.verify()?;
        for terminal in self.terminals() {
            let recorded = self.inliner.match_count(terminal.constraint());
            if recorded != terminal.len() {
                return Err(InvariantViolation::ScoreCorruption {
                    expected: format!("{} matches", terminal.len()),
                    actual: format!("{} matches", recorded),
                }
                .into());
            }
        }
        if self.environment_mode.is_fully_asserted() {
            let expected = self.recalculate()?;
            if expected != self.score() {
                return Err(InvariantViolation::ScoreCorruption {
                    expected: expected.to_string(),
                    actual: self.score().to_string(),
                }
                .into());
            }
        }
        Ok(())
    }

    /// Scores the live facts from scratch in a fresh session.
    fn recalculate(&self) -> Result<Sc> {
        let mut shadow = ConstraintSession::new(
            Arc::clone(&self.plan),
            EnvironmentMode::NonReproducible,
        );
        // Facts between before- and after-update are out of the graph.
        for fact in self.facts.values().filter(|f| !self.updating.contains(&f.id())) {
            shadow.on_fact_inserted(fact.clone())?;
        }
        Ok(shadow.score())
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    pub fn score(&self) -> Sc {
        self.inliner.score()
    }

    pub fn plan(&self) -> &ExecutionPlan<Sc> {
        &self.plan
    }

    pub fn environment_mode(&self) -> EnvironmentMode {
        self.environment_mode
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    pub fn fact_count(&self) -> usize {
        self.facts.len()
    }

    /// Live facts ordered by id.
    pub fn facts(&self) -> impl Iterator<Item = &FactHandle> {
        self.facts.values()
    }

    pub fn fact(&self, id: FactId) -> Option<&FactHandle> {
        self.facts.get(&id)
    }

    /// Score contributed by the constraint with the given full or short
    /// name.
    pub fn constraint_score(&self, name: &str) -> Option<Sc> {
        let index = self.plan.constraint_index(name)?;
        Some(self.inliner.constraint_score(index))
    }

    pub fn match_count(&self, name: &str) -> Option<usize> {
        let index = self.plan.constraint_index(name)?;
        Some(self.inliner.match_count(index))
    }

    /// The tuples currently matching a constraint, ordered by tuple id.
    pub fn match_tuples(&self, name: &str) -> Option<Vec<Tuple>> {
        let terminal = self.terminal(self.plan.constraint_index(name)?)?;
        Some(terminal.matches().map(|(t, _)| t.clone()).collect())
    }

    /// Live matches of a constraint with justification and indicted
    /// values.
    pub fn matches(&self, name: &str) -> Option<Vec<ConstraintMatch<Sc>>> {
        self.matches_at(self.plan.constraint_index(name)?)
    }

    pub fn explain(&self) -> ScoreExplanation<Sc> {
        let analyses = (0..self.inliner.len())
            .map(|i| {
                ConstraintAnalysis::new(
                    self.inliner.constraint_ref(i).clone(),
                    self.inliner.weight(i),
                    self.inliner.constraint_score(i),
                    self.matches_at(i).unwrap_or_default(),
                )
            })
            .collect();
        ScoreExplanation::new(self.score(), analyses)
    }

    pub fn indictments(&self) -> IndictmentMap<Sc> {
        let matches = (0..self.inliner.len())
            .filter_map(|i| self.matches_at(i))
            .flatten()
            .collect();
        IndictmentMap::from_matches(matches)
    }

    fn matches_at(&self, index: usize) -> Option<Vec<ConstraintMatch<Sc>>> {
        let def = self.plan.constraint_at(index)?;
        let terminal = self.terminal(index)?;
        Some(
            terminal
                .matches()
                .map(|(tuple, impact)| Self::constraint_match(def, tuple, impact))
                .collect(),
        )
    }

    fn constraint_match(
        def: &ConstraintDef<Sc>,
        tuple: &Tuple,
        impact: &ScoreImpact<Sc>,
    ) -> ConstraintMatch<Sc> {
        let elements = || -> Vec<EntityRef> {
            tuple
                .elements()
                .iter()
                .cloned()
                .map(EntityRef::from_value)
                .collect()
        };
        let justification = match &def.justify {
            Some(f) => f(tuple),
            None => ConstraintJustification::new(elements()),
        };
        let indicted = match &def.indict {
            Some(f) => f(tuple).into_iter().map(EntityRef::from_value).collect(),
            None => elements(),
        };
        ConstraintMatch {
            constraint_ref: def.constraint_ref.clone(),
            score: impact.delta(),
            justification,
            indicted,
        }
    }

    fn terminal(&self, index: usize) -> Option<&TerminalNode<Sc>> {
        let node = self.plan.terminals.get(index)?;
        match &self.states[node.0] {
            NodeState::Terminal(t) => Some(t),
            _ => None,
        }
    }

    fn terminals(&self) -> impl Iterator<Item = &TerminalNode<Sc>> {
        self.states.iter().filter_map(|s| match s {
            NodeState::Terminal(t) => Some(t),
            _ => None,
        })
    }
}

impl<Sc: Score> FactListener for ConstraintSession<Sc> {
    fn on_fact_inserted(&mut self, fact: FactHandle) -> Result<()> {
        self.guarded(|s| {
            let id = fact.id();
            if s.facts.contains_key(&id) {
                return Err(InvariantViolation::DuplicateFact(id.0).into());
            }
            s.next_fact_id = s.next_fact_id.max(id.0 + 1);
            s.push_fact_insert(&fact)?;
            s.facts.insert(id, fact);
            s.settle()?;
            debug!(
                event = "fact_inserted",
                fact = %id,
                fact_type = s.facts[&id].short_type_name(),
                score = %s.score(),
            );
            Ok(())
        })
    }

    fn on_fact_before_update(&mut self, fact: &FactHandle) -> Result<()> {
        self.guarded(|s| {
            let id = fact.id();
            let current = s
                .facts
                .get(&id)
                .cloned()
                .ok_or(InvariantViolation::UnknownFact(id.0))?;
            if !s.updating.insert(id) {
                return Err(InvariantViolation::UpdateInProgress(id.0).into());
            }
            // Held back until the matching after-update.
            s.push_fact_retract(&current)
        })
    }

    fn on_fact_after_update(&mut self, fact: FactHandle) -> Result<()> {
        self.guarded(|s| {
            let id = fact.id();
            if !s.updating.remove(&id) {
                return Err(InvariantViolation::UpdateNotStarted(id.0).into());
            }
            let same_type = s
                .facts
                .get(&id)
                .is_some_and(|old| old.fact_type() == fact.fact_type());
            if !same_type {
                return Err(InvariantViolation::FactTypeChanged(id.0).into());
            }
            s.push_fact_insert(&fact)?;
            s.facts.insert(id, fact);
            s.settle()?;
            debug!(event = "fact_updated", fact = %id, score = %s.score());
            Ok(())
        })
    }

    fn on_fact_retracted(&mut self, fact: &FactHandle) -> Result<()> {
        self.guarded(|s| {
            let id = fact.id();
            let current = s
                .facts
                .remove(&id)
                .ok_or(InvariantViolation::UnknownFact(id.0))?;
            // A fact in the middle of an update has already left the graph.
            if !s.updating.remove(&id) {
                s.push_fact_retract(&current)?;
            }
            s.settle()?;
            debug!(event = "fact_retracted", fact = %id, score = %s.score());
            Ok(())
        })
    }
}

impl<Sc: Score> std::fmt::Debug for ConstraintSession<Sc> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConstraintSession")
            .field("facts", &self.facts.len())
            .field("score", &self.score())
            .field("environment_mode", &self.environment_mode)
            .field("poisoned", &self.poisoned)
            .finish()
    }
}
