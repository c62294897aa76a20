// Constraint factory for creating typed constraint streams.
//
// The factory is the entry point for the fluent constraint API. It owns the
// graph builder every stream created from it writes into.

use std::cell::{Ref, RefCell};
use std::rc::Rc;
use std::sync::Arc;

use tupleforge_config::SessionConfig;
use tupleforge_core::{BuildError, Fact, ParseableScore, Result, Score, TupleForgeError};

use super::joiner::{into_defs, Joiner};
use super::{BiStream, UniStream};
use crate::api::ConstraintWeightOverrides;
use crate::graph::{ExecutionPlan, GraphBuilder, NodeId};
use crate::index::JoinerDef;
use crate::session::ConstraintSession;
use crate::tuple::Tuple;

/// Factory for creating constraint streams.
///
/// Clones share the same graph, so streams from any clone can be combined.
///
/// # Example
///
/// ```
/// use tupleforge_config::SessionConfig;
/// use tupleforge_core::SimpleScore;
/// use tupleforge_scoring::stream::ConstraintFactory;
///
/// #[derive(Debug)]
/// struct Shift { employee: Option<u32> }
///
/// let factory = ConstraintFactory::<SimpleScore>::new();
/// factory
///     .for_each::<Shift>()
///     .filter(|s: &Shift| s.employee.is_none())
///     .penalize(SimpleScore::of(1))
///     .as_constraint("Unassigned shift");
///
/// let mut session = factory.build_session(&SessionConfig::default()).unwrap();
/// session.insert(Shift { employee: None }).unwrap();
/// session.insert(Shift { employee: Some(3) }).unwrap();
/// assert_eq!(session.score(), SimpleScore::of(-1));
/// ```
pub struct ConstraintFactory<Sc: Score> {
    graph: Rc<RefCell<GraphBuilder<Sc>>>,
}

impl<Sc: Score> ConstraintFactory<Sc> {
    pub fn new() -> Self {
        Self {
            graph: Rc::new(RefCell::new(GraphBuilder::new())),
        }
    }

    /// Starts a stream over every live fact of type `T`.
    pub fn for_each<T: Fact>(&self) -> UniStream<Sc, T> {
        let node = self.add(|g| g.source_of::<T>());
        UniStream::new(self.clone(), node)
    }

    /// Starts a stream over every pair of distinct facts of type `T`
    /// matching `joiner`, each pair once.
    pub fn for_each_unique_pair<T: Fact>(
        &self,
        joiner: impl Joiner<(T,), T>,
    ) -> BiStream<Sc, T, T> {
        let left = self.add(|g| g.source_of::<T>());
        let right = self.add(|g| g.source_of::<T>());
        let mut defs = into_defs(joiner);
        // Facts are ordered by id; keep only pairs with left < right.
        defs.push(JoinerDef::filtering(Arc::new(|l: &Tuple, r: &Tuple| {
            l.value(0) < r.value(0)
        })));
        let node = self.join_nodes(left, right, defs);
        BiStream::new(self.clone(), node)
    }

    /// The graph recorded so far.
    pub fn graph(&self) -> Ref<'_, GraphBuilder<Sc>> {
        self.graph.borrow()
    }

    /// Validates the recorded graph and compiles it.
    pub fn build_plan(
        &self,
        config: &SessionConfig,
    ) -> std::result::Result<ExecutionPlan<Sc>, BuildError> {
        self.graph.borrow().build(config)
    }

    /// Builds a session, applying the weight overrides found in `config`.
    pub fn build_session(&self, config: &SessionConfig) -> Result<ConstraintSession<Sc>>
    where
        Sc: ParseableScore,
    {
        let overrides = ConstraintWeightOverrides::from_config(config)
            .map_err(|e| TupleForgeError::Config(e.to_string()))?;
        self.build_session_with(config, &overrides)
    }

    /// Builds a session with explicit constraint weight overrides.
    pub fn build_session_with(
        &self,
        config: &SessionConfig,
        overrides: &ConstraintWeightOverrides<Sc>,
    ) -> Result<ConstraintSession<Sc>> {
        let plan = self.graph.borrow().build_with_overrides(config, overrides)?;
        Ok(ConstraintSession::new(Arc::new(plan), config.environment_mode))
    }

    pub(crate) fn add(&self, f: impl FnOnce(&mut GraphBuilder<Sc>) -> NodeId) -> NodeId {
        f(&mut self.graph.borrow_mut())
    }

    pub(crate) fn join_nodes(&self, left: NodeId, right: NodeId, defs: Vec<JoinerDef>) -> NodeId {
        self.add(|g| g.join(left, right, defs))
    }
}

impl<Sc: Score> Default for ConstraintFactory<Sc> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Sc: Score> Clone for ConstraintFactory<Sc> {
    fn clone(&self) -> Self {
        Self {
            graph: Rc::clone(&self.graph),
        }
    }
}

impl<Sc: Score> std::fmt::Debug for ConstraintFactory<Sc> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConstraintFactory")
            .field("nodes", &self.graph.borrow().node_count())
            .finish()
    }
}
