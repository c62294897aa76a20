//! Untyped constraint graph builder.

use std::any::TypeId;

use smallvec::{smallvec, SmallVec};
use tupleforge_config::SessionConfig;
use tupleforge_core::{BuildError, Fact, Score};

use super::compiler::{self, ExecutionPlan};
use super::{
    ConstraintDef, FlattenFn, NodeBlueprint, NodeDef, NodeId, NodeType, TuplePredicate,
};
use crate::api::ConstraintWeightOverrides;
use crate::collector::CollectorFn;
use crate::index::{JoinerDef, JoinerSet, KeyFn, RightType};
use crate::tuple::MAX_ARITY;

/// Records constraint graph nodes.
///
/// Every method returns the new node's id, even when the node is invalid;
/// problems are collected and reported by [`build`](Self::build) so that a
/// fluent definition never has to handle errors midway.
///
/// This is the erased layer under the typed
/// [`ConstraintFactory`](crate::stream::ConstraintFactory). It can express
/// graphs the typed API rejects at compile time, which `build` then
/// reports as [`BuildError`]s.
pub struct GraphBuilder<Sc: Score> {
    nodes: Vec<NodeBlueprint<Sc>>,
    errors: Vec<BuildError>,
}

impl<Sc: Score> Default for GraphBuilder<Sc> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Sc: Score> Clone for GraphBuilder<Sc> {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes.clone(),
            errors: self.errors.clone(),
        }
    }
}

impl<Sc: Score> GraphBuilder<Sc> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Adds a source node emitting one uni-tuple per fact of `fact_type`.
    pub fn source(&mut self, fact_type: TypeId, type_name: &'static str) -> NodeId {
        self.push(
            NodeDef::From {
                fact_type,
                type_name,
            },
            SmallVec::new(),
            1,
        )
    }

    pub fn source_of<T: Fact>(&mut self) -> NodeId {
        self.source(TypeId::of::<T>(), std::any::type_name::<T>())
    }

    pub fn filter(&mut self, parent: NodeId, predicate: TuplePredicate) -> NodeId {
        let cardinality = self.parent_cardinality(parent);
        self.push(NodeDef::Filter(predicate), smallvec![parent], cardinality)
    }

    /// Adds a join of `left` and `right`, emitting `left ++ right`.
    pub fn join(&mut self, left: NodeId, right: NodeId, joiners: Vec<JoinerDef>) -> NodeId {
        let joiners = self.compile_joiners(&joiners);
        let cardinality = self.parent_cardinality(left) + self.parent_cardinality(right);
        self.check_arity(cardinality);
        self.push(NodeDef::Join(joiners), smallvec![left, right], cardinality)
    }

    /// Adds an existential node passing `left` tuples through depending on
    /// whether any `right` tuple of type `candidate` matches.
    pub fn exists(
        &mut self,
        left: NodeId,
        right: NodeId,
        should_exist: bool,
        candidate: RightType,
        joiners: Vec<JoinerDef>,
    ) -> NodeId {
        let joiner_types = joiners.iter().map(JoinerDef::right_type).collect();
        let joiners = self.compile_joiners(&joiners);
        let cardinality = self.parent_cardinality(left);
        self.push(
            NodeDef::Exists {
                should_exist,
                joiners,
                candidate,
                joiner_types,
            },
            smallvec![left, right],
            cardinality,
        )
    }

    /// Adds a group node emitting `(keys..., results...)` per non-empty
    /// group.
    pub fn group(
        &mut self,
        parent: NodeId,
        keys: Vec<KeyFn>,
        collectors: Vec<CollectorFn>,
    ) -> NodeId {
        let cardinality = keys.len() + collectors.len();
        if keys.len() > MAX_ARITY - 1 {
            self.errors.push(BuildError::Arity(keys.len()));
        }
        self.check_arity(cardinality);
        self.push(
            NodeDef::Group { keys, collectors },
            smallvec![parent],
            cardinality,
        )
    }

    pub fn map(&mut self, parent: NodeId, mappings: Vec<KeyFn>) -> NodeId {
        let cardinality = mappings.len();
        self.check_arity(cardinality);
        self.push(NodeDef::Map(mappings), smallvec![parent], cardinality)
    }

    /// Adds a node replacing the last element of every tuple by each item
    /// `f` produces.
    pub fn flatten_last(&mut self, parent: NodeId, f: FlattenFn) -> NodeId {
        let cardinality = self.parent_cardinality(parent);
        self.push(NodeDef::Flatten(f), smallvec![parent], cardinality)
    }

    pub fn distinct(&mut self, parent: NodeId) -> NodeId {
        let cardinality = self.parent_cardinality(parent);
        self.push(NodeDef::Distinct, smallvec![parent], cardinality)
    }

    /// Terminates `parent` in a scoring node for `constraint`.
    pub fn terminal(&mut self, parent: NodeId, constraint: ConstraintDef<Sc>) -> NodeId {
        let cardinality = self.parent_cardinality(parent);
        self.push(NodeDef::Terminal(constraint), smallvec![parent], cardinality)
    }

    /// Arity of the tuples `node` emits.
    pub fn cardinality(&self, node: NodeId) -> Option<usize> {
        self.nodes.get(node.0).map(|n| n.cardinality)
    }

    pub fn node_type(&self, node: NodeId) -> Option<NodeType> {
        self.nodes.get(node.0).map(|n| n.def.node_type())
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Validates the graph and compiles it into an execution plan.
    pub fn build(&self, config: &SessionConfig) -> Result<ExecutionPlan<Sc>, BuildError> {
        self.build_with_overrides(config, &ConstraintWeightOverrides::new())
    }

    /// Like [`build`](Self::build), replacing the weights of constraints
    /// named in `overrides`.
    pub fn build_with_overrides(
        &self,
        config: &SessionConfig,
        overrides: &ConstraintWeightOverrides<Sc>,
    ) -> Result<ExecutionPlan<Sc>, BuildError> {
        if let Some(err) = self.errors.first() {
            return Err(err.clone());
        }
        compiler::compile(&self.nodes, config.node_sharing, overrides)
    }

    fn push(
        &mut self,
        def: NodeDef<Sc>,
        parents: SmallVec<[NodeId; 2]>,
        cardinality: usize,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        for parent in &parents {
            if parent.0 >= self.nodes.len() {
                self.errors.push(BuildError::MissingSource {
                    node: id.0,
                    node_type: def.node_type().to_string(),
                });
            }
        }
        self.nodes.push(NodeBlueprint {
            def,
            parents,
            cardinality,
        });
        id
    }

    fn parent_cardinality(&self, parent: NodeId) -> usize {
        self.cardinality(parent).unwrap_or(0)
    }

    fn check_arity(&mut self, cardinality: usize) {
        if !(1..=MAX_ARITY).contains(&cardinality) {
            self.errors.push(BuildError::Arity(cardinality));
        }
    }

    fn compile_joiners(&mut self, joiners: &[JoinerDef]) -> JoinerSet {
        match JoinerSet::compile(joiners) {
            Ok(set) => set,
            Err(err) => {
                self.errors.push(err);
                JoinerSet::default()
            }
        }
    }
}
