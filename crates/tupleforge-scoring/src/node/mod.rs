//! Runtime state of graph nodes.
//!
//! Each node owns its indexes, pair tables and aggregate containers. Nodes
//! never look at each other's state; they receive insert and retract
//! deltas and push the resulting changes into an [`Emit`] buffer which the
//! session routes to their children.

mod distinct;
mod exists;
mod filter;
mod from;
mod group;
mod join;
mod map;
mod terminal;


use tupleforge_core::{InvariantViolation, Result, Score};

use crate::graph::{InputSide, NodeDef, NodeId};
use crate::tuple::{Elements, Tuple, TupleIds};

pub(crate) use distinct::DistinctNode;
pub(crate) use exists::ExistsNode;
pub(crate) use filter::FilterNode;
pub(crate) use from::FromNode;
pub(crate) use group::GroupNode;
pub(crate) use join::JoinNode;
pub(crate) use map::{FlattenNode, MapNode};
pub(crate) use terminal::TerminalNode;

/// A delta leaving a node.
#[derive(Debug, Clone)]
pub(crate) enum Change {
    Insert(Tuple),
    Retract(Tuple),
}

impl Change {
    pub(crate) fn tuple(&self) -> &Tuple {
        match self {
            Change::Insert(t) | Change::Retract(t) => t,
        }
    }
}

/// Output buffer handed to a node while it processes one delta.
pub(crate) struct Emit<'a> {
    node: NodeId,
    ids: &'a mut TupleIds,
    changes: &'a mut Vec<Change>,
}

impl<'a> Emit<'a> {
    pub(crate) fn new(
        node: NodeId,
        ids: &'a mut TupleIds,
        changes: &'a mut Vec<Change>,
    ) -> Self {
        Self {
            node,
            ids,
            changes,
        }
    }

    /// Creates a tuple owned by this node.
    pub(crate) fn create(&mut self, elements: Elements) -> Tuple {
        self.ids.tuple(elements)
    }

    pub(crate) fn insert(&mut self, tuple: Tuple) {
        self.changes.push(Change::Insert(tuple));
    }

    pub(crate) fn retract(&mut self, tuple: Tuple) {
        self.changes.push(Change::Retract(tuple));
    }

    pub(crate) fn unknown(&self, tuple: &Tuple) -> InvariantViolation {
        InvariantViolation::UnknownTuple {
            node: self.node.0,
            tuple: tuple.id().0,
        }
    }

    pub(crate) fn duplicate(&self, tuple: &Tuple) -> InvariantViolation {
        InvariantViolation::DuplicateTuple {
            node: self.node.0,
            tuple: tuple.id().0,
        }
    }

    pub(crate) fn node(&self) -> NodeId {
        self.node
    }
}

/// State of one node, one variant per node kind.
pub(crate) enum NodeState<Sc: Score> {
    From(FromNode),
    Filter(FilterNode),
    Join(JoinNode),
    Exists(ExistsNode),
    Group(GroupNode),
    Map(MapNode),
    Flatten(FlattenNode),
    Distinct(DistinctNode),
    Terminal(TerminalNode<Sc>),
}

impl<Sc: Score> NodeState<Sc> {
    /// Creates empty state for `def`. `constraint` is the inliner index of
    /// a terminal node.
    pub(crate) fn new(def: &NodeDef<Sc>, constraint: Option<usize>) -> Self {
        match def {
            NodeDef::From { .. } => NodeState::From(FromNode::default()),
            NodeDef::Filter(predicate) => NodeState::Filter(FilterNode::new(predicate.clone())),
            NodeDef::Join(joiners) => NodeState::Join(JoinNode::new(joiners.clone())),
            NodeDef::Exists {
                should_exist,
                joiners,
                ..
            } => NodeState::Exists(ExistsNode::new(*should_exist, joiners.clone())),
            NodeDef::Group { keys, collectors } => {
                NodeState::Group(GroupNode::new(keys.clone(), collectors.clone()))
            }
            NodeDef::Map(mappings) => NodeState::Map(MapNode::new(mappings.clone())),
            NodeDef::Flatten(f) => NodeState::Flatten(FlattenNode::new(f.clone())),
            NodeDef::Distinct => NodeState::Distinct(DistinctNode::default()),
            NodeDef::Terminal(c) => NodeState::Terminal(TerminalNode::new(
                constraint.unwrap_or_default(),
                c.match_weight.clone(),
            )),
        }
    }

    /// Applies one delta to a non-terminal node.
    ///
    /// Source and terminal nodes are driven directly by the session and
    /// report any delta routed to them as unknown.
    pub(crate) fn apply(
        &mut self,
        side: InputSide,
        change: Change,
        emit: &mut Emit<'_>,
    ) -> Result<()> {
        match (self, change) {
            (NodeState::Filter(n), Change::Insert(t)) => n.insert(t, emit),
            (NodeState::Filter(n), Change::Retract(t)) => n.retract(t, emit),
            (NodeState::Join(n), Change::Insert(t)) => n.insert(side, t, emit),
            (NodeState::Join(n), Change::Retract(t)) => n.retract(side, t, emit),
            (NodeState::Exists(n), Change::Insert(t)) => n.insert(side, t, emit),
            (NodeState::Exists(n), Change::Retract(t)) => n.retract(side, t, emit),
            (NodeState::Group(n), Change::Insert(t)) => n.insert(t, emit),
            (NodeState::Group(n), Change::Retract(t)) => n.retract(t, emit),
            (NodeState::Map(n), Change::Insert(t)) => n.insert(t, emit),
            (NodeState::Map(n), Change::Retract(t)) => n.retract(t, emit),
            (NodeState::Flatten(n), Change::Insert(t)) => n.insert(t, emit),
            (NodeState::Flatten(n), Change::Retract(t)) => n.retract(t, emit),
            (NodeState::Distinct(n), Change::Insert(t)) => n.insert(t, emit),
            (NodeState::Distinct(n), Change::Retract(t)) => n.retract(t, emit),
            (NodeState::From(_) | NodeState::Terminal(_), change) => {
                Err(emit.unknown(change.tuple()).into())
            }
        }
    }
}
