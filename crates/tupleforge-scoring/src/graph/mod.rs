//! Constraint graph definitions and the plan compiler.
//!
//! Nodes live in a single arena and refer to each other by [`NodeId`].
//! The [`GraphBuilder`] records node definitions; [`GraphBuilder::build`]
//! validates them and compiles an [`ExecutionPlan`] that sessions execute.

mod builder;
mod compiler;


use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

use smallvec::SmallVec;
use tupleforge_core::{ConstraintRef, ImpactType, MatchWeight, Score, Value};

use crate::api::ConstraintJustification;
use crate::collector::CollectorFn;
use crate::index::{JoinerSet, KeyFn, RightType};
use crate::tuple::Tuple;

pub use builder::GraphBuilder;
pub use compiler::{ExecutionPlan, PlanTree};

/// Tuple predicate used by filter nodes.
pub type TuplePredicate = Arc<dyn Fn(&Tuple) -> bool + Send + Sync>;

/// Produces the items replacing a tuple's last element.
pub type FlattenFn = Arc<dyn Fn(&Tuple) -> Vec<Value> + Send + Sync>;

pub type MatchWeightFn = Arc<dyn Fn(&Tuple) -> MatchWeight + Send + Sync>;

pub type JustifyFn = Arc<dyn Fn(&Tuple) -> ConstraintJustification + Send + Sync>;

pub type IndictFn = Arc<dyn Fn(&Tuple) -> Vec<Value> + Send + Sync>;

/// Index of a node in the graph arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// Which input of a node a delta arrives on. Unary nodes only use `Left`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputSide {
    Left,
    Right,
}

/// Public classification of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    From,
    Filter,
    Join,
    IfExists,
    IfNotExists,
    GroupMapping,
    GroupCollecting,
    GroupMappingCollecting,
    Map,
    Flatten,
    Distinct,
    Terminal,
}

impl NodeType {
    pub fn name(self) -> &'static str {
        match self {
            NodeType::From => "From",
            NodeType::Filter => "Filter",
            NodeType::Join => "Join",
            NodeType::IfExists => "IfExists",
            NodeType::IfNotExists => "IfNotExists",
            NodeType::GroupMapping => "GroupBy(mapping)",
            NodeType::GroupCollecting => "GroupBy(collecting)",
            NodeType::GroupMappingCollecting => "GroupBy(mapping, collecting)",
            NodeType::Map => "Map",
            NodeType::Flatten => "FlattenLast",
            NodeType::Distinct => "Distinct",
            NodeType::Terminal => "Terminal",
        }
    }

    /// True for nodes with a left and a right input.
    pub fn is_binary(self) -> bool {
        matches!(self, NodeType::Join | NodeType::IfExists | NodeType::IfNotExists)
    }

    pub fn is_group(self) -> bool {
        matches!(
            self,
            NodeType::GroupMapping | NodeType::GroupCollecting | NodeType::GroupMappingCollecting
        )
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Everything a terminal node needs to score its matches.
pub struct ConstraintDef<Sc: Score> {
    pub constraint_ref: ConstraintRef,
    pub impact_type: ImpactType,
    pub weight: Sc,
    /// Defaults to [`MatchWeight::ONE`].
    pub match_weight: Option<MatchWeightFn>,
    /// Defaults to the tuple's elements.
    pub justify: Option<JustifyFn>,
    /// Defaults to the tuple's elements.
    pub indict: Option<IndictFn>,
}

impl<Sc: Score> ConstraintDef<Sc> {
    pub fn new(constraint_ref: ConstraintRef, impact_type: ImpactType, weight: Sc) -> Self {
        Self {
            constraint_ref,
            impact_type,
            weight,
            match_weight: None,
            justify: None,
            indict: None,
        }
    }

    pub fn with_match_weight(mut self, f: MatchWeightFn) -> Self {
        self.match_weight = Some(f);
        self
    }

    pub fn with_justification(mut self, f: JustifyFn) -> Self {
        self.justify = Some(f);
        self
    }

    pub fn with_indictment(mut self, f: IndictFn) -> Self {
        self.indict = Some(f);
        self
    }
}

impl<Sc: Score> Clone for ConstraintDef<Sc> {
    fn clone(&self) -> Self {
        Self {
            constraint_ref: self.constraint_ref.clone(),
            impact_type: self.impact_type,
            weight: self.weight,
            match_weight: self.match_weight.clone(),
            justify: self.justify.clone(),
            indict: self.indict.clone(),
        }
    }
}

impl<Sc: Score> fmt::Debug for ConstraintDef<Sc> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstraintDef")
            .field("constraint_ref", &self.constraint_ref)
            .field("impact_type", &self.impact_type)
            .field("weight", &self.weight)
            .finish()
    }
}

/// Node variants as recorded by the builder.
pub(crate) enum NodeDef<Sc: Score> {
    From {
        fact_type: TypeId,
        type_name: &'static str,
    },
    Filter(TuplePredicate),
    Join(JoinerSet),
    Exists {
        should_exist: bool,
        joiners: JoinerSet,
        candidate: RightType,
        joiner_types: Vec<Option<RightType>>,
    },
    Group {
        keys: Vec<KeyFn>,
        collectors: Vec<CollectorFn>,
    },
    Map(Vec<KeyFn>),
    Flatten(FlattenFn),
    Distinct,
    Terminal(ConstraintDef<Sc>),
}

impl<Sc: Score> NodeDef<Sc> {
    pub(crate) fn node_type(&self) -> NodeType {
        match self {
            NodeDef::From { .. } => NodeType::From,
            NodeDef::Filter(_) => NodeType::Filter,
            NodeDef::Join(_) => NodeType::Join,
            NodeDef::Exists {
                should_exist: true, ..
            } => NodeType::IfExists,
            NodeDef::Exists { .. } => NodeType::IfNotExists,
            NodeDef::Group { keys, collectors } => match (keys.is_empty(), collectors.is_empty()) {
                (_, true) => NodeType::GroupMapping,
                (true, false) => NodeType::GroupCollecting,
                (false, false) => NodeType::GroupMappingCollecting,
            },
            NodeDef::Map(_) => NodeType::Map,
            NodeDef::Flatten(_) => NodeType::Flatten,
            NodeDef::Distinct => NodeType::Distinct,
            NodeDef::Terminal(_) => NodeType::Terminal,
        }
    }
}

impl<Sc: Score> Clone for NodeDef<Sc> {
    fn clone(&self) -> Self {
        match self {
            NodeDef::From {
                fact_type,
                type_name,
            } => NodeDef::From {
                fact_type: *fact_type,
                type_name,
            },
            NodeDef::Filter(p) => NodeDef::Filter(Arc::clone(p)),
            NodeDef::Join(j) => NodeDef::Join(j.clone()),
            NodeDef::Exists {
                should_exist,
                joiners,
                candidate,
                joiner_types,
            } => NodeDef::Exists {
                should_exist: *should_exist,
                joiners: joiners.clone(),
                candidate: *candidate,
                joiner_types: joiner_types.clone(),
            },
            NodeDef::Group { keys, collectors } => NodeDef::Group {
                keys: keys.clone(),
                collectors: collectors.clone(),
            },
            NodeDef::Map(m) => NodeDef::Map(m.clone()),
            NodeDef::Flatten(f) => NodeDef::Flatten(Arc::clone(f)),
            NodeDef::Distinct => NodeDef::Distinct,
            NodeDef::Terminal(c) => NodeDef::Terminal(c.clone()),
        }
    }
}

/// A node as recorded by the builder, before validation.
pub(crate) struct NodeBlueprint<Sc: Score> {
    pub(crate) def: NodeDef<Sc>,
    pub(crate) parents: SmallVec<[NodeId; 2]>,
    pub(crate) cardinality: usize,
}

impl<Sc: Score> Clone for NodeBlueprint<Sc> {
    fn clone(&self) -> Self {
        Self {
            def: self.def.clone(),
            parents: self.parents.clone(),
            cardinality: self.cardinality,
        }
    }
}
