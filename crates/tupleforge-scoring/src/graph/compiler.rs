//! Plan compiler.
//!
//! Turns builder blueprints into an [`ExecutionPlan`]: validates the graph,
//! merges shareable nodes, links children, assigns layers and derives one
//! [`PlanTree`] per constraint.
//!
//! Plan ids are the builder's ids. A merged node keeps its slot as an alias
//! of the node it was merged into, so every id handed out by the builder
//! stays valid for lookups.

use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::fmt;

use smallvec::SmallVec;
use tracing::debug;
use tupleforge_core::{BuildError, ConstraintRef, Score};

use super::{ConstraintDef, InputSide, NodeBlueprint, NodeDef, NodeId, NodeType};
use crate::api::ConstraintWeightOverrides;

/// A validated node with its links resolved.
pub(crate) struct PlanNode<Sc: Score> {
    pub(crate) def: NodeDef<Sc>,
    pub(crate) parents: SmallVec<[NodeId; 2]>,
    pub(crate) children: Vec<(NodeId, InputSide)>,
    pub(crate) layer: usize,
    pub(crate) cardinality: usize,
    /// Set when this node was merged into an identical earlier node. An
    /// alias has no children and never receives deltas.
    pub(crate) shared_with: Option<NodeId>,
}

impl<Sc: Score> PlanNode<Sc> {
    pub(crate) fn node_type(&self) -> NodeType {
        self.def.node_type()
    }

    fn label(&self) -> String {
        match &self.def {
            NodeDef::From { type_name, .. } => format!("From({})", short_name(type_name)),
            NodeDef::Exists { candidate, .. } => {
                format!("{}({})", self.node_type(), short_name(candidate.name))
            }
            NodeDef::Terminal(c) => format!("Terminal({})", c.constraint_ref.full_name()),
            _ => self.node_type().to_string(),
        }
    }
}

fn short_name(name: &str) -> &str {
    // Generic parameters can contain `::`, so split before them.
    let head = name.split('<').next().unwrap_or(name);
    let start = head.rfind("::").map_or(0, |i| i + 2);
    &name[start..]
}

/// Per-constraint view of the plan: join chunks combine two subtrees,
/// sequential chunks chain unary nodes onto one input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanTree {
    Source {
        node: NodeId,
        label: String,
    },
    Sequential {
        input: Box<PlanTree>,
        nodes: Vec<(NodeId, String)>,
    },
    Join {
        node: NodeId,
        label: String,
        left: Box<PlanTree>,
        right: Box<PlanTree>,
    },
}

impl PlanTree {
    /// The node whose output this tree describes.
    pub fn root(&self) -> NodeId {
        match self {
            PlanTree::Source { node, .. } | PlanTree::Join { node, .. } => *node,
            PlanTree::Sequential { input, nodes } => {
                nodes.last().map_or_else(|| input.root(), |(id, _)| *id)
            }
        }
    }

    /// Number of join chunks in the tree.
    pub fn join_count(&self) -> usize {
        match self {
            PlanTree::Source { .. } => 0,
            PlanTree::Sequential { input, .. } => input.join_count(),
            PlanTree::Join { left, right, .. } => 1 + left.join_count() + right.join_count(),
        }
    }

    fn write_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let pad = "  ".repeat(depth);
        match self {
            PlanTree::Source { node, label } => writeln!(f, "{}{} {}", pad, node, label),
            PlanTree::Sequential { input, nodes } => {
                input.write_indented(f, depth)?;
                for (id, label) in nodes {
                    writeln!(f, "{}-> {} {}", pad, id, label)?;
                }
                Ok(())
            }
            PlanTree::Join {
                node,
                label,
                left,
                right,
            } => {
                writeln!(f, "{}{} {}", pad, node, label)?;
                right.write_indented(f, depth + 1)?;
                left.write_indented(f, depth + 1)
            }
        }
    }
}

impl fmt::Display for PlanTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_indented(f, 0)
    }
}

/// A compiled, immutable constraint graph.
pub struct ExecutionPlan<Sc: Score> {
    pub(crate) nodes: Vec<PlanNode<Sc>>,
    pub(crate) sources: HashMap<TypeId, SmallVec<[NodeId; 2]>>,
    pub(crate) group_layers: Vec<Vec<NodeId>>,
    /// Terminal node of each constraint, in definition order.
    pub(crate) terminals: Vec<NodeId>,
    trees: Vec<PlanTree>,
    order: Vec<NodeId>,
}

impl<Sc: Score> ExecutionPlan<Sc> {
    /// Number of executing nodes, not counting merged aliases.
    pub fn node_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.shared_with.is_none()).count()
    }

    pub fn layer_count(&self) -> usize {
        self.group_layers.len()
    }

    /// The node that executes for `node`: itself, or the node it was
    /// merged into.
    pub fn resolve(&self, node: NodeId) -> Option<NodeId> {
        let plan_node = self.nodes.get(node.0)?;
        Some(plan_node.shared_with.unwrap_or(node))
    }

    pub fn node_type(&self, node: NodeId) -> Option<NodeType> {
        self.node(node).map(PlanNode::node_type)
    }

    pub fn layer(&self, node: NodeId) -> Option<usize> {
        self.node(node).map(|n| n.layer)
    }

    pub fn cardinality(&self, node: NodeId) -> Option<usize> {
        self.node(node).map(|n| n.cardinality)
    }

    fn node(&self, node: NodeId) -> Option<&PlanNode<Sc>> {
        self.resolve(node).and_then(|id| self.nodes.get(id.0))
    }

    /// Nodes in execution order: parents before children, and a join's
    /// right input before its left input.
    pub fn node_order(&self) -> &[NodeId] {
        &self.order
    }

    /// Source nodes fed by facts of `fact_type`.
    pub fn source_nodes(&self, fact_type: TypeId) -> &[NodeId] {
        self.sources.get(&fact_type).map_or(&[], |s| s.as_slice())
    }

    pub fn constraint_count(&self) -> usize {
        self.terminals.len()
    }

    pub fn constraint_refs(&self) -> impl Iterator<Item = &ConstraintRef> {
        self.terminals
            .iter()
            .filter_map(|t| self.constraint(*t).map(|c| &c.constraint_ref))
    }

    /// Finds a constraint by full name, or by short name.
    pub fn constraint_index(&self, name: &str) -> Option<usize> {
        let refs: Vec<&ConstraintRef> = self.constraint_refs().collect();
        refs.iter()
            .position(|r| r.full_name() == name)
            .or_else(|| refs.iter().position(|r| r.name == name))
    }

    pub fn plan_tree(&self, name: &str) -> Option<&PlanTree> {
        self.constraint_index(name).map(|i| &self.trees[i])
    }

    pub(crate) fn constraint(&self, terminal: NodeId) -> Option<&ConstraintDef<Sc>> {
        match &self.nodes.get(terminal.0)?.def {
            NodeDef::Terminal(c) => Some(c),
            _ => None,
        }
    }

    pub(crate) fn constraint_at(&self, index: usize) -> Option<&ConstraintDef<Sc>> {
        self.terminals.get(index).and_then(|t| self.constraint(*t))
    }
}

impl<Sc: Score> fmt::Debug for ExecutionPlan<Sc> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionPlan")
            .field("nodes", &self.node_count())
            .field("layers", &self.group_layers.len())
            .field("constraints", &self.terminals.len())
            .finish()
    }
}

impl<Sc: Score> fmt::Display for ExecutionPlan<Sc> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "ExecutionPlan: {} nodes in {} layers, {} constraints",
            self.node_count(),
            self.group_layers.len(),
            self.terminals.len()
        )?;
        for id in &self.order {
            let node = &self.nodes[id.0];
            let children: Vec<String> = node.children.iter().map(|(c, _)| c.to_string()).collect();
            writeln!(
                f,
                "  [{}] {} {} -> [{}]",
                node.layer,
                id,
                node.label(),
                children.join(", ")
            )?;
        }
        for (i, tree) in self.trees.iter().enumerate() {
            if let Some(c) = self.constraint_at(i) {
                writeln!(f, "constraint {}:", c.constraint_ref)?;
            }
            write!(f, "{}", tree)?;
        }
        Ok(())
    }
}

pub(crate) fn compile<Sc: Score>(
    blueprints: &[NodeBlueprint<Sc>],
    node_sharing: bool,
    overrides: &ConstraintWeightOverrides<Sc>,
) -> Result<ExecutionPlan<Sc>, BuildError> {
    validate(blueprints)?;

    // Merge shareable nodes. Parents always precede children, so one pass
    // in creation order sees every parent's canonical id first.
    let mut canonical: Vec<NodeId> = Vec::with_capacity(blueprints.len());
    let mut nodes: Vec<PlanNode<Sc>> = Vec::with_capacity(blueprints.len());
    let mut shared_sources: HashMap<TypeId, NodeId> = HashMap::new();
    let mut shared_distinct: HashMap<NodeId, NodeId> = HashMap::new();

    for bp in blueprints {
        let id = NodeId(nodes.len());
        let parents: SmallVec<[NodeId; 2]> = bp.parents.iter().map(|p| canonical[p.0]).collect();
        let existing = match &bp.def {
            NodeDef::From { fact_type, .. } if node_sharing => {
                shared_sources.get(fact_type).copied()
            }
            NodeDef::Distinct if node_sharing => shared_distinct.get(&parents[0]).copied(),
            _ => None,
        };
        if let Some(target) = existing {
            let layer = nodes[target.0].layer;
            canonical.push(target);
            nodes.push(PlanNode {
                def: bp.def.clone(),
                parents,
                children: Vec::new(),
                layer,
                cardinality: bp.cardinality,
                shared_with: Some(target),
            });
            continue;
        }

        let layer = parents
            .iter()
            .map(|p| nodes[p.0].layer + 1)
            .max()
            .unwrap_or(0);
        let mut def = bp.def.clone();
        match &mut def {
            NodeDef::From { fact_type, .. } => {
                shared_sources.insert(*fact_type, id);
            }
            NodeDef::Distinct => {
                shared_distinct.insert(parents[0], id);
            }
            NodeDef::Terminal(c) => {
                let name = c.constraint_ref.full_name();
                let weight = overrides
                    .get(&name)
                    .or_else(|| overrides.get(&c.constraint_ref.name));
                if let Some(w) = weight {
                    c.weight = *w;
                }
            }
            _ => {}
        }
        for (i, parent) in parents.iter().enumerate() {
            let side = if i == 0 {
                InputSide::Left
            } else {
                InputSide::Right
            };
            nodes[parent.0].children.push((id, side));
        }
        canonical.push(id);
        nodes.push(PlanNode {
            def,
            parents,
            children: Vec::new(),
            layer,
            cardinality: bp.cardinality,
            shared_with: None,
        });
    }

    let layer_count = nodes.iter().map(|n| n.layer + 1).max().unwrap_or(0);
    let mut group_layers = vec![Vec::new(); layer_count];
    let mut sources: HashMap<TypeId, SmallVec<[NodeId; 2]>> = HashMap::new();
    let mut terminals = Vec::new();
    for (i, node) in nodes.iter().enumerate() {
        if node.shared_with.is_some() {
            continue;
        }
        match &node.def {
            NodeDef::From { fact_type, .. } => {
                sources.entry(*fact_type).or_default().push(NodeId(i))
            }
            NodeDef::Group { .. } => group_layers[node.layer].push(NodeId(i)),
            NodeDef::Terminal(_) => terminals.push(NodeId(i)),
            _ => {}
        }
    }

    let live = nodes.iter().filter(|n| n.shared_with.is_none()).count();
    let mut order = Vec::with_capacity(live);
    let mut visited = HashSet::new();
    for terminal in &terminals {
        post_order(&nodes, *terminal, &mut visited, &mut order);
    }

    let trees = terminals.iter().map(|t| plan_tree(&nodes, *t)).collect();

    debug!(
        event = "plan_compiled",
        nodes = live,
        shared = blueprints.len() - live,
        layers = layer_count,
        constraints = terminals.len(),
    );

    Ok(ExecutionPlan {
        nodes,
        sources,
        group_layers,
        terminals,
        trees,
        order,
    })
}

fn validate<Sc: Score>(blueprints: &[NodeBlueprint<Sc>]) -> Result<(), BuildError> {
    let mut names = HashSet::new();
    let mut children: Vec<Vec<usize>> = vec![Vec::new(); blueprints.len()];

    for (i, bp) in blueprints.iter().enumerate() {
        let node_type = bp.def.node_type();
        let expected_parents = match node_type {
            NodeType::From => 0,
            t if t.is_binary() => 2,
            _ => 1,
        };
        if bp.parents.len() != expected_parents || bp.parents.iter().any(|p| p.0 >= i) {
            return Err(BuildError::MissingSource {
                node: i,
                node_type: node_type.to_string(),
            });
        }
        for parent in &bp.parents {
            children[parent.0].push(i);
        }

        match &bp.def {
            NodeDef::Join(_) | NodeDef::Exists { .. } => {
                let left = blueprints[bp.parents[0].0].cardinality;
                let right = blueprints[bp.parents[1].0].cardinality;
                if left < right {
                    return Err(BuildError::JoinCardinality { left, right });
                }
            }
            _ => {}
        }

        if let NodeDef::Exists {
            candidate,
            joiner_types,
            ..
        } = &bp.def
        {
            if let Some(actual) = joiner_types
                .iter()
                .flatten()
                .find(|t| t.id != candidate.id)
            {
                return Err(BuildError::ExistsTypeMismatch {
                    expected: candidate.name.to_string(),
                    actual: actual.name.to_string(),
                });
            }
        }

        if let NodeDef::Terminal(c) = &bp.def {
            let name = c.constraint_ref.full_name();
            if !names.insert(name.clone()) {
                return Err(BuildError::DuplicateConstraint(name));
            }
        }
    }

    // Every node must reach a terminal.
    let mut reaches = vec![false; blueprints.len()];
    for i in (0..blueprints.len()).rev() {
        reaches[i] = matches!(blueprints[i].def, NodeDef::Terminal(_))
            || children[i].iter().any(|c| reaches[*c]);
    }
    if let Some(i) = reaches.iter().position(|r| !r) {
        return Err(BuildError::UnterminatedStream {
            node: i,
            node_type: blueprints[i].def.node_type().to_string(),
        });
    }
    Ok(())
}

fn post_order<Sc: Score>(
    nodes: &[PlanNode<Sc>],
    node: NodeId,
    visited: &mut HashSet<NodeId>,
    order: &mut Vec<NodeId>,
) {
    if !visited.insert(node) {
        return;
    }
    // Right parent first.
    for parent in nodes[node.0].parents.iter().rev() {
        post_order(nodes, *parent, visited, order);
    }
    order.push(node);
}

fn plan_tree<Sc: Score>(nodes: &[PlanNode<Sc>], node: NodeId) -> PlanTree {
    let plan_node = &nodes[node.0];
    let label = plan_node.label();
    match plan_node.parents.as_slice() {
        [] => PlanTree::Source { node, label },
        [left, right] => PlanTree::Join {
            node,
            label,
            left: Box::new(plan_tree(nodes, *left)),
            right: Box::new(plan_tree(nodes, *right)),
        },
        [parent, ..] => match plan_tree(nodes, *parent) {
            PlanTree::Sequential { input, mut nodes } => {
                nodes.push((node, label));
                PlanTree::Sequential { input, nodes }
            }
            input => PlanTree::Sequential {
                input: Box::new(input),
                nodes: vec![(node, label)],
            },
        },
    }
}
