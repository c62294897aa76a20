// Terminal step of a constraint stream.

use std::marker::PhantomData;
use std::sync::Arc;

use tupleforge_core::{ConstraintRef, ImpactType, MatchWeight, Score, Value};

use super::ConstraintFactory;
use crate::api::ConstraintJustification;
use crate::function::TupleFn;
use crate::graph::{ConstraintDef, IndictFn, JustifyFn, MatchWeightFn, NodeId};
use crate::tuple::Tuple;

pub(crate) fn match_weight_fn<L, W>(f: W) -> MatchWeightFn
where
    W: TupleFn<L>,
    W::Output: Into<MatchWeight>,
{
    Arc::new(move |t: &Tuple| f.call(t).into())
}

/// A scored stream waiting for its constraint name.
///
/// Created by `penalize`, `reward` or `impact` on a stream whose tuples have
/// element types `L`. Nothing is added to the graph until
/// [`as_constraint`](Self::as_constraint).
pub struct ConstraintBuilder<Sc: Score, L> {
    factory: ConstraintFactory<Sc>,
    node: NodeId,
    impact_type: ImpactType,
    weight: Sc,
    match_weight: Option<MatchWeightFn>,
    justify: Option<JustifyFn>,
    indict: Option<IndictFn>,
    _phantom: PhantomData<fn() -> L>,
}

impl<Sc: Score, L: 'static> ConstraintBuilder<Sc, L> {
    pub(crate) fn new(
        factory: ConstraintFactory<Sc>,
        node: NodeId,
        impact_type: ImpactType,
        weight: Sc,
        match_weight: Option<MatchWeightFn>,
    ) -> Self {
        Self {
            factory,
            node,
            impact_type,
            weight,
            match_weight,
            justify: None,
            indict: None,
            _phantom: PhantomData,
        }
    }

    /// Replaces the default justification (the matched values).
    pub fn justify_with<J>(mut self, f: J) -> Self
    where
        J: TupleFn<L, Output = ConstraintJustification>,
    {
        self.justify = Some(Arc::new(move |t: &Tuple| f.call(t)));
        self
    }

    /// Replaces the default indicted objects (the matched values).
    pub fn indict_with<I>(mut self, f: I) -> Self
    where
        I: TupleFn<L, Output = Vec<Value>>,
    {
        self.indict = Some(Arc::new(move |t: &Tuple| f.call(t)));
        self
    }

    /// Finishes the constraint under `name` with no package.
    pub fn as_constraint(self, name: &str) -> ConstraintRef {
        self.as_constraint_in("", name)
    }

    pub fn as_constraint_in(self, package: &str, name: &str) -> ConstraintRef {
        let constraint_ref = ConstraintRef::new(package, name);
        let mut def = ConstraintDef::new(constraint_ref.clone(), self.impact_type, self.weight);
        def.match_weight = self.match_weight;
        def.justify = self.justify;
        def.indict = self.indict;
        let parent = self.node;
        self.factory.add(|g| g.terminal(parent, def));
        constraint_ref
    }
}
