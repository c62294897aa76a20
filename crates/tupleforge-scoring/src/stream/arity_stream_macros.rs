//! Macros for generating arity-specific constraint streams.
//!
//! These macros reduce code duplication across Uni/Bi/Tri/Quad streams,
//! which all follow the same pattern with different tuple sizes. Joins and
//! `flatten_last` change the element list and are defined in the individual
//! stream files.

/// Generates the stream struct and the operations every arity shares.
macro_rules! impl_arity_stream {
    ($stream:ident, $doc:literal, ($($t:ident),+)) => {
        #[doc = $doc]
        ///
        /// Cloning the handle does not copy the node: every constraint built
        /// from a clone shares it.
        pub struct $stream<Sc: tupleforge_core::Score, $($t),+> {
            pub(crate) factory: $crate::stream::ConstraintFactory<Sc>,
            pub(crate) node: $crate::graph::NodeId,
            _phantom: std::marker::PhantomData<fn() -> ($($t,)+)>,
        }

        impl<Sc: tupleforge_core::Score, $($t),+> Clone for $stream<Sc, $($t),+> {
            fn clone(&self) -> Self {
                Self {
                    factory: self.factory.clone(),
                    node: self.node,
                    _phantom: std::marker::PhantomData,
                }
            }
        }

        impl<Sc: tupleforge_core::Score, $($t),+> std::fmt::Debug for $stream<Sc, $($t),+> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($stream))
                    .field("node", &self.node)
                    .finish()
            }
        }

        impl<Sc: tupleforge_core::Score, $($t: 'static),+> $stream<Sc, $($t),+> {
            pub(crate) fn new(
                factory: $crate::stream::ConstraintFactory<Sc>,
                node: $crate::graph::NodeId,
            ) -> Self {
                Self {
                    factory,
                    node,
                    _phantom: std::marker::PhantomData,
                }
            }

            /// The graph node producing this stream's tuples.
            pub fn node(&self) -> $crate::graph::NodeId {
                self.node
            }

            pub fn filter<P>(self, predicate: P) -> Self
            where
                P: $crate::function::TupleFn<($($t,)+), Output = bool>,
            {
                let parent = self.node;
                let node = self.factory.add(|g| {
                    g.filter(
                        parent,
                        std::sync::Arc::new(move |t: &$crate::tuple::Tuple| predicate.call(t)),
                    )
                });
                Self::new(self.factory, node)
            }

            /// Keeps tuples for which a fact of type `E` matching `joiner`
            /// exists.
            pub fn if_exists<E: tupleforge_core::Fact>(
                self,
                joiner: impl $crate::stream::joiner::Joiner<($($t,)+), E>,
            ) -> Self {
                let other = self.factory.for_each::<E>();
                self.exists_node(other, true, joiner)
            }

            /// Keeps tuples for which no fact of type `E` matching `joiner`
            /// exists.
            pub fn if_not_exists<E: tupleforge_core::Fact>(
                self,
                joiner: impl $crate::stream::joiner::Joiner<($($t,)+), E>,
            ) -> Self {
                let other = self.factory.for_each::<E>();
                self.exists_node(other, false, joiner)
            }

            /// Like [`if_exists`](Self::if_exists), with candidates taken
            /// from `other`.
            pub fn if_exists_in<E: 'static>(
                self,
                other: $crate::stream::UniStream<Sc, E>,
                joiner: impl $crate::stream::joiner::Joiner<($($t,)+), E>,
            ) -> Self {
                self.exists_node(other, true, joiner)
            }

            pub fn if_not_exists_in<E: 'static>(
                self,
                other: $crate::stream::UniStream<Sc, E>,
                joiner: impl $crate::stream::joiner::Joiner<($($t,)+), E>,
            ) -> Self {
                self.exists_node(other, false, joiner)
            }

            fn exists_node<E: 'static>(
                self,
                other: $crate::stream::UniStream<Sc, E>,
                should_exist: bool,
                joiner: impl $crate::stream::joiner::Joiner<($($t,)+), E>,
            ) -> Self {
                let defs = $crate::stream::joiner::into_defs(joiner);
                let (left, right) = (self.node, other.node);
                let candidate = $crate::index::RightType::of::<E>();
                let node = self
                    .factory
                    .add(|g| g.exists(left, right, should_exist, candidate, defs));
                Self::new(self.factory, node)
            }

            /// Groups tuples by zero to three keys and aggregates each group
            /// with zero to four collectors.
            ///
            /// Both arguments are tuples; the output stream carries
            /// `(keys..., results...)`, one tuple per non-empty group.
            pub fn group_by<GK, GC>(
                self,
                keys: GK,
                collectors: GC,
            ) -> <(GK::Keys, GC::Results) as $crate::stream::GroupShape<Sc>>::Stream
            where
                GK: $crate::stream::GroupKeys<($($t,)+)>,
                GC: $crate::stream::GroupCollectors<($($t,)+)>,
                (GK::Keys, GC::Results): $crate::stream::GroupShape<Sc>,
            {
                let parent = self.node;
                let key_fns = keys.into_key_fns();
                let collector_fns = collectors.into_collector_fns();
                let node = self.factory.add(|g| g.group(parent, key_fns, collector_fns));
                <(GK::Keys, GC::Results) as $crate::stream::GroupShape<Sc>>::stream(
                    self.factory,
                    node,
                )
            }

            pub fn map<F1>(
                self,
                f1: F1,
            ) -> $crate::stream::UniStream<
                Sc,
                <F1 as $crate::function::TupleFn<($($t,)+)>>::Output,
            >
            where
                F1: $crate::function::TupleFn<($($t,)+)>,
                F1::Output: tupleforge_core::ValueType,
            {
                let mappings = vec![$crate::stream::group::key_fn(f1)];
                let node = self.map_node(mappings);
                $crate::stream::UniStream::new(self.factory, node)
            }

            pub fn map2<F1, F2>(
                self,
                f1: F1,
                f2: F2,
            ) -> $crate::stream::BiStream<
                Sc,
                <F1 as $crate::function::TupleFn<($($t,)+)>>::Output,
                <F2 as $crate::function::TupleFn<($($t,)+)>>::Output,
            >
            where
                F1: $crate::function::TupleFn<($($t,)+)>,
                F2: $crate::function::TupleFn<($($t,)+)>,
                F1::Output: tupleforge_core::ValueType,
                F2::Output: tupleforge_core::ValueType,
            {
                let mappings = vec![
                    $crate::stream::group::key_fn(f1),
                    $crate::stream::group::key_fn(f2),
                ];
                let node = self.map_node(mappings);
                $crate::stream::BiStream::new(self.factory, node)
            }

            pub fn map3<F1, F2, F3>(
                self,
                f1: F1,
                f2: F2,
                f3: F3,
            ) -> $crate::stream::TriStream<
                Sc,
                <F1 as $crate::function::TupleFn<($($t,)+)>>::Output,
                <F2 as $crate::function::TupleFn<($($t,)+)>>::Output,
                <F3 as $crate::function::TupleFn<($($t,)+)>>::Output,
            >
            where
                F1: $crate::function::TupleFn<($($t,)+)>,
                F2: $crate::function::TupleFn<($($t,)+)>,
                F3: $crate::function::TupleFn<($($t,)+)>,
                F1::Output: tupleforge_core::ValueType,
                F2::Output: tupleforge_core::ValueType,
                F3::Output: tupleforge_core::ValueType,
            {
                let mappings = vec![
                    $crate::stream::group::key_fn(f1),
                    $crate::stream::group::key_fn(f2),
                    $crate::stream::group::key_fn(f3),
                ];
                let node = self.map_node(mappings);
                $crate::stream::TriStream::new(self.factory, node)
            }

            pub fn map4<F1, F2, F3, F4>(
                self,
                f1: F1,
                f2: F2,
                f3: F3,
                f4: F4,
            ) -> $crate::stream::QuadStream<
                Sc,
                <F1 as $crate::function::TupleFn<($($t,)+)>>::Output,
                <F2 as $crate::function::TupleFn<($($t,)+)>>::Output,
                <F3 as $crate::function::TupleFn<($($t,)+)>>::Output,
                <F4 as $crate::function::TupleFn<($($t,)+)>>::Output,
            >
            where
                F1: $crate::function::TupleFn<($($t,)+)>,
                F2: $crate::function::TupleFn<($($t,)+)>,
                F3: $crate::function::TupleFn<($($t,)+)>,
                F4: $crate::function::TupleFn<($($t,)+)>,
                F1::Output: tupleforge_core::ValueType,
                F2::Output: tupleforge_core::ValueType,
                F3::Output: tupleforge_core::ValueType,
                F4::Output: tupleforge_core::ValueType,
            {
                let mappings = vec![
                    $crate::stream::group::key_fn(f1),
                    $crate::stream::group::key_fn(f2),
                    $crate::stream::group::key_fn(f3),
                    $crate::stream::group::key_fn(f4),
                ];
                let node = self.map_node(mappings);
                $crate::stream::QuadStream::new(self.factory, node)
            }

            fn map_node(&self, mappings: Vec<$crate::index::KeyFn>) -> $crate::graph::NodeId {
                let parent = self.node;
                self.factory.add(|g| g.map(parent, mappings))
            }

            /// Collapses structurally equal tuples into one.
            pub fn distinct(self) -> Self {
                let parent = self.node;
                let node = self.factory.add(|g| g.distinct(parent));
                Self::new(self.factory, node)
            }

            /// Penalizes each match by `weight`.
            pub fn penalize(
                self,
                weight: Sc,
            ) -> $crate::stream::ConstraintBuilder<Sc, ($($t,)+)> {
                self.scored(tupleforge_core::ImpactType::Penalty, weight, None)
            }

            /// Penalizes each match by `weight` times its match weight.
            pub fn penalize_with<W>(
                self,
                weight: Sc,
                match_weight: W,
            ) -> $crate::stream::ConstraintBuilder<Sc, ($($t,)+)>
            where
                W: $crate::function::TupleFn<($($t,)+)>,
                W::Output: Into<tupleforge_core::MatchWeight>,
            {
                let f = $crate::stream::constraint_builder::match_weight_fn(match_weight);
                self.scored(tupleforge_core::ImpactType::Penalty, weight, Some(f))
            }

            pub fn reward(
                self,
                weight: Sc,
            ) -> $crate::stream::ConstraintBuilder<Sc, ($($t,)+)> {
                self.scored(tupleforge_core::ImpactType::Reward, weight, None)
            }

            pub fn reward_with<W>(
                self,
                weight: Sc,
                match_weight: W,
            ) -> $crate::stream::ConstraintBuilder<Sc, ($($t,)+)>
            where
                W: $crate::function::TupleFn<($($t,)+)>,
                W::Output: Into<tupleforge_core::MatchWeight>,
            {
                let f = $crate::stream::constraint_builder::match_weight_fn(match_weight);
                self.scored(tupleforge_core::ImpactType::Reward, weight, Some(f))
            }

            /// Adds `weight` times the signed match weight; negative match
            /// weights are allowed.
            pub fn impact(
                self,
                weight: Sc,
            ) -> $crate::stream::ConstraintBuilder<Sc, ($($t,)+)> {
                self.scored(tupleforge_core::ImpactType::Mixed, weight, None)
            }

            pub fn impact_with<W>(
                self,
                weight: Sc,
                match_weight: W,
            ) -> $crate::stream::ConstraintBuilder<Sc, ($($t,)+)>
            where
                W: $crate::function::TupleFn<($($t,)+)>,
                W::Output: Into<tupleforge_core::MatchWeight>,
            {
                let f = $crate::stream::constraint_builder::match_weight_fn(match_weight);
                self.scored(tupleforge_core::ImpactType::Mixed, weight, Some(f))
            }

            fn scored(
                self,
                impact_type: tupleforge_core::ImpactType,
                weight: Sc,
                match_weight: Option<$crate::graph::MatchWeightFn>,
            ) -> $crate::stream::ConstraintBuilder<Sc, ($($t,)+)> {
                $crate::stream::ConstraintBuilder::new(
                    self.factory,
                    self.node,
                    impact_type,
                    weight,
                    match_weight,
                )
            }
        }
    };
}
