// Constraint stream handles.

use std::fmt;

use rust_decimal::Decimal;
use streamforge_core::{ImpactType, Score, StreamForgeError};

use super::collector::{Collector, GroupCollector};
use super::joiner::{CompiledJoiners, DynPairPredicate, Joiner};
use super::{mapping, ConstraintBuilder, ConstraintFactory, Mapper};
use crate::api::weight::ConstraintWeight;
use crate::fact::{Fact, FactValue};
use crate::graph::{NodeId, NodeKind, Port};
use crate::tuple::Tuple;

/// Maximum number of group keys in one `group_by`.
const MAX_GROUP_KEYS: usize = 3;

/// A stream of tuples of one fixed arity.
///
/// A lightweight handle onto a node of the factory's graph: copying it and
/// deriving several streams from it fans the node out to several children.
#[derive(Clone, Copy)]
pub struct ConstraintStream<'f, Sc: Score> {
    factory: &'f ConstraintFactory<Sc>,
    node: NodeId,
    arity: usize,
}

impl<'f, Sc: Score> ConstraintStream<'f, Sc> {
    pub(crate) fn new(factory: &'f ConstraintFactory<Sc>, node: NodeId, arity: usize) -> Self {
        Self {
            factory,
            node,
            arity,
        }
    }

    /// Number of facts in every tuple of this stream.
    pub fn arity(&self) -> usize {
        self.arity
    }

    fn derive(&self, kind: NodeKind, arity: usize, parents: &[(NodeId, Port)]) -> Self {
        let node = self.factory.graph.borrow_mut().add(kind, arity, parents);
        Self::new(self.factory, node, arity)
    }

    fn reject(&self, error: StreamForgeError) {
        self.factory.graph.borrow_mut().reject(error);
    }

    fn check_arity(&self, operation: &'static str, arity: usize) {
        self.factory.graph.borrow_mut().check_arity(operation, arity);
    }

    fn compile(&self, joiners: impl IntoIterator<Item = Joiner>) -> CompiledJoiners {
        match CompiledJoiners::compile(joiners) {
            Ok(compiled) => compiled,
            Err(e) => {
                self.reject(e);
                CompiledJoiners::cartesian()
            }
        }
    }

    /// Keeps tuples for which `predicate` holds.
    pub fn filter<P>(self, predicate: P) -> Self
    where
        P: Fn(&Tuple) -> bool + Send + Sync + 'static,
    {
        self.derive(
            NodeKind::Filter(Box::new(predicate)),
            self.arity,
            &[(self.node, Port::Left)],
        )
    }

    /// Joins every tuple with every matching fact of a uni stream.
    ///
    /// The result tuples are this stream's facts followed by the right fact.
    pub fn join(self, other: ConstraintStream<'f, Sc>, joiners: impl IntoIterator<Item = Joiner>) -> Self {
        self.join_filtered(other, joiners, None)
    }

    pub(crate) fn join_filtered(
        self,
        other: ConstraintStream<'f, Sc>,
        joiners: impl IntoIterator<Item = Joiner>,
        extra: Option<DynPairPredicate>,
    ) -> Self {
        let foreign = !std::ptr::eq(self.factory, other.factory);
        if foreign {
            self.reject(StreamForgeError::Config(
                "cannot join streams of different factories".to_string(),
            ));
        }
        if other.arity != 1 {
            self.reject(StreamForgeError::Config(format!(
                "the right side of a join must have arity 1, got {}",
                other.arity
            )));
        }
        let arity = self.arity + 1;
        self.check_arity("join", arity);
        let mut joiners = self.compile(joiners);
        if let Some(predicate) = extra {
            joiners = joiners.and_filter(predicate);
        }
        if foreign {
            // The other stream's node id means nothing in this graph.
            return self.derive(NodeKind::Join(joiners), arity, &[(self.node, Port::Left)]);
        }
        self.derive(
            NodeKind::Join(joiners),
            arity,
            &[(self.node, Port::Left), (other.node, Port::Right)],
        )
    }

    /// Joins with `for_each::<T>()`.
    pub fn join_each<T: FactValue>(self, joiners: impl IntoIterator<Item = Joiner>) -> Self {
        let other = self.factory.for_each::<T>();
        self.join(other, joiners)
    }

    fn exists<T: FactValue>(
        self,
        should_exist: bool,
        include_unassigned: bool,
        joiners: impl IntoIterator<Item = Joiner>,
    ) -> Self {
        self.exists_filtered::<T>(should_exist, include_unassigned, joiners, None)
    }

    fn exists_filtered<T: FactValue>(
        self,
        should_exist: bool,
        include_unassigned: bool,
        joiners: impl IntoIterator<Item = Joiner>,
        extra: Option<DynPairPredicate>,
    ) -> Self {
        let right = self.factory.source::<T>(include_unassigned);
        let mut joiners = self.compile(joiners);
        if let Some(predicate) = extra {
            joiners = joiners.and_filter(predicate);
        }
        self.derive(
            NodeKind::Exists {
                joiners,
                should_exist,
            },
            self.arity,
            &[(self.node, Port::Left), (right, Port::Right)],
        )
    }

    /// Exists check of a uni stream against other facts of its own class.
    fn exists_other<T: FactValue>(
        self,
        should_exist: bool,
        include_unassigned: bool,
        joiners: impl IntoIterator<Item = Joiner>,
    ) -> Self {
        if self.arity != 1 {
            self.reject(StreamForgeError::Config(format!(
                "exists against other facts needs a uni stream, got arity {}",
                self.arity
            )));
        }
        let not_itself: DynPairPredicate = Box::new(|l: &Tuple, r: &Tuple| l.fact(0) != r.fact(0));
        self.exists_filtered::<T>(should_exist, include_unassigned, joiners, Some(not_itself))
    }

    /// Keeps tuples matched by at least one assigned fact of type `T`.
    pub fn if_exists<T: FactValue>(self, joiners: impl IntoIterator<Item = Joiner>) -> Self {
        self.exists::<T>(true, false, joiners)
    }

    /// Keeps tuples matched by no assigned fact of type `T`.
    pub fn if_not_exists<T: FactValue>(self, joiners: impl IntoIterator<Item = Joiner>) -> Self {
        self.exists::<T>(false, false, joiners)
    }

    /// Like [`if_exists`](Self::if_exists), counting unassigned facts too.
    pub fn if_exists_including_unassigned<T: FactValue>(
        self,
        joiners: impl IntoIterator<Item = Joiner>,
    ) -> Self {
        self.exists::<T>(true, true, joiners)
    }

    /// Like [`if_not_exists`](Self::if_not_exists), counting unassigned facts too.
    pub fn if_not_exists_including_unassigned<T: FactValue>(
        self,
        joiners: impl IntoIterator<Item = Joiner>,
    ) -> Self {
        self.exists::<T>(false, true, joiners)
    }

    /// Keeps facts matched by at least one other assigned fact of type `T`.
    ///
    /// A fact never matches itself. Only valid on uni streams.
    pub fn if_exists_other<T: FactValue>(self, joiners: impl IntoIterator<Item = Joiner>) -> Self {
        self.exists_other::<T>(true, false, joiners)
    }

    /// Keeps facts matched by no other assigned fact of type `T`.
    pub fn if_not_exists_other<T: FactValue>(self, joiners: impl IntoIterator<Item = Joiner>) -> Self {
        self.exists_other::<T>(false, false, joiners)
    }

    /// Like [`if_exists_other`](Self::if_exists_other), counting unassigned facts too.
    pub fn if_exists_other_including_unassigned<T: FactValue>(
        self,
        joiners: impl IntoIterator<Item = Joiner>,
    ) -> Self {
        self.exists_other::<T>(true, true, joiners)
    }

    /// Like [`if_not_exists_other`](Self::if_not_exists_other), counting unassigned facts too.
    pub fn if_not_exists_other_including_unassigned<T: FactValue>(
        self,
        joiners: impl IntoIterator<Item = Joiner>,
    ) -> Self {
        self.exists_other::<T>(false, true, joiners)
    }

    /// Groups tuples by up to three keys and aggregates each group.
    ///
    /// Result tuples hold the key facts followed by one fact per collector.
    /// With no collectors the result is the distinct key combinations.
    pub fn group_by(
        self,
        keys: impl IntoIterator<Item = Mapper>,
        collectors: impl IntoIterator<Item = GroupCollector>,
    ) -> Self {
        let keys: Vec<_> = keys.into_iter().map(|m| m.0).collect();
        let mut collectors: Vec<GroupCollector> = collectors.into_iter().collect();
        if keys.len() > MAX_GROUP_KEYS {
            self.reject(StreamForgeError::Config(format!(
                "group_by supports at most {} keys, got {}",
                MAX_GROUP_KEYS,
                keys.len()
            )));
        }
        if keys.is_empty() && collectors.is_empty() {
            self.reject(StreamForgeError::Config(
                "group_by needs at least one key or one collector".to_string(),
            ));
        }
        if collectors.is_empty() {
            collectors.push(GroupCollector::noop());
        }
        let arity = keys.len() + collectors.iter().filter(|c| c.produces_result()).count();
        self.check_arity("group_by", arity);
        self.derive(
            NodeKind::Group { keys, collectors },
            arity,
            &[(self.node, Port::Left)],
        )
    }

    /// Distinct values of one key.
    pub fn group_by_key<K, F>(self, key: F) -> Self
    where
        K: FactValue,
        F: Fn(&Tuple) -> K + Send + Sync + 'static,
    {
        self.group_by([mapping(key)], std::iter::empty::<GroupCollector>())
    }

    /// One key plus one aggregate per group.
    pub fn group_by_key_with<K, F, C>(self, key: F, collector: C) -> Self
    where
        K: FactValue,
        F: Fn(&Tuple) -> K + Send + Sync + 'static,
        C: Collector,
    {
        self.group_by([mapping(key)], [GroupCollector::from(collector)])
    }

    /// One aggregate over the whole stream; no tuple while the stream is empty.
    pub fn group_by_collector<C: Collector>(self, collector: C) -> Self {
        self.group_by(std::iter::empty::<Mapper>(), [GroupCollector::from(collector)])
    }

    /// Replaces each tuple with a single derived fact.
    pub fn map<V, F>(self, mapper: F) -> Self
    where
        V: FactValue,
        F: Fn(&Tuple) -> V + Send + Sync + 'static,
    {
        self.map_tuple([mapping(mapper)])
    }

    /// Replaces each tuple with one derived fact per mapper.
    ///
    /// Different inputs may map to equal outputs; follow with
    /// [`distinct`](Self::distinct) to collapse them.
    pub fn map_tuple(self, mappers: impl IntoIterator<Item = Mapper>) -> Self {
        let mappers: Vec<_> = mappers.into_iter().map(|m| m.0).collect();
        let arity = mappers.len();
        self.check_arity("map", arity);
        self.derive(NodeKind::Map(mappers), arity, &[(self.node, Port::Left)])
    }

    /// Expands the last fact into every item `expand` yields, keeping the
    /// leading facts. A tuple yielding no items disappears.
    pub fn flatten_last<V, I, F>(self, expand: F) -> Self
    where
        V: FactValue,
        I: IntoIterator<Item = V>,
        F: Fn(&Fact) -> I + Send + Sync + 'static,
    {
        let flatten = move |last: &Fact| -> Vec<Fact> {
            expand(last).into_iter().map(Fact::new).collect()
        };
        self.derive(
            NodeKind::FlattenLast(Box::new(flatten)),
            self.arity,
            &[(self.node, Port::Left)],
        )
    }

    /// Collapses structurally equal tuples into one.
    pub fn distinct(self) -> Self {
        self.derive(NodeKind::Distinct, self.arity, &[(self.node, Port::Left)])
    }

    fn terminate(self, impact: ImpactType, weight: ConstraintWeight<Sc>) -> ConstraintBuilder<'f, Sc> {
        ConstraintBuilder::new(self.factory, self.node, impact, weight)
    }

    /// Penalizes each tuple by `weight`.
    pub fn penalize(self, weight: Sc) -> ConstraintBuilder<'f, Sc> {
        self.terminate(ImpactType::Penalty, ConstraintWeight::Fixed(weight))
    }

    /// Penalizes each tuple by `weight` times an integer match weight.
    pub fn penalize_with<W>(self, weight: Sc, match_weight: W) -> ConstraintBuilder<'f, Sc>
    where
        W: Fn(&Tuple) -> i32 + Send + Sync + 'static,
    {
        self.penalize(weight).with_match_weight(match_weight)
    }

    /// Penalizes each tuple by `weight` times a 64-bit match weight.
    pub fn penalize_long<W>(self, weight: Sc, match_weight: W) -> ConstraintBuilder<'f, Sc>
    where
        W: Fn(&Tuple) -> i64 + Send + Sync + 'static,
    {
        self.penalize(weight).with_long_match_weight(match_weight)
    }

    /// Penalizes each tuple by `weight` times a decimal match weight.
    pub fn penalize_decimal<W>(self, weight: Sc, match_weight: W) -> ConstraintBuilder<'f, Sc>
    where
        W: Fn(&Tuple) -> Decimal + Send + Sync + 'static,
    {
        self.penalize(weight).with_decimal_match_weight(match_weight)
    }

    /// Penalizes each tuple by a weight resolved per session.
    pub fn penalize_configurable(self, default_weight: Sc) -> ConstraintBuilder<'f, Sc> {
        self.terminate(
            ImpactType::Penalty,
            ConstraintWeight::Configurable(default_weight),
        )
    }

    /// Rewards each tuple by `weight`.
    pub fn reward(self, weight: Sc) -> ConstraintBuilder<'f, Sc> {
        self.terminate(ImpactType::Reward, ConstraintWeight::Fixed(weight))
    }

    /// Rewards each tuple by `weight` times an integer match weight.
    pub fn reward_with<W>(self, weight: Sc, match_weight: W) -> ConstraintBuilder<'f, Sc>
    where
        W: Fn(&Tuple) -> i32 + Send + Sync + 'static,
    {
        self.reward(weight).with_match_weight(match_weight)
    }

    /// Rewards each tuple by `weight` times a 64-bit match weight.
    pub fn reward_long<W>(self, weight: Sc, match_weight: W) -> ConstraintBuilder<'f, Sc>
    where
        W: Fn(&Tuple) -> i64 + Send + Sync + 'static,
    {
        self.reward(weight).with_long_match_weight(match_weight)
    }

    /// Rewards each tuple by `weight` times a decimal match weight.
    pub fn reward_decimal<W>(self, weight: Sc, match_weight: W) -> ConstraintBuilder<'f, Sc>
    where
        W: Fn(&Tuple) -> Decimal + Send + Sync + 'static,
    {
        self.reward(weight).with_decimal_match_weight(match_weight)
    }

    /// Rewards each tuple by a weight resolved per session.
    pub fn reward_configurable(self, default_weight: Sc) -> ConstraintBuilder<'f, Sc> {
        self.terminate(
            ImpactType::Reward,
            ConstraintWeight::Configurable(default_weight),
        )
    }
}

impl<Sc: Score> fmt::Debug for ConstraintStream<'_, Sc> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstraintStream")
            .field("node", &self.node)
            .field("arity", &self.arity)
            .finish()
    }
}
