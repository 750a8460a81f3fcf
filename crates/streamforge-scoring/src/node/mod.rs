//! Per-session node state.
//!
//! Each node reacts to one incoming [`Delta`] by updating its own bookkeeping
//! and appending the deltas it emits to `out`. The session then forwards
//! every emitted delta to each child, depth first.

mod distinct;
mod exists;
mod filter;
mod flatten;
mod group;
mod join;
mod map;
mod scorer;
mod source;

#[cfg(test)]
mod tests;

use streamforge_core::{Result, Score, StreamForgeError};

use crate::graph::{ConstraintSpec, NodeId, NodeKind, NodeLabel, NodeSpec, Port};
use crate::tuple::{Delta, TupleIds};

pub(crate) use distinct::DistinctState;
pub(crate) use exists::ExistsState;
pub(crate) use filter::FilterState;
pub(crate) use flatten::FlattenState;
pub(crate) use group::GroupState;
pub(crate) use join::JoinState;
pub(crate) use map::MapState;
pub(crate) use scorer::ScorerState;
pub(crate) use source::SourceState;

pub(crate) enum NodeState<Sc: Score> {
    Source(SourceState),
    Filter(FilterState),
    Join(JoinState),
    Exists(ExistsState),
    Group(GroupState),
    Map(MapState),
    FlattenLast(FlattenState),
    Distinct(DistinctState),
    Scorer(ScorerState<Sc>),
}

impl<Sc: Score> NodeState<Sc> {
    /// Empty state for a node; terminals start with their resolved weight.
    pub(crate) fn empty(kind: &NodeKind, weights: &[Sc]) -> Self {
        match kind {
            NodeKind::Source(_) => NodeState::Source(SourceState::default()),
            NodeKind::Filter(_) => NodeState::Filter(FilterState::default()),
            NodeKind::Join(_) => NodeState::Join(JoinState::default()),
            NodeKind::Exists { .. } => NodeState::Exists(ExistsState::default()),
            NodeKind::Group { .. } => NodeState::Group(GroupState::default()),
            NodeKind::Map(_) => NodeState::Map(MapState::default()),
            NodeKind::FlattenLast(_) => NodeState::FlattenLast(FlattenState::default()),
            NodeKind::Distinct => NodeState::Distinct(DistinctState::default()),
            NodeKind::Scorer(constraint) => {
                NodeState::Scorer(ScorerState::new(weights[*constraint]))
            }
        }
    }

    /// Applies one delta arriving on `port`.
    pub(crate) fn apply(
        &mut self,
        id: NodeId,
        spec: &NodeSpec,
        constraints: &[ConstraintSpec<Sc>],
        port: Port,
        delta: Delta,
        ids: &mut TupleIds,
        out: &mut Vec<Delta>,
    ) -> Result<()> {
        let node = NodeLabel(id, &spec.kind);
        match (self, &spec.kind) {
            (NodeState::Filter(state), NodeKind::Filter(predicate)) => {
                state.apply(node, predicate, delta, out)
            }
            (NodeState::Join(state), NodeKind::Join(joiners)) => {
                state.apply(node, joiners, port, delta, ids, out)
            }
            (
                NodeState::Exists(state),
                NodeKind::Exists {
                    joiners,
                    should_exist,
                },
            ) => state.apply(node, joiners, *should_exist, port, delta, out),
            (NodeState::Group(state), NodeKind::Group { keys, collectors }) => {
                state.apply(node, keys, collectors, delta, ids, out)
            }
            (NodeState::Map(state), NodeKind::Map(mappers)) => {
                state.apply(node, mappers, delta, ids, out)
            }
            (NodeState::FlattenLast(state), NodeKind::FlattenLast(expand)) => {
                state.apply(node, expand, delta, ids, out)
            }
            (NodeState::Distinct(state), NodeKind::Distinct) => state.apply(node, delta, ids, out),
            (NodeState::Scorer(state), NodeKind::Scorer(constraint)) => {
                state.apply(node, &constraints[*constraint], delta)
            }
            (NodeState::Source(_), NodeKind::Source(_)) => Err(StreamForgeError::protocol(
                node.to_string(),
                "source nodes only accept facts",
            )),
            _ => Err(StreamForgeError::Internal(format!(
                "state of {} does not match its node kind",
                node
            ))),
        }
    }

    /// Live tuples this node currently emits downstream.
    #[cfg(test)]
    pub(crate) fn outputs(&self) -> Vec<crate::tuple::Tuple> {
        match self {
            NodeState::Source(state) => state.outputs(),
            NodeState::Filter(state) => state.outputs(),
            NodeState::Join(state) => state.outputs(),
            NodeState::Exists(state) => state.outputs(),
            NodeState::Group(state) => state.outputs(),
            NodeState::Map(state) => state.outputs(),
            NodeState::FlattenLast(state) => state.outputs(),
            NodeState::Distinct(state) => state.outputs(),
            NodeState::Scorer(state) => state.outputs(),
        }
    }

    pub(crate) fn as_scorer(&self) -> Option<&ScorerState<Sc>> {
        match self {
            NodeState::Scorer(state) => Some(state),
            _ => None,
        }
    }
}

/// Protocol violation raised by `node`.
pub(crate) fn violation(node: NodeLabel<'_>, detail: impl Into<String>) -> StreamForgeError {
    StreamForgeError::protocol(node.to_string(), detail)
}
