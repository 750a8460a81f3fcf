//! Pipeline description: an arena of node descriptions wired parent to child.
//!
//! Nodes are appended after their parents, so arena order is a topological
//! order of the DAG.

mod builder;
mod pipeline;

#[cfg(test)]
mod tests;

use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

use crate::fact::Fact;
use crate::stream::collector::GroupCollector;
use crate::stream::joiner::CompiledJoiners;
use crate::tuple::Tuple;

pub(crate) use builder::GraphBuilder;
pub use pipeline::ConstraintPipeline;
pub(crate) use pipeline::ConstraintSpec;

/// Index of a node in the pipeline arena.
pub(crate) type NodeId = usize;

/// Predicate over a whole tuple.
pub type DynTuplePredicate = Box<dyn Fn(&Tuple) -> bool + Send + Sync>;

/// Derives one fact from a tuple.
pub type DynMapper = Box<dyn Fn(&Tuple) -> Fact + Send + Sync>;

/// Expands the last fact of a tuple into zero or more facts.
pub type DynFlatten = Box<dyn Fn(&Fact) -> Vec<Fact> + Send + Sync>;

/// Decides whether a fact of a planning entity class is assigned.
pub type DynAssigned = Arc<dyn Fn(&Fact) -> bool + Send + Sync>;

/// Which input of a two-input node an edge feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Port {
    Left,
    Right,
}

pub(crate) struct SourceSpec {
    pub(crate) type_id: TypeId,
    pub(crate) include_unassigned: bool,
    pub(crate) is_assigned: Option<DynAssigned>,
}

pub(crate) enum NodeKind {
    Source(SourceSpec),
    Filter(DynTuplePredicate),
    Join(CompiledJoiners),
    Exists {
        joiners: CompiledJoiners,
        should_exist: bool,
    },
    Group {
        keys: Vec<DynMapper>,
        collectors: Vec<GroupCollector>,
    },
    Map(Vec<DynMapper>),
    FlattenLast(DynFlatten),
    Distinct,
    /// Terminal of the constraint at this index.
    Scorer(usize),
}

impl NodeKind {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            NodeKind::Source(_) => "Source",
            NodeKind::Filter(_) => "Filter",
            NodeKind::Join(_) => "Join",
            NodeKind::Exists {
                should_exist: true, ..
            } => "IfExists",
            NodeKind::Exists { .. } => "IfNotExists",
            NodeKind::Group { .. } => "GroupBy",
            NodeKind::Map(_) => "Map",
            NodeKind::FlattenLast(_) => "FlattenLast",
            NodeKind::Distinct => "Distinct",
            NodeKind::Scorer(_) => "Scorer",
        }
    }
}

pub(crate) struct NodeSpec {
    pub(crate) kind: NodeKind,
    pub(crate) arity: usize,
    pub(crate) children: Vec<(NodeId, Port)>,
}

/// Display label of a node, e.g. `Join#4`.
#[derive(Clone, Copy)]
pub(crate) struct NodeLabel<'a>(pub(crate) NodeId, pub(crate) &'a NodeKind);

impl fmt::Display for NodeLabel<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.1.name(), self.0)
    }
}
