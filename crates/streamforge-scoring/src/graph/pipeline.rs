//! Immutable, validated pipeline shared by any number of sessions.

use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;

use streamforge_core::{ConstraintRef, ImpactType, Score};

use super::{NodeId, NodeKind, NodeLabel, NodeSpec};
use crate::api::weight::{ConstraintWeight, MatchWeigher};

/// One registered constraint and its scoring terminal.
pub(crate) struct ConstraintSpec<Sc: Score> {
    pub(crate) constraint_ref: ConstraintRef,
    pub(crate) impact: ImpactType,
    pub(crate) weight: ConstraintWeight<Sc>,
    pub(crate) weigher: MatchWeigher,
    pub(crate) scorer: NodeId,
}

/// A built constraint pipeline.
///
/// Produced by [`ConstraintFactory::build`](crate::ConstraintFactory::build).
/// Holds only immutable node descriptions and user closures; every session
/// keeps its own node state, so one pipeline can back many sessions on
/// different threads.
pub struct ConstraintPipeline<Sc: Score> {
    pub(crate) nodes: Vec<NodeSpec>,
    pub(crate) constraints: Vec<ConstraintSpec<Sc>>,
    pub(crate) sources_by_type: HashMap<TypeId, Vec<NodeId>>,
}

impl<Sc: Score> ConstraintPipeline<Sc> {
    pub(crate) fn new(nodes: Vec<NodeSpec>, constraints: Vec<ConstraintSpec<Sc>>) -> Self {
        let mut sources_by_type: HashMap<TypeId, Vec<NodeId>> = HashMap::new();
        for (id, node) in nodes.iter().enumerate() {
            if let NodeKind::Source(source) = &node.kind {
                sources_by_type.entry(source.type_id).or_default().push(id);
            }
        }
        Self {
            nodes,
            constraints,
            sources_by_type,
        }
    }

    /// Number of nodes, sources and terminals included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of registered constraints.
    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Registered constraints, in registration order.
    pub fn constraint_refs(&self) -> impl Iterator<Item = &ConstraintRef> {
        self.constraints.iter().map(|c| &c.constraint_ref)
    }

    /// Weight declared for a constraint, by full name.
    pub fn constraint_weight(&self, name: &str) -> Option<ConstraintWeight<Sc>> {
        self.constraint_index(name)
            .map(|i| self.constraints[i].weight)
    }

    pub(crate) fn constraint_index(&self, name: &str) -> Option<usize> {
        self.constraints
            .iter()
            .position(|c| c.constraint_ref.full_name() == name)
    }

    pub(crate) fn sources_of(&self, type_id: TypeId) -> &[NodeId] {
        self.sources_by_type
            .get(&type_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Marks every node from which an active terminal is reachable.
    ///
    /// Children always have higher ids than their parents, so one reverse
    /// pass over the arena settles every node.
    pub(crate) fn feeding_nodes(&self, active_constraints: &[bool]) -> Vec<bool> {
        let mut feeding = vec![false; self.nodes.len()];
        for id in (0..self.nodes.len()).rev() {
            feeding[id] = match self.nodes[id].kind {
                NodeKind::Scorer(constraint) => active_constraints[constraint],
                _ => self.nodes[id]
                    .children
                    .iter()
                    .any(|(child, _)| feeding[*child]),
            };
        }
        feeding
    }
}

impl<Sc: Score> fmt::Debug for ConstraintPipeline<Sc> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nodes: Vec<String> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(id, n)| format!("{}/{}", NodeLabel(id, &n.kind), n.arity))
            .collect();
        f.debug_struct("ConstraintPipeline")
            .field("nodes", &nodes)
            .field(
                "constraints",
                &self
                    .constraint_refs()
                    .map(ConstraintRef::full_name)
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}
