//! Mutable graph under construction, owned by a `ConstraintFactory`.

use std::any::TypeId;
use std::collections::{HashMap, HashSet};

use streamforge_core::{ConstraintRef, ImpactType, Result, Score, StreamForgeError};
use tracing::{debug, info};

use super::{
    ConstraintPipeline, ConstraintSpec, DynAssigned, NodeId, NodeKind, NodeLabel, NodeSpec,
    Port, SourceSpec,
};
use crate::api::weight::{ConstraintWeight, MatchWeigher};
use crate::tuple::MAX_ARITY;

pub(crate) struct GraphBuilder<Sc: Score> {
    nodes: Vec<NodeSpec>,
    sources: HashMap<(TypeId, bool), NodeId>,
    assignment: HashMap<TypeId, DynAssigned>,
    constraints: Vec<ConstraintSpec<Sc>>,
    errors: Vec<StreamForgeError>,
}

impl<Sc: Score> GraphBuilder<Sc> {
    pub(crate) fn new() -> Self {
        Self {
            nodes: Vec::new(),
            sources: HashMap::new(),
            assignment: HashMap::new(),
            constraints: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub(crate) fn register_entity(&mut self, type_id: TypeId, is_assigned: DynAssigned) {
        self.assignment.insert(type_id, is_assigned);
    }

    /// Returns the shared source for this fact class and assignment filter.
    pub(crate) fn source(
        &mut self,
        type_id: TypeId,
        include_unassigned: bool,
    ) -> NodeId {
        if let Some(&id) = self.sources.get(&(type_id, include_unassigned)) {
            return id;
        }
        let spec = SourceSpec {
            type_id,
            include_unassigned,
            is_assigned: None,
        };
        let id = self.add(NodeKind::Source(spec), 1, &[]);
        self.sources.insert((type_id, include_unassigned), id);
        id
    }

    pub(crate) fn add(&mut self, kind: NodeKind, arity: usize, parents: &[(NodeId, Port)]) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(NodeSpec {
            kind,
            arity,
            children: Vec::new(),
        });
        for &(parent, port) in parents {
            self.nodes[parent].children.push((id, port));
        }
        id
    }

    pub(crate) fn arity(&self, node: NodeId) -> usize {
        self.nodes[node].arity
    }

    /// Records a configuration error; `build` reports the first one.
    pub(crate) fn reject(&mut self, error: StreamForgeError) {
        self.errors.push(error);
    }

    pub(crate) fn check_arity(&mut self, operation: &'static str, arity: usize) {
        if !(1..=MAX_ARITY).contains(&arity) {
            self.reject(StreamForgeError::ArityOutOfRange { operation, arity });
        }
    }

    pub(crate) fn add_constraint(
        &mut self,
        parent: NodeId,
        constraint_ref: ConstraintRef,
        impact: ImpactType,
        weight: ConstraintWeight<Sc>,
        weigher: MatchWeigher,
    ) {
        if weigher.is_decimal() && !Sc::supports_decimal() {
            self.reject(StreamForgeError::Config(format!(
                "constraint '{}' uses a decimal match weight but {} has no decimal levels",
                constraint_ref,
                std::any::type_name::<Sc>()
            )));
        }
        let index = self.constraints.len();
        let scorer = self.add(NodeKind::Scorer(index), self.arity(parent), &[(parent, Port::Left)]);
        self.constraints.push(ConstraintSpec {
            constraint_ref,
            impact,
            weight,
            weigher,
            scorer,
        });
    }

    pub(crate) fn build(mut self) -> Result<ConstraintPipeline<Sc>> {
        if !self.errors.is_empty() {
            return Err(self.errors.swap_remove(0));
        }
        if self.constraints.is_empty() {
            return Err(StreamForgeError::Config(
                "no constraint was registered with as_constraint".to_string(),
            ));
        }
        let mut names = HashSet::new();
        for constraint in &self.constraints {
            if !names.insert(constraint.constraint_ref.full_name()) {
                return Err(StreamForgeError::Config(format!(
                    "duplicate constraint name '{}'",
                    constraint.constraint_ref
                )));
            }
        }

        for node in &mut self.nodes {
            if let NodeKind::Source(source) = &mut node.kind {
                if !source.include_unassigned {
                    source.is_assigned = self.assignment.get(&source.type_id).cloned();
                }
            }
        }

        for (id, node) in self.nodes.iter().enumerate() {
            if let NodeKind::Join(joiners) | NodeKind::Exists { joiners, .. } = &node.kind {
                if !joiners.is_indexed() {
                    debug!(
                        event = "unindexed_join",
                        node = %NodeLabel(id, &node.kind),
                        joiners = %joiners.describe(),
                    );
                }
            }
        }

        let pipeline = ConstraintPipeline::new(self.nodes, self.constraints);
        info!(
            event = "pipeline_built",
            nodes = pipeline.node_count(),
            constraints = pipeline.constraint_count(),
        );
        Ok(pipeline)
    }
}
