// Constraint factory: entry point for describing a pipeline.

use std::any::TypeId;
use std::cell::RefCell;
use std::sync::Arc;

use streamforge_core::{Result, Score};

use super::joiner::{DynPairPredicate, Joiner};
use super::ConstraintStream;
use crate::fact::{Fact, FactValue};
use crate::graph::{ConstraintPipeline, GraphBuilder, NodeId};
use crate::tuple::Tuple;

/// Factory for constraint streams.
///
/// Streams borrow the factory while constraints are described; `build`
/// consumes it and validates the whole description at once.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use streamforge_scoring::{ConstraintFactory, ScoringSession, Tuple};
/// use streamforge_core::SimpleScore;
///
/// #[derive(Debug, PartialEq, Eq, Hash)]
/// struct Task { priority: Option<i32> }
///
/// let factory = ConstraintFactory::<SimpleScore>::new();
/// factory.planning_entity::<Task>(|t| t.priority.is_some());
/// factory
///     .for_each_including_unassigned::<Task>()
///     .filter(|t: &Tuple| t.a::<Task>().priority.is_none())
///     .penalize(SimpleScore::of(1))
///     .as_constraint("Unassigned task");
///
/// let pipeline = Arc::new(factory.build().unwrap());
/// let mut session = ScoringSession::new(pipeline);
/// session.insert(Task { priority: Some(1) }).unwrap();
/// session.insert(Task { priority: None }).unwrap();
/// assert_eq!(session.score(), SimpleScore::of(-1));
/// ```
pub struct ConstraintFactory<Sc: Score> {
    pub(crate) graph: RefCell<GraphBuilder<Sc>>,
}

impl<Sc: Score> ConstraintFactory<Sc> {
    /// Creates an empty factory.
    pub fn new() -> Self {
        Self {
            graph: RefCell::new(GraphBuilder::new()),
        }
    }

    /// Registers the assignment predicate of a planning entity class.
    ///
    /// `for_each::<T>()` and the exists variants without
    /// `_including_unassigned` skip facts for which the predicate is false.
    /// Classes without a predicate treat every fact as assigned.
    pub fn planning_entity<T: FactValue>(
        &self,
        is_assigned: impl Fn(&T) -> bool + Send + Sync + 'static,
    ) -> &Self {
        let predicate = Arc::new(move |fact: &Fact| fact.downcast_ref::<T>().is_some_and(&is_assigned));
        self.graph
            .borrow_mut()
            .register_entity(TypeId::of::<T>(), predicate);
        self
    }

    /// Uni stream over every assigned fact of type `T`.
    pub fn for_each<T: FactValue>(&self) -> ConstraintStream<'_, Sc> {
        let node = self.source::<T>(false);
        ConstraintStream::new(self, node, 1)
    }

    /// Uni stream over every fact of type `T`, assigned or not.
    pub fn for_each_including_unassigned<T: FactValue>(&self) -> ConstraintStream<'_, Sc> {
        let node = self.source::<T>(true);
        ConstraintStream::new(self, node, 1)
    }

    /// Bi stream over every unordered pair of distinct assigned facts of type `T`.
    ///
    /// Each pair is reported once, with the earlier inserted fact on the
    /// left. The ordering filter runs after `joiners`.
    pub fn for_each_unique_pair<T: FactValue>(
        &self,
        joiners: impl IntoIterator<Item = Joiner>,
    ) -> ConstraintStream<'_, Sc> {
        let ordered: DynPairPredicate =
            Box::new(|l: &Tuple, r: &Tuple| l.fact(0).id() < r.fact(0).id());
        self.for_each::<T>()
            .join_filtered(self.for_each::<T>(), joiners, Some(ordered))
    }

    pub(crate) fn source<T: FactValue>(&self, include_unassigned: bool) -> NodeId {
        self.graph
            .borrow_mut()
            .source(TypeId::of::<T>(), include_unassigned)
    }

    /// Validates the description and freezes it into a pipeline.
    ///
    /// # Errors
    ///
    /// Returns the first configuration error recorded while describing
    /// streams, or a [`Config`](streamforge_core::StreamForgeError::Config)
    /// error for duplicate names or an empty factory.
    pub fn build(self) -> Result<ConstraintPipeline<Sc>> {
        self.graph.into_inner().build()
    }
}

impl<Sc: Score> Default for ConstraintFactory<Sc> {
    fn default() -> Self {
        Self::new()
    }
}
