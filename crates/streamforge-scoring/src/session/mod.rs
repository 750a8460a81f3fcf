//! Working-memory boundary: facts in, scores out.
//!
//! A [`ScoringSession`] owns the mutable state of every node of one
//! [`ConstraintPipeline`]. Each `insert`, `update` and `retract` propagates
//! depth first through the affected nodes and completes before returning, so
//! every query observes a quiescent state.

mod handle;
mod view;


use std::any::{Any, TypeId};
use std::collections::BTreeMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use streamforge_config::{EngineConfig, EnvironmentMode};
use streamforge_core::{ParseableScore, Result, Score, StreamForgeError};
use tracing::{debug, error, info, trace, warn};

use crate::api::analysis::{
    ConstraintAnalysis, ConstraintJustification, DetailedConstraintMatch, EntityRef,
    IndictmentMap, ScoreExplanation,
};
use crate::api::weight::ConstraintWeight;
use crate::api::weight_overrides::{ConstraintWeightOverrides, WeightProvider};
use crate::fact::{Fact, FactId, FactValue};
use crate::graph::{ConstraintPipeline, ConstraintSpec, NodeId, NodeKind, NodeLabel};
use crate::node::{NodeState, ScorerState};
use crate::tuple::{Delta, TupleIds};

pub use handle::FactHandle;
pub use view::{ConstraintMatch, ConstraintResult};

/// Incremental scoring over a mutable set of facts.
///
/// Sessions built from the same pipeline share only its immutable node
/// descriptions, so independent sessions can live on different threads.
///
/// # Failure
///
/// A propagation protocol violation, a score corruption detected in
/// full-assert mode, or a panic inside a user function poisons the session:
/// every later fallible call returns [`StreamForgeError::SessionPoisoned`].
/// Queries keep reporting the state reached when the failure happened.
pub struct ScoringSession<Sc: Score> {
    pipeline: Arc<ConstraintPipeline<Sc>>,
    states: Vec<NodeState<Sc>>,
    /// Resolved weight per constraint.
    weights: Vec<Sc>,
    /// Nodes from which an active terminal is reachable; others get no traffic.
    feeding: Vec<bool>,
    prune_inactive: bool,
    facts: BTreeMap<FactId, Fact>,
    next_fact_id: u64,
    ids: TupleIds,
    mode: EnvironmentMode,
    poisoned: bool,
}

impl<Sc: Score> ScoringSession<Sc> {
    /// Creates a session where configurable constraints use their default weight.
    pub fn new(pipeline: Arc<ConstraintPipeline<Sc>>) -> Self {
        Self::with_overrides(pipeline, &ConstraintWeightOverrides::new())
    }

    /// Creates a session with per-session weights for configurable constraints.
    ///
    /// Overrides naming a fixed-weight constraint are ignored.
    pub fn with_overrides(
        pipeline: Arc<ConstraintPipeline<Sc>>,
        overrides: &ConstraintWeightOverrides<Sc>,
    ) -> Self {
        warn_unmatched(&pipeline, overrides);
        let weights = resolve_weights(&pipeline, overrides);
        let session = Self::assemble(pipeline, weights, EnvironmentMode::Reproducible, false);
        session.log_created();
        session
    }

    /// Creates a session configured by an [`EngineConfig`].
    ///
    /// Configurable weights come from `overrides` first, then the config's
    /// `[constraint_weights]` table, then the declared default.
    ///
    /// # Errors
    ///
    /// Returns [`StreamForgeError::Config`] if a configured weight does not
    /// parse as `Sc`.
    pub fn with_config(
        pipeline: Arc<ConstraintPipeline<Sc>>,
        overrides: &ConstraintWeightOverrides<Sc>,
        config: &EngineConfig,
    ) -> Result<Self>
    where
        Sc: ParseableScore,
    {
        let mut merged = ConstraintWeightOverrides::from_config(config)?;
        merged.merge(overrides);
        warn_unmatched(&pipeline, &merged);
        let weights = resolve_weights(&pipeline, &merged);
        let session = Self::assemble(
            pipeline,
            weights,
            config.environment_mode,
            config.prune_inactive_branches,
        );
        session.log_created();
        Ok(session)
    }

    fn assemble(
        pipeline: Arc<ConstraintPipeline<Sc>>,
        weights: Vec<Sc>,
        mode: EnvironmentMode,
        prune_inactive: bool,
    ) -> Self {
        let active: Vec<bool> = weights
            .iter()
            .map(|w| !(prune_inactive && w.is_zero()))
            .collect();
        let feeding = pipeline.feeding_nodes(&active);
        let states = pipeline
            .nodes
            .iter()
            .map(|node| NodeState::empty(&node.kind, &weights))
            .collect();
        Self {
            pipeline,
            states,
            weights,
            feeding,
            prune_inactive,
            facts: BTreeMap::new(),
            next_fact_id: 0,
            ids: TupleIds::default(),
            mode,
            poisoned: false,
        }
    }

    fn log_created(&self) {
        for (constraint, weight) in self.pipeline.constraints.iter().zip(&self.weights) {
            if weight.is_zero() {
                debug!(
                    event = "constraint_deactivated",
                    constraint = %constraint.constraint_ref,
                );
            }
        }
        let mut pruned = 0usize;
        for (id, node) in self.pipeline.nodes.iter().enumerate() {
            if !self.feeding[id] {
                pruned += 1;
                debug!(event = "node_pruned", node = %NodeLabel(id, &node.kind));
            }
        }
        info!(
            event = "session_created",
            nodes = self.pipeline.node_count(),
            constraints = self.pipeline.constraint_count(),
            pruned_nodes = pruned,
            mode = ?self.mode,
        );
    }

    // ------------------------------------------------------------------
    // Fact operations
    // ------------------------------------------------------------------

    /// Inserts a fact and propagates it to every source of its type.
    pub fn insert<T: FactValue>(&mut self, value: T) -> Result<FactHandle> {
        self.ensure_usable()?;
        let id = FactId(self.next_fact_id);
        self.next_fact_id += 1;
        let handle = FactHandle {
            id,
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        };
        let fact = Fact::with_id(id, value);
        self.guarded(|session| session.insert_fact(fact))?;
        self.after_change("insert", handle)?;
        Ok(handle)
    }

    /// Replaces the value of a live fact: the old state is retracted and the
    /// new state inserted under the same identity.
    ///
    /// # Errors
    ///
    /// [`StreamForgeError::UnknownFact`] if the handle is not live and
    /// [`StreamForgeError::FactTypeMismatch`] if `T` differs from the type
    /// the fact was inserted with. Neither changes the session.
    pub fn update<T: FactValue>(&mut self, handle: FactHandle, value: T) -> Result<()> {
        self.ensure_usable()?;
        let live = self
            .facts
            .get(&handle.id)
            .ok_or_else(|| StreamForgeError::UnknownFact(handle.to_string()))?;
        if live.value_type_id() != TypeId::of::<T>() {
            return Err(StreamForgeError::FactTypeMismatch {
                expected: live.type_name(),
                actual: std::any::type_name::<T>(),
            });
        }
        let fact = Fact::with_id(handle.id, value);
        self.guarded(|session| {
            session.retract_fact(handle.id)?;
            session.insert_fact(fact)
        })?;
        self.after_change("update", handle)
    }

    /// Retracts a live fact and everything derived from it.
    pub fn retract(&mut self, handle: FactHandle) -> Result<()> {
        self.ensure_usable()?;
        if !self.facts.contains_key(&handle.id) {
            return Err(StreamForgeError::UnknownFact(handle.to_string()));
        }
        self.guarded(|session| session.retract_fact(handle.id))?;
        self.after_change("retract", handle)
    }

    fn insert_fact(&mut self, fact: Fact) -> Result<()> {
        let id = fact
            .id()
            .ok_or_else(|| StreamForgeError::Internal("inserted fact has no identity".to_string()))?;
        let pipeline = Arc::clone(&self.pipeline);
        self.facts.insert(id, fact.clone());
        for &source in pipeline.sources_of(fact.value_type_id()) {
            if !self.feeding[source] {
                continue;
            }
            let node = &pipeline.nodes[source];
            let (NodeKind::Source(spec), NodeState::Source(state)) =
                (&node.kind, &mut self.states[source])
            else {
                return Err(StreamForgeError::Internal(format!(
                    "node {} is registered as a source but is not one",
                    source
                )));
            };
            if let Some(delta) = state.insert(NodeLabel(source, &node.kind), spec, &fact, &mut self.ids)? {
                self.propagate(&pipeline, source, delta)?;
            }
        }
        Ok(())
    }

    fn retract_fact(&mut self, id: FactId) -> Result<()> {
        let fact = self
            .facts
            .remove(&id)
            .ok_or_else(|| StreamForgeError::UnknownFact(id.to_string()))?;
        let pipeline = Arc::clone(&self.pipeline);
        for &source in pipeline.sources_of(fact.value_type_id()) {
            if !self.feeding[source] {
                continue;
            }
            let NodeState::Source(state) = &mut self.states[source] else {
                return Err(StreamForgeError::Internal(format!(
                    "node {} is registered as a source but is not one",
                    source
                )));
            };
            if let Some(delta) = state.retract(id) {
                self.propagate(&pipeline, source, delta)?;
            }
        }
        Ok(())
    }

    /// Forwards one delta emitted by `node` to each of its children, fully
    /// propagating everything a child emits before moving to the next child.
    fn propagate(&mut self, pipeline: &ConstraintPipeline<Sc>, node: NodeId, delta: Delta) -> Result<()> {
        for &(child, port) in &pipeline.nodes[node].children {
            if !self.feeding[child] {
                continue;
            }
            let mut out = Vec::new();
            self.states[child].apply(
                child,
                &pipeline.nodes[child],
                &pipeline.constraints,
                port,
                delta.clone(),
                &mut self.ids,
                &mut out,
            )?;
            for emitted in out {
                self.propagate(pipeline, child, emitted)?;
            }
        }
        Ok(())
    }

    /// Runs a propagation, poisoning the session on fatal errors and panics.
    fn guarded<R>(&mut self, operation: impl FnOnce(&mut Self) -> Result<R>) -> Result<R> {
        match catch_unwind(AssertUnwindSafe(|| operation(self))) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                if e.is_fatal() {
                    self.poison(&e);
                }
                Err(e)
            }
            Err(payload) => {
                let e = StreamForgeError::UserPanic(panic_message(payload.as_ref()));
                self.poison(&e);
                Err(e)
            }
        }
    }

    fn poison(&mut self, cause: &StreamForgeError) {
        error!(event = "session_poisoned", error = %cause);
        self.poisoned = true;
    }

    fn ensure_usable(&self) -> Result<()> {
        if self.poisoned {
            Err(StreamForgeError::SessionPoisoned)
        } else {
            Ok(())
        }
    }

    fn after_change(&mut self, operation: &'static str, handle: FactHandle) -> Result<()> {
        if self.mode == EnvironmentMode::FullAssert {
            self.assert_score()?;
        }
        trace!(
            event = "fact_changed",
            operation,
            fact = %handle,
            score = %self.score(),
        );
        Ok(())
    }

    fn assert_score(&mut self) -> Result<()> {
        let from_scratch = self.calculate_from_scratch()?;
        let incremental = self.score();
        if incremental != from_scratch {
            let e = StreamForgeError::ScoreCorruption {
                incremental: incremental.to_string(),
                from_scratch: from_scratch.to_string(),
            };
            self.poison(&e);
            return Err(e);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Recomputation
    // ------------------------------------------------------------------

    /// Scores the live facts in a fresh session with the same weights.
    pub fn calculate_from_scratch(&self) -> Result<Sc> {
        Ok(self.rebuilt()?.score())
    }

    /// A fresh session holding the same facts under the same identities.
    pub(crate) fn rebuilt(&self) -> Result<Self> {
        self.ensure_usable()?;
        let mut fresh = Self::assemble(
            Arc::clone(&self.pipeline),
            self.weights.clone(),
            EnvironmentMode::Reproducible,
            self.prune_inactive,
        );
        for fact in self.facts.values() {
            fresh.guarded(|session| session.insert_fact(fact.clone()))?;
        }
        fresh.next_fact_id = self.next_fact_id;
        Ok(fresh)
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Total score over every constraint.
    pub fn score(&self) -> Sc {
        self.pipeline
            .constraints
            .iter()
            .filter_map(|c| self.scorer(c))
            .fold(Sc::zero(), |total, scorer| total + scorer.total())
    }

    /// Running score of one constraint, by full name.
    pub fn constraint_score(&self, full_name: &str) -> Option<Sc> {
        let index = self.pipeline.constraint_index(full_name)?;
        let scorer = self.scorer(&self.pipeline.constraints[index])?;
        Some(scorer.total())
    }

    /// Weight a constraint resolved to in this session, by full name.
    pub fn constraint_weight(&self, full_name: &str) -> Option<Sc> {
        self.pipeline
            .constraint_index(full_name)
            .map(|index| self.weights[index])
    }

    /// Per-constraint totals, in registration order.
    pub fn constraint_results(&self) -> Vec<ConstraintResult<Sc>> {
        self.pipeline
            .constraints
            .iter()
            .zip(&self.weights)
            .filter_map(|(constraint, weight)| {
                let scorer = self.scorer(constraint)?;
                Some(ConstraintResult {
                    constraint_ref: constraint.constraint_ref.clone(),
                    score: scorer.total(),
                    match_count: scorer.match_count(),
                    is_hard: weight.has_hard_impact(),
                })
            })
            .collect()
    }

    /// Every live tuple at a scoring terminal with its contribution.
    ///
    /// Ordered by constraint registration, then by emission.
    pub fn constraint_matches(&self) -> Vec<ConstraintMatch<Sc>> {
        let mut matches = Vec::new();
        for constraint in &self.pipeline.constraints {
            let Some(scorer) = self.scorer(constraint) else {
                continue;
            };
            matches.extend(scorer.matches().map(|m| ConstraintMatch {
                constraint_ref: constraint.constraint_ref.clone(),
                tuple: m.tuple.clone(),
                score: m.score,
            }));
        }
        matches
    }

    /// Per-constraint breakdown of the score with justifications.
    pub fn explain(&self) -> ScoreExplanation<Sc> {
        let analyses = self
            .pipeline
            .constraints
            .iter()
            .zip(&self.weights)
            .filter_map(|(constraint, weight)| {
                let scorer = self.scorer(constraint)?;
                let matches = scorer
                    .matches()
                    .map(|m| {
                        let entities = m.tuple.facts().iter().cloned().map(EntityRef::new).collect();
                        DetailedConstraintMatch::new(
                            constraint.constraint_ref.clone(),
                            m.score,
                            ConstraintJustification::new(entities),
                        )
                    })
                    .collect();
                Some(ConstraintAnalysis::new(
                    constraint.constraint_ref.clone(),
                    *weight,
                    scorer.total(),
                    matches,
                    weight.has_hard_impact(),
                ))
            })
            .collect();
        ScoreExplanation::new(self.score(), analyses)
    }

    /// Matches aggregated per fact.
    pub fn indictments(&self) -> IndictmentMap<Sc> {
        let matches = self
            .explain()
            .constraint_analyses
            .into_iter()
            .flat_map(|analysis| analysis.matches)
            .collect();
        IndictmentMap::from_matches(matches)
    }

    /// The current value of a live fact, if it is a `T`.
    pub fn get<T: 'static>(&self, handle: FactHandle) -> Option<&T> {
        self.facts.get(&handle.id)?.downcast_ref::<T>()
    }

    /// Number of live facts.
    pub fn fact_count(&self) -> usize {
        self.facts.len()
    }

    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    pub fn environment_mode(&self) -> EnvironmentMode {
        self.mode
    }

    pub fn pipeline(&self) -> &Arc<ConstraintPipeline<Sc>> {
        &self.pipeline
    }

    fn scorer(&self, constraint: &ConstraintSpec<Sc>) -> Option<&ScorerState<Sc>> {
        self.states[constraint.scorer].as_scorer()
    }

    /// Live output tuples of every node, as multisets, in arena order.
    #[cfg(test)]
    pub(crate) fn node_outputs(&self) -> Vec<std::collections::HashMap<crate::Tuple, usize>> {
        self.states
            .iter()
            .map(|state| {
                let mut counts = std::collections::HashMap::new();
                for tuple in state.outputs() {
                    *counts.entry(tuple).or_insert(0) += 1;
                }
                counts
            })
            .collect()
    }
}

impl<Sc: Score> fmt::Debug for ScoringSession<Sc> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScoringSession")
            .field("facts", &self.facts.len())
            .field("score", &self.score())
            .field("mode", &self.mode)
            .field("poisoned", &self.poisoned)
            .finish()
    }
}

fn resolve_weights<Sc: Score>(
    pipeline: &ConstraintPipeline<Sc>,
    provider: &dyn WeightProvider<Sc>,
) -> Vec<Sc> {
    pipeline
        .constraints
        .iter()
        .map(|constraint| match constraint.weight {
            ConstraintWeight::Fixed(weight) => weight,
            ConstraintWeight::Configurable(default) => {
                provider.weight_or_default(&constraint.constraint_ref.full_name(), default)
            }
        })
        .collect()
}

fn warn_unmatched<Sc: Score>(pipeline: &ConstraintPipeline<Sc>, overrides: &ConstraintWeightOverrides<Sc>) {
    for name in overrides.names() {
        match pipeline.constraint_weight(name) {
            None => warn!(event = "unknown_constraint_weight", constraint = name),
            Some(ConstraintWeight::Fixed(_)) => {
                warn!(event = "fixed_constraint_weight_overridden", constraint = name)
            }
            Some(ConstraintWeight::Configurable(_)) => {}
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
