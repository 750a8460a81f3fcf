//! Incremental constraint-stream scoring for streamforge.
//!
//! This crate turns declarative constraint streams into a node graph and
//! keeps every constraint's score up to date as facts change:
//! - [`ConstraintFactory`] and [`ConstraintStream`] describe constraints
//! - [`ConstraintPipeline`] is the immutable node graph they build
//! - [`ScoringSession`] holds per-session node state and answers score queries
//!
//! # Architecture
//!
//! Facts enter at source nodes, one per `for_each` of a type. Every change is
//! a tuple delta (insert or retract) that flows depth first through filter,
//! join, exists, group-by, map, flatten and distinct nodes until it reaches
//! a scoring terminal. Updates are a retract followed by an insert, so each
//! node only ever implements those two operations.
//!
//! User closures are stored boxed in the pipeline and called with [`Tuple`]
//! views; the typed accessors (`a::<T>()`, `b::<T>()`, ...) downcast the
//! facts at each position.

// Core modules
pub mod api;
pub mod stream;

mod fact;
mod graph;
mod node;
mod session;
mod tuple;

// ============================================================================
// Facts and Tuples
// ============================================================================

pub use fact::{Fact, FactId, FactValue};
pub use tuple::{Tuple, TupleId, MAX_ARITY};

// ============================================================================
// Fluent Constraint Stream API
// ============================================================================

pub use graph::ConstraintPipeline;
pub use stream::{ConstraintBuilder, ConstraintFactory, ConstraintStream};

// ============================================================================
// Sessions
// ============================================================================

pub use session::{ConstraintMatch, ConstraintResult, FactHandle, ScoringSession};

// ============================================================================
// Weights and Analysis
// ============================================================================

pub use api::analysis::{
    ConstraintAnalysis, ConstraintJustification, DetailedConstraintMatch, EntityRef, Indictment,
    IndictmentMap, ScoreExplanation,
};
pub use api::weight::{ConstraintWeight, MatchWeigher};
pub use api::weight_overrides::{ConstraintWeightOverrides, WeightProvider};
