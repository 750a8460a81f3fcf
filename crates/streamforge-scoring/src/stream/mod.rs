//! Fluent constraint stream API.
//!
//! Streams describe a pipeline; nothing is evaluated until the pipeline is
//! built and a session is fed facts.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use streamforge_scoring::stream::joiner::{equal, filtering};
//! use streamforge_scoring::{ConstraintFactory, ScoringSession, Tuple};
//! use streamforge_core::HardSoftScore;
//!
//! #[derive(Debug, PartialEq, Eq, Hash)]
//! struct Shift { employee: Option<u32>, start: i64, end: i64 }
//!
//! let factory = ConstraintFactory::<HardSoftScore>::new();
//! factory.planning_entity::<Shift>(|s| s.employee.is_some());
//! factory
//!     .for_each_unique_pair::<Shift>([
//!         equal(|l: &Tuple| l.a::<Shift>().employee, |r: &Tuple| r.a::<Shift>().employee),
//!         filtering(|l: &Tuple, r: &Tuple| {
//!             let (a, b) = (l.a::<Shift>(), r.a::<Shift>());
//!             a.start < b.end && b.start < a.end
//!         }),
//!     ])
//!     .penalize(HardSoftScore::ONE_HARD)
//!     .as_constraint("Overlapping shifts");
//!
//! let mut session = ScoringSession::new(Arc::new(factory.build().unwrap()));
//! session.insert(Shift { employee: Some(1), start: 0, end: 8 }).unwrap();
//! session.insert(Shift { employee: Some(1), start: 4, end: 12 }).unwrap();
//! session.insert(Shift { employee: Some(2), start: 4, end: 12 }).unwrap();
//!
//! // The overlapping pair matches once.
//! assert_eq!(session.score(), HardSoftScore::of(-1, 0));
//! ```
//!
//! # Architecture
//!
//! ```text
//! ConstraintFactory::new()
//!     .for_each::<A>()                 -> ConstraintStream (arity 1)
//!     .join_each::<B>(joiners)         -> ConstraintStream (arity 2)
//!     .group_by(keys, collectors)      -> ConstraintStream (keys + collectors)
//!     .penalize(weight)                -> ConstraintBuilder
//!     .as_constraint(name)             -> ConstraintRef
//! factory.for_each_unique_pair::<A>()  -> ConstraintStream (arity 2)
//! factory.build()                      -> ConstraintPipeline
//! ```

pub mod collector;
mod constraint_builder;
mod constraint_stream;
mod factory;
pub mod joiner;
mod mapping;


pub use constraint_builder::ConstraintBuilder;
pub use constraint_stream::ConstraintStream;
pub use factory::ConstraintFactory;
pub use mapping::{mapping, Mapper};
