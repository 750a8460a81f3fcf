//! streamforge core - score, constraint and error types
//!
//! This crate provides the fundamental vocabulary shared by the engine crates:
//! - Score types for representing the quality of a working set
//! - Constraint identification and impact direction
//! - The engine-wide error type

pub mod constraint;
pub mod error;
pub mod score;

pub use constraint::{ConstraintRef, ImpactType};
pub use error::{Result, StreamForgeError};
pub use score::{
    HardMediumSoftScore, HardSoftDecimalScore, HardSoftScore, ParseableScore, Score,
    ScoreLevel, ScoreParseError, SimpleScore,
};

/// Arbitrary-precision decimal used for decimal match weights and decimal scores.
pub use rust_decimal::Decimal;
