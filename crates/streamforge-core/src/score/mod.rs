//! Score types for representing the quality of a working set
//!
//! Scores are accumulated incrementally by the scoring terminals of a
//! constraint pipeline. All score types are immutable values with arithmetic
//! operations; multi-level scores compare the highest-priority level first.

#[macro_use]
mod macros;

mod hard_medium_soft;
mod hard_soft;
mod hard_soft_decimal;
mod simple;
mod traits;

#[cfg(test)]
mod tests;

pub use hard_medium_soft::HardMediumSoftScore;
pub use hard_soft::HardSoftScore;
pub use hard_soft_decimal::HardSoftDecimalScore;
pub use simple::SimpleScore;
pub use traits::{ParseableScore, Score, ScoreParseError};

/// Score level representing different constraint priorities.
///
/// Used by [`Score::level_label`] to classify what a given level index
/// represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoreLevel {
    /// Hard constraints - must be satisfied for feasibility.
    Hard,
    /// Medium constraints - secondary priority.
    Medium,
    /// Soft constraints - optimization objectives.
    Soft,
}
