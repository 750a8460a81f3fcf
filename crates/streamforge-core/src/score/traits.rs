//! Core Score trait definition

use std::cmp::Ordering;
use std::fmt::{Debug, Display};
use std::ops::{Add, Neg, Sub};

use rust_decimal::Decimal;

use super::ScoreLevel;

/// Core trait for all score types in streamforge.
///
/// Scores represent the quality of the working set. The engine only ever adds
/// and subtracts scores; the multiplication methods exist so that a scoring
/// terminal can turn a constraint weight and a match weight into one
/// contribution.
///
/// All score implementations must be:
/// - Immutable (operations return new instances)
/// - Thread-safe (Send + Sync)
/// - Comparable (total ordering)
pub trait Score:
    Copy
    + Debug
    + Display
    + Default
    + Send
    + Sync
    + PartialEq
    + Eq
    + PartialOrd
    + Ord
    + Add<Output = Self>
    + Sub<Output = Self>
    + Neg<Output = Self>
    + 'static
{
    /// Returns true if this score represents a feasible solution.
    ///
    /// A solution is feasible when all hard constraints are satisfied
    /// (i.e., the hard score is >= 0).
    fn is_feasible(&self) -> bool;

    /// Returns the zero score (identity element for addition).
    fn zero() -> Self;

    /// Returns true if every level of this score is zero.
    fn is_zero(&self) -> bool {
        *self == Self::zero()
    }

    /// Returns true if a hard level of this score is non-zero.
    ///
    /// Score types without a hard level always return false.
    fn has_hard_impact(&self) -> bool {
        false
    }

    /// Returns the number of score levels.
    fn levels_count() -> usize;

    /// Returns the semantic label for the score level at the given index.
    ///
    /// # Panics
    /// Panics if `index >= levels_count()`.
    fn level_label(index: usize) -> ScoreLevel;

    /// Multiplies every level by an integer match weight.
    ///
    /// Overflow is not defended against; keeping weights in range is the
    /// responsibility of whoever writes the weigher.
    fn multiply_long(&self, multiplicand: i64) -> Self;

    /// Multiplies every level by a decimal match weight.
    ///
    /// Integer-backed scores round half away from zero and saturate on overflow.
    fn multiply_decimal(&self, multiplicand: Decimal) -> Self;

    /// Returns true if this score type stores decimal levels.
    ///
    /// Pipelines reject decimal match weighers for score types that return false.
    fn supports_decimal() -> bool {
        false
    }

    /// Returns the absolute value of this score.
    fn abs(&self) -> Self;

    /// Compares two scores, returning the ordering.
    fn compare(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }

    /// Returns true if this score is better than the other score.
    fn is_better_than(&self, other: &Self) -> bool {
        self > other
    }

    /// Returns true if this score is worse than the other score.
    fn is_worse_than(&self, other: &Self) -> bool {
        self < other
    }
}

/// Marker trait for scores that can be parsed from a string.
///
/// Used to read constraint weights from configuration files.
pub trait ParseableScore: Score {
    /// Parses a score from a string representation.
    ///
    /// # Format
    /// - SimpleScore: "42" or "42init"
    /// - HardSoftScore: "0hard/-100soft" or "-1hard/0soft"
    /// - HardMediumSoftScore: "0hard/0medium/-100soft"
    /// - HardSoftDecimalScore: "-1.5hard/0.25soft"
    fn parse(s: &str) -> Result<Self, ScoreParseError>;

    /// Returns the string representation of this score.
    fn to_string_repr(&self) -> String;
}

/// Error when parsing a score from string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreParseError {
    pub message: String,
}

impl std::fmt::Display for ScoreParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Score parse error: {}", self.message)
    }
}

impl std::error::Error for ScoreParseError {}

/// Multiplies an integer level by a decimal, rounding and saturating.
pub(crate) fn scale_level(level: i64, multiplicand: Decimal) -> i64 {
    use num_traits::ToPrimitive;
    use rust_decimal::RoundingStrategy;

    let product = Decimal::from(level).checked_mul(multiplicand);
    let rounded =
        product.map(|p| p.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero));
    match rounded.and_then(|p| p.to_i64()) {
        Some(value) => value,
        None if (level < 0) == multiplicand.is_sign_negative() => i64::MAX,
        None => i64::MIN,
    }
}
