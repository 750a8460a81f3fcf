//! HardSoftDecimalScore - Two-level score with decimal levels
//!
//! This is the only built-in score type that accepts decimal match weights.

use std::fmt;

use rust_decimal::Decimal;

use super::traits::Score;
use super::ScoreLevel;

/// A score with separate hard and soft levels stored as [`Decimal`].
///
/// # Examples
///
/// ```
/// use streamforge_core::{Decimal, HardSoftDecimalScore, Score};
///
/// let score = HardSoftDecimalScore::of(Decimal::new(-15, 1), Decimal::new(25, 2));
/// assert!(!score.is_feasible());
/// assert_eq!(format!("{}", score), "-1.5hard/0.25soft");
///
/// let tripled = score.multiply_long(3);
/// assert_eq!(tripled, HardSoftDecimalScore::of(Decimal::new(-45, 1), Decimal::new(75, 2)));
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HardSoftDecimalScore {
    hard: Decimal,
    soft: Decimal,
}

impl HardSoftDecimalScore {
    /// The zero score.
    pub const ZERO: HardSoftDecimalScore = HardSoftDecimalScore::of(Decimal::ZERO, Decimal::ZERO);

    /// One hard constraint penalty.
    pub const ONE_HARD: HardSoftDecimalScore =
        HardSoftDecimalScore::of(Decimal::ONE, Decimal::ZERO);

    /// One soft constraint penalty.
    pub const ONE_SOFT: HardSoftDecimalScore =
        HardSoftDecimalScore::of(Decimal::ZERO, Decimal::ONE);

    /// Creates a new score from decimal levels.
    #[inline]
    pub const fn of(hard: Decimal, soft: Decimal) -> Self {
        HardSoftDecimalScore { hard, soft }
    }

    /// Creates a score from whole-number levels.
    pub fn of_i64(hard: i64, soft: i64) -> Self {
        HardSoftDecimalScore::of(Decimal::from(hard), Decimal::from(soft))
    }

    /// Returns the hard score component.
    #[inline]
    pub const fn hard(&self) -> Decimal {
        self.hard
    }

    /// Returns the soft score component.
    #[inline]
    pub const fn soft(&self) -> Decimal {
        self.soft
    }
}

impl Score for HardSoftDecimalScore {
    #[inline]
    fn has_hard_impact(&self) -> bool {
        !self.hard.is_zero()
    }

    #[inline]
    fn is_feasible(&self) -> bool {
        self.hard >= Decimal::ZERO
    }

    #[inline]
    fn zero() -> Self {
        HardSoftDecimalScore::ZERO
    }

    fn is_zero(&self) -> bool {
        self.hard.is_zero() && self.soft.is_zero()
    }

    #[inline]
    fn levels_count() -> usize {
        2
    }

    fn level_label(index: usize) -> ScoreLevel {
        match index {
            0 => ScoreLevel::Hard,
            1 => ScoreLevel::Soft,
            _ => panic!("HardSoftDecimalScore has 2 levels, got index {}", index),
        }
    }

    fn multiply_long(&self, multiplicand: i64) -> Self {
        let m = Decimal::from(multiplicand);
        HardSoftDecimalScore::of(self.hard * m, self.soft * m)
    }

    fn multiply_decimal(&self, multiplicand: Decimal) -> Self {
        HardSoftDecimalScore::of(self.hard * multiplicand, self.soft * multiplicand)
    }

    fn supports_decimal() -> bool {
        true
    }

    fn abs(&self) -> Self {
        HardSoftDecimalScore::of(self.hard.abs(), self.soft.abs())
    }
}

impl_score_ops!(HardSoftDecimalScore { hard, soft } => of);

impl fmt::Debug for HardSoftDecimalScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HardSoftDecimalScore({}, {})", self.hard, self.soft)
    }
}

impl fmt::Display for HardSoftDecimalScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}hard/{}soft",
            self.hard.normalize(),
            self.soft.normalize()
        )
    }
}

impl_score_parse!(HardSoftDecimalScore: Decimal { hard => "hard", soft => "soft" } => of);
