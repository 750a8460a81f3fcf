//! Constraint weights and match weighers.

use std::fmt;

use rust_decimal::Decimal;
use streamforge_core::Score;

use crate::tuple::Tuple;

/// Computes the match weight of one tuple reaching a scoring terminal.
///
/// Exactly one numeric kind per constraint. Integer kinds multiply the
/// constraint weight exactly; the decimal kind needs a score type that
/// stores decimal levels.
pub enum MatchWeigher {
    Int(Box<dyn Fn(&Tuple) -> i32 + Send + Sync>),
    Long(Box<dyn Fn(&Tuple) -> i64 + Send + Sync>),
    Decimal(Box<dyn Fn(&Tuple) -> Decimal + Send + Sync>),
}

impl MatchWeigher {
    /// Every match weighs 1.
    pub fn unit() -> Self {
        MatchWeigher::Int(Box::new(|_| 1))
    }

    pub fn is_decimal(&self) -> bool {
        matches!(self, MatchWeigher::Decimal(_))
    }

    /// Constraint weight times match weight, before the impact sign.
    #[inline]
    pub(crate) fn weigh<Sc: Score>(&self, weight: &Sc, tuple: &Tuple) -> Sc {
        match self {
            MatchWeigher::Int(f) => weight.multiply_long(i64::from(f(tuple))),
            MatchWeigher::Long(f) => weight.multiply_long(f(tuple)),
            MatchWeigher::Decimal(f) => weight.multiply_decimal(f(tuple)),
        }
    }
}

impl fmt::Debug for MatchWeigher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            MatchWeigher::Int(_) => "Int",
            MatchWeigher::Long(_) => "Long",
            MatchWeigher::Decimal(_) => "Decimal",
        };
        write!(f, "MatchWeigher::{}", kind)
    }
}

/// Weight of a constraint: fixed when the pipeline is built, or resolved
/// per session from overrides and configuration.
///
/// A resolved weight of zero deactivates the constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintWeight<Sc: Score> {
    Fixed(Sc),
    /// Configurable, with the weight used when nothing overrides it.
    Configurable(Sc),
}

impl<Sc: Score> ConstraintWeight<Sc> {
    /// The weight used when no override applies.
    pub fn default_weight(&self) -> Sc {
        match self {
            ConstraintWeight::Fixed(w) | ConstraintWeight::Configurable(w) => *w,
        }
    }

    pub fn is_configurable(&self) -> bool {
        matches!(self, ConstraintWeight::Configurable(_))
    }
}
