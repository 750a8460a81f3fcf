//! Read-only views over a session's scoring terminals.

use streamforge_core::{ConstraintRef, Score};

use crate::tuple::Tuple;

/// One live tuple at a scoring terminal and the score it contributes.
#[derive(Debug, Clone)]
pub struct ConstraintMatch<Sc: Score> {
    pub constraint_ref: ConstraintRef,
    pub tuple: Tuple,
    /// Signed contribution: negative for penalties, positive for rewards.
    pub score: Sc,
}

/// Running total of one constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintResult<Sc: Score> {
    pub constraint_ref: ConstraintRef,
    pub score: Sc,
    pub match_count: usize,
    /// True if the resolved weight touches a hard level.
    pub is_hard: bool,
}

impl<Sc: Score> ConstraintResult<Sc> {
    /// Returns the constraint name.
    pub fn name(&self) -> &str {
        &self.constraint_ref.name
    }
}
