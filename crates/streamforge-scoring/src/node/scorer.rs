//! Scoring terminal.

use std::collections::BTreeMap;

use streamforge_core::{ImpactType, Result, Score};

use super::violation;
use crate::graph::{ConstraintSpec, NodeLabel};
use crate::tuple::{Delta, Tuple, TupleId};

/// A live match and the signed score it contributes.
#[derive(Debug, Clone)]
pub(crate) struct ScoredMatch<Sc: Score> {
    pub(crate) tuple: Tuple,
    pub(crate) score: Sc,
}

pub(crate) struct ScorerState<Sc: Score> {
    weight: Sc,
    matches: BTreeMap<TupleId, ScoredMatch<Sc>>,
    total: Sc,
}

impl<Sc: Score> ScorerState<Sc> {
    pub(crate) fn new(weight: Sc) -> Self {
        Self {
            weight,
            matches: BTreeMap::new(),
            total: Sc::zero(),
        }
    }

    pub(crate) fn apply(
        &mut self,
        node: NodeLabel<'_>,
        constraint: &ConstraintSpec<Sc>,
        delta: Delta,
    ) -> Result<()> {
        match delta {
            Delta::Insert(id, tuple) => {
                if self.matches.contains_key(&id) {
                    return Err(violation(node, format!("tuple {} inserted twice", id)));
                }
                let magnitude = constraint.weigher.weigh(&self.weight, &tuple);
                // Stored so that retraction subtracts exactly what was added.
                let score = match constraint.impact {
                    ImpactType::Penalty => -magnitude,
                    ImpactType::Reward => magnitude,
                };
                self.total = self.total + score;
                self.matches.insert(id, ScoredMatch { tuple, score });
            }
            Delta::Retract(id) => {
                let removed = self
                    .matches
                    .remove(&id)
                    .ok_or_else(|| violation(node, format!("retract of unknown match {}", id)))?;
                self.total = self.total - removed.score;
            }
        }
        Ok(())
    }

    /// Sum of all live contributions.
    pub(crate) fn total(&self) -> Sc {
        self.total
    }

    pub(crate) fn match_count(&self) -> usize {
        self.matches.len()
    }

    /// Live matches in emission order.
    pub(crate) fn matches(&self) -> impl Iterator<Item = &ScoredMatch<Sc>> {
        self.matches.values()
    }

    #[cfg(test)]
    pub(crate) fn outputs(&self) -> Vec<Tuple> {
        self.matches.values().map(|m| m.tuple.clone()).collect()
    }
}
