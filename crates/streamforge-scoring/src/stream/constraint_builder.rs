// Terminal builder: weights and the constraint name.

use rust_decimal::Decimal;
use streamforge_core::{ConstraintRef, ImpactType, Score};

use super::ConstraintFactory;
use crate::api::weight::{ConstraintWeight, MatchWeigher};
use crate::graph::NodeId;
use crate::tuple::Tuple;

/// Finalizes a stream into a named constraint.
///
/// Every match weighs 1 unless a match weigher is set.
pub struct ConstraintBuilder<'f, Sc: Score> {
    factory: &'f ConstraintFactory<Sc>,
    node: NodeId,
    impact: ImpactType,
    weight: ConstraintWeight<Sc>,
    weigher: MatchWeigher,
}

impl<'f, Sc: Score> ConstraintBuilder<'f, Sc> {
    pub(crate) fn new(
        factory: &'f ConstraintFactory<Sc>,
        node: NodeId,
        impact: ImpactType,
        weight: ConstraintWeight<Sc>,
    ) -> Self {
        Self {
            factory,
            node,
            impact,
            weight,
            weigher: MatchWeigher::unit(),
        }
    }

    /// Multiplies the constraint weight by an `i32` per match.
    pub fn with_match_weight<W>(mut self, match_weight: W) -> Self
    where
        W: Fn(&Tuple) -> i32 + Send + Sync + 'static,
    {
        self.weigher = MatchWeigher::Int(Box::new(match_weight));
        self
    }

    /// Multiplies the constraint weight by an `i64` per match.
    pub fn with_long_match_weight<W>(mut self, match_weight: W) -> Self
    where
        W: Fn(&Tuple) -> i64 + Send + Sync + 'static,
    {
        self.weigher = MatchWeigher::Long(Box::new(match_weight));
        self
    }

    /// Multiplies the constraint weight by a [`Decimal`] per match.
    ///
    /// Only valid for score types with decimal levels; `build` fails otherwise.
    pub fn with_decimal_match_weight<W>(mut self, match_weight: W) -> Self
    where
        W: Fn(&Tuple) -> Decimal + Send + Sync + 'static,
    {
        self.weigher = MatchWeigher::Decimal(Box::new(match_weight));
        self
    }

    /// Registers the constraint under `name`.
    pub fn as_constraint(self, name: &str) -> ConstraintRef {
        self.as_constraint_in("", name)
    }

    /// Registers the constraint under `package/name`.
    pub fn as_constraint_in(self, package: &str, name: &str) -> ConstraintRef {
        let constraint_ref = ConstraintRef::new(package, name);
        self.factory.graph.borrow_mut().add_constraint(
            self.node,
            constraint_ref.clone(),
            self.impact,
            self.weight,
            self.weigher,
        );
        constraint_ref
    }
}
