//! Score analysis types for detailed constraint tracking.
//!
//! A session produces these on demand from its live constraint matches:
//! [`ScoreExplanation`] breaks the score down per constraint and
//! [`IndictmentMap`] aggregates the same matches per fact.

use std::collections::HashMap;
use std::fmt::Debug;

use streamforge_core::{ConstraintRef, Score};

use crate::fact::Fact;

/// Reference to a fact involved in a constraint match.
///
/// Equality follows [`Fact`]: session facts compare by identity, derived
/// facts (group keys, collector results) by value.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct EntityRef {
    fact: Fact,
}

impl EntityRef {
    /// Creates a reference to a fact.
    pub fn new(fact: Fact) -> Self {
        Self { fact }
    }

    /// The referenced fact.
    pub fn fact(&self) -> &Fact {
        &self.fact
    }

    /// Attempts to downcast to the concrete entity type.
    pub fn as_entity<T: 'static>(&self) -> Option<&T> {
        self.fact.downcast_ref::<T>()
    }

    /// Full type name of the entity.
    pub fn type_name(&self) -> &'static str {
        self.fact.type_name()
    }

    /// Returns the short type name (without module path).
    pub fn short_type_name(&self) -> &'static str {
        let name = self.fact.type_name();
        name.rsplit("::").next().unwrap_or(name)
    }

    /// `Debug` rendering of the entity.
    pub fn display(&self) -> String {
        format!("{:?}", self.fact)
    }
}

impl Debug for EntityRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityRef")
            .field("type", &self.short_type_name())
            .field("id", &self.fact.id())
            .field("display", &self.display())
            .finish()
    }
}

/// Justification for why a constraint matched.
#[derive(Debug, Clone)]
pub struct ConstraintJustification {
    /// Facts of the matched tuple, in tuple order.
    pub entities: Vec<EntityRef>,
    /// Human-readable description of why the constraint matched.
    pub description: String,
}

impl ConstraintJustification {
    /// Creates a justification from entities, auto-generating description.
    pub fn new(entities: Vec<EntityRef>) -> Self {
        let description = if entities.is_empty() {
            "No entities".to_string()
        } else {
            entities
                .iter()
                .map(EntityRef::display)
                .collect::<Vec<_>>()
                .join(", ")
        };
        Self {
            entities,
            description,
        }
    }

    /// Creates a justification with a custom description.
    pub fn with_description(entities: Vec<EntityRef>, description: String) -> Self {
        Self {
            entities,
            description,
        }
    }
}

/// A detailed constraint match with entity information.
#[derive(Debug, Clone)]
pub struct DetailedConstraintMatch<Sc: Score> {
    /// Reference to the constraint that matched.
    pub constraint_ref: ConstraintRef,
    /// Score impact of this match.
    pub score: Sc,
    /// Justification with involved entities.
    pub justification: ConstraintJustification,
}

impl<Sc: Score> DetailedConstraintMatch<Sc> {
    /// Creates a new detailed constraint match.
    pub fn new(
        constraint_ref: ConstraintRef,
        score: Sc,
        justification: ConstraintJustification,
    ) -> Self {
        Self {
            constraint_ref,
            score,
            justification,
        }
    }
}

/// Per-constraint breakdown in a score explanation.
#[derive(Debug, Clone)]
pub struct ConstraintAnalysis<Sc: Score> {
    /// Constraint reference.
    pub constraint_ref: ConstraintRef,
    /// Resolved constraint weight for the session.
    pub weight: Sc,
    /// Total score from this constraint.
    pub score: Sc,
    /// All matches for this constraint.
    pub matches: Vec<DetailedConstraintMatch<Sc>>,
    /// Whether this is a hard constraint.
    pub is_hard: bool,
}

impl<Sc: Score> ConstraintAnalysis<Sc> {
    /// Creates a new constraint analysis.
    pub fn new(
        constraint_ref: ConstraintRef,
        weight: Sc,
        score: Sc,
        matches: Vec<DetailedConstraintMatch<Sc>>,
        is_hard: bool,
    ) -> Self {
        Self {
            constraint_ref,
            weight,
            score,
            matches,
            is_hard,
        }
    }

    /// Returns the number of matches.
    pub fn match_count(&self) -> usize {
        self.matches.len()
    }

    /// Returns the constraint name.
    pub fn name(&self) -> &str {
        &self.constraint_ref.name
    }

    /// Returns true if the resolved weight is zero.
    pub fn is_deactivated(&self) -> bool {
        self.weight.is_zero()
    }
}

/// Complete score explanation with per-constraint breakdown.
#[derive(Debug, Clone)]
pub struct ScoreExplanation<Sc: Score> {
    /// The total score.
    pub score: Sc,
    /// Per-constraint breakdown, in registration order.
    pub constraint_analyses: Vec<ConstraintAnalysis<Sc>>,
}

impl<Sc: Score> ScoreExplanation<Sc> {
    /// Creates a new score explanation.
    pub fn new(score: Sc, constraint_analyses: Vec<ConstraintAnalysis<Sc>>) -> Self {
        Self {
            score,
            constraint_analyses,
        }
    }

    /// Returns the total match count across all constraints.
    pub fn total_match_count(&self) -> usize {
        self.constraint_analyses.iter().map(|a| a.match_count()).sum()
    }

    /// Returns constraints with non-zero scores.
    pub fn non_zero_constraints(&self) -> Vec<&ConstraintAnalysis<Sc>> {
        self.constraint_analyses
            .iter()
            .filter(|a| !a.score.is_zero())
            .collect()
    }

    /// Returns the analysis of one constraint by full name.
    pub fn constraint(&self, full_name: &str) -> Option<&ConstraintAnalysis<Sc>> {
        self.constraint_analyses
            .iter()
            .find(|a| a.constraint_ref.full_name() == full_name)
    }

    /// Returns all detailed matches across all constraints.
    pub fn all_matches(&self) -> Vec<&DetailedConstraintMatch<Sc>> {
        self.constraint_analyses
            .iter()
            .flat_map(|a| &a.matches)
            .collect()
    }
}

/// Analysis of how a single entity impacts the score.
#[derive(Debug, Clone)]
pub struct Indictment<Sc: Score> {
    /// The entity being analyzed.
    pub entity: EntityRef,
    /// Total score impact from this entity.
    pub score: Sc,
    /// Matches involving this entity, grouped by constraint.
    pub constraint_matches: HashMap<ConstraintRef, Vec<DetailedConstraintMatch<Sc>>>,
}

impl<Sc: Score> Indictment<Sc> {
    /// Creates a new indictment for an entity.
    pub fn new(entity: EntityRef) -> Self {
        Self {
            entity,
            score: Sc::zero(),
            constraint_matches: HashMap::new(),
        }
    }

    /// Adds a match to this indictment.
    pub fn add_match(&mut self, constraint_match: DetailedConstraintMatch<Sc>) {
        self.score = self.score + constraint_match.score;
        self.constraint_matches
            .entry(constraint_match.constraint_ref.clone())
            .or_default()
            .push(constraint_match);
    }

    /// Returns the total number of constraint matches.
    pub fn match_count(&self) -> usize {
        self.constraint_matches.values().map(|v| v.len()).sum::<usize>()
    }

    /// Returns the constraint refs for all matched constraints.
    pub fn violated_constraints(&self) -> Vec<&ConstraintRef> {
        let mut refs: Vec<_> = self.constraint_matches.keys().collect();
        refs.sort();
        refs
    }

    /// Returns the number of distinct constraints matched.
    pub fn constraint_count(&self) -> usize {
        self.constraint_matches.len()
    }
}

/// Map of entity indictments for analyzing which entities cause violations.
#[derive(Debug, Clone)]
pub struct IndictmentMap<Sc: Score> {
    /// Indictments keyed by entity reference.
    pub indictments: HashMap<EntityRef, Indictment<Sc>>,
}

impl<Sc: Score> IndictmentMap<Sc> {
    /// Creates an empty indictment map.
    pub fn new() -> Self {
        Self {
            indictments: HashMap::new(),
        }
    }

    /// Builds an indictment map from a collection of detailed matches.
    ///
    /// A fact appearing twice in one match (a self-join pair) is indicted once
    /// for that match.
    pub fn from_matches(matches: Vec<DetailedConstraintMatch<Sc>>) -> Self {
        let mut map = Self::new();
        for m in matches {
            let entities = &m.justification.entities;
            for (position, entity) in entities.iter().enumerate() {
                if entities[..position].contains(entity) {
                    continue;
                }
                map.indictments
                    .entry(entity.clone())
                    .or_insert_with(|| Indictment::new(entity.clone()))
                    .add_match(m.clone());
            }
        }
        map
    }

    /// Gets the indictment for a specific entity.
    pub fn get(&self, entity: &EntityRef) -> Option<&Indictment<Sc>> {
        self.indictments.get(entity)
    }

    /// Gets the indictment for a fact.
    pub fn get_fact(&self, fact: &Fact) -> Option<&Indictment<Sc>> {
        self.indictments.get(&EntityRef::new(fact.clone()))
    }

    /// Returns all indicted entities.
    pub fn entities(&self) -> impl Iterator<Item = &EntityRef> {
        self.indictments.keys()
    }

    /// Returns entities sorted by worst score impact (most negative first).
    ///
    /// Ties are broken by display string so the order is stable.
    pub fn worst_entities(&self) -> Vec<&EntityRef> {
        let mut entities: Vec<_> = self.indictments.keys().collect();
        entities.sort_by(|a, b| {
            let score_a = &self.indictments[*a].score;
            let score_b = &self.indictments[*b].score;
            score_a
                .cmp(score_b)
                .then_with(|| a.display().cmp(&b.display()))
        });
        entities
    }

    /// Returns the number of indicted entities.
    pub fn len(&self) -> usize {
        self.indictments.len()
    }

    /// Returns true if no entities are indicted.
    pub fn is_empty(&self) -> bool {
        self.indictments.is_empty()
    }
}

impl<Sc: Score> Default for IndictmentMap<Sc> {
    fn default() -> Self {
        Self::new()
    }
}
