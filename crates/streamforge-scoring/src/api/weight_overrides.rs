// Runtime constraint weight configuration.
//
// Overrides apply to configurable constraints only and are resolved once per
// session, so one pipeline can be scored under different weightings.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use streamforge_config::EngineConfig;
use streamforge_core::{ParseableScore, Result, Score, StreamForgeError};

// Holds runtime overrides for configurable constraint weights, keyed by the
// constraint's full name (`package/name`, or `name` without a package).
//
// A zero weight deactivates the constraint for the session.
#[derive(Clone)]
pub struct ConstraintWeightOverrides<Sc: Score> {
    weights: HashMap<String, Sc>,
}

impl<Sc: Score> Debug for ConstraintWeightOverrides<Sc> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConstraintWeightOverrides")
            .field("count", &self.weights.len())
            .finish()
    }
}

impl<Sc: Score> Default for ConstraintWeightOverrides<Sc> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Sc: Score> ConstraintWeightOverrides<Sc> {
    // Creates an empty overrides container.
    pub fn new() -> Self {
        Self {
            weights: HashMap::new(),
        }
    }

    // Creates overrides from an iterator of (name, weight) pairs.
    pub fn from_pairs<I, N>(iter: I) -> Self
    where
        I: IntoIterator<Item = (N, Sc)>,
        N: Into<String>,
    {
        let weights = iter.into_iter().map(|(n, w)| (n.into(), w)).collect();
        Self { weights }
    }

    // Sets the weight for a constraint.
    pub fn put<N: Into<String>>(&mut self, name: N, weight: Sc) {
        self.weights.insert(name.into(), weight);
    }

    // Removes the override for a constraint.
    pub fn remove(&mut self, name: &str) -> Option<Sc> {
        self.weights.remove(name)
    }

    // Gets the overridden weight, or returns the default if not overridden.
    pub fn get_or_default(&self, name: &str, default: Sc) -> Sc {
        self.weights.get(name).copied().unwrap_or(default)
    }

    // Gets the overridden weight if present.
    pub fn get(&self, name: &str) -> Option<&Sc> {
        self.weights.get(name)
    }

    // Returns true if this constraint has an override.
    pub fn contains(&self, name: &str) -> bool {
        self.weights.contains_key(name)
    }

    // Names of every overridden constraint.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.weights.keys().map(String::as_str)
    }

    // Returns the number of overrides.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    // Returns true if there are no overrides.
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    // Clears all overrides.
    pub fn clear(&mut self) {
        self.weights.clear();
    }

    // Copies every override of `other` into `self`, replacing existing ones.
    pub fn merge(&mut self, other: &Self) {
        for (name, weight) in &other.weights {
            self.weights.insert(name.clone(), *weight);
        }
    }

    // Creates an Arc-wrapped version for sharing across threads.
    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl<Sc: ParseableScore> ConstraintWeightOverrides<Sc> {
    // Reads the `[constraint_weights]` table of an engine configuration.
    //
    // Fails with `Config` if any weight string does not parse as `Sc`.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let pairs = config
            .parsed_constraint_weights::<Sc>()
            .map_err(|e| StreamForgeError::Config(e.to_string()))?;
        Ok(Self::from_pairs(pairs))
    }
}

// Source of per-session weights for configurable constraints.
pub trait WeightProvider<Sc: Score>: Send + Sync {
    // Gets the weight for a constraint by full name.
    fn weight(&self, name: &str) -> Option<Sc>;

    // Gets the weight or returns the default.
    fn weight_or_default(&self, name: &str, default: Sc) -> Sc {
        self.weight(name).unwrap_or(default)
    }
}

impl<Sc: Score> WeightProvider<Sc> for ConstraintWeightOverrides<Sc> {
    fn weight(&self, name: &str) -> Option<Sc> {
        self.get(name).copied()
    }
}

impl<Sc: Score> WeightProvider<Sc> for Arc<ConstraintWeightOverrides<Sc>> {
    fn weight(&self, name: &str) -> Option<Sc> {
        self.get(name).copied()
    }
}
