//! Score analysis, constraint weights and runtime weight overrides.

pub mod analysis;
pub mod weight;
pub mod weight_overrides;


pub use analysis::{
    ConstraintAnalysis, ConstraintJustification, DetailedConstraintMatch, EntityRef, Indictment,
    IndictmentMap, ScoreExplanation,
};
pub use weight::{ConstraintWeight, MatchWeigher};
pub use weight_overrides::{ConstraintWeightOverrides, WeightProvider};
