//! Configuration system for streamforge.
//!
//! Load engine configuration from TOML or YAML files to control runtime
//! assertions, branch pruning, and constraint weights without code changes.
//!
//! # Examples
//!
//! Load configuration from TOML string:
//!
//! ```
//! use streamforge_config::{EngineConfig, EnvironmentMode};
//! use streamforge_core::HardSoftScore;
//!
//! let config = EngineConfig::from_toml_str(r#"
//!     environment_mode = "full_assert"
//!
//!     [constraint_weights]
//!     "Room conflict" = "-1hard/0soft"
//!     "Teacher preference" = "0hard/0soft"
//! "#).unwrap();
//!
//! assert_eq!(config.environment_mode, EnvironmentMode::FullAssert);
//! assert_eq!(
//!     config.constraint_weight::<HardSoftScore>("Room conflict").unwrap(),
//!     Some(HardSoftScore::of(-1, 0))
//! );
//! ```
//!
//! Use default config when file is missing:
//!
//! ```
//! use streamforge_config::EngineConfig;
//!
//! let config = EngineConfig::load("engine.toml").unwrap_or_default();
//! // Proceeds with defaults if file doesn't exist
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use streamforge_core::ParseableScore;
use thiserror::Error;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Engine configuration for one or more scoring sessions.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct EngineConfig {
    /// Environment mode affecting runtime assertions.
    #[serde(default)]
    pub environment_mode: EnvironmentMode,

    /// Skip propagation into branches that only feed deactivated constraints.
    #[serde(default)]
    pub prune_inactive_branches: bool,

    /// Constraint weight overrides, keyed by constraint full name, as score strings.
    #[serde(default)]
    pub constraint_weights: BTreeMap<String, String>,
}

impl EngineConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if file doesn't exist or contains invalid TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_file(path)
    }

    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(s)?)
    }

    /// Sets the environment mode.
    pub fn with_environment_mode(mut self, mode: EnvironmentMode) -> Self {
        self.environment_mode = mode;
        self
    }

    /// Enables or disables pruning of branches feeding only deactivated constraints.
    pub fn with_prune_inactive_branches(mut self, prune: bool) -> Self {
        self.prune_inactive_branches = prune;
        self
    }

    /// Adds a constraint weight override as a score string.
    pub fn with_constraint_weight(
        mut self,
        constraint: impl Into<String>,
        weight: impl Into<String>,
    ) -> Self {
        self.constraint_weights.insert(constraint.into(), weight.into());
        self
    }

    /// Parses the configured weight for a constraint, if any.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the configured string is not a
    /// valid score of type `Sc`.
    pub fn constraint_weight<Sc: ParseableScore>(
        &self,
        constraint: &str,
    ) -> Result<Option<Sc>, ConfigError> {
        self.constraint_weights
            .get(constraint)
            .map(|raw| {
                Sc::parse(raw).map_err(|e| {
                    ConfigError::Invalid(format!("constraint weight for '{}': {}", constraint, e))
                })
            })
            .transpose()
    }

    /// Parses every configured weight.
    pub fn parsed_constraint_weights<Sc: ParseableScore>(
        &self,
    ) -> Result<Vec<(String, Sc)>, ConfigError> {
        self.constraint_weights
            .keys()
            .map(|name| {
                let weight = self.constraint_weight::<Sc>(name)?.ok_or_else(|| {
                    ConfigError::Invalid(format!("constraint weight for '{}' vanished", name))
                })?;
                Ok((name.clone(), weight))
            })
            .collect()
    }

    /// Returns true if every session operation must be checked against a
    /// from-scratch recomputation.
    pub fn is_full_assert(&self) -> bool {
        self.environment_mode == EnvironmentMode::FullAssert
    }
}

/// Environment mode affecting engine behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvironmentMode {
    /// Deterministic propagation with protocol checks only.
    #[default]
    Reproducible,

    /// Recompute the score from scratch after every fact change and fail on mismatch.
    FullAssert,
}

#[cfg(test)]
mod tests;
