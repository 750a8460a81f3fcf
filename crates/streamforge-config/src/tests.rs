//! Tests for engine configuration.

use super::*;
use streamforge_core::{HardSoftScore, SimpleScore};

#[test]
fn test_toml_parsing() {
    let toml = r#"
        environment_mode = "full_assert"
        prune_inactive_branches = true

        [constraint_weights]
        "Unassigned shift" = "-1hard/0soft"
        "Preference" = "0hard/-3soft"
    "#;

    let config = EngineConfig::from_toml_str(toml).unwrap();
    assert_eq!(config.environment_mode, EnvironmentMode::FullAssert);
    assert!(config.prune_inactive_branches);
    assert!(config.is_full_assert());
    assert_eq!(config.constraint_weights.len(), 2);
    assert_eq!(
        config.constraint_weight::<HardSoftScore>("Preference").unwrap(),
        Some(HardSoftScore::of(0, -3))
    );
}

#[test]
fn test_yaml_parsing() {
    let yaml = r#"
        environment_mode: reproducible
        constraint_weights:
          Overtime: "-7"
    "#;

    let config = EngineConfig::from_yaml_str(yaml).unwrap();
    assert_eq!(config.environment_mode, EnvironmentMode::Reproducible);
    assert!(!config.prune_inactive_branches);
    assert_eq!(
        config.constraint_weight::<SimpleScore>("Overtime").unwrap(),
        Some(SimpleScore::of(-7))
    );
}

#[test]
fn test_defaults() {
    let config = EngineConfig::from_toml_str("").unwrap();
    assert_eq!(config, EngineConfig::default());
    assert_eq!(config.environment_mode, EnvironmentMode::Reproducible);
    assert!(config.constraint_weights.is_empty());
}

#[test]
fn test_missing_weight_is_none() {
    let config = EngineConfig::new();
    assert_eq!(config.constraint_weight::<SimpleScore>("Nope").unwrap(), None);
}

#[test]
fn test_invalid_weight_is_reported() {
    let config = EngineConfig::new().with_constraint_weight("Broken", "lots");
    let err = config.constraint_weight::<HardSoftScore>("Broken").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
    assert!(config.parsed_constraint_weights::<HardSoftScore>().is_err());
}

#[test]
fn test_builder_methods() {
    let config = EngineConfig::new()
        .with_environment_mode(EnvironmentMode::FullAssert)
        .with_prune_inactive_branches(true)
        .with_constraint_weight("A", "3")
        .with_constraint_weight("B", "-2");

    let weights = config.parsed_constraint_weights::<SimpleScore>().unwrap();
    assert_eq!(
        weights,
        vec![
            ("A".to_string(), SimpleScore::of(3)),
            ("B".to_string(), SimpleScore::of(-2)),
        ]
    );
}

#[test]
fn test_load_missing_file_errors() {
    let result = EngineConfig::load("/nonexistent/engine.toml");
    assert!(matches!(result, Err(ConfigError::Io(_))));
}

#[test]
fn test_unknown_mode_rejected() {
    let result = EngineConfig::from_toml_str(r#"environment_mode = "turbo""#);
    assert!(matches!(result, Err(ConfigError::Toml(_))));
}
