//! Tests for session configuration.

use tupleforge_core::{HardSoftScore, SimpleScore};

use super::*;

#[test]
fn test_toml_parsing() {
    let toml = r#"
        environment_mode = "fast_assert"

        [constraint_weights]
        "Capacity" = "-1hard/0soft"
        "shifts/Preference" = "0hard/-3soft"
    "#;

    let config = SessionConfig::from_toml_str(toml).unwrap();
    assert_eq!(config.environment_mode, EnvironmentMode::FastAssert);
    assert!(config.node_sharing);
    assert_eq!(config.constraint_weights["Capacity"], "-1hard/0soft");
}

#[test]
fn test_yaml_parsing() {
    let yaml = r#"
        environment_mode: full_assert
        node_sharing: false
        constraint_weights:
          Capacity: "5"
    "#;

    let config = SessionConfig::from_yaml_str(yaml).unwrap();
    assert_eq!(config.environment_mode, EnvironmentMode::FullAssert);
    assert!(!config.node_sharing);
}

#[test]
fn test_empty_toml_is_default() {
    let config = SessionConfig::from_toml_str("").unwrap();
    assert_eq!(config, SessionConfig::default());
}

#[test]
fn test_unknown_mode_is_rejected() {
    let result = SessionConfig::from_toml_str(r#"environment_mode = "paranoid""#);
    assert!(matches!(result, Err(ConfigError::Toml(_))));
}

#[test]
fn test_builder() {
    let config = SessionConfig::new()
        .with_environment_mode(EnvironmentMode::Reproducible)
        .with_node_sharing(false)
        .with_constraint_weight("Capacity", "3");

    assert_eq!(config.environment_mode, EnvironmentMode::Reproducible);
    assert!(!config.node_sharing);
    assert_eq!(config.constraint_weights.len(), 1);
}

#[test]
fn test_parsed_weights() {
    let config = SessionConfig::new()
        .with_constraint_weight("A", "-2hard/0soft")
        .with_constraint_weight("B", "0hard/-7soft");

    let weights = config.parsed_weights::<HardSoftScore>().unwrap();
    assert_eq!(
        weights,
        vec![
            ("A".to_string(), HardSoftScore::of(-2, 0)),
            ("B".to_string(), HardSoftScore::of(0, -7)),
        ]
    );
}

#[test]
fn test_parsed_weights_reports_constraint() {
    let config = SessionConfig::new().with_constraint_weight("Broken", "lots");
    let err = config.parsed_weights::<SimpleScore>().unwrap_err();
    assert!(err.to_string().contains("Broken"));
}

#[test]
fn test_assert_levels() {
    assert!(!EnvironmentMode::NonReproducible.is_asserted());
    assert!(EnvironmentMode::FastAssert.is_asserted());
    assert!(!EnvironmentMode::FastAssert.is_fully_asserted());
    assert!(EnvironmentMode::FullAssert.is_fully_asserted());
}
