//! Configuration system for TupleForge.
//!
//! Load session configuration from TOML or YAML to control assertion
//! modes, node sharing and constraint weights without code changes.
//!
//! # Examples
//!
//! ```
//! use tupleforge_config::{EnvironmentMode, SessionConfig};
//!
//! let config = SessionConfig::from_toml_str(r#"
//!     environment_mode = "full_assert"
//!     node_sharing = false
//!
//!     [constraint_weights]
//!     "rooms/Capacity" = "-2hard/0soft"
//! "#).unwrap();
//!
//! assert_eq!(config.environment_mode, EnvironmentMode::FullAssert);
//! assert!(!config.node_sharing);
//! assert_eq!(config.constraint_weights.len(), 1);
//! ```
//!
//! Use default config when file is missing:
//!
//! ```
//! use tupleforge_config::SessionConfig;
//!
//! let config = SessionConfig::load("session.toml").unwrap_or_default();
//! assert!(config.node_sharing);
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tupleforge_core::ParseableScore;

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

/// Session configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct SessionConfig {
    /// Environment mode controlling runtime self-checks.
    #[serde(default)]
    pub environment_mode: EnvironmentMode,

    /// Share `From` and `Distinct` nodes between constraints.
    #[serde(default = "default_node_sharing")]
    pub node_sharing: bool,

    /// Constraint weight overrides, keyed by full constraint name and
    /// written in the score type's string format.
    #[serde(default)]
    pub constraint_weights: BTreeMap<String, String>,
}

fn default_node_sharing() -> bool {
    true
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            environment_mode: EnvironmentMode::default(),
            node_sharing: true,
            constraint_weights: BTreeMap::new(),
        }
    }
}

impl SessionConfig {
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

    pub fn with_environment_mode(mut self, mode: EnvironmentMode) -> Self {
        self.environment_mode = mode;
        self
    }

    pub fn with_node_sharing(mut self, enabled: bool) -> Self {
        self.node_sharing = enabled;
        self
    }

    /// Adds a weight override for a constraint.
    pub fn with_constraint_weight(
        mut self,
        constraint: impl Into<String>,
        weight: impl Into<String>,
    ) -> Self {
        self.constraint_weights
            .insert(constraint.into(), weight.into());
        self
    }

    /// Parses every configured weight as the given score type.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first unparseable weight.
    pub fn parsed_weights<Sc: ParseableScore>(&self) -> Result<Vec<(String, Sc)>, ConfigError> {
        self.constraint_weights
            .iter()
            .map(|(name, text)| {
                Sc::parse(text)
                    .map(|score| (name.clone(), score))
                    .map_err(|e| {
                        ConfigError::Invalid(format!("weight of constraint {}: {}", name, e))
                    })
            })
            .collect()
    }
}

/// Environment mode affecting session self-checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvironmentMode {
    /// No self-checks.
    #[default]
    NonReproducible,

    /// No self-checks. Propagation order is deterministic in every mode,
    /// so this only documents intent.
    Reproducible,

    /// Verifies score bookkeeping after every mutation.
    FastAssert,

    /// Additionally recalculates the score from scratch after every
    /// mutation and compares it with the incremental score.
    FullAssert,
}

impl EnvironmentMode {
    pub fn is_asserted(self) -> bool {
        matches!(self, EnvironmentMode::FastAssert | EnvironmentMode::FullAssert)
    }

    pub fn is_fully_asserted(self) -> bool {
        self == EnvironmentMode::FullAssert
    }
}

#[cfg(test)]
mod tests;
