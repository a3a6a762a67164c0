//! Serializable simulation configuration.
//!
//! A [`SimConfig`] is the on-disk form of a [`Description`]: built-in rules
//! only, since custom [`Force`](crate::Force) plugins are code. Missing keys
//! fall back to the reference defaults, so `{}` is a valid config.
//!
//! ```json
//! {
//!   "block_size": 10,
//!   "seed": 7,
//!   "lifecycle": { "max_age": 80.0, "reset_one_in": 0 },
//!   "rules": [ { "Gravity": 0.5 }, { "Drag": 0.1 } ]
//! }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::emitter::Emitter;
use crate::error::ConfigError;
use crate::lifecycle::Lifecycle;
use crate::rules::Rule;
use crate::simulation::{Description, DEFAULT_BLOCK_SIZE};

/// Complete simulation configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub block_size: usize,
    pub seed: Option<u64>,
    pub lifecycle: Lifecycle,
    pub emitter: Emitter,
    pub rules: Vec<Rule>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            seed: None,
            lifecycle: Lifecycle::default(),
            emitter: Emitter::default(),
            rules: Vec::new(),
        }
    }
}

impl SimConfig {
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check values serde cannot reject on its own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.block_size == 0 {
            return Err(ConfigError::Invalid("block_size must be positive".into()));
        }
        if !(self.lifecycle.time_step.is_finite() && self.lifecycle.max_age.is_finite()) {
            return Err(ConfigError::Invalid(
                "lifecycle time_step and max_age must be finite".into(),
            ));
        }
        Ok(())
    }

    /// Build a solver description, rules registered in file order.
    pub fn to_description(&self) -> Result<Description, ConfigError> {
        self.validate()?;

        let mut description = Description::new()
            .with_block_size(self.block_size)
            .with_lifecycle(self.lifecycle.clone())
            .with_emitter(self.emitter.clone());
        if let Some(seed) = self.seed {
            description = description.with_seed(seed);
        }
        for rule in &self.rules {
            description = description.with_rule(rule.clone());
        }
        Ok(description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_empty_config_is_reference() {
        let config = SimConfig::from_json("{}").unwrap();
        assert_eq!(config, SimConfig::default());
        assert_eq!(config.block_size, 10);
        assert!(config.rules.is_empty());
    }

    #[test]
    fn test_to_description() {
        let config = SimConfig::from_json(
            r#"{
                "block_size": 4,
                "seed": 7,
                "lifecycle": { "max_age": 80.0 },
                "rules": [ { "Gravity": 0.5 }, { "Acceleration": [1.0, 0.0, 0.0] } ]
            }"#,
        )
        .unwrap();
        assert_eq!(config.rules[1], Rule::Acceleration(Vec3::X));

        let description = config.to_description().unwrap();
        assert_eq!(description.block_size(), 4);
        assert_eq!(description.seed(), Some(7));
        assert_eq!(description.forces().len(), 2);
        assert_eq!(description.lifecycle().max_age, 80.0);
        assert_eq!(description.lifecycle().time_step, 0.01);
    }

    #[test]
    fn test_zero_block_size_is_invalid() {
        let config = SimConfig {
            block_size: 0,
            ..SimConfig::default()
        };
        assert!(matches!(config.to_description(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            SimConfig::from_json("{ \"block_size\": -1 }"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("bparticles-config-{}.json", std::process::id()));
        let config = SimConfig {
            seed: Some(3),
            rules: vec![Rule::Drag(0.2)],
            ..SimConfig::default()
        };
        config.save(&path).unwrap();
        let loaded = SimConfig::load(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            SimConfig::load("/definitely/not/here.json"),
            Err(ConfigError::Io(_))
        ));
    }
}
