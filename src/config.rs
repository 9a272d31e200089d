//! Configuration structures for training
//!
//! This module provides the training configuration a network is built with:
//! the gradient descent learning rate and the seed used for weight
//! initialization.

use serde::Deserialize;
use std::fs;

use crate::error::{NetworkError, Result};

fn default_learning_rate() -> f32 {
    0.01
}

/// Configuration for training.
///
/// Parsed from JSON; every field is optional.
///
/// # Example
///
/// ```json
/// {
///   "learning_rate": 0.5,
///   "seed": 42
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrainingConfig {
    /// Step size of the gradient descent update (default 0.01)
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f32,

    /// Seed for weight initialization; `None` seeds from the OS
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            learning_rate: default_learning_rate(),
            seed: None,
        }
    }
}

impl TrainingConfig {
    pub fn with_learning_rate(mut self, learning_rate: f32) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Check that the learning rate is usable.
    pub fn validate(&self) -> Result<()> {
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(NetworkError::configuration(format!(
                "learning_rate must be finite and positive, got {}",
                self.learning_rate
            )));
        }
        Ok(())
    }
}

/// Parse and validate a training configuration from a JSON string.
pub fn parse_config(contents: &str) -> Result<TrainingConfig> {
    let config: TrainingConfig = serde_json::from_str(contents)?;
    config.validate()?;
    Ok(config)
}

/// Loads a training configuration from a JSON file.
///
/// # Examples
///
/// ```no_run
/// use feedforward_nn::config::load_config;
///
/// let cfg = load_config("config/training.json").unwrap();
/// assert!(cfg.learning_rate > 0.0);
/// ```
pub fn load_config(path: &str) -> Result<TrainingConfig> {
    let contents = fs::read_to_string(path)?;
    parse_config(&contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = parse_config("{}").unwrap();
        assert_eq!(config, TrainingConfig::default());
        assert_eq!(config.learning_rate, 0.01);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn test_negative_learning_rate_rejected() {
        let err = parse_config(r#"{"learning_rate": -0.1}"#).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = parse_config(r#"{"momentum": 0.9}"#).unwrap_err();
        assert!(matches!(err, NetworkError::Json(_)));
    }
}
