//! Configuration structures for training
//!
//! This module provides the JSON training configuration: the network topology
//! and the optimizer (with its hyperparameters) used to train it.

use crate::error::{Error, Result};
use crate::network::DEFAULT_EPSILON;
use crate::optimizers::{EvolutionConfig, SgdConfig};
use crate::utils::ActivationFunction;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Network topology and initialization settings.
///
/// Input and output widths come from the training data, so only the hidden
/// layers are configured here.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Widths of the hidden layers, in order
    pub hidden_layers: Vec<usize>,
    /// Activation used by every layer: "sigmoid" or "linear"
    pub activation: ActivationFunction,
    /// Centre of the Normal(epsilon, 2 * epsilon) weight initialization
    pub init_epsilon: f64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            hidden_layers: vec![2],
            activation: ActivationFunction::Sigmoid,
            init_epsilon: DEFAULT_EPSILON,
        }
    }
}

/// Optimizer selection, tagged by `"type"`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OptimizerConfig {
    /// Stochastic gradient descent
    Sgd(SgdConfig),
    /// Fast evolutionary programming
    Evolutionary(EvolutionConfig),
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        OptimizerConfig::Sgd(SgdConfig::default())
    }
}

/// Configuration for a training run.
///
/// # Example
///
/// ```json
/// {
///   "network": { "hidden_layers": [2], "activation": "sigmoid" },
///   "optimizer": { "type": "evolutionary", "population_size": 100, "max_fitness_evaluations": 100000 }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Hidden topology, activation and initialization
    pub network: NetworkConfig,
    /// Optimizer and its hyperparameters
    pub optimizer: OptimizerConfig,
}

/// Loads a training configuration from a JSON file.
///
/// Reads the file at `path` and deserializes its JSON contents into a `TrainingConfig`.
///
/// # Returns
///
/// `Ok(TrainingConfig)` on success, or an error if the file cannot be read, the
/// JSON is invalid, or a value is out of range.
///
/// # Examples
///
/// ```no_run
/// use feedforward_optimizers::config::load_config;
///
/// let cfg = load_config("config/xor_sgd.json").unwrap();
/// assert_eq!(cfg.network.hidden_layers, vec![2]);
/// ```
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<TrainingConfig> {
    let contents = fs::read_to_string(path)?;
    parse_config(&contents)
}

/// Parses and validates a training configuration from a JSON string.
pub fn parse_config(contents: &str) -> Result<TrainingConfig> {
    let config: TrainingConfig = serde_json::from_str(contents)?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &TrainingConfig) -> Result<()> {
    let network = &config.network;
    if let Some(index) = network.hidden_layers.iter().position(|&width| width == 0) {
        return Err(Error::InvalidConfig(format!(
            "hidden layer {} must have at least one unit",
            index
        )));
    }
    if !(network.init_epsilon.is_finite() && network.init_epsilon > 0.0) {
        return Err(Error::InvalidConfig(
            "init_epsilon must be positive".to_string(),
        ));
    }

    match &config.optimizer {
        OptimizerConfig::Sgd(sgd) => sgd
            .validate()
            .map_err(|e| Error::InvalidConfig(e.to_string())),
        OptimizerConfig::Evolutionary(evolution) => {
            evolution
                .validate()
                .map_err(|e| Error::InvalidConfig(e.to_string()))?;
            if evolution.max_fitness_evaluations == 0 {
                return Err(Error::InvalidConfig(
                    "max_fitness_evaluations must be greater than 0".to_string(),
                ));
            }
            Ok(())
        }
    }
}
