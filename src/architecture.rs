//! Declarative network description
//!
//! This module parses an ordered list of layer descriptors from JSON and
//! builds a [`Network`] from it, so architectures can change without code
//! changes. Unknown fields are rejected rather than ignored.
//!
//! Generator-function initializers cannot be expressed in JSON; build those
//! layers programmatically with [`DenseParams`].

use ndarray::Array2;
use serde::{Deserialize, Deserializer};
use std::fs;
use tracing::info;

use crate::config::TrainingConfig;
use crate::error::{NetworkError, Result};
use crate::layers::{BiasInit, DenseParams, InputParams, LayerConfig, WeightInit};
use crate::network::Network;
use crate::utils::activations::ActivationKind;

/// Parameters of an input descriptor.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputSpec {
    /// Width of one example
    pub shape: usize,
    pub name: Option<String>,
}

/// Parameters of a dense descriptor.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DenseSpec {
    pub neurons: usize,
    /// `"sigmoid"`, `"relu"`, or `"none"` / absent for no activation
    #[serde(default, deserialize_with = "activation_or_none")]
    pub activation: Option<ActivationKind>,
    /// Weight rows (one per neuron); absent for the default initializer
    #[serde(default)]
    pub weight_init: Option<Vec<Vec<f32>>>,
    /// Scalar bias; absent for the default initializer
    #[serde(default)]
    pub bias_init: Option<f32>,
    pub name: Option<String>,
}

fn activation_or_none<'de, D>(deserializer: D) -> std::result::Result<Option<ActivationKind>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(rename_all = "lowercase")]
    enum Selector {
        Sigmoid,
        Relu,
        None,
    }

    Ok(match Option::<Selector>::deserialize(deserializer)? {
        Some(Selector::Sigmoid) => Some(ActivationKind::Sigmoid),
        Some(Selector::Relu) => Some(ActivationKind::Relu),
        Some(Selector::None) | None => None,
    })
}

/// One layer descriptor, tagged by `"type"`.
///
/// # Examples
///
/// ```json
/// { "type": "input", "shape": 784 }
/// ```
///
/// ```json
/// { "type": "dense", "neurons": 10, "activation": "sigmoid", "bias_init": 0.0 }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LayerSpec {
    Input(InputSpec),
    Dense(DenseSpec),
}

/// Configuration for the entire network architecture.
///
/// Layers are added in the order they appear; the first must be an input.
///
/// ```json
/// {
///   "layers": [
///     { "type": "input", "shape": 784 },
///     { "type": "dense", "neurons": 128, "activation": "relu" },
///     { "type": "dense", "neurons": 10 }
///   ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArchitectureConfig {
    pub layers: Vec<LayerSpec>,
}

impl LayerSpec {
    /// Convert into the parameters `Network::add_layer` accepts.
    pub fn to_layer_config(&self) -> Result<LayerConfig> {
        match self {
            LayerSpec::Input(spec) => Ok(LayerConfig::Input(InputParams {
                shape: spec.shape,
                name: spec.name.clone(),
            })),
            LayerSpec::Dense(spec) => {
                let weight_init = match &spec.weight_init {
                    Some(rows) => WeightInit::Fixed(rows_to_matrix(rows, spec)?),
                    None => WeightInit::Default,
                };
                let bias_init = match spec.bias_init {
                    Some(bias) => BiasInit::Fixed(bias),
                    None => BiasInit::Default,
                };
                Ok(LayerConfig::Dense(DenseParams {
                    neurons: spec.neurons,
                    activation: spec.activation,
                    weight_init,
                    bias_init,
                    name: spec.name.clone(),
                }))
            }
        }
    }
}

fn rows_to_matrix(rows: &[Vec<f32>], spec: &DenseSpec) -> Result<Array2<f32>> {
    let label = spec.name.as_deref().unwrap_or("dense");
    let cols = rows.first().map(Vec::len).unwrap_or(0);
    if let Some(bad) = rows.iter().find(|row| row.len() != cols) {
        return Err(NetworkError::shape(label, cols, bad.len()));
    }
    let flat: Vec<f32> = rows.iter().flatten().copied().collect();
    Array2::from_shape_vec((rows.len(), cols), flat).map_err(|e| {
        NetworkError::configuration(format!("invalid weight_init for '{}': {}", label, e))
    })
}

/// Parse an architecture from a JSON string.
pub fn parse_architecture(contents: &str) -> Result<ArchitectureConfig> {
    let config: ArchitectureConfig = serde_json::from_str(contents)?;
    validate_architecture(&config)?;
    Ok(config)
}

/// Loads an architecture configuration from a JSON file.
///
/// # Examples
///
/// ```no_run
/// use feedforward_nn::architecture::load_architecture;
///
/// let arch = load_architecture("config/architectures/xor.json").unwrap();
/// assert!(!arch.layers.is_empty());
/// ```
pub fn load_architecture(path: &str) -> Result<ArchitectureConfig> {
    let contents = fs::read_to_string(path)?;
    parse_architecture(&contents)
}

/// Checks the descriptor list before any layer is built.
fn validate_architecture(config: &ArchitectureConfig) -> Result<()> {
    match config.layers.first() {
        None => Err(NetworkError::configuration(
            "architecture must contain at least one layer",
        )),
        Some(LayerSpec::Dense(_)) => Err(NetworkError::configuration(
            "first layer must be an input layer",
        )),
        Some(LayerSpec::Input(_)) => Ok(()),
    }
}

/// Builds a network from an architecture configuration.
pub fn build_network(arch: &ArchitectureConfig, training: TrainingConfig) -> Result<Network> {
    validate_architecture(arch)?;
    let mut network = Network::from_config(training)?;
    for spec in &arch.layers {
        network.add_layer(spec.to_layer_config()?)?;
    }
    info!(
        layers = network.len(),
        parameters = network.parameter_count(),
        "network built from architecture"
    );
    Ok(network)
}
