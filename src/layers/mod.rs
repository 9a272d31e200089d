//! Layer abstractions for the feed-forward chain
//!
//! This module provides the Layer trait and the closed set of layer kinds a
//! network may contain: the Input leaf and Dense layers.

mod r#trait;
pub mod dense;
pub mod input;

use std::fmt;

use ndarray::Array1;

pub use dense::{BiasInit, DenseLayer, DenseParams, WeightInit};
pub use input::InputLayer;
pub use r#trait::{Layer, LayerId};

use crate::error::Result;
use crate::optimizers::Optimizer;

/// Construction parameters for an input layer.
#[derive(Debug, Clone, Default)]
pub struct InputParams {
    pub shape: usize,
    pub name: Option<String>,
}

impl InputParams {
    pub fn new(shape: usize) -> Self {
        Self { shape, name: None }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Layer type plus its parameters, as passed to `Network::add_layer`.
#[derive(Debug)]
pub enum LayerConfig {
    Input(InputParams),
    Dense(DenseParams),
}

impl LayerConfig {
    pub fn is_leaf(&self) -> bool {
        matches!(self, LayerConfig::Input(_))
    }
}

/// A layer stored in the network arena.
#[derive(Debug)]
pub enum LayerNode {
    Input(InputLayer),
    Dense(DenseLayer),
}

impl LayerNode {
    pub fn as_input(&self) -> Option<&InputLayer> {
        match self {
            LayerNode::Input(layer) => Some(layer),
            LayerNode::Dense(_) => None,
        }
    }

    pub fn as_input_mut(&mut self) -> Option<&mut InputLayer> {
        match self {
            LayerNode::Input(layer) => Some(layer),
            LayerNode::Dense(_) => None,
        }
    }

    pub fn as_dense(&self) -> Option<&DenseLayer> {
        match self {
            LayerNode::Dense(layer) => Some(layer),
            LayerNode::Input(_) => None,
        }
    }

    fn inner(&self) -> &dyn Layer {
        match self {
            LayerNode::Input(layer) => layer,
            LayerNode::Dense(layer) => layer,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Layer {
        match self {
            LayerNode::Input(layer) => layer,
            LayerNode::Dense(layer) => layer,
        }
    }
}

impl Layer for LayerNode {
    fn name(&self) -> &str {
        self.inner().name()
    }

    fn output_size(&self) -> usize {
        self.inner().output_size()
    }

    fn source(&self) -> Option<LayerId> {
        self.inner().source()
    }

    fn forward(&mut self, input: Option<Array1<f32>>) -> Result<Array1<f32>> {
        self.inner_mut().forward(input)
    }

    fn backward(&mut self, grad_output: Array1<f32>) -> Result<Option<Array1<f32>>> {
        self.inner_mut().backward(grad_output)
    }

    fn update_weights(&mut self, count: usize, optimizer: &mut dyn Optimizer) -> Result<()> {
        self.inner_mut().update_weights(count, optimizer)
    }

    fn parameter_count(&self) -> usize {
        self.inner().parameter_count()
    }

    fn clear_cache(&mut self) {
        self.inner_mut().clear_cache()
    }

    fn reset_gradients(&mut self) {
        self.inner_mut().reset_gradients()
    }
}

impl fmt::Display for LayerNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerNode::Input(layer) => fmt::Display::fmt(layer, f),
            LayerNode::Dense(layer) => fmt::Display::fmt(layer, f),
        }
    }
}
