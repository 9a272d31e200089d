//! Input layer: the leaf of every chain
//!
//! Holds the example currently bound by the network. Forward propagation
//! returns it unchanged and backward propagation stops here.

use std::fmt;

use ndarray::Array1;
use tracing::trace;

use crate::error::{NetworkError, Result};
use crate::layers::{Layer, LayerId};
use crate::optimizers::Optimizer;

/// Leaf layer holding externally bound data.
#[derive(Debug, Clone)]
pub struct InputLayer {
    name: String,
    shape: usize,
    data: Option<Array1<f32>>,
}

impl InputLayer {
    pub fn new(name: impl Into<String>, shape: usize) -> Self {
        Self {
            name: name.into(),
            shape,
            data: None,
        }
    }

    pub fn shape(&self) -> usize {
        self.shape
    }

    /// Bind an example to this layer, replacing whatever was bound before.
    ///
    /// The example width must equal the configured shape.
    pub fn load_data(&mut self, data: Array1<f32>) -> Result<()> {
        if data.len() != self.shape {
            return Err(NetworkError::shape(&self.name, self.shape, data.len()));
        }
        trace!(layer = %self.name, "input rebound");
        self.data = Some(data);
        Ok(())
    }

    /// Alias of [`InputLayer::load_data`].
    pub fn set_data(&mut self, data: Array1<f32>) -> Result<()> {
        self.load_data(data)
    }

    pub fn data(&self) -> Option<&Array1<f32>> {
        self.data.as_ref()
    }
}

impl Layer for InputLayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn output_size(&self) -> usize {
        self.shape
    }

    fn source(&self) -> Option<LayerId> {
        None
    }

    fn forward(&mut self, _input: Option<Array1<f32>>) -> Result<Array1<f32>> {
        self.data.clone().ok_or_else(|| {
            NetworkError::configuration(format!("no data bound to input layer '{}'", self.name))
        })
    }

    fn backward(&mut self, _grad_output: Array1<f32>) -> Result<Option<Array1<f32>>> {
        Ok(None)
    }

    fn update_weights(&mut self, _count: usize, _optimizer: &mut dyn Optimizer) -> Result<()> {
        Ok(())
    }

    fn parameter_count(&self) -> usize {
        0
    }
}

impl fmt::Display for InputLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Layer.Input({}) {}>", self.name, self.shape)
    }
}
