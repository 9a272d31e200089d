//! Dense (fully connected) layer implementation
//!
//! This module provides a DenseLayer that performs the transformation
//! `output = activation(W · x + b)` on one example at a time.

use std::fmt;

use ndarray::{Array1, Array2, Axis};
use tracing::trace;

use crate::error::{NetworkError, Result};
use crate::layers::{Layer, LayerId};
use crate::optimizers::Optimizer;
use crate::utils::activations::{Activation, ActivationKind};
use crate::utils::rng::SeededRng;

/// How the weight matrix (`neurons × source output size`) is initialized.
pub enum WeightInit {
    /// He-style: N(0, 1) scaled by `sqrt(2 / neurons)`
    Default,
    /// Explicit matrix; its row count must equal the neuron count
    Fixed(Array2<f32>),
    /// Called with `(row, col)` for every entry
    Generator(Box<dyn Fn(usize, usize) -> f32>),
}

/// How the bias is initialized. The scalar is broadcast to every neuron.
pub enum BiasInit {
    /// One N(0, 1) sample
    Default,
    Fixed(f32),
    Generator(Box<dyn Fn() -> f32>),
}

impl Default for WeightInit {
    fn default() -> Self {
        WeightInit::Default
    }
}

impl Default for BiasInit {
    fn default() -> Self {
        BiasInit::Default
    }
}

impl fmt::Debug for WeightInit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WeightInit::Default => write!(f, "WeightInit::Default"),
            WeightInit::Fixed(w) => write!(f, "WeightInit::Fixed({:?})", w.dim()),
            WeightInit::Generator(_) => write!(f, "WeightInit::Generator"),
        }
    }
}

impl fmt::Debug for BiasInit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BiasInit::Default => write!(f, "BiasInit::Default"),
            BiasInit::Fixed(b) => write!(f, "BiasInit::Fixed({})", b),
            BiasInit::Generator(_) => write!(f, "BiasInit::Generator"),
        }
    }
}

/// Construction parameters for a dense layer.
#[derive(Debug, Default)]
pub struct DenseParams {
    pub neurons: usize,
    pub activation: Option<ActivationKind>,
    pub weight_init: WeightInit,
    pub bias_init: BiasInit,
    pub name: Option<String>,
}

impl DenseParams {
    pub fn new(neurons: usize) -> Self {
        Self {
            neurons,
            ..Default::default()
        }
    }

    pub fn activation(mut self, kind: ActivationKind) -> Self {
        self.activation = Some(kind);
        self
    }

    pub fn weights(mut self, init: WeightInit) -> Self {
        self.weight_init = init;
        self
    }

    pub fn bias(mut self, init: BiasInit) -> Self {
        self.bias_init = init;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Fully connected layer with weights, bias and an optional activation.
///
/// Weight gradients accumulate across backward calls and are only applied,
/// averaged, by [`Layer::update_weights`].
#[derive(Debug)]
pub struct DenseLayer {
    name: String,
    source: LayerId,
    source_name: String,
    output_size: usize,
    weights: Array2<f32>,
    bias: Array1<f32>,
    activation: Option<Activation>,
    input: Option<Array1<f32>>,
    grad_weights: Array2<f32>,
    grad_bias: Array1<f32>,
    accumulated: usize,
}

impl DenseLayer {
    /// Create a dense layer reading from `source`.
    ///
    /// `rng` is only drawn from for `Default` initializers.
    pub fn new(
        name: impl Into<String>,
        source_id: LayerId,
        source: &dyn Layer,
        params: DenseParams,
        rng: &mut SeededRng,
    ) -> Result<Self> {
        let name = name.into();
        let output_size = params.neurons;
        let input_size = source.output_size();
        if output_size == 0 {
            return Err(NetworkError::configuration(format!(
                "dense layer '{}' needs at least one neuron",
                name
            )));
        }

        let weights = match params.weight_init {
            WeightInit::Default => {
                let scale = (2.0f32 / output_size as f32).sqrt();
                rng.normal_matrix(output_size, input_size, scale)
            }
            WeightInit::Fixed(w) => {
                if w.nrows() != output_size {
                    return Err(NetworkError::shape(&name, output_size, w.nrows()));
                }
                w.as_standard_layout().into_owned()
            }
            WeightInit::Generator(f) => {
                Array2::from_shape_fn((output_size, input_size), |(i, j)| f(i, j))
            }
        };

        let bias_value = match params.bias_init {
            BiasInit::Default => rng.normal(),
            BiasInit::Fixed(b) => b,
            BiasInit::Generator(f) => f(),
        };

        Ok(Self {
            name,
            source: source_id,
            source_name: source.name().to_string(),
            output_size,
            grad_weights: Array2::zeros(weights.raw_dim()),
            grad_bias: Array1::zeros(output_size),
            bias: Array1::from_elem(output_size, bias_value),
            weights,
            activation: params.activation.map(ActivationKind::build),
            input: None,
            accumulated: 0,
        })
    }

    /// Width of the input the weight matrix accepts.
    pub fn input_size(&self) -> usize {
        self.weights.ncols()
    }

    pub fn weights(&self) -> &Array2<f32> {
        &self.weights
    }

    pub fn bias(&self) -> &Array1<f32> {
        &self.bias
    }

    pub fn grad_weights(&self) -> &Array2<f32> {
        &self.grad_weights
    }

    pub fn grad_bias(&self) -> &Array1<f32> {
        &self.grad_bias
    }

    pub fn activation(&self) -> Option<&Activation> {
        self.activation.as_ref()
    }

    /// Whether a forward step is waiting for its backward step.
    pub fn has_cached_input(&self) -> bool {
        self.input.is_some()
    }

    /// Backward calls accumulated since the last update.
    pub fn accumulated(&self) -> usize {
        self.accumulated
    }
}

impl Layer for DenseLayer {
    fn name(&self) -> &str {
        &self.name
    }

    fn output_size(&self) -> usize {
        self.output_size
    }

    fn source(&self) -> Option<LayerId> {
        Some(self.source)
    }

    fn forward(&mut self, input: Option<Array1<f32>>) -> Result<Array1<f32>> {
        let x = input.ok_or_else(|| {
            NetworkError::configuration(format!(
                "dense layer '{}' received no output from '{}'",
                self.name, self.source_name
            ))
        })?;
        if x.len() != self.weights.ncols() {
            return Err(NetworkError::shape(&self.name, self.weights.ncols(), x.len()));
        }

        let z = self.weights.dot(&x) + &self.bias;
        self.input = Some(x);
        Ok(match self.activation.as_mut() {
            Some(activation) => activation.forward(z),
            None => z,
        })
    }

    fn backward(&mut self, grad_output: Array1<f32>) -> Result<Option<Array1<f32>>> {
        if grad_output.len() != self.output_size {
            return Err(NetworkError::shape(
                &self.name,
                self.output_size,
                grad_output.len(),
            ));
        }
        let x = self
            .input
            .take()
            .ok_or_else(|| NetworkError::stale(&self.name))?;

        let grad = match self.activation.as_mut() {
            Some(activation) => activation.backward(grad_output, &self.name)?,
            None => grad_output,
        };

        // Outer product: (out × 1) · (1 × in)
        let outer = grad
            .view()
            .insert_axis(Axis(1))
            .dot(&x.view().insert_axis(Axis(0)));
        self.grad_weights += &outer;
        self.grad_bias += &grad;
        self.accumulated += 1;
        trace!(layer = %self.name, accumulated = self.accumulated, "gradient accumulated");

        Ok(Some(self.weights.t().dot(&grad)))
    }

    fn update_weights(&mut self, count: usize, optimizer: &mut dyn Optimizer) -> Result<()> {
        if count == 0 {
            return Err(NetworkError::configuration(format!(
                "cannot average gradients of layer '{}' over zero examples",
                self.name
            )));
        }

        let scale = 1.0 / count as f32;
        let avg_weights = &self.grad_weights * scale;
        let avg_bias = &self.grad_bias * scale;
        optimizer.update(self.weights.view_mut().into_dyn(), avg_weights.view().into_dyn());
        optimizer.update(self.bias.view_mut().into_dyn(), avg_bias.view().into_dyn());

        self.reset_gradients();
        if let Some(activation) = self.activation.as_mut() {
            activation.update_weights(count);
        }
        Ok(())
    }

    fn parameter_count(&self) -> usize {
        self.weights.len() + self.bias.len()
    }

    fn clear_cache(&mut self) {
        self.input = None;
        if let Some(activation) = self.activation.as_mut() {
            activation.clear_cache();
        }
    }

    fn reset_gradients(&mut self) {
        self.grad_weights.fill(0.0);
        self.grad_bias.fill(0.0);
        self.accumulated = 0;
    }
}

impl fmt::Display for DenseLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let activation = self
            .activation
            .as_ref()
            .map(|a| a.kind().to_string())
            .unwrap_or_else(|| "none".to_string());
        write!(
            f,
            "<Layer.Dense({}) {},{},{}>",
            self.name, self.source_name, self.output_size, activation
        )
    }
}
