//! Activation functions for dense layers
//!
//! This module provides the elementwise nonlinearities a dense layer may own:
//! - Sigmoid (canonical logistic function)
//! - ReLU
//!
//! The scalar helpers are pure; [`Activation`] wraps them with the cached
//! pre-activation input needed for the backward step.

use std::fmt;

use ndarray::{Array1, Zip};
use serde::Deserialize;

use crate::error::{NetworkError, Result};

/// Sigmoid activation function.
///
/// Returns the logistic function: 1 / (1 + exp(-x))
pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

/// Sigmoid derivative with respect to the raw input `x`.
///
/// Returns s(x) * (1 - s(x))
pub fn sigmoid_derivative(x: f32) -> f32 {
    let s = sigmoid(x);
    s * (1.0 - s)
}

/// ReLU activation function.
pub fn relu(x: f32) -> f32 {
    x.max(0.0)
}

/// ReLU gradient mask: zero where the input was strictly negative.
///
/// An input of exactly zero passes the upstream gradient through.
pub fn relu_mask(x: f32, upstream: f32) -> f32 {
    if x < 0.0 {
        0.0
    } else {
        upstream
    }
}

/// Selector for the activation a dense layer should own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivationKind {
    Sigmoid,
    Relu,
}

impl ActivationKind {
    /// Build a fresh activation instance with an empty cache.
    pub fn build(self) -> Activation {
        match self {
            ActivationKind::Sigmoid => Activation::Sigmoid { input: None },
            ActivationKind::Relu => Activation::Relu { input: None },
        }
    }
}

impl fmt::Display for ActivationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActivationKind::Sigmoid => write!(f, "sigmoid"),
            ActivationKind::Relu => write!(f, "relu"),
        }
    }
}

/// Elementwise nonlinearity owned by exactly one dense layer.
///
/// `forward` caches its input; `backward` consumes that cache, so every
/// backward step must be paired with the forward step that preceded it.
#[derive(Debug, Clone, PartialEq)]
pub enum Activation {
    Sigmoid { input: Option<Array1<f32>> },
    Relu { input: Option<Array1<f32>> },
}

impl Activation {
    pub fn kind(&self) -> ActivationKind {
        match self {
            Activation::Sigmoid { .. } => ActivationKind::Sigmoid,
            Activation::Relu { .. } => ActivationKind::Relu,
        }
    }

    /// Apply the nonlinearity and remember `z` for the backward step.
    pub fn forward(&mut self, z: Array1<f32>) -> Array1<f32> {
        let (output, cache) = match self {
            Activation::Sigmoid { input } => (z.mapv(sigmoid), input),
            Activation::Relu { input } => (z.mapv(relu), input),
        };
        *cache = Some(z);
        output
    }

    /// Gradient with respect to the cached input, given the upstream gradient.
    ///
    /// `layer` names the owning layer for error reporting.
    pub fn backward(&mut self, upstream: Array1<f32>, layer: &str) -> Result<Array1<f32>> {
        let kind = self.kind();
        let cache = match self {
            Activation::Sigmoid { input } | Activation::Relu { input } => input,
        };
        let input = cache.take().ok_or_else(|| NetworkError::stale(layer))?;
        if input.len() != upstream.len() {
            return Err(NetworkError::shape(layer, input.len(), upstream.len()));
        }

        let mut grad = upstream;
        match kind {
            ActivationKind::Sigmoid => {
                Zip::from(&mut grad)
                    .and(&input)
                    .for_each(|g, &x| *g *= sigmoid_derivative(x));
            }
            ActivationKind::Relu => {
                Zip::from(&mut grad)
                    .and(&input)
                    .for_each(|g, &x| *g = relu_mask(x, *g));
            }
        }
        Ok(grad)
    }

    /// Activations carry no trainable parameters.
    pub fn update_weights(&mut self, _count: usize) {}

    /// Drop the cached input without running a backward step.
    pub fn clear_cache(&mut self) {
        match self {
            Activation::Sigmoid { input } | Activation::Relu { input } => *input = None,
        }
    }

    pub fn has_cached_input(&self) -> bool {
        match self {
            Activation::Sigmoid { input } | Activation::Relu { input } => input.is_some(),
        }
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Activation::Sigmoid { .. } => write!(f, "<Activation.Sigmoid>"),
            Activation::Relu { .. } => write!(f, "<Activation.ReLU>"),
        }
    }
}
