//! Parameter update rule for dense layers
//!
//! Dense layers accumulate gradients across a whole batch during backward
//! propagation and hand the averaged gradient to an optimizer exactly once per
//! batch. The basic gradient descent update is
//! `weight = weight - learning_rate * gradient`.
//!
//! # Example
//!
//! ```
//! use feedforward_nn::optimizers::{Optimizer, SGD};
//! use ndarray::array;
//!
//! let mut optimizer = SGD::new(0.5);
//! let mut weights = array![[1.0f32, 2.0]];
//! let grads = array![[2.0f32, 2.0]];
//! optimizer.update(weights.view_mut().into_dyn(), grads.view().into_dyn());
//! assert_eq!(weights, array![[0.0, 1.0]]);
//! ```

pub mod sgd;

pub use sgd::SGD;

use ndarray::{ArrayViewD, ArrayViewMutD};

/// Update rule applied to a layer's parameters.
///
/// Parameters and gradients are passed as dynamic-dimension views so the
/// same rule serves weight matrices and bias vectors.
pub trait Optimizer {
    /// Update parameters in place using (already averaged) gradients.
    ///
    /// # Panics
    ///
    /// Implementations may panic if parameters and gradients have different shapes.
    fn update(&mut self, parameters: ArrayViewMutD<'_, f32>, gradients: ArrayViewD<'_, f32>);

    /// Get the learning rate for this optimizer.
    fn learning_rate(&self) -> f32;

    /// Set the learning rate for this optimizer.
    fn set_learning_rate(&mut self, lr: f32);
}
