//! Layer trait definition for the network chain
//!
//! Every node in the chain (the Input leaf and each Dense layer) implements
//! this trait. Layers do not hold references to one another: a non-leaf layer
//! records the [`LayerId`] of its source, and the owning network walks the
//! chain through those identifiers.

use ndarray::Array1;

use crate::error::Result;
use crate::optimizers::Optimizer;

/// Index of a layer inside the network's layer arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub usize);

impl LayerId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Core trait for layers in the feed-forward chain.
///
/// Forward propagation must precede backward propagation on the same input:
/// layers cache whatever they need during `forward` and consume that cache in
/// `backward`.
pub trait Layer {
    /// Name assigned at network-build time (e.g. `i0`, `d1`).
    fn name(&self) -> &str;

    /// Number of values this layer produces per example. Fixed at construction.
    fn output_size(&self) -> usize;

    /// Layer whose output feeds this one; `None` for the leaf.
    fn source(&self) -> Option<LayerId>;

    /// Forward propagation through the layer.
    ///
    /// # Arguments
    ///
    /// * `input` - Output of the source layer, or `None` for the leaf
    fn forward(&mut self, input: Option<Array1<f32>>) -> Result<Array1<f32>>;

    /// Backward propagation through the layer.
    ///
    /// Accumulates parameter gradients internally and returns the gradient
    /// with respect to the layer input, to be passed on to the source layer.
    /// Leaves return `Ok(None)`.
    fn backward(&mut self, grad_output: Array1<f32>) -> Result<Option<Array1<f32>>>;

    /// Apply accumulated gradients averaged over `count` examples.
    ///
    /// Call once per batch, after every example in it has completed its
    /// backward propagation. Accumulators are cleared afterwards.
    fn update_weights(&mut self, count: usize, optimizer: &mut dyn Optimizer) -> Result<()>;

    /// Number of trainable parameters.
    fn parameter_count(&self) -> usize;

    /// Forget any forward cache, so the next backward reports stale state.
    fn clear_cache(&mut self) {}

    /// Discard accumulated gradients without applying them.
    fn reset_gradients(&mut self) {}
}
