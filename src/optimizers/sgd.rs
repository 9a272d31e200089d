//! Gradient descent optimizer
//!
//! Performs the plain update `parameter = parameter - learning_rate * gradient`.

use ndarray::{ArrayViewD, ArrayViewMutD, Zip};

use crate::optimizers::Optimizer;

/// Gradient descent without momentum or adaptive learning rates.
///
/// `w = w - η * ∇L/∂w`
#[derive(Debug, Clone)]
pub struct SGD {
    learning_rate: f32,
}

impl SGD {
    /// Creates a new optimizer with the specified learning rate.
    ///
    /// ```
    /// use feedforward_nn::optimizers::{Optimizer, SGD};
    ///
    /// let optimizer = SGD::new(0.01);
    /// assert_eq!(optimizer.learning_rate(), 0.01);
    /// ```
    pub fn new(learning_rate: f32) -> Self {
        Self { learning_rate }
    }
}

impl Optimizer for SGD {
    fn update(&mut self, mut parameters: ArrayViewMutD<'_, f32>, gradients: ArrayViewD<'_, f32>) {
        assert_eq!(
            parameters.shape(),
            gradients.shape(),
            "Parameters and gradients must have the same shape"
        );

        let lr = self.learning_rate;
        Zip::from(&mut parameters)
            .and(&gradients)
            .for_each(|param, &grad| *param -= lr * grad);
    }

    fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    fn set_learning_rate(&mut self, lr: f32) {
        self.learning_rate = lr;
    }
}
