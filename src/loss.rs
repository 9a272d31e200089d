//! Loss-function collaborator used by `Network::train`
//!
//! A loss computes a scalar from a prediction and a label in `forward`, then
//! produces the gradient with respect to the prediction in `backward`.

use ndarray::{Array1, Zip};

use crate::error::{NetworkError, Result};

/// Loss function contract.
///
/// `backward` returns a gradient with the same width as the prediction passed
/// to the preceding `forward` call.
pub trait Loss {
    fn forward(&mut self, prediction: &Array1<f32>, label: &Array1<f32>) -> Result<f32>;

    fn backward(&mut self, loss: f32) -> Result<Array1<f32>>;
}

/// Mean squared error: `mean((p - y)^2)`, gradient `2 (p - y) / n`.
#[derive(Debug, Clone, Default)]
pub struct MeanSquaredError {
    diff: Option<Array1<f32>>,
}

impl MeanSquaredError {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Loss for MeanSquaredError {
    fn forward(&mut self, prediction: &Array1<f32>, label: &Array1<f32>) -> Result<f32> {
        if prediction.len() != label.len() {
            return Err(NetworkError::shape("loss", prediction.len(), label.len()));
        }
        let diff = prediction - label;
        let loss = diff.mapv(|v| v * v).mean().unwrap_or(0.0);
        self.diff = Some(diff);
        Ok(loss)
    }

    fn backward(&mut self, _loss: f32) -> Result<Array1<f32>> {
        let mut diff = self.diff.take().ok_or_else(|| NetworkError::stale("loss"))?;
        let n = diff.len().max(1) as f32;
        Zip::from(&mut diff).for_each(|d| *d *= 2.0 / n);
        Ok(diff)
    }
}
