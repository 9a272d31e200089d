//! Data-loader contract
//!
//! Dataset acquisition lives outside this crate. Anything that can produce a
//! `(features, labels)` pair of matrices sharing the example count as their
//! leading dimension can feed `Network::train`.

use ndarray::{Array2, Array3, Axis};

use crate::error::{NetworkError, Result};

/// Source of a training or test batch.
pub trait DataLoader {
    /// Features (`examples × input width`) and labels (`examples × output width`).
    fn load(&self) -> Result<(Array2<f32>, Array2<f32>)>;
}

/// Loader over matrices already in memory.
#[derive(Debug, Clone)]
pub struct InMemoryLoader {
    features: Array2<f32>,
    labels: Array2<f32>,
}

impl InMemoryLoader {
    pub fn new(features: Array2<f32>, labels: Array2<f32>) -> Result<Self> {
        if features.nrows() != labels.nrows() {
            return Err(NetworkError::shape("labels", features.nrows(), labels.nrows()));
        }
        Ok(Self { features, labels })
    }
}

impl DataLoader for InMemoryLoader {
    fn load(&self) -> Result<(Array2<f32>, Array2<f32>)> {
        Ok((self.features.clone(), self.labels.clone()))
    }
}

/// Check a batch against a network's input width.
pub fn validate_batch(features: &Array2<f32>, labels: &Array2<f32>, input_size: usize) -> Result<()> {
    if features.nrows() != labels.nrows() {
        return Err(NetworkError::shape("labels", features.nrows(), labels.nrows()));
    }
    if features.ncols() != input_size {
        return Err(NetworkError::shape("features", input_size, features.ncols()));
    }
    Ok(())
}

/// Encode class indices as one row of scores per example.
pub fn one_hot(labels: &[usize], classes: usize) -> Result<Array2<f32>> {
    let mut scores = Array2::zeros((labels.len(), classes));
    for (mut row, &label) in scores.axis_iter_mut(Axis(0)).zip(labels) {
        if label >= classes {
            return Err(NetworkError::configuration(format!(
                "label {} out of range for {} classes",
                label, classes
            )));
        }
        row[label] = 1.0;
    }
    Ok(scores)
}

/// Flatten a stack of `examples × height × width` images into rows.
pub fn flatten_images(images: Array3<f32>) -> Result<Array2<f32>> {
    let (count, height, width) = images.dim();
    images
        .as_standard_layout()
        .into_owned()
        .into_shape((count, height * width))
        .map_err(|e| NetworkError::configuration(format!("cannot flatten images: {}", e)))
}
