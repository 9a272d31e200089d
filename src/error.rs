//! Error types for network construction, training and prediction

use thiserror::Error;

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, NetworkError>;

/// Errors reported by layers, the network driver and the config loaders.
///
/// None of these are recovered locally: they abort the requested operation
/// (layer add, train, predict) and carry enough context to locate the layer
/// and the offending dimension.
#[derive(Error, Debug)]
pub enum NetworkError {
    /// The network or one of its collaborators is configured incorrectly
    #[error("configuration error: {context}")]
    Configuration { context: String },

    /// A tensor did not have the width a layer expected
    #[error("shape mismatch in layer '{layer}': expected {expected}, received {received}")]
    ShapeMismatch {
        layer: String,
        expected: usize,
        received: usize,
    },

    /// Backward propagation without a matching forward propagation
    #[error("stale state in layer '{layer}': backward propagation requires a preceding forward propagation")]
    StaleState { layer: String },

    /// IO error while reading a config file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl NetworkError {
    pub(crate) fn configuration(context: impl Into<String>) -> Self {
        NetworkError::Configuration {
            context: context.into(),
        }
    }

    pub(crate) fn shape(layer: impl Into<String>, expected: usize, received: usize) -> Self {
        NetworkError::ShapeMismatch {
            layer: layer.into(),
            expected,
            received,
        }
    }

    pub(crate) fn stale(layer: impl Into<String>) -> Self {
        NetworkError::StaleState {
            layer: layer.into(),
        }
    }

    /// True for errors caused by how the network was set up rather than by data.
    pub fn is_configuration(&self) -> bool {
        matches!(self, NetworkError::Configuration { .. })
    }
}
