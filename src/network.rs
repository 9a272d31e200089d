//! Network construction and the train / predict driver
//!
//! A [`Network`] owns its layers in an arena (`Vec<LayerNode>`). Each dense
//! layer stores the [`LayerId`] of its source, so forward propagation recurses
//! from the terminal layer up to the Input leaf and backward propagation walks
//! the same source links in reverse. No separate reverse list is kept.

use std::fmt;

use ndarray::{Array1, Array2, ArrayView1};
use tracing::{debug, info, warn};

use crate::config::TrainingConfig;
use crate::error::{NetworkError, Result};
use crate::layers::{DenseLayer, InputLayer, Layer, LayerConfig, LayerId, LayerNode};
use crate::loss::Loss;
use crate::optimizers::{Optimizer, SGD};
use crate::utils::rng::SeededRng;

/// Construction state of a network's layer chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkState {
    /// No layers yet
    Empty,
    /// Only the Input leaf
    Building,
    /// Input leaf followed by at least one dense layer
    Built,
}

/// Linear chain of layers with an optional loss collaborator.
pub struct Network {
    layers: Vec<LayerNode>,
    input_count: usize,
    dense_count: usize,
    optimizer: SGD,
    rng: SeededRng,
    loss: Option<Box<dyn Loss>>,
}

impl Network {
    /// Create an empty network.
    ///
    /// The config is taken as is; use [`Network::from_config`] to reject an
    /// invalid learning rate up front.
    pub fn new(config: TrainingConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => SeededRng::new(seed),
            None => SeededRng::from_entropy(),
        };
        Self {
            layers: Vec::new(),
            input_count: 0,
            dense_count: 0,
            optimizer: SGD::new(config.learning_rate),
            rng,
            loss: None,
        }
    }

    /// Create an empty network after validating `config`.
    pub fn from_config(config: TrainingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config))
    }

    pub fn with_loss(mut self, loss: Box<dyn Loss>) -> Self {
        self.loss = Some(loss);
        self
    }

    pub fn set_loss(&mut self, loss: Box<dyn Loss>) {
        self.loss = Some(loss);
    }

    pub fn has_loss(&self) -> bool {
        self.loss.is_some()
    }

    pub fn state(&self) -> NetworkState {
        match self.layers.len() {
            0 => NetworkState::Empty,
            1 => NetworkState::Building,
            _ => NetworkState::Built,
        }
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn layers(&self) -> &[LayerNode] {
        &self.layers
    }

    pub fn layer(&self, id: LayerId) -> Option<&LayerNode> {
        self.layers.get(id.index())
    }

    /// Find a layer by its (auto-generated or explicit) name.
    pub fn layer_by_name(&self, name: &str) -> Option<&LayerNode> {
        self.layers.iter().find(|layer| layer.name() == name)
    }

    pub fn input_layer(&self) -> Option<&InputLayer> {
        self.layers.first().and_then(LayerNode::as_input)
    }

    pub fn terminal(&self) -> Option<LayerId> {
        self.layers.len().checked_sub(1).map(LayerId)
    }

    pub fn input_size(&self) -> Option<usize> {
        self.input_layer().map(InputLayer::shape)
    }

    pub fn output_size(&self) -> Option<usize> {
        self.layers.last().map(Layer::output_size)
    }

    pub fn parameter_count(&self) -> usize {
        self.layers.iter().map(Layer::parameter_count).sum()
    }

    pub fn learning_rate(&self) -> f32 {
        self.optimizer.learning_rate()
    }

    /// Append a layer to the chain.
    ///
    /// The first layer must be an Input leaf; every later layer must be a
    /// dense layer and is wired to the current last layer. On error the chain
    /// is left unchanged.
    pub fn add_layer(&mut self, config: LayerConfig) -> Result<LayerId> {
        let id = LayerId(self.layers.len());
        let node = match (config, self.layers.last()) {
            (LayerConfig::Dense(_), None) => {
                warn!("rejected dense layer as first layer");
                return Err(NetworkError::configuration(
                    "first layer must be an input layer",
                ));
            }
            (LayerConfig::Input(params), None) => {
                let name = params
                    .name
                    .unwrap_or_else(|| format!("i{}", self.input_count));
                self.input_count += 1;
                LayerNode::Input(InputLayer::new(name, params.shape))
            }
            (LayerConfig::Input(_), Some(last)) => {
                warn!(last = %last.name(), "rejected second input layer");
                return Err(NetworkError::configuration(format!(
                    "input layer can only start the chain, but '{}' is already present",
                    last.name()
                )));
            }
            (LayerConfig::Dense(mut params), Some(last)) => {
                let name = params
                    .name
                    .take()
                    .unwrap_or_else(|| format!("d{}", self.dense_count));
                let source = LayerId(id.index() - 1);
                let dense = DenseLayer::new(name, source, last, params, &mut self.rng)?;
                self.dense_count += 1;
                LayerNode::Dense(dense)
            }
        };

        debug!(layer = %node, id = id.index(), "layer added");
        self.layers.push(node);
        Ok(id)
    }

    /// Bind one example to the Input layer.
    ///
    /// Forward caches computed from the previous example are dropped, so a
    /// backward step needs a fresh forward step on the new data.
    pub fn load_data(&mut self, data: Array1<f32>) -> Result<()> {
        let input = self
            .layers
            .first_mut()
            .and_then(LayerNode::as_input_mut)
            .ok_or_else(|| NetworkError::configuration("network has no input layer"))?;
        input.load_data(data)?;
        self.layers.iter_mut().for_each(Layer::clear_cache);
        Ok(())
    }

    /// Forward propagation ending at `id`, recursing through source links.
    pub fn forward_prop(&mut self, id: LayerId) -> Result<Array1<f32>> {
        let source = self.node(id)?.source();
        let input = match source {
            Some(source) => Some(self.forward_prop(source)?),
            None => None,
        };
        self.node_mut(id)?.forward(input)
    }

    /// Backward propagation starting at `id` with the gradient of its output.
    pub fn backward_prop(&mut self, id: LayerId, gradient: Array1<f32>) -> Result<()> {
        let node = self.node_mut(id)?;
        let upstream = node.backward(gradient)?;
        match (node.source(), upstream) {
            (Some(source), Some(grad)) => self.backward_prop(source, grad),
            _ => Ok(()),
        }
    }

    /// Apply averaged gradients on `id` and every layer it reads from.
    pub fn update_weights(&mut self, id: LayerId, count: usize) -> Result<()> {
        let layer = self
            .layers
            .get_mut(id.index())
            .ok_or_else(|| NetworkError::configuration(format!("no layer with id {}", id.index())))?;
        layer.update_weights(count, &mut self.optimizer)?;
        match layer.source() {
            Some(source) => self.update_weights(source, count),
            None => Ok(()),
        }
    }

    /// Train on one full batch.
    ///
    /// Every example is forward- and backward-propagated in order, gradients
    /// accumulate in the dense layers, and a single update averaged over the
    /// batch size is applied at the end. Returns the mean loss of the batch.
    pub fn train(&mut self, data: &Array2<f32>, labels: &Array2<f32>) -> Result<f32> {
        let mut loss_fn = self
            .loss
            .take()
            .ok_or_else(|| NetworkError::configuration("train requires a loss function"))?;
        let result = self.train_batch(loss_fn.as_mut(), data, labels);
        self.loss = Some(loss_fn);
        result
    }

    fn train_batch(
        &mut self,
        loss_fn: &mut dyn Loss,
        data: &Array2<f32>,
        labels: &Array2<f32>,
    ) -> Result<f32> {
        let terminal = self.require_terminal()?;
        let count = data.nrows();
        if count == 0 {
            return Err(NetworkError::configuration("train requires at least one example"));
        }
        if labels.nrows() != count {
            return Err(NetworkError::shape("labels", count, labels.nrows()));
        }
        self.check_input_width(data.ncols())?;

        let total_loss = match self.accumulate_batch(loss_fn, terminal, data, labels) {
            Ok(total) => total,
            Err(err) => {
                // A failed batch must not leak partial gradients into the next one
                for layer in &mut self.layers {
                    layer.reset_gradients();
                    layer.clear_cache();
                }
                warn!(error = %err, "batch aborted, accumulated gradients discarded");
                return Err(err);
            }
        };

        self.update_weights(terminal, count)?;
        let mean_loss = total_loss / count as f32;
        info!(batch_size = count, mean_loss, "batch trained");
        Ok(mean_loss)
    }

    fn accumulate_batch(
        &mut self,
        loss_fn: &mut dyn Loss,
        terminal: LayerId,
        data: &Array2<f32>,
        labels: &Array2<f32>,
    ) -> Result<f32> {
        let mut total_loss = 0.0f32;
        for (index, (example, label)) in data.outer_iter().zip(labels.outer_iter()).enumerate() {
            self.load_data(example.to_owned())?;
            let prediction = self.forward_prop(terminal)?;
            let loss = loss_fn.forward(&prediction, &label.to_owned())?;
            let gradient = loss_fn.backward(loss)?;
            self.backward_prop(terminal, gradient)?;
            debug!(example = index, loss, "example propagated");
            total_loss += loss;
        }
        Ok(total_loss)
    }

    /// Raw output of the terminal layer for one example.
    pub fn predict(&mut self, x: &Array1<f32>) -> Result<Array1<f32>> {
        let terminal = self.require_terminal()?;
        self.check_input_width(x.len())?;
        self.load_data(x.clone())?;
        self.forward_prop(terminal)
    }

    /// Raw outputs for every row of `data`.
    pub fn predict_batch(&mut self, data: &Array2<f32>) -> Result<Array2<f32>> {
        let terminal = self.require_terminal()?;
        let width = self.node(terminal)?.output_size();
        let mut outputs = Array2::zeros((data.nrows(), width));
        for (row, mut out) in data.outer_iter().zip(outputs.outer_iter_mut()) {
            out.assign(&self.predict_row(row)?);
        }
        Ok(outputs)
    }

    fn predict_row(&mut self, row: ArrayView1<'_, f32>) -> Result<Array1<f32>> {
        self.predict(&row.to_owned())
    }

    fn require_terminal(&self) -> Result<LayerId> {
        self.terminal()
            .ok_or_else(|| NetworkError::configuration("network has no layers"))
    }

    fn check_input_width(&self, width: usize) -> Result<()> {
        let input = self
            .input_layer()
            .ok_or_else(|| NetworkError::configuration("network has no input layer"))?;
        if input.shape() != width {
            return Err(NetworkError::shape(input.name(), input.shape(), width));
        }
        Ok(())
    }

    fn node(&self, id: LayerId) -> Result<&LayerNode> {
        self.layers
            .get(id.index())
            .ok_or_else(|| NetworkError::configuration(format!("no layer with id {}", id.index())))
    }

    fn node_mut(&mut self, id: LayerId) -> Result<&mut LayerNode> {
        self.layers
            .get_mut(id.index())
            .ok_or_else(|| NetworkError::configuration(format!("no layer with id {}", id.index())))
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[NeuralNetwork")?;
        for layer in &self.layers {
            write!(f, " {}", layer)?;
        }
        write!(f, "]")
    }
}

impl fmt::Debug for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Network")
            .field("layers", &self.layers)
            .field("optimizer", &self.optimizer)
            .field("has_loss", &self.loss.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::{BiasInit, DenseParams, InputParams, WeightInit};
    use crate::loss::MeanSquaredError;
    use ndarray::array;

    fn seeded() -> Network {
        Network::new(TrainingConfig::default().with_seed(7))
    }

    #[test]
    fn test_state_transitions() {
        let mut nn = seeded();
        assert_eq!(nn.state(), NetworkState::Empty);
        nn.add_layer(LayerConfig::Input(InputParams::new(3))).unwrap();
        assert_eq!(nn.state(), NetworkState::Building);
        nn.add_layer(LayerConfig::Dense(DenseParams::new(2))).unwrap();
        assert_eq!(nn.state(), NetworkState::Built);
    }

    #[test]
    fn test_auto_names_are_scoped_per_type() {
        let mut nn = seeded();
        nn.add_layer(LayerConfig::Input(InputParams::new(4))).unwrap();
        nn.add_layer(LayerConfig::Dense(DenseParams::new(3))).unwrap();
        nn.add_layer(LayerConfig::Dense(DenseParams::new(2))).unwrap();
        let names: Vec<&str> = nn.layers().iter().map(Layer::name).collect();
        assert_eq!(names, vec!["i0", "d0", "d1"]);
    }

    #[test]
    fn test_explicit_name_overrides_auto_name() {
        let mut nn = seeded();
        nn.add_layer(LayerConfig::Input(InputParams::new(2).name("pixels")))
            .unwrap();
        nn.add_layer(LayerConfig::Dense(DenseParams::new(1).name("out")))
            .unwrap();
        assert!(nn.layer_by_name("pixels").is_some());
        assert_eq!(nn.layer_by_name("out").unwrap().source(), Some(LayerId(0)));
    }

    #[test]
    fn test_dense_wired_to_previous_layer() {
        let mut nn = seeded();
        nn.add_layer(LayerConfig::Input(InputParams::new(5))).unwrap();
        let d0 = nn.add_layer(LayerConfig::Dense(DenseParams::new(4))).unwrap();
        let d1 = nn.add_layer(LayerConfig::Dense(DenseParams::new(3))).unwrap();
        assert_eq!(nn.layer(d0).unwrap().source(), Some(LayerId(0)));
        assert_eq!(nn.layer(d1).unwrap().source(), Some(d0));
        assert_eq!(nn.layer(d1).unwrap().as_dense().unwrap().input_size(), 4);
    }

    #[test]
    fn test_second_input_rejected() {
        let mut nn = seeded();
        nn.add_layer(LayerConfig::Input(InputParams::new(2))).unwrap();
        let err = nn
            .add_layer(LayerConfig::Input(InputParams::new(2)))
            .unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(nn.len(), 1);
    }

    #[test]
    fn test_backward_prop_without_forward_is_stale() {
        let mut nn = seeded();
        nn.add_layer(LayerConfig::Input(InputParams::new(2))).unwrap();
        let d0 = nn.add_layer(LayerConfig::Dense(DenseParams::new(2))).unwrap();
        let err = nn.backward_prop(d0, array![1.0, 1.0]).unwrap_err();
        assert!(matches!(err, NetworkError::StaleState { .. }));
    }

    #[test]
    fn test_loss_is_restored_after_failed_train() {
        let mut nn = seeded().with_loss(Box::new(MeanSquaredError::new()));
        nn.add_layer(LayerConfig::Input(InputParams::new(2))).unwrap();
        nn.add_layer(LayerConfig::Dense(DenseParams::new(1))).unwrap();
        let bad = Array2::<f32>::zeros((1, 3));
        assert!(nn.train(&bad, &Array2::zeros((1, 1))).is_err());
        assert!(nn.has_loss());
    }

    #[test]
    fn test_single_example_gradient_step() {
        let mut nn = Network::new(TrainingConfig::default().with_learning_rate(0.5))
            .with_loss(Box::new(MeanSquaredError::new()));
        nn.add_layer(LayerConfig::Input(InputParams::new(1))).unwrap();
        nn.add_layer(LayerConfig::Dense(
            DenseParams::new(1)
                .weights(WeightInit::Fixed(array![[1.0]]))
                .bias(BiasInit::Fixed(0.0)),
        ))
        .unwrap();

        // prediction 2, label 0: dL/dp = 4, dW = 4 * 2 = 8, db = 4
        let loss = nn.train(&array![[2.0]], &array![[0.0]]).unwrap();
        assert!((loss - 4.0).abs() < 1e-6);
        let dense = nn.layer(LayerId(1)).unwrap().as_dense().unwrap();
        assert!((dense.weights()[[0, 0]] - (1.0 - 0.5 * 8.0)).abs() < 1e-6);
        assert!((dense.bias()[0] - (0.0 - 0.5 * 4.0)).abs() < 1e-6);
    }

    #[test]
    fn test_display() {
        let mut nn = seeded();
        nn.add_layer(LayerConfig::Input(InputParams::new(785))).unwrap();
        nn.add_layer(LayerConfig::Dense(DenseParams::new(10))).unwrap();
        assert_eq!(
            nn.to_string(),
            "[NeuralNetwork <Layer.Input(i0) 785> <Layer.Dense(d0) i0,10,none>]"
        );
    }
}
