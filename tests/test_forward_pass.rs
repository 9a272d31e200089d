//! Tests for forward propagation through layer chains
//!
//! This file tests:
//! - Dense output width equals the neuron count for any input width
//! - The identity-weight ReLU scenario
//! - Affine transform and activation ordering (bias before activation)
//! - predict on a freshly built network reflects the initial weights
//! - Shape mismatches surfacing from the affine transform

use approx::assert_relative_eq;
use feedforward_nn::layers::{
    BiasInit, DenseParams, InputParams, Layer, LayerConfig, LayerId, WeightInit,
};
use feedforward_nn::utils::activations::ActivationKind;
use feedforward_nn::{Network, NetworkError};
use feedforward_nn::config::TrainingConfig;
use ndarray::{array, Array1, Array2};

fn network_with_input(width: usize) -> Network {
    let mut nn = Network::new(TrainingConfig::default().with_seed(42));
    nn.add_layer(LayerConfig::Input(InputParams::new(width)))
        .unwrap();
    nn
}

mod output_shape_tests {
    use super::*;

    #[test]
    fn test_dense_output_width_matches_neurons() {
        for &(input_width, neurons) in &[(1, 1), (3, 7), (10, 2), (784, 10)] {
            let mut nn = network_with_input(input_width);
            nn.add_layer(LayerConfig::Dense(DenseParams::new(neurons)))
                .unwrap();
            let out = nn.predict(&Array1::ones(input_width)).unwrap();
            assert_eq!(out.len(), neurons);
        }
    }

    #[test]
    fn test_stacked_layers_output_width() {
        let mut nn = network_with_input(6);
        nn.add_layer(LayerConfig::Dense(
            DenseParams::new(5).activation(ActivationKind::Relu),
        ))
        .unwrap();
        nn.add_layer(LayerConfig::Dense(
            DenseParams::new(3).activation(ActivationKind::Sigmoid),
        ))
        .unwrap();
        let out = nn.predict(&Array1::linspace(-1.0, 1.0, 6)).unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(nn.output_size(), Some(3));
        assert!(out.iter().all(|&v| v > 0.0 && v < 1.0));
    }

    #[test]
    fn test_predict_batch_rows() {
        let mut nn = network_with_input(2);
        nn.add_layer(LayerConfig::Dense(DenseParams::new(4)))
            .unwrap();
        let data = array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]];
        let out = nn.predict_batch(&data).unwrap();
        assert_eq!(out.dim(), (3, 4));
        let single = nn.predict(&array![3.0, 4.0]).unwrap();
        assert_eq!(out.row(1).to_owned(), single);
    }
}

mod scenario_tests {
    use super::*;

    #[test]
    fn test_identity_relu_forward() {
        let mut nn = network_with_input(2);
        nn.add_layer(LayerConfig::Dense(
            DenseParams::new(2)
                .activation(ActivationKind::Relu)
                .weights(WeightInit::Fixed(array![[1.0, 0.0], [0.0, 1.0]]))
                .bias(BiasInit::Fixed(0.0)),
        ))
        .unwrap();

        let out = nn.predict(&array![1.0, -1.0]).unwrap();
        assert_eq!(out, array![1.0, 0.0]);
    }

    #[test]
    fn test_bias_applied_before_activation() {
        let mut nn = network_with_input(1);
        nn.add_layer(LayerConfig::Dense(
            DenseParams::new(1)
                .activation(ActivationKind::Relu)
                .weights(WeightInit::Fixed(array![[1.0]]))
                .bias(BiasInit::Fixed(-5.0)),
        ))
        .unwrap();

        // relu(2 - 5) = 0, not relu(2) - 5 = -3
        assert_eq!(nn.predict(&array![2.0]).unwrap(), array![0.0]);
    }

    #[test]
    fn test_affine_transform_values() {
        let mut nn = network_with_input(3);
        nn.add_layer(LayerConfig::Dense(
            DenseParams::new(2)
                .weights(WeightInit::Fixed(array![[1.0, 2.0, 3.0], [-1.0, 0.5, 0.0]]))
                .bias(BiasInit::Fixed(0.5)),
        ))
        .unwrap();

        let out = nn.predict(&array![1.0, 1.0, 2.0]).unwrap();
        assert_relative_eq!(out[0], 1.0 + 2.0 + 6.0 + 0.5);
        assert_relative_eq!(out[1], -1.0 + 0.5 + 0.5);
    }

    #[test]
    fn test_predict_reflects_initial_weights() {
        let mut nn = network_with_input(3);
        nn.add_layer(LayerConfig::Dense(
            DenseParams::new(2).activation(ActivationKind::Sigmoid),
        ))
        .unwrap();

        let dense = nn.layer(LayerId(1)).unwrap().as_dense().unwrap();
        let (weights, bias) = (dense.weights().clone(), dense.bias().clone());
        let x = array![0.2, -0.4, 1.5];
        let expected = (weights.dot(&x) + &bias).mapv(|z| 1.0 / (1.0 + (-z).exp()));

        let out = nn.predict(&x).unwrap();
        for (a, b) in out.iter().zip(expected.iter()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-6);
        }
        // Predicting does not touch the weights
        let dense = nn.layer(LayerId(1)).unwrap().as_dense().unwrap();
        assert_eq!(dense.weights(), &weights);
    }

    #[test]
    fn test_same_seed_same_predictions() {
        let build = || {
            let mut nn = network_with_input(4);
            nn.add_layer(LayerConfig::Dense(DenseParams::new(3)))
                .unwrap();
            nn
        };
        let x = array![1.0, 0.0, -1.0, 2.0];
        assert_eq!(build().predict(&x).unwrap(), build().predict(&x).unwrap());
    }

    #[test]
    fn test_default_init_scale() {
        let mut nn = network_with_input(200);
        nn.add_layer(LayerConfig::Dense(DenseParams::new(50)))
            .unwrap();
        let weights = nn.layer(LayerId(1)).unwrap().as_dense().unwrap().weights();
        let n = weights.len() as f32;
        let mean = weights.sum() / n;
        let var = weights.mapv(|w| (w - mean).powi(2)).sum() / n;
        // He-style: variance 2 / neurons
        assert_relative_eq!(var, 2.0 / 50.0, max_relative = 0.1);
    }
}

mod shape_error_tests {
    use super::*;

    #[test]
    fn test_weight_columns_mismatch_surfaces_on_forward() {
        let mut nn = network_with_input(3);
        nn.add_layer(LayerConfig::Dense(
            DenseParams::new(2).weights(WeightInit::Fixed(Array2::ones((2, 4)))),
        ))
        .unwrap();

        let err = nn.predict(&array![1.0, 2.0, 3.0]).unwrap_err();
        match err {
            NetworkError::ShapeMismatch {
                layer,
                expected,
                received,
            } => {
                assert_eq!(layer, "d0");
                assert_eq!(expected, 4);
                assert_eq!(received, 3);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_predict_wrong_input_width() {
        let mut nn = network_with_input(3);
        nn.add_layer(LayerConfig::Dense(DenseParams::new(2)))
            .unwrap();
        let err = nn.predict(&array![1.0, 2.0]).unwrap_err();
        assert!(matches!(err, NetworkError::ShapeMismatch { expected: 3, received: 2, .. }));
    }

    #[test]
    fn test_predict_on_empty_network() {
        let mut nn = Network::new(TrainingConfig::default());
        assert!(nn.predict(&array![1.0]).unwrap_err().is_configuration());
    }

    #[test]
    fn test_input_only_network_echoes_input() {
        let mut nn = network_with_input(2);
        assert_eq!(nn.predict(&array![4.0, 5.0]).unwrap(), array![4.0, 5.0]);
        assert_eq!(nn.layer(LayerId(0)).unwrap().output_size(), 2);
    }
}
