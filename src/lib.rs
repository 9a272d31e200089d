//! Feed-forward neural network engine
//!
//! A linear chain of layers with forward and backward propagation, pluggable
//! activation functions and a small training driver that accumulates gradients
//! over a full batch before applying one averaged update.
//!
//! # Modules
//!
//! - `layers`: Layer trait and the Input / Dense layer variants
//! - `optimizers`: gradient descent update rule
//! - `loss`: loss-function collaborator trait and mean squared error
//! - `network`: layer arena, construction wiring, train / predict
//! - `architecture`: declarative JSON network description and builder
//! - `config`: training configuration
//! - `data`: data-loader contract and label helpers
//! - `utils`: activations and seeded random number generation
//! - `error`: crate error type

pub mod architecture;
pub mod config;
pub mod data;
pub mod error;
pub mod layers;
pub mod loss;
pub mod network;
pub mod optimizers;
pub mod utils;

pub use error::{NetworkError, Result};
pub use network::{Network, NetworkState};
