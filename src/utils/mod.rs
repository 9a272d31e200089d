//! Shared utilities for the network engine
//!
//! This module provides the activation functions used by dense layers and the
//! seeded random number generator used for weight initialization.

pub mod activations;
pub mod rng;

pub use activations::{Activation, ActivationKind};
pub use rng::SeededRng;
