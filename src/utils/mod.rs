//! Shared utilities for the network engine
//!
//! This module provides random number generation and the activation
//! functions attached to layers.

pub mod activations;
pub mod rng;

pub use activations::{
    activation_from_name, sigmoid, sigmoid_derivative, ActivationFunction, Identity, Linear,
    Sigmoid, Step, Tanh,
};
pub use rng::SimpleRng;
