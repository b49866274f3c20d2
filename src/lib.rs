//! Graph-based feed-forward neural network engine
//!
//! This library evaluates networks whose layers are joined by heterogeneous
//! connections (dense weight matrices, one-to-one pass-throughs and
//! one-step-delayed context links), propagates errors backward through them,
//! and builds per-sample gradients and Jacobians for training algorithms.
//!
//! # Modules
//!
//! - `network`: Layers, connections, the graph and its flat parameter vector
//! - `propagation`: Forward evaluation, backward deltas, gradients, Jacobians
//! - `backend`: Matrix-vector primitives (software, optional BLAS)
//! - `data`: Training set access
//! - `randomize`: Weight and bias initialization
//! - `utils`: Shared utilities (RNG, activation functions)
//! - `config`: Training configuration structures
//! - `architecture`: Architecture configuration and graph building
//! - `error`: The crate-wide error type

pub mod architecture;
pub mod backend;
pub mod config;
pub mod data;
pub mod error;
pub mod network;
pub mod propagation;
pub mod randomize;
pub mod utils;

pub use error::{NetworkError, Result};
