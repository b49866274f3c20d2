//! Network model: layers, connections, and the graph that owns them
//!
//! This module provides the data model evaluated by
//! [`propagation`](crate::propagation): layers with activations and optional
//! biases, connections of three kinds (weighted, one-to-one, context), and
//! the [`NetworkGraph`] that validates the topology and exposes the flat
//! parameter vector.

pub mod connection;
pub mod graph;
pub mod layer;
pub mod matrix;

pub use connection::{Connection, ConnectionId, ConnectionKind, ConnectionType};
pub use graph::{NetworkGraph, ParameterLayout};
pub use layer::{Layer, LayerId, LayerRole};
pub use matrix::Matrix;
