//! Forward and backward propagation over a [`NetworkGraph`](crate::network::NetworkGraph)
//!
//! # Overview
//!
//! - [`ForwardEvaluator`] computes activations and fills the [`OutputCache`]
//! - [`BackwardPropagator`] turns an evaluation and ideal values into
//!   per-layer deltas
//! - [`GradientCalculator`] sums per-parameter gradients over a training set
//! - [`JacobianBuilder`] produces one Jacobian row and residual per sample
//!
//! All of them borrow the graph immutably, so weights cannot change while a
//! batch is being processed. Updates go through
//! [`NetworkGraph::unflatten`](crate::network::NetworkGraph::unflatten)
//! between batches.
//!
//! # Example
//!
//! ```
//! use neural_graph::network::{Layer, NetworkGraph};
//! use neural_graph::propagation::{BackwardPropagator, ForwardEvaluator, RecurrentState};
//! use neural_graph::utils::Sigmoid;
//!
//! let mut graph = NetworkGraph::new();
//! let input = graph.add_layer(Layer::input(2)).unwrap();
//! let output = graph.add_layer(Layer::output(1, Sigmoid).with_bias()).unwrap();
//! graph.connect_weighted(input, output).unwrap();
//!
//! let forward = ForwardEvaluator::new(&graph).unwrap();
//! let backward = BackwardPropagator::new(&graph).unwrap();
//! let mut state = RecurrentState::for_graph(&graph);
//!
//! let evaluation = forward.evaluate(&[0.5, -0.5], &mut state).unwrap();
//! let pass = backward.backward(&evaluation, &[1.0]).unwrap();
//! // sigmoid(0) = 0.5, derivative 0.25, error 0.5
//! assert_eq!(pass.delta(output), Some(&[0.125][..]));
//! ```

pub mod backward;
pub mod cache;
pub mod forward;
pub mod gradient;
pub mod jacobian;

pub use backward::{BackwardPass, BackwardPropagator, PropagationLevel};
pub use cache::{CachedConnection, OutputCache};
pub use forward::{Evaluation, ForwardEvaluator, RecurrentState};
pub use gradient::{accumulate_gradients, parameter_gradients, GradientBatch, GradientCalculator};
pub use jacobian::{JacobianBuilder, JacobianResult};
