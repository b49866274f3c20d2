//! Forward evaluation of a network graph
//!
//! Layers are computed in topological order over non-context connections.
//! Each incoming connection's contribution is recorded in the
//! [`OutputCache`] before the destination's bias and activation are applied.
//! Context connections read from an explicit [`RecurrentState`] owned by the
//! caller, so independent samples can be evaluated in parallel as long as each
//! worker owns its own state.

use std::sync::Arc;

use tracing::debug;

use super::cache::{CachedConnection, OutputCache};
use crate::backend::{ComputeBackend, SoftwareBackend};
use crate::error::{NetworkError, Result};
use crate::network::{ConnectionId, ConnectionKind, LayerId, NetworkGraph};

/// One-step delay buffers for context connections.
///
/// Each context connection remembers the source output it saw on the previous
/// evaluation. Missing entries read as zero, which is also the state right
/// after [`reset`](Self::reset).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecurrentState {
    delayed: Vec<Option<Vec<f64>>>,
}

impl RecurrentState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zero-filled buffers for every context connection of `graph`.
    pub fn for_graph(graph: &NetworkGraph) -> Self {
        let delayed = graph
            .connections()
            .iter()
            .map(|c| {
                c.is_context()
                    .then(|| vec![0.0; graph.layer(c.source()).neuron_count()])
            })
            .collect();
        Self { delayed }
    }

    /// Value the connection will read on the next evaluation.
    pub fn delayed(&self, id: ConnectionId) -> Option<&[f64]> {
        self.delayed.get(id.index()).and_then(|d| d.as_deref())
    }

    /// Forget all history; the next evaluation behaves like the first.
    pub fn reset(&mut self) {
        for values in self.delayed.iter_mut().flatten() {
            values.fill(0.0);
        }
    }

    fn read(&self, id: ConnectionId, size: usize) -> Result<Vec<f64>> {
        match self.delayed(id) {
            Some(values) if values.len() != size => Err(NetworkError::shape(
                format!("recurrent state of {id}"),
                size,
                values.len(),
            )),
            Some(values) => Ok(values.to_vec()),
            None => Ok(vec![0.0; size]),
        }
    }

    fn store(&mut self, id: ConnectionId, values: &[f64]) {
        if self.delayed.len() <= id.index() {
            self.delayed.resize(id.index() + 1, None);
        }
        match &mut self.delayed[id.index()] {
            Some(existing) => existing.copy_from_slice(values),
            slot => *slot = Some(values.to_vec()),
        }
    }
}

/// Result of one forward pass.
#[derive(Debug, Clone)]
pub struct Evaluation {
    output: Vec<f64>,
    layer_outputs: Vec<Vec<f64>>,
    cache: OutputCache,
}

impl Evaluation {
    /// Activated values of the output layer.
    pub fn output(&self) -> &[f64] {
        &self.output
    }

    /// Activated values of any layer computed in this pass.
    pub fn layer_output(&self, id: LayerId) -> &[f64] {
        &self.layer_outputs[id.index()]
    }

    pub fn cache(&self) -> &OutputCache {
        &self.cache
    }

    pub fn into_output(self) -> Vec<f64> {
        self.output
    }
}

/// Evaluates a validated graph.
///
/// # Example
///
/// ```
/// use neural_graph::network::{Layer, Matrix, NetworkGraph, ConnectionType};
/// use neural_graph::propagation::{ForwardEvaluator, RecurrentState};
/// use neural_graph::utils::Linear;
///
/// let mut graph = NetworkGraph::new();
/// let input = graph.add_layer(Layer::input(2)).unwrap();
/// let output = graph.add_layer(Layer::output(1, Linear::default()).with_bias()).unwrap();
/// let weights = Matrix::from_rows(&[vec![1.0], vec![1.0]]).unwrap();
/// graph.connect_with_matrix(input, output, ConnectionType::Weighted, weights).unwrap();
///
/// let evaluator = ForwardEvaluator::new(&graph).unwrap();
/// let mut state = RecurrentState::for_graph(&graph);
/// let evaluation = evaluator.evaluate(&[1.0, 2.0], &mut state).unwrap();
/// assert_eq!(evaluation.output(), &[3.0]);
/// ```
#[derive(Debug, Clone)]
pub struct ForwardEvaluator<'g> {
    graph: &'g NetworkGraph,
    backend: Arc<dyn ComputeBackend>,
    order: Vec<LayerId>,
    incoming: Vec<Vec<ConnectionId>>,
    input: LayerId,
    output: LayerId,
}

impl<'g> ForwardEvaluator<'g> {
    /// Validate the graph and prepare an evaluator on the software backend.
    pub fn new(graph: &'g NetworkGraph) -> Result<Self> {
        Self::with_backend(graph, Arc::new(SoftwareBackend))
    }

    pub fn with_backend(graph: &'g NetworkGraph, backend: Arc<dyn ComputeBackend>) -> Result<Self> {
        graph.validate()?;
        let order = graph.topological_order()?;
        let incoming = graph.layer_ids().map(|id| graph.incoming(id)).collect();
        Ok(Self {
            graph,
            backend,
            order,
            incoming,
            input: graph.input_layer()?,
            output: graph.output_layer()?,
        })
    }

    pub fn graph(&self) -> &'g NetworkGraph {
        self.graph
    }

    pub fn backend(&self) -> &Arc<dyn ComputeBackend> {
        &self.backend
    }

    /// Run one forward pass.
    ///
    /// `input` must match the input layer's neuron count. Context connections
    /// read `state` and, once the pass succeeds, `state` is advanced to this
    /// pass's source outputs. On error `state` is left untouched.
    pub fn evaluate(&self, input: &[f64], state: &mut RecurrentState) -> Result<Evaluation> {
        let expected = self.graph.layer(self.input).neuron_count();
        if input.len() != expected {
            return Err(NetworkError::shape("network input", expected, input.len()));
        }

        let mut cache = OutputCache::new();
        cache.clear(self.graph.connections().len());
        let mut layer_outputs = vec![Vec::new(); self.graph.layers().len()];

        for &layer_id in &self.order {
            let layer = self.graph.layer(layer_id);
            let mut sum = if layer_id == self.input {
                input.to_vec()
            } else {
                vec![0.0; layer.neuron_count()]
            };

            for &connection_id in &self.incoming[layer_id.index()] {
                let connection = self.graph.connection(connection_id);
                let source = connection.source();
                let read = if connection.is_context() {
                    state.read(connection_id, self.graph.layer(source).neuron_count())?
                } else {
                    layer_outputs[source.index()].clone()
                };

                let mut contribution = vec![0.0; layer.neuron_count()];
                match connection.kind() {
                    ConnectionKind::Weighted(matrix) | ConnectionKind::Context(matrix) => {
                        self.backend
                            .matvec_transposed_add(matrix, &read, &mut contribution);
                    }
                    ConnectionKind::OneToOne => contribution.copy_from_slice(&read),
                }

                for (s, c) in sum.iter_mut().zip(&contribution) {
                    *s += c;
                }
                cache.record(
                    connection_id,
                    CachedConnection {
                        input: read,
                        output: contribution,
                    },
                );
            }

            if let Some(bias) = layer.bias() {
                for (s, b) in sum.iter_mut().zip(bias) {
                    *s += b;
                }
            }
            self.backend.activate(layer.activation(), &mut sum);
            layer_outputs[layer_id.index()] = sum;
        }

        for connection_id in self.graph.connection_ids() {
            let connection = self.graph.connection(connection_id);
            if connection.is_context() {
                state.store(connection_id, &layer_outputs[connection.source().index()]);
            }
        }

        let output = layer_outputs[self.output.index()].clone();
        debug!(
            connections = cache.len(),
            outputs = output.len(),
            "forward pass complete"
        );
        Ok(Evaluation {
            output,
            layer_outputs,
            cache,
        })
    }

    /// Forward pass with fresh recurrent state; convenient for graphs
    /// without context connections.
    pub fn compute(&self, input: &[f64]) -> Result<Vec<f64>> {
        let mut state = RecurrentState::for_graph(self.graph);
        self.evaluate(input, &mut state).map(Evaluation::into_output)
    }
}
