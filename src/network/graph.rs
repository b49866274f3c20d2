//! The network graph: ordered layers, ordered connections, and the single
//! flat parameter vector used by external optimizers.

use std::collections::BTreeSet;

use tracing::debug;

use super::connection::{Connection, ConnectionId, ConnectionKind, ConnectionType};
use super::layer::{Layer, LayerId, LayerRole};
use super::matrix::Matrix;
use crate::error::{NetworkError, Result};

/// Owner of every layer and connection of a network.
///
/// Layers and connections are kept in declaration order; that order defines
/// the flattened parameter vector:
/// 1. every weighted/context matrix, connection by connection, row-major
/// 2. every bias vector, layer by layer
///
/// # Example
///
/// ```
/// use neural_graph::network::{Layer, NetworkGraph};
/// use neural_graph::utils::Sigmoid;
///
/// let mut graph = NetworkGraph::new();
/// let input = graph.add_layer(Layer::input(2)).unwrap();
/// let output = graph.add_layer(Layer::output(3, Sigmoid).with_bias()).unwrap();
/// graph.connect_weighted(input, output).unwrap();
///
/// assert_eq!(graph.parameter_count(), 2 * 3 + 3);
/// assert!(graph.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default)]
pub struct NetworkGraph {
    layers: Vec<Layer>,
    connections: Vec<Connection>,
}

/// Offsets of every connection matrix and bias vector inside the flat
/// parameter vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterLayout {
    connection_offsets: Vec<Option<usize>>,
    bias_offsets: Vec<Option<usize>>,
    total: usize,
}

impl ParameterLayout {
    /// Start of the connection's matrix, `None` for one-to-one connections.
    pub fn connection_offset(&self, id: ConnectionId) -> Option<usize> {
        self.connection_offsets.get(id.0).copied().flatten()
    }

    /// Start of the layer's bias, `None` when the layer has no bias.
    pub fn bias_offset(&self, id: LayerId) -> Option<usize> {
        self.bias_offsets.get(id.0).copied().flatten()
    }

    /// Total number of parameters.
    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

impl NetworkGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a layer and return its handle.
    ///
    /// Fails with a topology error for empty layers and for a second input or
    /// output layer.
    pub fn add_layer(&mut self, layer: Layer) -> Result<LayerId> {
        if layer.neuron_count() == 0 {
            return Err(NetworkError::Topology(
                "a layer must have at least one neuron".to_string(),
            ));
        }
        if layer.role() != LayerRole::Hidden {
            if let Some(existing) = self.find_role(layer.role()) {
                return Err(NetworkError::Topology(format!(
                    "graph already has an {:?} layer ({existing})",
                    layer.role()
                )));
            }
        }
        let id = LayerId(self.layers.len());
        self.layers.push(layer);
        Ok(id)
    }

    pub fn layer(&self, id: LayerId) -> &Layer {
        &self.layers[id.0]
    }

    pub fn layer_mut(&mut self, id: LayerId) -> &mut Layer {
        &mut self.layers[id.0]
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer_ids(&self) -> impl Iterator<Item = LayerId> {
        (0..self.layers.len()).map(LayerId)
    }

    pub fn connection(&self, id: ConnectionId) -> &Connection {
        &self.connections[id.0]
    }

    pub fn connection_mut(&mut self, id: ConnectionId) -> &mut Connection {
        &mut self.connections[id.0]
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn connection_ids(&self) -> impl Iterator<Item = ConnectionId> {
        (0..self.connections.len()).map(ConnectionId)
    }

    /// Connect two layers with a zero-initialized matrix (weighted/context)
    /// or an identity pass-through (one-to-one).
    ///
    /// Nothing is added when a structural invariant fails:
    /// - one-to-one layers must have equal neuron counts
    /// - only context connections may close a cycle
    pub fn connect(
        &mut self,
        source: LayerId,
        destination: LayerId,
        connection_type: ConnectionType,
    ) -> Result<ConnectionId> {
        let (rows, cols) = self.endpoint_sizes(source, destination)?;
        let kind = match connection_type {
            ConnectionType::Weighted => ConnectionKind::Weighted(Matrix::zeros(rows, cols)),
            ConnectionType::Context => ConnectionKind::Context(Matrix::zeros(rows, cols)),
            ConnectionType::OneToOne => {
                if rows != cols {
                    return Err(NetworkError::Topology(format!(
                        "one-to-one connection needs equal neuron counts, \
                         {source} has {rows} and {destination} has {cols}"
                    )));
                }
                ConnectionKind::OneToOne
            }
        };
        self.insert(source, destination, kind)
    }

    pub fn connect_weighted(
        &mut self,
        source: LayerId,
        destination: LayerId,
    ) -> Result<ConnectionId> {
        self.connect(source, destination, ConnectionType::Weighted)
    }

    pub fn connect_one_to_one(
        &mut self,
        source: LayerId,
        destination: LayerId,
    ) -> Result<ConnectionId> {
        self.connect(source, destination, ConnectionType::OneToOne)
    }

    pub fn connect_context(
        &mut self,
        source: LayerId,
        destination: LayerId,
    ) -> Result<ConnectionId> {
        self.connect(source, destination, ConnectionType::Context)
    }

    /// Connect with explicit weights. The matrix must be
    /// `source.neuron_count × destination.neuron_count`.
    pub fn connect_with_matrix(
        &mut self,
        source: LayerId,
        destination: LayerId,
        connection_type: ConnectionType,
        matrix: Matrix,
    ) -> Result<ConnectionId> {
        let (rows, cols) = self.endpoint_sizes(source, destination)?;
        if matrix.rows() != rows || matrix.cols() != cols {
            return Err(NetworkError::Topology(format!(
                "matrix is {}x{} but {source} -> {destination} needs {rows}x{cols}",
                matrix.rows(),
                matrix.cols()
            )));
        }
        let kind = match connection_type {
            ConnectionType::Weighted => ConnectionKind::Weighted(matrix),
            ConnectionType::Context => ConnectionKind::Context(matrix),
            ConnectionType::OneToOne => {
                return Err(NetworkError::Topology(
                    "one-to-one connections carry no matrix".to_string(),
                ))
            }
        };
        self.insert(source, destination, kind)
    }

    fn endpoint_sizes(&self, source: LayerId, destination: LayerId) -> Result<(usize, usize)> {
        let size = |id: LayerId| {
            self.layers
                .get(id.0)
                .map(Layer::neuron_count)
                .ok_or_else(|| NetworkError::Topology(format!("unknown {id}")))
        };
        Ok((size(source)?, size(destination)?))
    }

    fn insert(
        &mut self,
        source: LayerId,
        destination: LayerId,
        kind: ConnectionKind,
    ) -> Result<ConnectionId> {
        let is_context = matches!(kind, ConnectionKind::Context(_));
        if !is_context && (source == destination || self.reaches(destination, source)) {
            return Err(NetworkError::Topology(format!(
                "{source} -> {destination} would close a cycle; only context connections may"
            )));
        }
        let id = ConnectionId(self.connections.len());
        self.connections.push(Connection {
            source,
            destination,
            kind,
        });
        Ok(id)
    }

    /// Whether `to` is reachable from `from` along non-context connections.
    fn reaches(&self, from: LayerId, to: LayerId) -> bool {
        let mut visited = vec![false; self.layers.len()];
        let mut stack = vec![from];
        while let Some(current) = stack.pop() {
            if current == to {
                return true;
            }
            if std::mem::replace(&mut visited[current.0], true) {
                continue;
            }
            stack.extend(
                self.connections
                    .iter()
                    .filter(|c| !c.is_context() && c.source == current)
                    .map(|c| c.destination),
            );
        }
        false
    }

    /// Connections whose destination is `layer`, in declaration order.
    pub fn incoming(&self, layer: LayerId) -> Vec<ConnectionId> {
        self.connection_ids()
            .filter(|&id| self.connections[id.0].destination == layer)
            .collect()
    }

    /// Connections whose source is `layer`, in declaration order.
    pub fn outgoing(&self, layer: LayerId) -> Vec<ConnectionId> {
        self.connection_ids()
            .filter(|&id| self.connections[id.0].source == layer)
            .collect()
    }

    fn find_role(&self, role: LayerRole) -> Option<LayerId> {
        self.layers
            .iter()
            .position(|l| l.role() == role)
            .map(LayerId)
    }

    pub fn input_layer(&self) -> Result<LayerId> {
        self.find_role(LayerRole::Input)
            .ok_or_else(|| NetworkError::Topology("graph has no input layer".to_string()))
    }

    pub fn output_layer(&self) -> Result<LayerId> {
        self.find_role(LayerRole::Output)
            .ok_or_else(|| NetworkError::Topology("graph has no output layer".to_string()))
    }

    pub fn has_context_connections(&self) -> bool {
        self.connections.iter().any(Connection::is_context)
    }

    /// Check every structural invariant of a complete graph.
    pub fn validate(&self) -> Result<()> {
        let input = self.input_layer()?;
        self.output_layer()?;
        for id in self.layer_ids() {
            if id != input && self.incoming(id).is_empty() {
                return Err(NetworkError::Topology(format!(
                    "{id} is not the destination of any connection"
                )));
            }
        }
        self.topological_order().map(|_| ())
    }

    /// Layers ordered so every non-context connection points forward.
    ///
    /// Ties are broken by declaration order, so the result is deterministic.
    pub fn topological_order(&self) -> Result<Vec<LayerId>> {
        let mut in_degree = vec![0usize; self.layers.len()];
        for c in self.connections.iter().filter(|c| !c.is_context()) {
            in_degree[c.destination.0] += 1;
        }
        let mut ready: BTreeSet<usize> = (0..self.layers.len())
            .filter(|&i| in_degree[i] == 0)
            .collect();

        let mut order = Vec::with_capacity(self.layers.len());
        while let Some(next) = ready.pop_first() {
            order.push(LayerId(next));
            for c in self.connections.iter() {
                if c.is_context() || c.source.0 != next {
                    continue;
                }
                in_degree[c.destination.0] -= 1;
                if in_degree[c.destination.0] == 0 {
                    ready.insert(c.destination.0);
                }
            }
        }

        if order.len() != self.layers.len() {
            return Err(NetworkError::Topology(
                "non-context connections form a cycle".to_string(),
            ));
        }
        Ok(order)
    }

    /// Total number of trainable values: every matrix entry plus every bias.
    pub fn parameter_count(&self) -> usize {
        self.connections
            .iter()
            .map(Connection::parameter_count)
            .sum::<usize>()
            + self.layers.iter().map(Layer::parameter_count).sum::<usize>()
    }

    /// Where each matrix and bias lives in the flat parameter vector.
    pub fn parameter_layout(&self) -> ParameterLayout {
        let mut offset = 0;
        let connection_offsets = self
            .connections
            .iter()
            .map(|c| {
                c.matrix().map(|m| {
                    let start = offset;
                    offset += m.len();
                    start
                })
            })
            .collect();
        let bias_offsets = self
            .layers
            .iter()
            .map(|l| {
                l.bias().map(|b| {
                    let start = offset;
                    offset += b.len();
                    start
                })
            })
            .collect();
        ParameterLayout {
            connection_offsets,
            bias_offsets,
            total: offset,
        }
    }

    /// Copy every weight and bias into one vector.
    pub fn flatten(&self) -> Vec<f64> {
        let mut params = Vec::with_capacity(self.parameter_count());
        for matrix in self.connections.iter().filter_map(Connection::matrix) {
            params.extend_from_slice(matrix.as_slice());
        }
        for bias in self.layers.iter().filter_map(Layer::bias) {
            params.extend_from_slice(bias);
        }
        params
    }

    /// Overwrite every weight and bias from a vector produced by
    /// [`flatten`](Self::flatten). The graph is untouched on a length mismatch.
    pub fn unflatten(&mut self, params: &[f64]) -> Result<()> {
        let expected = self.parameter_count();
        if params.len() != expected {
            return Err(NetworkError::shape("flat parameters", expected, params.len()));
        }

        let mut rest = params;
        for matrix in self.connections.iter_mut().filter_map(Connection::matrix_mut) {
            let (head, tail) = rest.split_at(matrix.len());
            matrix.as_mut_slice().copy_from_slice(head);
            rest = tail;
        }
        for bias in self.layers.iter_mut().filter_map(Layer::bias_mut) {
            let (head, tail) = rest.split_at(bias.len());
            bias.copy_from_slice(head);
            rest = tail;
        }
        debug!(parameters = expected, "unflattened parameters into graph");
        Ok(())
    }
}
