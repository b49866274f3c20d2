//! Backward propagation of error signals
//!
//! The propagator walks the graph backward from the output layer and builds
//! one [`PropagationLevel`] per reachable layer, ordered so that every layer
//! comes after all the layers it feeds. Deltas are routed along each level's
//! incoming connections and summed at the source, so a layer that fans out to
//! several destinations receives the total of all contributions before its
//! own activation derivative is applied.
//!
//! Context connections are not followed backward: the value they carry comes
//! from the previous evaluation and is a constant of the current one.

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::{debug, trace};

use super::forward::Evaluation;
use crate::backend::{ComputeBackend, SoftwareBackend};
use crate::error::{NetworkError, Result};
use crate::network::{ConnectionId, ConnectionKind, LayerId, NetworkGraph};

/// Delta vector of one layer plus the connections that feed it.
#[derive(Debug, Clone, PartialEq)]
pub struct PropagationLevel {
    pub layer: LayerId,
    pub deltas: Vec<f64>,
    /// Non-context connections whose destination is `layer`.
    pub incoming: Vec<ConnectionId>,
}

/// All levels produced by one backward pass, output level first.
#[derive(Debug, Clone)]
pub struct BackwardPass {
    levels: Vec<PropagationLevel>,
    positions: Vec<Option<usize>>,
}

impl BackwardPass {
    pub fn levels(&self) -> &[PropagationLevel] {
        &self.levels
    }

    /// Delta of `layer`, `None` when the layer does not influence the output.
    pub fn delta(&self, layer: LayerId) -> Option<&[f64]> {
        self.positions
            .get(layer.index())
            .copied()
            .flatten()
            .map(|pos| self.levels[pos].deltas.as_slice())
    }

    pub fn into_levels(self) -> Vec<PropagationLevel> {
        self.levels
    }
}

/// Reverse-mode chain rule over a heterogeneous graph.
#[derive(Debug, Clone)]
pub struct BackwardPropagator<'g> {
    graph: &'g NetworkGraph,
    backend: Arc<dyn ComputeBackend>,
    plan: Vec<(LayerId, Vec<ConnectionId>)>,
    input: LayerId,
    output: LayerId,
}

impl<'g> BackwardPropagator<'g> {
    pub fn new(graph: &'g NetworkGraph) -> Result<Self> {
        Self::with_backend(graph, Arc::new(SoftwareBackend))
    }

    pub fn with_backend(graph: &'g NetworkGraph, backend: Arc<dyn ComputeBackend>) -> Result<Self> {
        graph.validate()?;
        let input = graph.input_layer()?;
        let output = graph.output_layer()?;

        let mut reachable = vec![false; graph.layers().len()];
        let mut queue = VecDeque::from([output]);
        while let Some(layer) = queue.pop_front() {
            if std::mem::replace(&mut reachable[layer.index()], true) {
                continue;
            }
            for id in graph.incoming(layer) {
                let connection = graph.connection(id);
                if !connection.is_context() {
                    queue.push_back(connection.source());
                }
            }
        }

        let plan = graph
            .topological_order()?
            .into_iter()
            .rev()
            .filter(|layer| reachable[layer.index()])
            .map(|layer| {
                let incoming = graph
                    .incoming(layer)
                    .into_iter()
                    .filter(|&id| !graph.connection(id).is_context())
                    .collect();
                (layer, incoming)
            })
            .collect();

        Ok(Self {
            graph,
            backend,
            plan,
            input,
            output,
        })
    }

    pub fn graph(&self) -> &'g NetworkGraph {
        self.graph
    }

    /// Layers in propagation order, output first.
    pub fn level_layers(&self) -> impl Iterator<Item = LayerId> + '_ {
        self.plan.iter().map(|(layer, _)| *layer)
    }

    /// Fail unless every activation the chain rule passes through has a
    /// derivative. The input layer only matters when it carries a bias or is
    /// fed by a connection of any kind, context included.
    pub fn check_differentiable(&self) -> Result<()> {
        let output = self.graph.layer(self.output);
        if !output.activation().has_derivative() {
            return Err(NetworkError::Configuration(format!(
                "output activation '{}' has no derivative; gradient training is not possible",
                output.activation().name()
            )));
        }
        for (id, _) in &self.plan {
            let layer = self.graph.layer(*id);
            let needed = *id != self.input
                || layer.has_bias()
                || !self.graph.incoming(*id).is_empty();
            if needed && !layer.activation().has_derivative() {
                return Err(NetworkError::Configuration(format!(
                    "{id} activation '{}' has no derivative; gradient training is not possible",
                    layer.activation().name()
                )));
            }
        }
        Ok(())
    }

    /// Error deltas for every layer that influences the output.
    ///
    /// The output level is `derivative(y[i]) * (ideal[i] - y[i])`.
    pub fn backward(&self, evaluation: &Evaluation, ideal: &[f64]) -> Result<BackwardPass> {
        let fired = evaluation.output();
        if ideal.len() != fired.len() {
            return Err(NetworkError::shape("ideal output", fired.len(), ideal.len()));
        }
        self.check_differentiable()?;

        let activation = self.graph.layer(self.output).activation();
        let seed = fired
            .iter()
            .zip(ideal)
            .map(|(&y, &t)| activation.derivative(y) * (t - y))
            .collect();
        Ok(self.propagate(evaluation, seed))
    }

    /// Sensitivity of the output itself: the output level is seeded with
    /// `derivative(y[i])` alone, so the resulting gradients are `∂y/∂θ`.
    pub fn propagate_output_sensitivity(&self, evaluation: &Evaluation) -> Result<BackwardPass> {
        self.check_differentiable()?;
        let activation = self.graph.layer(self.output).activation();
        let seed = evaluation
            .output()
            .iter()
            .map(|&y| activation.derivative(y))
            .collect();
        Ok(self.propagate(evaluation, seed))
    }

    fn propagate(&self, evaluation: &Evaluation, seed: Vec<f64>) -> BackwardPass {
        let layer_count = self.graph.layers().len();
        let mut error_sums: Vec<Option<Vec<f64>>> = vec![None; layer_count];
        let mut positions = vec![None; layer_count];
        let mut levels = Vec::with_capacity(self.plan.len());

        for (layer_id, incoming) in &self.plan {
            let layer = self.graph.layer(*layer_id);
            let deltas = if *layer_id == self.output {
                seed.clone()
            } else {
                let mut sum = error_sums[layer_id.index()]
                    .take()
                    .unwrap_or_else(|| vec![0.0; layer.neuron_count()]);
                let activation = layer.activation();
                if activation.has_derivative() {
                    let outputs = evaluation.layer_output(*layer_id);
                    for (d, &y) in sum.iter_mut().zip(outputs) {
                        *d *= activation.derivative(y);
                    }
                }
                sum
            };

            for &connection_id in incoming {
                let connection = self.graph.connection(connection_id);
                let source = connection.source();
                let source_size = self.graph.layer(source).neuron_count();
                let accumulated =
                    error_sums[source.index()].get_or_insert_with(|| vec![0.0; source_size]);
                match connection.kind() {
                    ConnectionKind::Weighted(matrix) => {
                        self.backend.matvec_add(matrix, &deltas, accumulated);
                    }
                    ConnectionKind::OneToOne => {
                        for (a, d) in accumulated.iter_mut().zip(&deltas) {
                            *a += d;
                        }
                    }
                    // filtered out when the plan is built
                    ConnectionKind::Context(_) => {}
                }
            }

            trace!(layer = %layer_id, deltas = ?deltas, "propagation level");
            positions[layer_id.index()] = Some(levels.len());
            levels.push(PropagationLevel {
                layer: *layer_id,
                deltas,
                incoming: incoming.clone(),
            });
        }

        debug!(levels = levels.len(), "backward pass complete");
        BackwardPass { levels, positions }
    }
}
