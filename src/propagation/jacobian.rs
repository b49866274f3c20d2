//! Per-sample Jacobian for second-order (Levenberg-Marquardt style) trainers
//!
//! Each row holds `∂y/∂θ` for one training sample, where `y` is the single
//! network output and `θ` runs over the flat parameter vector in flatten
//! order. Rows are produced by the same recursive reverse pass as the error
//! deltas, seeded with the output derivative instead of the error, so any
//! depth and any mix of connection kinds is supported.

use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, warn};

use super::backward::BackwardPropagator;
use super::forward::{ForwardEvaluator, RecurrentState};
use super::gradient::accumulate_gradients;
use crate::backend::{ComputeBackend, SoftwareBackend};
use crate::data::TrainingSet;
use crate::error::{NetworkError, Result};
use crate::network::{NetworkGraph, ParameterLayout};

/// Jacobian matrix, residuals and error of one batch.
#[derive(Debug, Clone, PartialEq)]
pub struct JacobianResult {
    /// `jacobian[sample][parameter] = ∂y_sample/∂θ_parameter`.
    pub jacobian: Vec<Vec<f64>>,
    /// `ideal - actual` per sample.
    pub residuals: Vec<f64>,
    /// Half the sum of squared residuals.
    pub error: f64,
}

impl JacobianResult {
    /// Number of samples.
    pub fn rows(&self) -> usize {
        self.jacobian.len()
    }

    /// Number of parameters.
    pub fn cols(&self) -> usize {
        self.jacobian.first().map_or(0, Vec::len)
    }
}

/// Builds [`JacobianResult`]s for a fixed graph.
///
/// # Example
///
/// ```
/// use neural_graph::data::BasicTrainingSet;
/// use neural_graph::network::{Layer, NetworkGraph};
/// use neural_graph::propagation::JacobianBuilder;
/// use neural_graph::utils::{Linear, Sigmoid};
///
/// let mut graph = NetworkGraph::new();
/// let input = graph.add_layer(Layer::input(2)).unwrap();
/// let hidden = graph.add_layer(Layer::new(3, Sigmoid).with_bias()).unwrap();
/// let output = graph.add_layer(Layer::output(1, Linear::default()).with_bias()).unwrap();
/// graph.connect_weighted(input, hidden).unwrap();
/// graph.connect_weighted(hidden, output).unwrap();
///
/// let data = BasicTrainingSet::new(vec![vec![0.0, 1.0]], vec![vec![1.0]]).unwrap();
/// let result = JacobianBuilder::new(&graph).unwrap().build(&data).unwrap();
/// assert_eq!(result.rows(), 1);
/// assert_eq!(result.cols(), graph.parameter_count());
/// ```
#[derive(Debug, Clone)]
pub struct JacobianBuilder<'g> {
    forward: ForwardEvaluator<'g>,
    backward: BackwardPropagator<'g>,
    layout: ParameterLayout,
    parallel: bool,
}

impl<'g> JacobianBuilder<'g> {
    pub fn new(graph: &'g NetworkGraph) -> Result<Self> {
        Self::with_backend(graph, Arc::new(SoftwareBackend))
    }

    pub fn with_backend(graph: &'g NetworkGraph, backend: Arc<dyn ComputeBackend>) -> Result<Self> {
        Ok(Self {
            forward: ForwardEvaluator::with_backend(graph, Arc::clone(&backend))?,
            backward: BackwardPropagator::with_backend(graph, backend)?,
            layout: graph.parameter_layout(),
            parallel: false,
        })
    }

    /// Compute rows on the rayon pool. Graphs with context connections are
    /// always processed sequentially, sharing one recurrent state.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn build(&self, training: &dyn TrainingSet) -> Result<JacobianResult> {
        let mut state = RecurrentState::for_graph(self.forward.graph());
        self.build_with_state(training, &mut state)
    }

    /// Like [`build`](Self::build), continuing from `state`.
    pub fn build_with_state(
        &self,
        training: &dyn TrainingSet,
        state: &mut RecurrentState,
    ) -> Result<JacobianResult> {
        self.check_shapes(training)?;
        self.backward.check_differentiable()?;

        let graph = self.forward.graph();
        let samples = training.count();
        let rows: Vec<(Vec<f64>, f64)> = if self.parallel && !graph.has_context_connections() {
            (0..samples)
                .into_par_iter()
                .map(|index| {
                    let mut private = RecurrentState::for_graph(graph);
                    self.row(training, index, &mut private)
                })
                .collect::<Result<_>>()?
        } else {
            if self.parallel {
                warn!("graph has context connections; building the jacobian sequentially");
            }
            (0..samples)
                .map(|index| self.row(training, index, state))
                .collect::<Result<_>>()?
        };

        let (jacobian, residuals): (Vec<Vec<f64>>, Vec<f64>) = rows.into_iter().unzip();
        // sample order, so the sum is reproducible
        let error = residuals.iter().map(|e| e * e).sum::<f64>() / 2.0;

        debug!(
            samples,
            parameters = self.layout.len(),
            error,
            "jacobian complete"
        );
        Ok(JacobianResult {
            jacobian,
            residuals,
            error,
        })
    }

    fn check_shapes(&self, training: &dyn TrainingSet) -> Result<()> {
        let graph = self.forward.graph();
        let output_size = graph.layer(graph.output_layer()?).neuron_count();
        if output_size != 1 {
            return Err(NetworkError::shape("jacobian output layer", 1, output_size));
        }
        if training.count() == 0 {
            return Ok(());
        }
        if training.ideal_size() != 1 {
            return Err(NetworkError::shape("training ideal", 1, training.ideal_size()));
        }
        let input_size = graph.layer(graph.input_layer()?).neuron_count();
        if training.input_size() != input_size {
            return Err(NetworkError::shape(
                "training input",
                input_size,
                training.input_size(),
            ));
        }
        Ok(())
    }

    fn row(
        &self,
        training: &dyn TrainingSet,
        index: usize,
        state: &mut RecurrentState,
    ) -> Result<(Vec<f64>, f64)> {
        let (input, ideal) = training.record(index);
        if ideal.len() != 1 {
            return Err(NetworkError::shape("training ideal", 1, ideal.len()));
        }
        let evaluation = self.forward.evaluate(input, state)?;
        let sensitivity = self.backward.propagate_output_sensitivity(&evaluation)?;

        let mut row = vec![0.0; self.layout.len()];
        accumulate_gradients(
            self.forward.graph(),
            &self.layout,
            &evaluation,
            &sensitivity,
            &mut row,
        );
        Ok((row, ideal[0] - evaluation.output()[0]))
    }
}
