//! Per-parameter gradients aligned with the flat parameter vector
//!
//! For a weight `(i, j)` of a connection the gradient is
//! `cached_input[i] * delta_destination[j]`; for a bias it is the delta of
//! its neuron. With error deltas (`ideal - actual`) this is the negative
//! derivative of half the squared error, so an optimizer moves parameters
//! *along* the gradient to reduce the error.

use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, warn};

use super::backward::{BackwardPass, BackwardPropagator};
use super::forward::{Evaluation, ForwardEvaluator, RecurrentState};
use crate::backend::{ComputeBackend, SoftwareBackend};
use crate::data::TrainingSet;
use crate::error::{NetworkError, Result};
use crate::network::{NetworkGraph, ParameterLayout};

/// Gradient of one pass, in flatten order.
pub fn parameter_gradients(
    graph: &NetworkGraph,
    evaluation: &Evaluation,
    backward: &BackwardPass,
) -> Vec<f64> {
    let layout = graph.parameter_layout();
    let mut gradients = vec![0.0; layout.len()];
    accumulate_gradients(graph, &layout, evaluation, backward, &mut gradients);
    gradients
}

/// Add one pass's gradient into `gradients` (flatten order).
///
/// Parameters that do not influence the output are left unchanged.
pub fn accumulate_gradients(
    graph: &NetworkGraph,
    layout: &ParameterLayout,
    evaluation: &Evaluation,
    backward: &BackwardPass,
    gradients: &mut [f64],
) {
    for id in graph.connection_ids() {
        let connection = graph.connection(id);
        let (Some(offset), Some(deltas), Some(cached)) = (
            layout.connection_offset(id),
            backward.delta(connection.destination()),
            evaluation.cache().get(id),
        ) else {
            continue;
        };
        let cols = deltas.len();
        for (i, &x) in cached.input.iter().enumerate() {
            let row = &mut gradients[offset + i * cols..offset + (i + 1) * cols];
            for (g, &d) in row.iter_mut().zip(deltas) {
                *g += x * d;
            }
        }
    }

    for id in graph.layer_ids() {
        let (Some(offset), Some(deltas)) = (layout.bias_offset(id), backward.delta(id)) else {
            continue;
        };
        for (g, &d) in gradients[offset..offset + deltas.len()].iter_mut().zip(deltas) {
            *g += d;
        }
    }
}

/// Summed gradients over a training set.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientBatch {
    /// Σ over samples of the per-sample gradient, flatten order.
    pub gradients: Vec<f64>,
    /// Half the sum of squared errors over every output of every sample.
    pub error: f64,
    pub samples: usize,
}

/// Batch gradient calculation for first-order trainers.
#[derive(Debug, Clone)]
pub struct GradientCalculator<'g> {
    forward: ForwardEvaluator<'g>,
    backward: BackwardPropagator<'g>,
    layout: ParameterLayout,
    parallel: bool,
}

impl<'g> GradientCalculator<'g> {
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

    /// Evaluate samples on the rayon pool. Ignored for graphs with context
    /// connections, whose samples depend on each other through the state.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn calculate(&self, training: &dyn TrainingSet) -> Result<GradientBatch> {
        let mut state = RecurrentState::for_graph(self.forward.graph());
        self.calculate_with_state(training, &mut state)
    }

    /// Like [`calculate`](Self::calculate), continuing from `state` and
    /// leaving it advanced past the last sample.
    pub fn calculate_with_state(
        &self,
        training: &dyn TrainingSet,
        state: &mut RecurrentState,
    ) -> Result<GradientBatch> {
        let graph = self.forward.graph();
        self.backward.check_differentiable()?;
        let input_size = graph.layer(graph.input_layer()?).neuron_count();
        if training.count() > 0 && training.input_size() != input_size {
            return Err(NetworkError::shape(
                "training input",
                input_size,
                training.input_size(),
            ));
        }

        let samples = training.count();
        let results: Vec<(Vec<f64>, f64)> = if self.parallel && !graph.has_context_connections() {
            (0..samples)
                .into_par_iter()
                .map(|index| {
                    let mut private = RecurrentState::for_graph(graph);
                    self.sample(training, index, &mut private)
                })
                .collect::<Result<_>>()?
        } else {
            if self.parallel {
                warn!("graph has context connections; computing gradients sequentially");
            }
            (0..samples)
                .map(|index| self.sample(training, index, state))
                .collect::<Result<_>>()?
        };

        // fixed sample order keeps the sums reproducible
        let mut gradients = vec![0.0; self.layout.len()];
        let mut error = 0.0;
        for (sample_gradients, sample_error) in &results {
            for (g, s) in gradients.iter_mut().zip(sample_gradients) {
                *g += s;
            }
            error += sample_error;
        }

        debug!(samples, error, "gradient batch complete");
        Ok(GradientBatch {
            gradients,
            error,
            samples,
        })
    }

    fn sample(
        &self,
        training: &dyn TrainingSet,
        index: usize,
        state: &mut RecurrentState,
    ) -> Result<(Vec<f64>, f64)> {
        let (input, ideal) = training.record(index);
        let evaluation = self.forward.evaluate(input, state)?;
        let backward = self.backward.backward(&evaluation, ideal)?;
        let mut gradients = vec![0.0; self.layout.len()];
        accumulate_gradients(
            self.forward.graph(),
            &self.layout,
            &evaluation,
            &backward,
            &mut gradients,
        );
        let error = evaluation
            .output()
            .iter()
            .zip(ideal)
            .map(|(y, t)| (t - y) * (t - y))
            .sum::<f64>()
            / 2.0;
        Ok((gradients, error))
    }
}
