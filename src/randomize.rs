//! Weight and bias randomization

use crate::network::NetworkGraph;
use crate::utils::SimpleRng;

/// Produces new values for every trainable parameter of a graph.
pub trait Randomizer {
    /// New value for a single parameter, given its current value.
    fn next_value(&mut self, current: f64) -> f64;

    /// Replace every matrix entry and every bias of `graph`.
    ///
    /// One-to-one connections and bias-free layers are skipped.
    fn randomize(&mut self, graph: &mut NetworkGraph) {
        let connections: Vec<_> = graph.connection_ids().collect();
        for id in connections {
            if let Some(matrix) = graph.connection_mut(id).matrix_mut() {
                for value in matrix.as_mut_slice() {
                    *value = self.next_value(*value);
                }
            }
        }
        let layers: Vec<_> = graph.layer_ids().collect();
        for id in layers {
            if let Some(bias) = graph.layer_mut(id).bias_mut() {
                for value in bias.iter_mut() {
                    *value = self.next_value(*value);
                }
            }
        }
    }
}

/// Uniform values in `[min, max)`.
#[derive(Debug, Clone)]
pub struct RangeRandomizer {
    min: f64,
    max: f64,
    rng: SimpleRng,
}

impl RangeRandomizer {
    pub fn new(min: f64, max: f64, seed: u64) -> Self {
        Self {
            min,
            max,
            rng: SimpleRng::new(seed),
        }
    }

    /// Draw from an existing generator instead of a fresh seed.
    pub fn with_rng(min: f64, max: f64, rng: SimpleRng) -> Self {
        Self { min, max, rng }
    }
}

impl Randomizer for RangeRandomizer {
    fn next_value(&mut self, _current: f64) -> f64 {
        self.rng.gen_range_f64(self.min, self.max)
    }
}

/// Sets every parameter to the same value.
#[derive(Debug, Clone, Copy)]
pub struct ConstantRandomizer(pub f64);

impl Randomizer for ConstantRandomizer {
    fn next_value(&mut self, _current: f64) -> f64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::Layer;
    use crate::utils::Sigmoid;

    fn graph() -> NetworkGraph {
        let mut graph = NetworkGraph::new();
        let input = graph.add_layer(Layer::input(2)).unwrap();
        let output = graph.add_layer(Layer::output(2, Sigmoid).with_bias()).unwrap();
        graph.connect_weighted(input, output).unwrap();
        graph.connect_one_to_one(input, output).unwrap();
        graph
    }

    #[test]
    fn test_range_randomizer_bounds() {
        let mut g = graph();
        RangeRandomizer::new(-0.5, 0.5, 7).randomize(&mut g);
        let params = g.flatten();
        assert_eq!(params.len(), 6);
        assert!(params.iter().all(|p| (-0.5..0.5).contains(p)));
        assert!(params.iter().any(|&p| p != 0.0));
    }

    #[test]
    fn test_same_seed_same_weights() {
        let mut a = graph();
        let mut b = graph();
        RangeRandomizer::new(-1.0, 1.0, 99).randomize(&mut a);
        RangeRandomizer::new(-1.0, 1.0, 99).randomize(&mut b);
        assert_eq!(a.flatten(), b.flatten());
    }

    #[test]
    fn test_constant_randomizer() {
        let mut g = graph();
        ConstantRandomizer(0.25).randomize(&mut g);
        assert!(g.flatten().iter().all(|&p| p == 0.25));
    }
}
