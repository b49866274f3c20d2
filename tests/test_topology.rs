// Tests for graph construction, validation and the flat parameter vector.

use neural_graph::network::{ConnectionKind, ConnectionType, Layer, Matrix, NetworkGraph};
use neural_graph::randomize::{RangeRandomizer, Randomizer};
use neural_graph::utils::{Linear, Sigmoid, Tanh};

// input(2) -> hidden(3, bias) -> output(2, bias), plus a one-to-one skip
// from a 2-neuron side layer and a context loop on the hidden layer.
fn mixed_graph() -> NetworkGraph {
    let mut graph = NetworkGraph::new();
    let input = graph.add_layer(Layer::input(2)).unwrap();
    let hidden = graph.add_layer(Layer::new(3, Tanh).with_bias()).unwrap();
    let side = graph.add_layer(Layer::new(2, Sigmoid)).unwrap();
    let output = graph.add_layer(Layer::output(2, Sigmoid).with_bias()).unwrap();
    graph.connect_weighted(input, hidden).unwrap();
    graph.connect_weighted(input, side).unwrap();
    graph.connect_weighted(hidden, output).unwrap();
    graph.connect_one_to_one(side, output).unwrap();
    graph.connect_context(hidden, hidden).unwrap();
    RangeRandomizer::new(-1.0, 1.0, 11).randomize(&mut graph);
    graph
}

// ============================================================================
// Construction Tests
// ============================================================================

mod construction_tests {
    use super::*;

    #[test]
    fn test_one_to_one_size_mismatch_adds_nothing() {
        let mut graph = NetworkGraph::new();
        let input = graph.add_layer(Layer::input(3)).unwrap();
        let output = graph.add_layer(Layer::output(4, Linear::default())).unwrap();

        let err = graph.connect_one_to_one(input, output).unwrap_err();
        assert!(err.is_topology());
        assert!(graph.connections().is_empty());
        assert!(graph.incoming(output).is_empty());
    }

    #[test]
    fn test_connect_with_matrix_checks_dimensions() {
        let mut graph = NetworkGraph::new();
        let input = graph.add_layer(Layer::input(2)).unwrap();
        let output = graph.add_layer(Layer::output(3, Sigmoid)).unwrap();

        let err = graph
            .connect_with_matrix(input, output, ConnectionType::Weighted, Matrix::zeros(3, 2))
            .unwrap_err();
        assert!(err.is_topology());
        assert!(graph.connections().is_empty());
    }

    #[test]
    fn test_one_to_one_carries_no_matrix() {
        let mut graph = NetworkGraph::new();
        let input = graph.add_layer(Layer::input(2)).unwrap();
        let output = graph.add_layer(Layer::output(2, Sigmoid)).unwrap();
        let id = graph.connect_one_to_one(input, output).unwrap();

        let connection = graph.connection(id);
        assert!(matches!(connection.kind(), ConnectionKind::OneToOne));
        assert!(connection.matrix().is_none());
        assert_eq!(connection.parameter_count(), 0);
    }

    #[test]
    fn test_weighted_self_loop_rejected() {
        let mut graph = NetworkGraph::new();
        let hidden = graph.add_layer(Layer::new(2, Sigmoid)).unwrap();
        assert!(graph.connect_weighted(hidden, hidden).unwrap_err().is_topology());
        assert!(graph.connect_context(hidden, hidden).is_ok());
    }

    #[test]
    fn test_empty_layer_rejected() {
        let mut graph = NetworkGraph::new();
        assert!(graph.add_layer(Layer::new(0, Sigmoid)).unwrap_err().is_topology());
        assert!(graph.layers().is_empty());
    }

    #[test]
    fn test_second_output_rejected() {
        let mut graph = NetworkGraph::new();
        graph.add_layer(Layer::output(1, Sigmoid)).unwrap();
        assert!(graph.add_layer(Layer::output(1, Sigmoid)).unwrap_err().is_topology());
    }

    #[test]
    fn test_connection_type_names() {
        assert_eq!(ConnectionType::from_name("weighted"), Some(ConnectionType::Weighted));
        assert_eq!(ConnectionType::from_name("one_to_one"), Some(ConnectionType::OneToOne));
        assert_eq!(ConnectionType::from_name("context"), Some(ConnectionType::Context));
        assert_eq!(ConnectionType::from_name("sparse"), None);
    }
}

// ============================================================================
// Validation Tests
// ============================================================================

mod validation_tests {
    use super::*;

    #[test]
    fn test_mixed_graph_is_valid() {
        let graph = mixed_graph();
        assert!(graph.validate().is_ok());
        assert!(graph.has_context_connections());
    }

    #[test]
    fn test_unconnected_hidden_layer_rejected() {
        let mut graph = NetworkGraph::new();
        let input = graph.add_layer(Layer::input(2)).unwrap();
        let output = graph.add_layer(Layer::output(1, Sigmoid)).unwrap();
        graph.add_layer(Layer::new(2, Sigmoid)).unwrap();
        graph.connect_weighted(input, output).unwrap();

        assert!(graph.validate().unwrap_err().is_topology());
    }

    #[test]
    fn test_missing_input_rejected() {
        let mut graph = NetworkGraph::new();
        graph.add_layer(Layer::output(1, Sigmoid)).unwrap();
        assert!(graph.validate().unwrap_err().is_topology());
    }

    #[test]
    fn test_topological_order_respects_every_forward_edge() {
        let graph = mixed_graph();
        let order = graph.topological_order().unwrap();
        let position = |id: neural_graph::network::LayerId| {
            order.iter().position(|&l| l == id).unwrap()
        };
        for connection in graph.connections().iter().filter(|c| !c.is_context()) {
            assert!(position(connection.source()) < position(connection.destination()));
        }
    }
}

// ============================================================================
// Flatten / Unflatten Tests
// ============================================================================

mod flatten_tests {
    use super::*;

    #[test]
    fn test_weighted_plus_bias_count() {
        let mut graph = NetworkGraph::new();
        let input = graph.add_layer(Layer::input(2)).unwrap();
        let output = graph.add_layer(Layer::output(3, Sigmoid).with_bias()).unwrap();
        graph.connect_weighted(input, output).unwrap();

        assert_eq!(graph.parameter_count(), 9);
        assert_eq!(graph.flatten().len(), 9);
    }

    #[test]
    fn test_mixed_graph_count() {
        // 2x3 + 2x2 + 3x2 + 3x3 context, biases 3 + 2; one-to-one adds nothing
        let graph = mixed_graph();
        assert_eq!(graph.parameter_count(), 6 + 4 + 6 + 9 + 3 + 2);
    }

    #[test]
    fn test_flatten_order_matrices_then_biases() {
        let mut graph = NetworkGraph::new();
        let input = graph.add_layer(Layer::input(2)).unwrap();
        let output = graph
            .add_layer(Layer::output(2, Sigmoid).with_bias_values(vec![9.0, 10.0]).unwrap())
            .unwrap();
        graph
            .connect_with_matrix(
                input,
                output,
                ConnectionType::Weighted,
                Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap(),
            )
            .unwrap();
        graph.connect_one_to_one(input, output).unwrap();
        graph
            .connect_with_matrix(
                input,
                output,
                ConnectionType::Weighted,
                Matrix::from_rows(&[vec![5.0, 6.0], vec![7.0, 8.0]]).unwrap(),
            )
            .unwrap();

        let expected: Vec<f64> = (1..=10).map(f64::from).collect();
        assert_eq!(graph.flatten(), expected);
    }

    #[test]
    fn test_round_trip_is_bit_identical() {
        let graph = mixed_graph();
        let params = graph.flatten();
        let mut copy = mixed_graph();
        RangeRandomizer::new(-5.0, 5.0, 999).randomize(&mut copy);
        copy.unflatten(&params).unwrap();

        let restored = copy.flatten();
        assert_eq!(params.len(), restored.len());
        for (a, b) in params.iter().zip(&restored) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn test_unflatten_wrong_length_leaves_graph_untouched() {
        let mut graph = mixed_graph();
        let before = graph.flatten();
        let err = graph.unflatten(&before[1..]).unwrap_err();
        assert!(err.is_shape());
        assert_eq!(graph.flatten(), before);
    }

    #[test]
    fn test_unflatten_moves_values_into_place() {
        let mut graph = mixed_graph();
        let params: Vec<f64> = (0..graph.parameter_count()).map(|i| i as f64).collect();
        graph.unflatten(&params).unwrap();
        let first = graph.connections()[0].matrix().unwrap();
        assert_eq!(first.as_slice(), &[0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
        let output_bias = graph.layers()[3].bias().unwrap();
        assert_eq!(output_bias, &[28.0, 29.0]);
    }
}
