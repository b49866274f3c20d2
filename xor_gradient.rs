use std::env;
use std::time::Instant;

use neural_graph::architecture::{build_network, load_architecture};
use neural_graph::config::{load_config, TrainingConfig};
use neural_graph::data::BasicTrainingSet;
use neural_graph::network::{Layer, NetworkGraph};
use neural_graph::propagation::{ForwardEvaluator, GradientCalculator, JacobianBuilder};
use neural_graph::randomize::{RangeRandomizer, Randomizer};
use neural_graph::utils::{Sigmoid, SimpleRng};
use neural_graph::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

// XOR with plain batch gradient steps (educational example).
const NUM_HIDDEN: usize = 3;
const REPORT_EVERY: usize = 500;

// 2-3-1 sigmoid network with biases on the hidden and output layers.
fn xor_network(rng: SimpleRng) -> Result<NetworkGraph> {
    let mut graph = NetworkGraph::new();
    let input = graph.add_layer(Layer::input(2))?;
    let hidden = graph.add_layer(Layer::new(NUM_HIDDEN, Sigmoid).with_bias())?;
    let output = graph.add_layer(Layer::output(1, Sigmoid).with_bias())?;
    graph.connect_weighted(input, hidden)?;
    graph.connect_weighted(hidden, output)?;
    RangeRandomizer::with_rng(-1.0, 1.0, rng).randomize(&mut graph);
    Ok(graph)
}

fn xor_data() -> Result<BasicTrainingSet> {
    BasicTrainingSet::new(
        vec![vec![0.0, 0.0], vec![0.0, 1.0], vec![1.0, 0.0], vec![1.0, 1.0]],
        vec![vec![0.0], vec![1.0], vec![1.0], vec![0.0]],
    )
}

// Gradients point downhill, so each step adds them.
fn train(
    graph: &mut NetworkGraph,
    data: &BasicTrainingSet,
    config: &TrainingConfig,
) -> Result<f64> {
    let backend = config.backend()?;
    let learning_rate = config.learning_rate();
    let mut error = f64::INFINITY;

    for epoch in 0..config.epochs() {
        let batch = GradientCalculator::with_backend(graph, backend.clone())?
            .with_parallel(config.parallel())
            .calculate(data)?;
        error = batch.error;
        if (epoch + 1) % REPORT_EVERY == 0 {
            info!(epoch = epoch + 1, error, "training");
        }
        if error < config.target_error() {
            info!(epoch = epoch + 1, error, "target error reached");
            break;
        }

        let mut params = graph.flatten();
        for (param, gradient) in params.iter_mut().zip(&batch.gradients) {
            *param += learning_rate * gradient;
        }
        graph.unflatten(&params)?;
    }
    Ok(error)
}

fn test(graph: &NetworkGraph, data: &BasicTrainingSet) -> Result<()> {
    println!("\nTesting the trained network:");
    let evaluator = ForwardEvaluator::new(graph)?;
    for (input, ideal) in data.iter() {
        let output = evaluator.compute(input)?;
        println!(
            "Input: {:.1}, {:.1}, Expected Output: {:.1}, Predicted Output: {:.3}",
            input[0], input[1], ideal[0], output[0]
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Usage: xor_gradient [training.json] [architecture.json]
    let args: Vec<String> = env::args().collect();
    let config = match args.get(1) {
        Some(path) => load_config(path)?,
        None => TrainingConfig::default(),
    };
    let mut graph = match args.get(2) {
        Some(path) => {
            let architecture = load_architecture(path)?;
            build_network(&architecture, &mut config.rng())?
        }
        None => xor_network(config.rng())?,
    };
    let data = xor_data()?;

    info!(
        parameters = graph.parameter_count(),
        learning_rate = config.learning_rate(),
        parallel = config.parallel(),
        "training XOR"
    );
    let start = Instant::now();
    let error = train(&mut graph, &data, &config)?;
    println!(
        "Training finished in {:.2} seconds, error {:.6}",
        start.elapsed().as_secs_f64(),
        error
    );

    test(&graph, &data)?;

    let jacobian = JacobianBuilder::new(&graph)?.build(&data)?;
    println!(
        "\nJacobian: {} x {}, error {:.6}",
        jacobian.rows(),
        jacobian.cols(),
        jacobian.error
    );
    Ok(())
}
