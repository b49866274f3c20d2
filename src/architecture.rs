//! Architecture configuration structures
//!
//! This module describes network graphs in JSON so topologies can be changed
//! without code changes. Layers are named; connections refer to them by name.
//!
//! # Example
//!
//! ```json
//! {
//!   "layers": [
//!     { "name": "in", "role": "input", "neurons": 2 },
//!     { "name": "hidden", "neurons": 3, "activation": "tanh", "bias": true },
//!     { "name": "out", "role": "output", "neurons": 1, "activation": "sigmoid", "bias": true }
//!   ],
//!   "connections": [
//!     { "from": "in", "to": "hidden", "connection_type": "weighted" },
//!     { "from": "hidden", "to": "out", "connection_type": "weighted" },
//!     { "from": "hidden", "to": "hidden", "connection_type": "context" }
//!   ]
//! }
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::{NetworkError, Result};
use crate::network::{ConnectionType, Layer, LayerRole, Matrix, NetworkGraph};
use crate::utils::activations::activation_from_name;
use crate::utils::rng::SimpleRng;

const VALID_ACTIVATIONS: [&str; 5] = ["identity", "linear", "sigmoid", "tanh", "step"];

/// Configuration for a single layer.
///
/// - **role**: "input", "hidden" (default) or "output"
/// - **activation**: "identity", "linear", "sigmoid", "tanh" or "step";
///   defaults to "identity" for the input layer and "sigmoid" otherwise
/// - **slope**: scale of the "linear" activation (default 1.0)
/// - **bias**: attach a zero-initialized bias vector (default false)
#[derive(Debug, Clone, Deserialize)]
pub struct LayerConfig {
    pub name: String,
    pub role: Option<String>,
    pub neurons: usize,
    pub activation: Option<String>,
    pub slope: Option<f64>,
    pub bias: Option<bool>,
}

/// Configuration for a connection between two named layers.
///
/// `connection_type` is "weighted", "one_to_one" or "context".
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectionConfig {
    pub from: String,
    pub to: String,
    pub connection_type: String,
}

/// Configuration for the whole network.
///
/// When `connections` is omitted, consecutive layers are joined by weighted
/// connections in declaration order.
#[derive(Debug, Clone, Deserialize)]
pub struct ArchitectureConfig {
    pub layers: Vec<LayerConfig>,
    #[serde(default)]
    pub connections: Vec<ConnectionConfig>,
}

/// Loads an architecture configuration from a JSON file.
///
/// # Examples
///
/// ```no_run
/// use neural_graph::architecture::load_architecture;
///
/// let arch = load_architecture("config/architectures/xor.json").unwrap();
/// assert!(!arch.layers.is_empty());
/// ```
pub fn load_architecture(path: impl AsRef<Path>) -> Result<ArchitectureConfig> {
    let contents = fs::read_to_string(path)?;
    parse_architecture(&contents)
}

/// Parse and validate an architecture from a JSON string.
pub fn parse_architecture(json: &str) -> Result<ArchitectureConfig> {
    let config: ArchitectureConfig = serde_json::from_str(json)?;
    validate_architecture(&config)?;
    Ok(config)
}

fn parse_role(layer: &LayerConfig, index: usize) -> Result<LayerRole> {
    match layer.role.as_deref().map(str::to_lowercase).as_deref() {
        None | Some("hidden") => Ok(LayerRole::Hidden),
        Some("input") => Ok(LayerRole::Input),
        Some("output") => Ok(LayerRole::Output),
        Some(other) => Err(NetworkError::Configuration(format!(
            "Layer {index}: invalid role '{other}'. Must be one of: input, hidden, output"
        ))),
    }
}

fn activation_name(layer: &LayerConfig, role: LayerRole) -> String {
    match (&layer.activation, role) {
        (Some(name), _) => name.to_lowercase(),
        (None, LayerRole::Input) => "identity".to_string(),
        (None, _) => "sigmoid".to_string(),
    }
}

/// Validates an architecture configuration.
///
/// Checks that:
/// - there is at least one layer, and names are unique
/// - each layer has a positive neuron count, a known role and activation
/// - each connection names existing layers and a known connection type
fn validate_architecture(config: &ArchitectureConfig) -> Result<()> {
    if config.layers.is_empty() {
        return Err(NetworkError::Configuration(
            "Architecture must have at least one layer".to_string(),
        ));
    }

    let mut names = HashMap::new();
    for (index, layer) in config.layers.iter().enumerate() {
        if names.insert(layer.name.as_str(), index).is_some() {
            return Err(NetworkError::Configuration(format!(
                "Layer {index}: duplicate layer name '{}'",
                layer.name
            )));
        }
        if layer.neurons == 0 {
            return Err(NetworkError::Configuration(format!(
                "Layer {index}: neurons must be greater than 0"
            )));
        }
        let role = parse_role(layer, index)?;
        let activation = activation_name(layer, role);
        if !VALID_ACTIVATIONS.contains(&activation.as_str()) {
            return Err(NetworkError::Configuration(format!(
                "Layer {index}: invalid activation function '{activation}'. Must be one of: {}",
                VALID_ACTIVATIONS.join(", ")
            )));
        }
        if let Some(slope) = layer.slope {
            if !slope.is_finite() {
                return Err(NetworkError::Configuration(format!(
                    "Layer {index}: slope must be finite"
                )));
            }
        }
    }

    for (index, connection) in config.connections.iter().enumerate() {
        for name in [&connection.from, &connection.to] {
            if !names.contains_key(name.as_str()) {
                return Err(NetworkError::Configuration(format!(
                    "Connection {index}: unknown layer '{name}'"
                )));
            }
        }
        if ConnectionType::from_name(&connection.connection_type).is_none() {
            return Err(NetworkError::Configuration(format!(
                "Connection {index}: invalid connection type '{}'. \
                 Must be one of: weighted, one_to_one, context",
                connection.connection_type
            )));
        }
    }

    Ok(())
}

/// Builds a network graph from an architecture configuration.
///
/// Weighted and context matrices get Xavier initialization from `rng`; biases
/// start at zero. Structural problems (such as a one-to-one connection
/// between layers of different sizes) surface as topology errors, and the
/// finished graph is validated before it is returned.
///
/// # Examples
///
/// ```no_run
/// use neural_graph::architecture::{build_network, load_architecture};
/// use neural_graph::utils::rng::SimpleRng;
///
/// let config = load_architecture("config/architectures/xor.json").unwrap();
/// let mut rng = SimpleRng::new(42);
/// let graph = build_network(&config, &mut rng).unwrap();
/// assert_eq!(graph.layers().len(), config.layers.len());
/// ```
pub fn build_network(config: &ArchitectureConfig, rng: &mut SimpleRng) -> Result<NetworkGraph> {
    validate_architecture(config)?;

    let mut graph = NetworkGraph::new();
    let mut ids = HashMap::new();
    for (index, layer_config) in config.layers.iter().enumerate() {
        let role = parse_role(layer_config, index)?;
        let name = activation_name(layer_config, role);
        let activation = activation_from_name(&name, layer_config.slope).ok_or_else(|| {
            NetworkError::Configuration(format!("Layer {index}: unknown activation '{name}'"))
        })?;
        let mut layer =
            Layer::with_shared_activation(layer_config.neurons, activation).with_role(role);
        if layer_config.bias.unwrap_or(false) {
            layer = layer.with_bias();
        }
        ids.insert(layer_config.name.as_str(), graph.add_layer(layer)?);
    }

    let chained: Vec<ConnectionConfig>;
    let connections = if config.connections.is_empty() {
        chained = config
            .layers
            .windows(2)
            .map(|pair| ConnectionConfig {
                from: pair[0].name.clone(),
                to: pair[1].name.clone(),
                connection_type: "weighted".to_string(),
            })
            .collect();
        &chained
    } else {
        &config.connections
    };

    let lookup = |name: &str| {
        ids.get(name)
            .copied()
            .ok_or_else(|| NetworkError::Configuration(format!("unknown layer '{name}'")))
    };
    for connection in connections {
        let source = lookup(&connection.from)?;
        let destination = lookup(&connection.to)?;
        let rows = graph.layer(source).neuron_count();
        let cols = graph.layer(destination).neuron_count();
        match ConnectionType::from_name(&connection.connection_type) {
            Some(ConnectionType::OneToOne) => {
                graph.connect_one_to_one(source, destination)?;
            }
            Some(kind) => {
                let matrix = Matrix::xavier(rows, cols, rng);
                graph.connect_with_matrix(source, destination, kind, matrix)?;
            }
            None => {
                return Err(NetworkError::Configuration(format!(
                    "unknown connection type '{}'",
                    connection.connection_type
                )))
            }
        }
    }

    graph.validate()?;
    debug!(
        layers = graph.layers().len(),
        connections = graph.connections().len(),
        parameters = graph.parameter_count(),
        "built network from architecture"
    );
    Ok(graph)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_when_connections_omitted() {
        let config = parse_architecture(
            r#"{ "layers": [
                { "name": "in", "role": "input", "neurons": 2 },
                { "name": "out", "role": "output", "neurons": 1, "bias": true }
            ] }"#,
        )
        .unwrap();
        let graph = build_network(&config, &mut SimpleRng::new(1)).unwrap();
        assert_eq!(graph.connections().len(), 1);
        assert_eq!(graph.parameter_count(), 3);
    }

    #[test]
    fn test_unknown_role() {
        let err = parse_architecture(
            r#"{ "layers": [ { "name": "a", "role": "sideways", "neurons": 2 } ] }"#,
        )
        .unwrap_err();
        assert!(err.is_configuration());
    }
}
