//! Layers: vector-valued nodes of the network graph
//!
//! A layer holds a neuron count, an activation function, an optional bias
//! vector and a role tag. Layers never know about their connections; the
//! [`NetworkGraph`](super::NetworkGraph) owns the adjacency.

use std::fmt;
use std::sync::Arc;

use crate::error::{NetworkError, Result};
use crate::utils::activations::{ActivationFunction, Identity};

/// Handle to a layer inside a [`NetworkGraph`](super::NetworkGraph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub(crate) usize);

impl LayerId {
    /// Position of the layer in declaration order.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "layer#{}", self.0)
    }
}

/// Position of a layer in the network.
///
/// A valid graph has exactly one input and exactly one output layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerRole {
    Input,
    Hidden,
    Output,
}

/// A group of neurons sharing one activation function.
///
/// # Example
///
/// ```
/// use neural_graph::network::{Layer, LayerRole};
/// use neural_graph::utils::Sigmoid;
///
/// let layer = Layer::new(4, Sigmoid).with_bias();
/// assert_eq!(layer.neuron_count(), 4);
/// assert_eq!(layer.role(), LayerRole::Hidden);
/// assert_eq!(layer.bias(), Some(&[0.0; 4][..]));
/// ```
#[derive(Debug, Clone)]
pub struct Layer {
    neuron_count: usize,
    activation: Arc<dyn ActivationFunction>,
    bias: Option<Vec<f64>>,
    role: LayerRole,
}

impl Layer {
    /// Hidden layer without bias.
    pub fn new(neuron_count: usize, activation: impl ActivationFunction + 'static) -> Self {
        Self::with_shared_activation(neuron_count, Arc::new(activation))
    }

    /// Hidden layer sharing an already boxed activation.
    pub fn with_shared_activation(
        neuron_count: usize,
        activation: Arc<dyn ActivationFunction>,
    ) -> Self {
        Self {
            neuron_count,
            activation,
            bias: None,
            role: LayerRole::Hidden,
        }
    }

    /// Input layer: identity activation, no bias.
    pub fn input(neuron_count: usize) -> Self {
        Self::new(neuron_count, Identity).with_role(LayerRole::Input)
    }

    /// Output layer with the given activation and no bias.
    pub fn output(neuron_count: usize, activation: impl ActivationFunction + 'static) -> Self {
        Self::new(neuron_count, activation).with_role(LayerRole::Output)
    }

    pub fn with_role(mut self, role: LayerRole) -> Self {
        self.role = role;
        self
    }

    /// Attach a zero-initialized bias vector.
    pub fn with_bias(mut self) -> Self {
        self.bias = Some(vec![0.0; self.neuron_count]);
        self
    }

    /// Attach explicit bias values; the length must match the neuron count.
    pub fn with_bias_values(mut self, bias: Vec<f64>) -> Result<Self> {
        if bias.len() != self.neuron_count {
            return Err(NetworkError::shape("layer bias", self.neuron_count, bias.len()));
        }
        self.bias = Some(bias);
        Ok(self)
    }

    pub fn neuron_count(&self) -> usize {
        self.neuron_count
    }

    pub fn activation(&self) -> &dyn ActivationFunction {
        self.activation.as_ref()
    }

    pub fn role(&self) -> LayerRole {
        self.role
    }

    pub fn has_bias(&self) -> bool {
        self.bias.is_some()
    }

    pub fn bias(&self) -> Option<&[f64]> {
        self.bias.as_deref()
    }

    pub fn bias_mut(&mut self) -> Option<&mut [f64]> {
        self.bias.as_deref_mut()
    }

    /// Trainable values owned by the layer (its bias, if any).
    pub fn parameter_count(&self) -> usize {
        self.bias.as_ref().map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::Tanh;

    #[test]
    fn test_input_layer_defaults() {
        let layer = Layer::input(3);
        assert_eq!(layer.role(), LayerRole::Input);
        assert_eq!(layer.activation().name(), "identity");
        assert!(!layer.has_bias());
        assert_eq!(layer.parameter_count(), 0);
    }

    #[test]
    fn test_bias_values_length_checked() {
        let err = Layer::new(3, Tanh).with_bias_values(vec![0.1, 0.2]).unwrap_err();
        assert!(err.is_shape());
    }
}
