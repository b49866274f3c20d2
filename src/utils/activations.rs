//! Activation functions for network layers
//!
//! Every layer owns an activation behind the [`ActivationFunction`] capability
//! interface:
//! - Identity and Linear (scaled pass-through)
//! - Sigmoid
//! - Tanh (hyperbolic tangent)
//! - Step (threshold; has no derivative and is forward-only)
//!
//! Derivatives are expressed in terms of the *activated* value, so the
//! backward pass can work from the outputs cached by the forward pass.

use std::fmt::Debug;
use std::sync::Arc;

/// Capability set shared by all activation functions.
pub trait ActivationFunction: Debug + Send + Sync {
    /// Short lowercase name used in architecture files and log output.
    fn name(&self) -> &'static str;

    /// Apply the activation in place.
    fn apply(&self, values: &mut [f64]);

    /// Derivative at a point, given the activated output `y = f(x)`.
    ///
    /// Only meaningful when [`has_derivative`](Self::has_derivative) is true.
    fn derivative(&self, output: f64) -> f64;

    /// Whether gradient-based training can pass through this function.
    fn has_derivative(&self) -> bool {
        true
    }
}

/// Sigmoid activation function.
///
/// Returns the sigmoid of the input: 1 / (1 + exp(-x))
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Sigmoid derivative assuming x = sigmoid(z).
///
/// Returns the derivative: x * (1 - x)
pub fn sigmoid_derivative(x: f64) -> f64 {
    x * (1.0 - x)
}

/// f(x) = x
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Identity;

impl ActivationFunction for Identity {
    fn name(&self) -> &'static str {
        "identity"
    }

    fn apply(&self, _values: &mut [f64]) {}

    fn derivative(&self, _output: f64) -> f64 {
        1.0
    }
}

/// f(x) = slope * x
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Linear {
    pub slope: f64,
}

impl Linear {
    pub fn new(slope: f64) -> Self {
        Self { slope }
    }
}

impl Default for Linear {
    fn default() -> Self {
        Self { slope: 1.0 }
    }
}

impl ActivationFunction for Linear {
    fn name(&self) -> &'static str {
        "linear"
    }

    fn apply(&self, values: &mut [f64]) {
        if self.slope == 1.0 {
            return;
        }
        for value in values.iter_mut() {
            *value *= self.slope;
        }
    }

    fn derivative(&self, _output: f64) -> f64 {
        self.slope
    }
}

/// Logistic sigmoid, range (0, 1).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Sigmoid;

impl ActivationFunction for Sigmoid {
    fn name(&self) -> &'static str {
        "sigmoid"
    }

    fn apply(&self, values: &mut [f64]) {
        for value in values.iter_mut() {
            *value = sigmoid(*value);
        }
    }

    fn derivative(&self, output: f64) -> f64 {
        sigmoid_derivative(output)
    }
}

/// Hyperbolic tangent, range (-1, 1).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Tanh;

impl ActivationFunction for Tanh {
    fn name(&self) -> &'static str {
        "tanh"
    }

    fn apply(&self, values: &mut [f64]) {
        for value in values.iter_mut() {
            *value = value.tanh();
        }
    }

    fn derivative(&self, output: f64) -> f64 {
        1.0 - output * output
    }
}

/// Threshold function: `high` when `x >= center`, otherwise `low`.
///
/// The step is flat almost everywhere, so it reports no derivative and any
/// layer using it is limited to forward evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    pub low: f64,
    pub center: f64,
    pub high: f64,
}

impl Step {
    pub fn new(low: f64, center: f64, high: f64) -> Self {
        Self { low, center, high }
    }
}

impl Default for Step {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0)
    }
}

impl ActivationFunction for Step {
    fn name(&self) -> &'static str {
        "step"
    }

    fn apply(&self, values: &mut [f64]) {
        for value in values.iter_mut() {
            *value = if *value >= self.center {
                self.high
            } else {
                self.low
            };
        }
    }

    fn derivative(&self, _output: f64) -> f64 {
        0.0
    }

    fn has_derivative(&self) -> bool {
        false
    }
}

/// Resolve an activation by name, as used in architecture files.
///
/// `slope` only applies to `linear`. Returns `None` for unknown names.
pub fn activation_from_name(name: &str, slope: Option<f64>) -> Option<Arc<dyn ActivationFunction>> {
    let activation: Arc<dyn ActivationFunction> = match name.to_lowercase().as_str() {
        "identity" => Arc::new(Identity),
        "linear" => Arc::new(Linear::new(slope.unwrap_or(1.0))),
        "sigmoid" => Arc::new(Sigmoid),
        "tanh" => Arc::new(Tanh),
        "step" => Arc::new(Step::default()),
        _ => return None,
    };
    Some(activation)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-10;

    #[test]
    fn test_sigmoid_zero() {
        let result = sigmoid(0.0);
        assert!((result - 0.5).abs() < EPSILON);
    }

    #[test]
    fn test_sigmoid_derivative_at_half() {
        let result = sigmoid_derivative(0.5);
        assert!((result - 0.25).abs() < EPSILON);
    }

    #[test]
    fn test_linear_slope() {
        let mut data = vec![1.0, -2.0];
        Linear::new(0.5).apply(&mut data);
        assert_eq!(data, vec![0.5, -1.0]);
        assert_eq!(Linear::new(0.5).derivative(123.0), 0.5);
    }

    #[test]
    fn test_tanh_derivative_from_output() {
        let x = 0.3f64;
        let y = x.tanh();
        let expected = 1.0 / x.cosh().powi(2);
        assert!((Tanh.derivative(y) - expected).abs() < EPSILON);
    }

    #[test]
    fn test_step_has_no_derivative() {
        let mut data = vec![-0.1, 0.0, 0.7];
        Step::default().apply(&mut data);
        assert_eq!(data, vec![0.0, 1.0, 1.0]);
        assert!(!Step::default().has_derivative());
    }

    #[test]
    fn test_from_name() {
        assert_eq!(activation_from_name("Sigmoid", None).unwrap().name(), "sigmoid");
        assert!(activation_from_name("softsign", None).is_none());
    }
}
