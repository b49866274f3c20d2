//! Configuration structures for training runs
//!
//! A [`TrainingConfig`] selects the compute backend and the batch mode used by
//! [`GradientCalculator`](crate::propagation::GradientCalculator) and
//! [`JacobianBuilder`](crate::propagation::JacobianBuilder), plus the
//! parameters of a simple gradient-step loop. Every field is optional.
//!
//! # Example
//!
//! ```json
//! {
//!   "backend": "software",
//!   "parallel": true,
//!   "seed": 42,
//!   "learning_rate": 0.7,
//!   "epochs": 5000,
//!   "target_error": 0.001
//! }
//! ```

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use tracing::debug;

use crate::backend::{backend_from_name, ComputeBackend};
use crate::error::{NetworkError, Result};
use crate::utils::SimpleRng;

pub const DEFAULT_LEARNING_RATE: f64 = 0.7;
pub const DEFAULT_EPOCHS: usize = 5000;
pub const DEFAULT_TARGET_ERROR: f64 = 0.001;

/// Training run settings.
///
/// - **backend**: "software" (default) or "blas"
/// - **parallel**: process samples on the rayon pool (default false)
/// - **seed**: seed for weight initialization (time-based when absent)
/// - **learning_rate**: gradient step size, must be positive (default 0.7)
/// - **epochs**: maximum number of passes, must be positive (default 5000)
/// - **target_error**: stop once the batch error drops below this (default 0.001)
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TrainingConfig {
    pub backend: Option<String>,
    pub parallel: Option<bool>,
    pub seed: Option<u64>,
    pub learning_rate: Option<f64>,
    pub epochs: Option<usize>,
    pub target_error: Option<f64>,
}

impl TrainingConfig {
    pub fn parallel(&self) -> bool {
        self.parallel.unwrap_or(false)
    }

    /// Generator for weight initialization. Runs without a seed differ from
    /// each other.
    pub fn rng(&self) -> SimpleRng {
        match self.seed {
            Some(seed) => SimpleRng::new(seed),
            None => {
                let mut rng = SimpleRng::new(0);
                rng.reseed_from_time();
                debug!("no seed configured, seeding from the clock");
                rng
            }
        }
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate.unwrap_or(DEFAULT_LEARNING_RATE)
    }

    pub fn epochs(&self) -> usize {
        self.epochs.unwrap_or(DEFAULT_EPOCHS)
    }

    pub fn target_error(&self) -> f64 {
        self.target_error.unwrap_or(DEFAULT_TARGET_ERROR)
    }

    /// Resolve the configured backend.
    pub fn backend(&self) -> Result<Arc<dyn ComputeBackend>> {
        backend_from_name(self.backend.as_deref().unwrap_or("software"))
    }
}

/// Loads a training configuration from a JSON file.
///
/// # Examples
///
/// ```no_run
/// use neural_graph::config::load_config;
///
/// let cfg = load_config("config/xor_training.json").unwrap();
/// assert!(cfg.learning_rate() > 0.0);
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<TrainingConfig> {
    let contents = fs::read_to_string(path)?;
    let config: TrainingConfig = serde_json::from_str(&contents)?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &TrainingConfig) -> Result<()> {
    if let Some(learning_rate) = config.learning_rate {
        if !(learning_rate > 0.0 && learning_rate.is_finite()) {
            return Err(NetworkError::Configuration(
                "learning_rate must be positive".to_string(),
            ));
        }
    }

    if config.epochs == Some(0) {
        return Err(NetworkError::Configuration(
            "epochs must be greater than 0".to_string(),
        ));
    }

    if let Some(target_error) = config.target_error {
        if target_error < 0.0 {
            return Err(NetworkError::Configuration(
                "target_error must be non-negative".to_string(),
            ));
        }
    }

    if let Some(ref backend) = config.backend {
        let valid_backends = ["software", "cpu", "blas"];
        if !valid_backends.contains(&backend.to_lowercase().as_str()) {
            return Err(NetworkError::Configuration(format!(
                "Invalid backend '{}'. Must be one of: {}",
                backend,
                valid_backends.join(", ")
            )));
        }
    }

    Ok(())
}
