//! Compute backend abstraction
//!
//! The forward and backward passes never multiply matrices themselves; they
//! go through a [`ComputeBackend`]. The pure-software backend is always
//! available and is the default. A BLAS backend built on `cblas` is compiled
//! in with the `blas` cargo feature.
//!
//! # Example
//!
//! ```
//! use neural_graph::backend::{ComputeBackend, SoftwareBackend};
//! use neural_graph::network::Matrix;
//!
//! let weights = Matrix::from_rows(&[vec![1.0], vec![1.0]]).unwrap();
//! let mut out = vec![0.0];
//! SoftwareBackend.matvec_transposed_add(&weights, &[1.0, 2.0], &mut out);
//! assert_eq!(out, vec![3.0]);
//! ```

use std::fmt::Debug;
use std::sync::Arc;

use crate::error::{NetworkError, Result};
use crate::network::Matrix;
use crate::utils::activations::ActivationFunction;

#[cfg(feature = "blas")]
pub mod blas;
pub mod software;

#[cfg(feature = "blas")]
pub use blas::BlasBackend;
pub use software::SoftwareBackend;

/// Vectorised primitives used by the propagation passes.
///
/// Implementations must be usable from several threads at once; the batch
/// builders share one backend across rayon workers.
pub trait ComputeBackend: Debug + Send + Sync {
    /// Backend name as used in training configuration files.
    fn name(&self) -> &'static str;

    /// `output[j] += Σ_i matrix[i][j] * input[i]`, i.e. `output += matrixᵀ · input`.
    ///
    /// `input.len() == matrix.rows()` and `output.len() == matrix.cols()`.
    fn matvec_transposed_add(&self, matrix: &Matrix, input: &[f64], output: &mut [f64]);

    /// `output[i] += Σ_j matrix[i][j] * input[j]`, i.e. `output += matrix · input`.
    ///
    /// `input.len() == matrix.cols()` and `output.len() == matrix.rows()`.
    fn matvec_add(&self, matrix: &Matrix, input: &[f64], output: &mut [f64]);

    /// Apply an activation function elementwise, in place.
    fn activate(&self, activation: &dyn ActivationFunction, values: &mut [f64]) {
        activation.apply(values);
    }
}

/// Resolve a backend by configuration name (`"software"` or `"blas"`).
///
/// Asking for `"blas"` in a build without the `blas` feature is a
/// configuration error rather than a silent fallback.
pub fn backend_from_name(name: &str) -> Result<Arc<dyn ComputeBackend>> {
    match name.to_lowercase().as_str() {
        "software" | "cpu" => Ok(Arc::new(SoftwareBackend)),
        #[cfg(feature = "blas")]
        "blas" => Ok(Arc::new(BlasBackend)),
        #[cfg(not(feature = "blas"))]
        "blas" => Err(NetworkError::Configuration(
            "the blas backend was requested but the crate was built without the `blas` feature"
                .to_string(),
        )),
        other => Err(NetworkError::Configuration(format!(
            "unknown compute backend '{other}'. Must be one of: software, blas"
        ))),
    }
}
