//! Pure-software backend: plain loops over row-major storage.

use super::ComputeBackend;
use crate::network::Matrix;

/// Reference backend with no external requirements.
#[derive(Debug, Clone, Copy, Default)]
pub struct SoftwareBackend;

impl ComputeBackend for SoftwareBackend {
    fn name(&self) -> &'static str {
        "software"
    }

    fn matvec_transposed_add(&self, matrix: &Matrix, input: &[f64], output: &mut [f64]) {
        debug_assert_eq!(input.len(), matrix.rows());
        debug_assert_eq!(output.len(), matrix.cols());
        for (i, &x) in input.iter().enumerate() {
            for (out, &w) in output.iter_mut().zip(matrix.row(i)) {
                *out += w * x;
            }
        }
    }

    fn matvec_add(&self, matrix: &Matrix, input: &[f64], output: &mut [f64]) {
        debug_assert_eq!(input.len(), matrix.cols());
        debug_assert_eq!(output.len(), matrix.rows());
        for (i, out) in output.iter_mut().enumerate() {
            *out += matrix
                .row(i)
                .iter()
                .zip(input)
                .map(|(&w, &x)| w * x)
                .sum::<f64>();
        }
    }
}
