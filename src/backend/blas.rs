//! BLAS backend using `cblas::dgemv` on the row-major weight storage.

extern crate blas_src;

use cblas::{dgemv, Layout, Transpose};

use super::ComputeBackend;
use crate::network::Matrix;

/// Backend delegating matrix-vector products to the linked BLAS library.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlasBackend;

impl BlasBackend {
    fn gemv(transpose: Transpose, matrix: &Matrix, input: &[f64], output: &mut [f64]) {
        if matrix.is_empty() {
            return;
        }
        // SAFETY: slice lengths match the dimensions passed to dgemv; callers
        // uphold the ComputeBackend length contract.
        unsafe {
            dgemv(
                Layout::RowMajor,
                transpose,
                matrix.rows() as i32,
                matrix.cols() as i32,
                1.0,
                matrix.as_slice(),
                matrix.cols() as i32,
                input,
                1,
                1.0,
                output,
                1,
            );
        }
    }
}

impl ComputeBackend for BlasBackend {
    fn name(&self) -> &'static str {
        "blas"
    }

    fn matvec_transposed_add(&self, matrix: &Matrix, input: &[f64], output: &mut [f64]) {
        assert_eq!(input.len(), matrix.rows(), "input length mismatch in dgemv");
        assert_eq!(output.len(), matrix.cols(), "output length mismatch in dgemv");
        Self::gemv(Transpose::Ordinary, matrix, input, output);
    }

    fn matvec_add(&self, matrix: &Matrix, input: &[f64], output: &mut [f64]) {
        assert_eq!(input.len(), matrix.cols(), "input length mismatch in dgemv");
        assert_eq!(output.len(), matrix.rows(), "output length mismatch in dgemv");
        Self::gemv(Transpose::None, matrix, input, output);
    }
}
