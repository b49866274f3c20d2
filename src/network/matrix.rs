//! Dense weight matrix owned by weighted and context connections

use crate::error::{NetworkError, Result};
use crate::utils::SimpleRng;

/// Row-major `f64` matrix.
///
/// For a connection, rows index source neurons and columns index destination
/// neurons, so entry `(i, j)` is the weight from source neuron `i` to
/// destination neuron `j`.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Zero-filled matrix.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// Build from a row-major buffer.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(NetworkError::shape("matrix data", rows * cols, data.len()));
        }
        Ok(Self { rows, cols, data })
    }

    /// Build from nested rows; every row must have the same length.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let cols = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(rows.len() * cols);
        for row in rows {
            if row.len() != cols {
                return Err(NetworkError::shape("matrix row", cols, row.len()));
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            data,
        })
    }

    /// Xavier/Glorot uniform initialization.
    ///
    /// Entries are sampled from [-limit, limit] where
    /// limit = sqrt(6 / (rows + cols)).
    pub fn xavier(rows: usize, cols: usize, rng: &mut SimpleRng) -> Self {
        let mut matrix = Self::zeros(rows, cols);
        if rows + cols == 0 {
            return matrix;
        }
        let limit = (6.0 / (rows + cols) as f64).sqrt();
        for value in &mut matrix.data {
            *value = rng.gen_range_f64(-limit, limit);
        }
        matrix
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.cols + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.cols + col] = value;
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }
}
