//! Training data access
//!
//! The propagation code only needs random access to `(input, ideal)` pairs.
//! Loading data from files is left to the caller; [`BasicTrainingSet`] keeps
//! pairs in memory.

use crate::error::{NetworkError, Result};

/// Random-access collection of `(input, ideal)` pairs.
///
/// `Sync` so batch builders can read it from several rayon workers.
pub trait TrainingSet: Send + Sync {
    /// Number of records.
    fn count(&self) -> usize;

    /// Length of every input vector.
    fn input_size(&self) -> usize;

    /// Length of every ideal vector.
    fn ideal_size(&self) -> usize;

    /// Record `index`.
    ///
    /// # Panics
    ///
    /// Implementations may panic when `index >= count()`.
    fn record(&self, index: usize) -> (&[f64], &[f64]);
}

/// In-memory training set with fixed input and ideal widths.
///
/// # Example
///
/// ```
/// use neural_graph::data::{BasicTrainingSet, TrainingSet};
///
/// let xor = BasicTrainingSet::new(
///     vec![vec![0.0, 0.0], vec![0.0, 1.0], vec![1.0, 0.0], vec![1.0, 1.0]],
///     vec![vec![0.0], vec![1.0], vec![1.0], vec![0.0]],
/// )
/// .unwrap();
/// assert_eq!(xor.count(), 4);
/// assert_eq!(xor.record(1), (&[0.0, 1.0][..], &[1.0][..]));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BasicTrainingSet {
    inputs: Vec<Vec<f64>>,
    ideals: Vec<Vec<f64>>,
    input_size: usize,
    ideal_size: usize,
}

impl BasicTrainingSet {
    /// Build from parallel rows. Widths are taken from the first row and every
    /// other row must match.
    pub fn new(inputs: Vec<Vec<f64>>, ideals: Vec<Vec<f64>>) -> Result<Self> {
        if inputs.len() != ideals.len() {
            return Err(NetworkError::shape("ideal rows", inputs.len(), ideals.len()));
        }
        let mut set = Self::with_sizes(
            inputs.first().map_or(0, Vec::len),
            ideals.first().map_or(0, Vec::len),
        );
        for (input, ideal) in inputs.into_iter().zip(ideals) {
            set.add(input, ideal)?;
        }
        Ok(set)
    }

    /// Empty set with fixed widths.
    pub fn with_sizes(input_size: usize, ideal_size: usize) -> Self {
        Self {
            inputs: Vec::new(),
            ideals: Vec::new(),
            input_size,
            ideal_size,
        }
    }

    pub fn add(&mut self, input: Vec<f64>, ideal: Vec<f64>) -> Result<()> {
        if input.len() != self.input_size {
            return Err(NetworkError::shape("training input", self.input_size, input.len()));
        }
        if ideal.len() != self.ideal_size {
            return Err(NetworkError::shape("training ideal", self.ideal_size, ideal.len()));
        }
        self.inputs.push(input);
        self.ideals.push(ideal);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&[f64], &[f64])> {
        self.inputs
            .iter()
            .zip(&self.ideals)
            .map(|(i, t)| (i.as_slice(), t.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.inputs.is_empty()
    }
}

impl TrainingSet for BasicTrainingSet {
    fn count(&self) -> usize {
        self.inputs.len()
    }

    fn input_size(&self) -> usize {
        self.input_size
    }

    fn ideal_size(&self) -> usize {
        self.ideal_size
    }

    fn record(&self, index: usize) -> (&[f64], &[f64]) {
        (&self.inputs[index], &self.ideals[index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ragged_input_rejected() {
        let err = BasicTrainingSet::new(vec![vec![0.0, 1.0], vec![1.0]], vec![vec![0.0], vec![1.0]])
            .unwrap_err();
        assert!(err.is_shape());
    }

    #[test]
    fn test_row_count_mismatch() {
        let err = BasicTrainingSet::new(vec![vec![0.0]], vec![]).unwrap_err();
        assert!(err.is_shape());
    }

    #[test]
    fn test_empty_set() {
        let set = BasicTrainingSet::new(vec![], vec![]).unwrap();
        assert_eq!(set.count(), 0);
        assert!(set.is_empty());
    }
}
