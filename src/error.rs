//! Error types shared by every part of the network engine
//!
//! Construction, evaluation and training report failures through a single
//! [`NetworkError`] enum. All failures are local and synchronous: the graph is
//! never left half-modified, and a graph rejected for gradient work can still
//! be used for forward-only evaluation.

use thiserror::Error;

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, NetworkError>;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum NetworkError {
    /// A structural invariant of the graph was violated.
    #[error("topology error: {0}")]
    Topology(String),

    /// A vector length does not match the layer or parameter count it feeds.
    #[error("shape mismatch for {context}: expected {expected}, got {actual}")]
    Shape {
        context: String,
        expected: usize,
        actual: usize,
    },

    /// The requested operation is not supported by the current configuration,
    /// e.g. gradient work through an activation without a derivative.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl NetworkError {
    pub(crate) fn shape(context: impl Into<String>, expected: usize, actual: usize) -> Self {
        NetworkError::Shape {
            context: context.into(),
            expected,
            actual,
        }
    }

    /// Returns true for [`NetworkError::Topology`].
    pub fn is_topology(&self) -> bool {
        matches!(self, NetworkError::Topology(_))
    }

    /// Returns true for [`NetworkError::Shape`].
    pub fn is_shape(&self) -> bool {
        matches!(self, NetworkError::Shape { .. })
    }

    /// Returns true for [`NetworkError::Configuration`].
    pub fn is_configuration(&self) -> bool {
        matches!(self, NetworkError::Configuration(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_message() {
        let err = NetworkError::shape("input", 3, 4);
        assert_eq!(
            err.to_string(),
            "shape mismatch for input: expected 3, got 4"
        );
        assert!(err.is_shape());
        assert!(!err.is_topology());
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: NetworkError = io.into();
        assert!(matches!(err, NetworkError::Io(_)));
    }
}
