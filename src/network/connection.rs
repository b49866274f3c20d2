//! Connections: directed edges between two layers
//!
//! The set of connection kinds is closed, so it is modelled as an enum and
//! matched exhaustively by the forward and backward passes.

use std::fmt;

use super::layer::LayerId;
use super::matrix::Matrix;

/// Handle to a connection inside a [`NetworkGraph`](super::NetworkGraph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub(crate) usize);

impl ConnectionId {
    /// Position of the connection in declaration order.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "connection#{}", self.0)
    }
}

/// Kind tag without payload, used when requesting a new connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionType {
    Weighted,
    OneToOne,
    Context,
}

impl ConnectionType {
    /// Parse the lowercase names used in architecture files.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "weighted" => Some(ConnectionType::Weighted),
            "one_to_one" | "onetoone" => Some(ConnectionType::OneToOne),
            "context" => Some(ConnectionType::Context),
            _ => None,
        }
    }
}

/// Connection payload.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionKind {
    /// Full `source × destination` weight matrix.
    Weighted(Matrix),
    /// Identity pass-through; source and destination have equal sizes.
    OneToOne,
    /// Weight matrix applied to the value carried on the previous evaluation.
    Context(Matrix),
}

/// Directed edge from `source` to `destination`.
///
/// Connections refer to layers by handle and never own them. They can only
/// be created through [`NetworkGraph`](super::NetworkGraph), which checks the
/// structural invariants first.
#[derive(Debug, Clone, PartialEq)]
pub struct Connection {
    pub(crate) source: LayerId,
    pub(crate) destination: LayerId,
    pub(crate) kind: ConnectionKind,
}

impl Connection {
    pub fn source(&self) -> LayerId {
        self.source
    }

    pub fn destination(&self) -> LayerId {
        self.destination
    }

    pub fn kind(&self) -> &ConnectionKind {
        &self.kind
    }

    pub fn connection_type(&self) -> ConnectionType {
        match self.kind {
            ConnectionKind::Weighted(_) => ConnectionType::Weighted,
            ConnectionKind::OneToOne => ConnectionType::OneToOne,
            ConnectionKind::Context(_) => ConnectionType::Context,
        }
    }

    pub fn is_context(&self) -> bool {
        matches!(self.kind, ConnectionKind::Context(_))
    }

    /// Weight matrix, absent for one-to-one connections.
    pub fn matrix(&self) -> Option<&Matrix> {
        match &self.kind {
            ConnectionKind::Weighted(m) | ConnectionKind::Context(m) => Some(m),
            ConnectionKind::OneToOne => None,
        }
    }

    pub fn matrix_mut(&mut self) -> Option<&mut Matrix> {
        match &mut self.kind {
            ConnectionKind::Weighted(m) | ConnectionKind::Context(m) => Some(m),
            ConnectionKind::OneToOne => None,
        }
    }

    /// Number of trainable weights.
    pub fn parameter_count(&self) -> usize {
        self.matrix().map_or(0, Matrix::len)
    }
}
