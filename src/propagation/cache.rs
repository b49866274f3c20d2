//! Per-connection record of the most recent forward pass.

use crate::network::ConnectionId;

/// What a single connection read and produced during one forward pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CachedConnection {
    /// Vector the connection read: the source layer's output, or the delayed
    /// value for a context connection.
    pub input: Vec<f64>,
    /// Raw contribution added to the destination before bias and activation.
    pub output: Vec<f64>,
}

/// Output cache indexed by connection.
///
/// Filled by the forward evaluator and read by the backward propagator and
/// gradient calculator, which need per-connection values rather than only
/// per-layer ones.
#[derive(Debug, Clone, Default)]
pub struct OutputCache {
    entries: Vec<Option<CachedConnection>>,
}

impl OutputCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every entry and size the cache for `connections` connections.
    pub fn clear(&mut self, connections: usize) {
        self.entries.clear();
        self.entries.resize(connections, None);
    }

    pub fn record(&mut self, id: ConnectionId, entry: CachedConnection) {
        if self.entries.len() <= id.index() {
            self.entries.resize(id.index() + 1, None);
        }
        self.entries[id.index()] = Some(entry);
    }

    pub fn get(&self, id: ConnectionId) -> Option<&CachedConnection> {
        self.entries.get(id.index()).and_then(Option::as_ref)
    }

    /// Number of connections recorded since the last clear.
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
