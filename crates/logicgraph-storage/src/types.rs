//! Storage-layer types for circuit identity and metadata.
//!
//! [`CircuitId`] lives here rather than in logicgraph-core because circuits
//! only gain an identity when they are persisted.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unique identifier for a stored circuit.
///
/// The inner `i64` aligns with SQLite's `INTEGER PRIMARY KEY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CircuitId(pub i64);

impl fmt::Display for CircuitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CircuitId({})", self.0)
    }
}

/// Summary of a stored circuit (for listing).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitSummary {
    pub id: CircuitId,
    pub name: String,
    /// Hex blake3 digest of the last saved content; `None` until first save.
    pub checksum: Option<String>,
}
