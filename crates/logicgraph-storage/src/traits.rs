//! The [`CircuitStore`] trait defining the storage contract for circuits.
//!
//! Backends store whole circuits: a save replaces everything previously
//! stored under the id, and a load always builds a fresh graph.

use logicgraph_core::CircuitGraph;

use crate::error::StorageError;
use crate::types::{CircuitId, CircuitSummary};

/// The storage contract for circuits.
///
/// The trait is synchronous; every backend is used from a single thread.
pub trait CircuitStore {
    /// Creates a new empty circuit with the given name.
    fn create(&mut self, name: &str) -> Result<CircuitId, StorageError>;

    /// Replaces the stored content of `id` with `graph`.
    fn save(&mut self, id: CircuitId, graph: &CircuitGraph) -> Result<(), StorageError>;

    fn load(&self, id: CircuitId) -> Result<CircuitGraph, StorageError>;

    fn delete(&mut self, id: CircuitId) -> Result<(), StorageError>;

    /// Lists all stored circuits in id order.
    fn list(&self) -> Result<Vec<CircuitSummary>, StorageError>;

    /// First circuit called `name`, in id order.
    fn find_by_name(&self, name: &str) -> Result<Option<CircuitSummary>, StorageError> {
        Ok(self.list()?.into_iter().find(|c| c.name == name))
    }
}

/// Names must be non-empty, single-line and usable as a file name.
pub(crate) fn check_name(name: &str) -> Result<(), StorageError> {
    let bad = name.trim().is_empty()
        || name.starts_with('.')
        || name.chars().any(|c| matches!(c, '/' | '\\' | '\0' | '\n' | '\r'));
    if bad {
        return Err(StorageError::InvalidName {
            name: name.to_owned(),
        });
    }
    Ok(())
}
