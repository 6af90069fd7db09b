//! In-memory implementation of [`CircuitStore`].
//!
//! [`InMemoryStore`] is a first-class backend for tests and sessions that do
//! not need persistence. It keeps decomposed records rather than live graphs,
//! so loads go through the same [`recompose`] path as every other backend.

use std::collections::BTreeMap;

use logicgraph_core::CircuitGraph;

use crate::convert::{decompose, recompose, DecomposedCircuit};
use crate::error::StorageError;
use crate::hash::hash_records;
use crate::traits::{check_name, CircuitStore};
use crate::types::{CircuitId, CircuitSummary};

#[derive(Debug, Clone)]
struct StoredCircuit {
    name: String,
    records: DecomposedCircuit,
    checksum: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    circuits: BTreeMap<i64, StoredCircuit>,
    next_id: i64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        InMemoryStore {
            circuits: BTreeMap::new(),
            next_id: 1,
        }
    }

    fn get(&self, id: CircuitId) -> Result<&StoredCircuit, StorageError> {
        self.circuits
            .get(&id.0)
            .ok_or(StorageError::CircuitNotFound(id.0))
    }
}

impl CircuitStore for InMemoryStore {
    fn create(&mut self, name: &str) -> Result<CircuitId, StorageError> {
        check_name(name)?;
        // A Default-constructed store starts at zero; ids are always positive.
        let id = self.next_id.max(1);
        self.next_id = id + 1;
        self.circuits.insert(
            id,
            StoredCircuit {
                name: name.to_owned(),
                records: DecomposedCircuit::default(),
                checksum: None,
            },
        );
        Ok(CircuitId(id))
    }

    fn save(&mut self, id: CircuitId, graph: &CircuitGraph) -> Result<(), StorageError> {
        let stored = self
            .circuits
            .get_mut(&id.0)
            .ok_or(StorageError::CircuitNotFound(id.0))?;
        stored.records = decompose(graph);
        stored.checksum = Some(hash_records(&stored.records).to_hex().to_string());
        Ok(())
    }

    fn load(&self, id: CircuitId) -> Result<CircuitGraph, StorageError> {
        recompose(&self.get(id)?.records)
    }

    fn delete(&mut self, id: CircuitId) -> Result<(), StorageError> {
        self.circuits
            .remove(&id.0)
            .map(|_| ())
            .ok_or(StorageError::CircuitNotFound(id.0))
    }

    fn list(&self) -> Result<Vec<CircuitSummary>, StorageError> {
        Ok(self
            .circuits
            .iter()
            .map(|(&id, stored)| CircuitSummary {
                id: CircuitId(id),
                name: stored.name.clone(),
                checksum: stored.checksum.clone(),
            })
            .collect())
    }
}
