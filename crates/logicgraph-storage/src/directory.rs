//! Directory-backed implementation of [`CircuitStore`].
//!
//! Each circuit is one save-format file named `<id>-<name>.lgc` inside the
//! store's root directory.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use logicgraph_core::CircuitGraph;

use crate::error::StorageError;
use crate::text::{read_circuit, write_circuit};
use crate::traits::{check_name, CircuitStore};
use crate::types::{CircuitId, CircuitSummary};

/// File extension for saved circuits.
pub const EXTENSION: &str = "lgc";

#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

struct Entry {
    id: CircuitId,
    name: String,
    path: PathBuf,
}

impl DirectoryStore {
    /// Opens the store at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(DirectoryStore { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Every well-formed circuit file, in id order. Other files are ignored.
    fn entries(&self) -> Result<Vec<Entry>, StorageError> {
        let mut entries = Vec::new();
        for dirent in fs::read_dir(&self.root)? {
            let path = dirent?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let Some((id, name)) = stem.split_once('-') else {
                continue;
            };
            let Ok(id) = id.parse::<i64>() else { continue };
            entries.push(Entry {
                id: CircuitId(id),
                name: name.to_owned(),
                path,
            });
        }
        entries.sort_by_key(|e| e.id);
        Ok(entries)
    }

    fn entry(&self, id: CircuitId) -> Result<Entry, StorageError> {
        self.entries()?
            .into_iter()
            .find(|e| e.id == id)
            .ok_or(StorageError::CircuitNotFound(id.0))
    }
}

impl CircuitStore for DirectoryStore {
    fn create(&mut self, name: &str) -> Result<CircuitId, StorageError> {
        check_name(name)?;
        let id = self.entries()?.last().map_or(1, |e| e.id.0 + 1);
        let path = self.root.join(format!("{id}-{name}.{EXTENSION}"));
        fs::write(&path, write_circuit(&CircuitGraph::new()))?;
        info!(path = %path.display(), "created circuit file");
        Ok(CircuitId(id))
    }

    fn save(&mut self, id: CircuitId, graph: &CircuitGraph) -> Result<(), StorageError> {
        let entry = self.entry(id)?;
        fs::write(&entry.path, write_circuit(graph))?;
        info!(path = %entry.path.display(), nodes = graph.node_count(), "saved circuit");
        Ok(())
    }

    fn load(&self, id: CircuitId) -> Result<CircuitGraph, StorageError> {
        let entry = self.entry(id)?;
        read_circuit(&fs::read_to_string(&entry.path)?)
    }

    fn delete(&mut self, id: CircuitId) -> Result<(), StorageError> {
        let entry = self.entry(id)?;
        fs::remove_file(&entry.path)?;
        Ok(())
    }

    fn list(&self) -> Result<Vec<CircuitSummary>, StorageError> {
        self.entries()?
            .into_iter()
            .map(|e| {
                let bytes = fs::read(&e.path)?;
                Ok(CircuitSummary {
                    id: e.id,
                    name: e.name,
                    checksum: Some(blake3::hash(&bytes).to_hex().to_string()),
                })
            })
            .collect()
    }
}
