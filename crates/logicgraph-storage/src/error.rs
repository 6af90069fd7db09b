//! Storage error types for logicgraph-storage.
//!
//! [`StorageError`] covers every way loading, saving or exporting a circuit
//! can fail: malformed save files, backend I/O and database failures, and
//! circuits whose records do not form a valid graph.

use logicgraph_core::CoreError;
use thiserror::Error;

/// Errors produced by storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// JSON serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("migration error: {0}")]
    Migration(String),

    /// The records were read but do not describe a valid circuit.
    #[error("invalid circuit: {0}")]
    Core(#[from] CoreError),

    #[error("unsupported save format version {version:?}")]
    UnsupportedVersion { version: String },

    /// A save file line could not be parsed. Lines are 1-based.
    #[error("line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("circuit not found: {0}")]
    CircuitNotFound(i64),

    /// Circuit names must be non-empty and free of path separators.
    #[error("invalid circuit name {name:?}")]
    InvalidName { name: String },

    /// Stored rows could not be turned back into records.
    #[error("reconstruction error: {reason}")]
    ReconstructionError { reason: String },

    /// Stored content does not match the checksum recorded with it.
    #[error("checksum mismatch for circuit {id}")]
    ChecksumMismatch { id: i64 },
}
