//! Persistence for logicgraph circuits.
//!
//! Provides the line-oriented save format, SVG export, blueprint library
//! files and the [`CircuitStore`] trait with three backends:
//! [`InMemoryStore`], [`DirectoryStore`] and [`SqliteStore`].
//!
//! # Modules
//!
//! - [`error`]: StorageError enum with all failure modes
//! - [`types`]: CircuitId, CircuitSummary storage-layer types
//! - [`convert`]: CircuitGraph decompose/recompose functions
//! - [`text`]: save format reader and writer
//! - [`hash`]: blake3 content checksums
//! - [`svg`]: SVG export through the core renderer interface
//! - [`library`]: blueprint library JSON files
//! - [`traits`]: CircuitStore trait definition
//! - [`memory`], [`directory`], [`sqlite`]: store backends
//! - [`schema`]: SQLite migration setup

pub mod convert;
pub mod directory;
pub mod error;
pub mod hash;
pub mod library;
pub mod memory;
pub mod schema;
pub mod sqlite;
pub mod svg;
pub mod text;
pub mod traits;
pub mod types;

// Re-export key types for ergonomic use.
pub use convert::{decompose, recompose, DecomposedCircuit, NodeRecord, WireRecord};
pub use directory::DirectoryStore;
pub use error::StorageError;
pub use hash::{hash_circuit, hash_records};
pub use library::{read_library, write_library};
pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;
pub use svg::{export_svg, SvgOptions, SvgRenderer};
pub use text::{load_from_path, read_circuit, save_to_path, write_circuit, FORMAT_VERSION};
pub use traits::CircuitStore;
pub use types::{CircuitId, CircuitSummary};
