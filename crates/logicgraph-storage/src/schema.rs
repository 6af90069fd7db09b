//! Circuit database layout and connection setup.
//!
//! Each entry in [`MIGRATIONS`] is one step of the layout; the database's
//! `user_version` records how many have been applied, so [`SCHEMA_VERSION`]
//! is simply the length of the list.

use std::path::Path;

use rusqlite::Connection;
use rusqlite_migration::{Migrations, M};
use tracing::debug;

use crate::error::StorageError;

/// Layout steps in application order. Never edit a released entry.
const MIGRATIONS: &[&str] = &[
    // circuits plus per-record node, wire and group rows
    include_str!("migrations/001_initial_schema.sql"),
    // name lookups for `find_by_name`
    include_str!("migrations/002_circuit_name_index.sql"),
];

/// The `user_version` of a fully migrated circuit database.
pub const SCHEMA_VERSION: usize = MIGRATIONS.len();

/// Set on every connection. Cascading deletes of node and wire rows need
/// `foreign_keys`, which SQLite leaves off.
const CONNECTION_PRAGMAS: &[(&str, &str)] = &[
    ("journal_mode", "WAL"),
    ("synchronous", "NORMAL"),
    ("foreign_keys", "ON"),
];

fn migrations() -> Migrations<'static> {
    Migrations::new(MIGRATIONS.iter().map(|&sql| M::up(sql)).collect())
}

/// Opens (or creates) a circuit database at `path`, bringing it up to
/// [`SCHEMA_VERSION`].
pub fn open_database(path: impl AsRef<Path>) -> Result<Connection, StorageError> {
    prepare(Connection::open(path)?)
}

pub fn open_in_memory() -> Result<Connection, StorageError> {
    prepare(Connection::open_in_memory()?)
}

/// Number of layout steps applied to `conn`.
pub fn schema_version(conn: &Connection) -> Result<usize, StorageError> {
    let version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    usize::try_from(version).map_err(|_| StorageError::Migration(format!("negative user_version {version}")))
}

fn prepare(mut conn: Connection) -> Result<Connection, StorageError> {
    for &(pragma, value) in CONNECTION_PRAGMAS {
        conn.pragma_update(None, pragma, value)?;
    }

    let before = schema_version(&conn)?;
    if before > SCHEMA_VERSION {
        return Err(StorageError::Migration(format!(
            "database layout {before} is newer than supported layout {SCHEMA_VERSION}"
        )));
    }
    migrations()
        .to_latest(&mut conn)
        .map_err(|e| StorageError::Migration(e.to_string()))?;
    if before < SCHEMA_VERSION {
        debug!(from = before, to = SCHEMA_VERSION, "migrated circuit database");
    }
    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_valid() {
        assert!(migrations().validate().is_ok());
    }

    #[test]
    fn fresh_database_is_fully_migrated() {
        let conn = open_in_memory().unwrap();
        assert_eq!(schema_version(&conn).unwrap(), SCHEMA_VERSION);

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('circuits', 'nodes', 'wires', 'circuit_groups')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 4);

        let plan: String = conn
            .query_row(
                "EXPLAIN QUERY PLAN SELECT id FROM circuits WHERE name = 'x'",
                [],
                |row| row.get(3),
            )
            .unwrap();
        assert!(plan.contains("circuits_by_name"), "{plan}");
    }

    #[test]
    fn reopening_keeps_rows_and_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("circuits.db");
        {
            let conn = open_database(&path).unwrap();
            conn.execute("INSERT INTO circuits (name) VALUES ('adder')", []).unwrap();
        }
        let conn = open_database(&path).unwrap();
        assert_eq!(schema_version(&conn).unwrap(), SCHEMA_VERSION);
        let name: String = conn
            .query_row("SELECT name FROM circuits", [], |row| row.get(0))
            .unwrap();
        assert_eq!(name, "adder");
    }

    #[test]
    fn newer_layout_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("future.db");
        {
            let conn = open_database(&path).unwrap();
            conn.pragma_update(None, "user_version", SCHEMA_VERSION as i64 + 1)
                .unwrap();
        }
        assert!(matches!(open_database(&path), Err(StorageError::Migration(_))));
    }
}
