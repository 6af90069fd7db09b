//! SQLite implementation of [`CircuitStore`].
//!
//! [`SqliteStore`] keeps one row per node, wire and group, keyed by the
//! record's index in the decomposed circuit. Every save runs in a single
//! transaction and records the blake3 checksum of the content, which loads
//! verify before rebuilding the graph.

use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};

use logicgraph_core::{CircuitGraph, ElbowConfig, GateKind, Group, Position};

use crate::convert::{decompose, recompose, DecomposedCircuit, NodeRecord, WireRecord};
use crate::error::StorageError;
use crate::hash::hash_records;
use crate::traits::{check_name, CircuitStore};
use crate::types::{CircuitId, CircuitSummary};

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (or creates) a database at `path`.
    pub fn new(path: &str) -> Result<Self, StorageError> {
        let conn = crate::schema::open_database(path)?;
        info!(path, layout = crate::schema::schema_version(&conn)?, "opened circuit database");
        Ok(SqliteStore { conn })
    }

    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = crate::schema::open_in_memory()?;
        Ok(SqliteStore { conn })
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    fn checksum(&self, id: CircuitId) -> Result<Option<String>, StorageError> {
        let mut stmt = self.conn.prepare("SELECT checksum FROM circuits WHERE id = ?1")?;
        let mut rows = stmt.query(params![id.0])?;
        match rows.next()? {
            Some(row) => Ok(row.get(0)?),
            None => Err(StorageError::CircuitNotFound(id.0)),
        }
    }

    fn save_decomposed(&mut self, id: CircuitId, records: &DecomposedCircuit) -> Result<(), StorageError> {
        let checksum = hash_records(records).to_hex().to_string();
        let tx = self.conn.transaction()?;

        let updated = tx.execute(
            "UPDATE circuits SET checksum = ?2, updated_at = datetime('now') WHERE id = ?1",
            params![id.0, checksum],
        )?;
        if updated == 0 {
            return Err(StorageError::CircuitNotFound(id.0));
        }

        for table in ["nodes", "wires", "circuit_groups"] {
            tx.execute(&format!("DELETE FROM {table} WHERE circuit_id = ?1"), params![id.0])?;
        }

        {
            let mut insert = tx.prepare(
                "INSERT INTO nodes (circuit_id, idx, gate, param, x, y, name) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;
            for (idx, node) in records.nodes.iter().enumerate() {
                insert.execute(params![
                    id.0,
                    idx as i64,
                    node.gate.symbol().to_string(),
                    node.param,
                    node.position.x,
                    node.position.y,
                    node.name,
                ])?;
            }

            let mut insert = tx.prepare(
                "INSERT INTO wires (circuit_id, idx, start_idx, end_idx, elbow) VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for (idx, wire) in records.wires.iter().enumerate() {
                insert.execute(params![
                    id.0,
                    idx as i64,
                    wire.start as i64,
                    wire.end as i64,
                    wire.elbow_config.index(),
                ])?;
            }

            let mut insert =
                tx.prepare("INSERT INTO circuit_groups (circuit_id, idx, data) VALUES (?1, ?2, ?3)")?;
            for (idx, group) in records.groups.iter().enumerate() {
                insert.execute(params![id.0, idx as i64, serde_json::to_string(group)?])?;
            }
        }

        tx.commit()?;
        debug!(
            %id,
            nodes = records.nodes.len(),
            wires = records.wires.len(),
            "saved circuit rows"
        );
        Ok(())
    }

    fn load_decomposed(&self, id: CircuitId) -> Result<DecomposedCircuit, StorageError> {
        let mut records = DecomposedCircuit::default();

        let mut stmt = self.conn.prepare(
            "SELECT gate, param, x, y, name FROM nodes WHERE circuit_id = ?1 ORDER BY idx",
        )?;
        let rows = stmt.query_map(params![id.0], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, u8>(1)?,
                row.get::<_, i32>(2)?,
                row.get::<_, i32>(3)?,
                row.get::<_, Option<String>>(4)?,
            ))
        })?;
        for row in rows {
            let (gate, param, x, y, name) = row?;
            records.nodes.push(NodeRecord {
                gate: gate_from_column(&gate)?,
                param,
                position: Position::new(x, y),
                name,
            });
        }

        let mut stmt = self.conn.prepare(
            "SELECT start_idx, end_idx, elbow FROM wires WHERE circuit_id = ?1 ORDER BY idx",
        )?;
        let rows = stmt.query_map(params![id.0], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?, row.get::<_, u8>(2)?))
        })?;
        for row in rows {
            let (start, end, elbow) = row?;
            records.wires.push(WireRecord {
                elbow_config: ElbowConfig::from_index(elbow).ok_or_else(|| {
                    StorageError::ReconstructionError {
                        reason: format!("unknown elbow config {elbow}"),
                    }
                })?,
                start: index_from_column(start)?,
                end: index_from_column(end)?,
            });
        }

        let mut stmt = self
            .conn
            .prepare("SELECT data FROM circuit_groups WHERE circuit_id = ?1 ORDER BY idx")?;
        let rows = stmt.query_map(params![id.0], |row| row.get::<_, String>(0))?;
        for row in rows {
            let group: Group = serde_json::from_str(&row?)?;
            records.groups.push(group);
        }

        Ok(records)
    }
}

fn gate_from_column(value: &str) -> Result<GateKind, StorageError> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => GateKind::from_symbol(c),
        _ => None,
    }
    .ok_or_else(|| StorageError::ReconstructionError {
        reason: format!("unknown gate {value:?}"),
    })
}

fn index_from_column(value: i64) -> Result<usize, StorageError> {
    usize::try_from(value).map_err(|_| StorageError::ReconstructionError {
        reason: format!("negative node index {value}"),
    })
}

impl CircuitStore for SqliteStore {
    fn create(&mut self, name: &str) -> Result<CircuitId, StorageError> {
        check_name(name)?;
        self.conn
            .execute("INSERT INTO circuits (name) VALUES (?1)", params![name])?;
        Ok(CircuitId(self.conn.last_insert_rowid()))
    }

    fn save(&mut self, id: CircuitId, graph: &CircuitGraph) -> Result<(), StorageError> {
        self.save_decomposed(id, &decompose(graph))
    }

    fn load(&self, id: CircuitId) -> Result<CircuitGraph, StorageError> {
        let expected = self.checksum(id)?;
        let records = self.load_decomposed(id)?;
        if let Some(expected) = expected {
            if hash_records(&records).to_hex().as_str() != expected {
                return Err(StorageError::ChecksumMismatch { id: id.0 });
            }
        }
        let graph = recompose(&records)?;
        info!(%id, nodes = graph.node_count(), "loaded circuit");
        Ok(graph)
    }

    fn delete(&mut self, id: CircuitId) -> Result<(), StorageError> {
        let deleted = self
            .conn
            .execute("DELETE FROM circuits WHERE id = ?1", params![id.0])?;
        if deleted == 0 {
            return Err(StorageError::CircuitNotFound(id.0));
        }
        Ok(())
    }

    fn list(&self) -> Result<Vec<CircuitSummary>, StorageError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, checksum FROM circuits ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(CircuitSummary {
                id: CircuitId(row.get(0)?),
                name: row.get(1)?,
                checksum: row.get(2)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn find_by_name(&self, name: &str) -> Result<Option<CircuitSummary>, StorageError> {
        let summary = self
            .conn
            .query_row(
                "SELECT id, name, checksum FROM circuits WHERE name = ?1 ORDER BY id LIMIT 1",
                params![name],
                |row| {
                    Ok(CircuitSummary {
                        id: CircuitId(row.get(0)?),
                        name: row.get(1)?,
                        checksum: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tampered_rows_fail_checksum() {
        let mut store = SqliteStore::in_memory().unwrap();
        let id = store.create("tamper").unwrap();
        let mut graph = CircuitGraph::new();
        let a = graph.create_node(Position::new(0, 0), logicgraph_core::Gate::Or).unwrap();
        let b = graph.create_node(Position::new(8, 0), logicgraph_core::Gate::And).unwrap();
        graph.connect(a, b).unwrap();
        store.save(id, &graph).unwrap();

        store
            .conn
            .execute("UPDATE nodes SET x = 64 WHERE circuit_id = ?1 AND idx = 0", params![id.0])
            .unwrap();
        assert!(matches!(
            store.load(id),
            Err(StorageError::ChecksumMismatch { id: 1 })
        ));
    }

    #[test]
    fn find_by_name_returns_oldest_match() {
        let mut store = SqliteStore::in_memory().unwrap();
        let first = store.create("latch").unwrap();
        store.create("adder").unwrap();
        store.create("latch").unwrap();
        assert_eq!(store.find_by_name("latch").unwrap().map(|c| c.id), Some(first));
        assert!(store.find_by_name("mux").unwrap().is_none());
    }

    #[test]
    fn deleting_cascades_rows() {
        let mut store = SqliteStore::in_memory().unwrap();
        let id = store.create("cascade").unwrap();
        let mut graph = CircuitGraph::new();
        graph.create_node(Position::new(0, 0), logicgraph_core::Gate::Battery).unwrap();
        store.save(id, &graph).unwrap();
        store.delete(id).unwrap();
        let nodes: i64 = store
            .conn
            .query_row("SELECT COUNT(*) FROM nodes", [], |row| row.get(0))
            .unwrap();
        assert_eq!(nodes, 0);
    }
}
