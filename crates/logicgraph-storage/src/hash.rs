//! Content checksums for stored circuits.
//!
//! The checksum is the blake3 digest of the circuit's save-format text, so
//! two circuits with the same checksum save to identical files regardless of
//! which backend holds them.

use logicgraph_core::CircuitGraph;

use crate::convert::{decompose, DecomposedCircuit};
use crate::text::format_records;

pub fn hash_records(records: &DecomposedCircuit) -> blake3::Hash {
    blake3::hash(format_records(records).as_bytes())
}

pub fn hash_circuit(graph: &CircuitGraph) -> blake3::Hash {
    hash_records(&decompose(graph))
}

#[cfg(test)]
mod tests {
    use super::*;
    use logicgraph_core::{Gate, Position};

    #[test]
    fn state_does_not_affect_checksum() {
        let mut graph = CircuitGraph::new();
        let b = graph.create_node(Position::new(0, 0), Gate::Battery).unwrap();
        let c = graph.create_node(Position::new(8, 0), Gate::Capacitor { capacity: 3, charge: 0 }).unwrap();
        graph.connect(b, c).unwrap();
        let before = hash_circuit(&graph);
        graph.evaluate();
        graph.evaluate();
        assert_eq!(hash_circuit(&graph), before);

        graph.move_node(c, Position::new(16, 0)).unwrap();
        assert_ne!(hash_circuit(&graph), before);
    }
}
