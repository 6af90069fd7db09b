//! Whole-circuit state fingerprints using blake3.
//!
//! A fingerprint covers everything that decides the next tick: every node's
//! output plus its gate with all dynamic memory (capacitor charge, delay
//! memory, and the OR/NOR choice of a switch). Two ticks with equal
//! fingerprints on an unedited graph are followed by identical futures,
//! which is what settle detection relies on.
//!
//! Nodes are hashed in node-list order; the list only changes on a re-sort,
//! and a sorted list is stable across ticks.

use logicgraph_core::{CircuitGraph, Gate};

/// Hashes the dynamic state of every node.
pub fn fingerprint(graph: &CircuitGraph) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new();
    for node in graph.nodes() {
        hasher.update(&[node.state() as u8]);
        hasher.update(&gate_bytes(node.gate()));
    }
    hasher.finalize()
}

fn gate_bytes(gate: &Gate) -> [u8; 3] {
    let memory = match *gate {
        Gate::Capacitor { charge, .. } => charge,
        Gate::Delay { memory } => memory as u8,
        _ => 0,
    };
    [gate.kind().symbol() as u8, gate.param(), memory]
}

#[cfg(test)]
mod tests {
    use super::*;
    use logicgraph_core::Position;

    #[test]
    fn same_state_same_hash() {
        let mut a = CircuitGraph::new();
        a.create_node(Position::new(0, 0), Gate::Battery).unwrap();
        let mut b = CircuitGraph::new();
        b.create_node(Position::new(64, 64), Gate::Battery).unwrap();
        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn memory_and_outputs_change_the_hash() {
        let mut graph = CircuitGraph::new();
        let bat = graph.create_node(Position::new(0, 0), Gate::Battery).unwrap();
        let cap = graph.create_node(Position::new(8, 0), Gate::Capacitor { capacity: 9, charge: 0 }).unwrap();
        graph.connect(bat, cap).unwrap();

        let before = fingerprint(&graph);
        graph.evaluate();
        let once = fingerprint(&graph);
        graph.evaluate();
        let twice = fingerprint(&graph);
        assert_ne!(before, once);
        // Outputs are unchanged on the second tick, only the charge differs.
        assert_ne!(once, twice);
    }

    #[test]
    fn switch_position_changes_the_hash() {
        let mut graph = CircuitGraph::new();
        let s = graph.create_node(Position::new(0, 0), Gate::Or).unwrap();
        let before = fingerprint(&graph);
        graph.toggle_switch(s).unwrap();
        assert_ne!(fingerprint(&graph), before);
    }
}
