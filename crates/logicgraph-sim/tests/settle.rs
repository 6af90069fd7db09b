//! Settle detection over random feed-forward circuits.
//!
//! A circuit without feedback loops and with constant inputs always reaches
//! a fixed point, so `run_until_settled` must report `Stable`.

use proptest::prelude::*;

use logicgraph_core::{CircuitGraph, Gate, GateKind, Position};
use logicgraph_sim::{SimConfig, SimState, Simulator};

/// Builds a circuit whose wires only run from lower to higher creation index.
fn feed_forward(kinds: &[(usize, u8)], wires: &[(usize, usize)]) -> CircuitGraph {
    let mut graph = CircuitGraph::new();
    let ids: Vec<_> = kinds
        .iter()
        .enumerate()
        .map(|(i, &(kind, param))| {
            let kind = GateKind::ALL[kind];
            let gate = Gate::new(kind, param.min(kind.max_param())).unwrap();
            graph.create_node(Position::new(i as i32 * 8, 0), gate).unwrap()
        })
        .collect();
    for &(a, b) in wires {
        let (a, b) = (a % ids.len(), b % ids.len());
        if a < b {
            graph.connect(ids[a], ids[b]).unwrap();
        }
    }
    graph
}

proptest! {
    #[test]
    fn feed_forward_circuits_settle(
        kinds in prop::collection::vec((0..GateKind::ALL.len(), 0u8..5), 1..12),
        wires in prop::collection::vec((any::<usize>(), any::<usize>()), 0..30),
    ) {
        let graph = feed_forward(&kinds, &wires);
        prop_assert!(graph.feedback_loops().is_empty());

        let mut sim = Simulator::new(graph, SimConfig::default());
        let state = sim.run_until_settled().unwrap();
        prop_assert!(matches!(state, SimState::Stable { .. }), "{:?}", state);
    }
}

#[test]
fn settled_run_resumes_after_input_change() {
    let mut graph = CircuitGraph::new();
    let switch = graph.create_node(Position::new(0, 0), Gate::Or).unwrap();
    graph.set_name(switch, Some("in".into())).unwrap();
    let delay = graph.create_node(Position::new(16, 0), Gate::Delay { memory: false }).unwrap();
    let lamp = graph.create_node(Position::new(32, 0), Gate::Led { color: 5 }).unwrap();
    graph.set_name(lamp, Some("lamp".into())).unwrap();
    graph.connect(switch, delay).unwrap();
    graph.connect(delay, lamp).unwrap();

    let mut sim = Simulator::new(graph, SimConfig::default());
    assert_eq!(sim.run_until_settled().unwrap(), SimState::Stable { tick: 0 });
    assert!(!sim.probe("lamp").unwrap());

    sim.set_input("in", true).unwrap();
    let state = sim.run_until_settled().unwrap();
    assert_eq!(state, SimState::Stable { tick: 3 });
    assert!(sim.probe("lamp").unwrap());
}
