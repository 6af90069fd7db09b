//! Deterministic random switch flipping.
//!
//! Reproducibility: given the same seed and the same circuit, the same
//! switches are flipped on the same ticks.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use logicgraph_core::{CircuitGraph, GateKind, NodeId};

/// Flips one randomly chosen switch every `period` ticks.
///
/// A switch is a zero-input OR or NOR node.
#[derive(Debug, Clone)]
pub struct RandomStimulus {
    seed: u64,
    period: u64,
    rng: ChaCha8Rng,
}

impl RandomStimulus {
    /// A `period` of zero is treated as one.
    pub fn new(seed: u64, period: u64) -> Self {
        RandomStimulus {
            seed,
            period: period.max(1),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn period(&self) -> u64 {
        self.period
    }

    /// The switch to flip before tick `tick + 1`, if this is a flipping tick
    /// and the circuit has any switch.
    pub fn pick(&mut self, graph: &CircuitGraph, tick: u64) -> Option<NodeId> {
        if tick % self.period != 0 {
            return None;
        }
        let switches = switches(graph);
        if switches.is_empty() {
            return None;
        }
        Some(switches[self.rng.gen_range(0..switches.len())])
    }
}

/// Every switch in the circuit, in node-list order.
pub fn switches(graph: &CircuitGraph) -> Vec<NodeId> {
    graph
        .nodes()
        .filter(|n| n.is_source() && matches!(n.kind(), GateKind::Or | GateKind::Nor))
        .map(|n| n.id())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SimConfig, Simulator};
    use logicgraph_core::{Gate, Position};

    fn board() -> CircuitGraph {
        let mut graph = CircuitGraph::new();
        let sink = graph.create_node(Position::new(64, 0), Gate::Xor).unwrap();
        for i in 0..4 {
            let s = graph.create_node(Position::new(0, i * 8), Gate::Or).unwrap();
            graph.connect(s, sink).unwrap();
        }
        graph
    }

    #[test]
    fn switches_are_sources_with_or_or_nor() {
        let graph = board();
        assert_eq!(switches(&graph).len(), 4);
    }

    #[test]
    fn same_seed_same_run() {
        let config = SimConfig {
            trace_enabled: true,
            ..SimConfig::default()
        };
        let run = |seed| {
            let mut sim = Simulator::new(board(), config.clone());
            let mut stimulus = RandomStimulus::new(seed, 3);
            sim.run_with_stimulus(12, &mut stimulus).unwrap();
            sim.trace().to_vec()
        };
        let first = run(7);
        assert_eq!(first, run(7));
        let flips = first.iter().filter(|t| t.toggled.is_some()).count();
        assert_eq!(flips, 4);
    }

    #[test]
    fn no_switches_no_flips() {
        let mut graph = CircuitGraph::new();
        graph.create_node(Position::new(0, 0), Gate::Battery).unwrap();
        let mut stimulus = RandomStimulus::new(1, 0);
        assert_eq!(stimulus.period(), 1);
        assert_eq!(stimulus.pick(&graph, 0), None);
    }
}
