//! Evaluation ordering and the per-tick evaluation pass.
//!
//! # Sorting
//!
//! [`CircuitGraph::sort`] is a breadth-first (Kahn) walk from the start
//! nodes: a node is emitted once every one of its input sources has been
//! emitted. Feedback loops have no zero-input entry, so when the queue runs
//! dry with nodes left over, the first leftover node in node-list order whose
//! outstanding inputs all come from its own strongly connected component is
//! promoted to a synthetic root and the walk resumes from it. Restricting
//! promotion that way keeps every node that merely hangs off a loop behind
//! the whole loop, so a wire `u -> v` always has `u` first unless `u` and `v`
//! share a cycle.
//!
//! # Evaluating
//!
//! [`CircuitGraph::evaluate`] visits the node list once, in order. Each node
//! reads its input wires' states, which are its sources' outputs as already
//! updated this tick. Inside a loop the promoted entry node reads the stale
//! output of its in-loop predecessor, which is what makes latches hold.

use std::collections::VecDeque;

use petgraph::algo::tarjan_scc;
use petgraph::graphmap::DiGraphMap;
use slotmap::SecondaryMap;
use tracing::{debug, warn};

use crate::graph::CircuitGraph;
use crate::id::NodeId;

/// What a sort had to do to cover the graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortReport {
    /// Nodes promoted to synthetic roots, in promotion order.
    pub promoted: Vec<NodeId>,
}

impl SortReport {
    /// Returns `true` if the graph has at least one feedback loop.
    pub fn has_feedback(&self) -> bool {
        !self.promoted.is_empty()
    }
}

impl CircuitGraph {
    /// Reorders the node list into evaluation order and clears the dirty flag.
    pub fn sort(&mut self) -> SortReport {
        let total = self.nodes.len();
        let mut report = SortReport::default();
        let mut sorted = Vec::with_capacity(total);
        let mut pending: SecondaryMap<NodeId, usize> = SecondaryMap::with_capacity(total);
        let mut enqueued: SecondaryMap<NodeId, ()> = SecondaryMap::with_capacity(total);
        let mut queue: VecDeque<NodeId> = VecDeque::new();
        let mut components: Option<SecondaryMap<NodeId, usize>> = None;

        for (id, node) in &self.nodes {
            pending.insert(id, node.input_count);
        }
        for &id in &self.start_nodes {
            enqueued.insert(id, ());
            queue.push_back(id);
        }

        while sorted.len() < total {
            while let Some(id) = queue.pop_front() {
                sorted.push(id);
                for &w in self.nodes[id].outputs() {
                    let next = self.wires[w].end;
                    let left = &mut pending[next];
                    *left = left.saturating_sub(1);
                    if *left == 0 && enqueued.insert(next, ()).is_none() {
                        queue.push_back(next);
                    }
                }
            }
            if sorted.len() == total {
                break;
            }

            let components = components.get_or_insert_with(|| self.component_index());
            let root = self
                .order
                .iter()
                .copied()
                .find(|&id| {
                    !enqueued.contains_key(id)
                        && self.nodes[id].inputs().iter().all(|&w| {
                            let source = self.wires[w].start;
                            enqueued.contains_key(source) || components[source] == components[id]
                        })
                })
                .or_else(|| self.order.iter().copied().find(|&id| !enqueued.contains_key(id)));
            let Some(root) = root else {
                break;
            };

            warn!(node = %root, "feedback loop: promoting synthetic evaluation root");
            report.promoted.push(root);
            enqueued.insert(root, ());
            queue.push_back(root);
        }

        debug!(
            nodes = total,
            roots = self.start_nodes.len(),
            promoted = report.promoted.len(),
            "sorted evaluation order"
        );
        self.order = sorted;
        self.order_dirty = false;
        report
    }

    /// Runs one tick: re-sorts if the order is stale, then steps every node
    /// once in order.
    pub fn evaluate(&mut self) {
        if self.order_dirty {
            self.sort();
        }
        for i in 0..self.order.len() {
            let id = self.order[i];
            self.evaluate_node(id);
        }
    }

    fn evaluate_node(&mut self, id: NodeId) {
        let node = &self.nodes[id];
        let passthrough = node.is_passthrough();
        let total = node.input_count;
        let high = node
            .inputs()
            .iter()
            .filter(|&&w| self.nodes[self.wires[w].start].state)
            .count();

        let node = &mut self.nodes[id];
        node.previous_state = node.state;
        node.state = if passthrough {
            high == 1
        } else {
            node.gate.step(total, high)
        };
    }

    /// Clears every output and gate memory, as if the circuit were just built.
    pub fn reset_state(&mut self) {
        for node in self.nodes.values_mut() {
            node.state = false;
            node.previous_state = false;
            node.gate = node.gate.reset();
        }
    }

    /// Every feedback loop: strongly connected components of two or more
    /// nodes, each listed in node-list order.
    pub fn feedback_loops(&self) -> Vec<Vec<NodeId>> {
        let position: SecondaryMap<NodeId, usize> = self
            .order
            .iter()
            .enumerate()
            .map(|(i, &id)| (id, i))
            .collect();
        let mut loops: Vec<Vec<NodeId>> = tarjan_scc(&self.signal_graph())
            .into_iter()
            .filter(|scc| scc.len() > 1)
            .map(|mut scc| {
                scc.sort_by_key(|&id| position[id]);
                scc
            })
            .collect();
        loops.sort_by_key(|scc| position[scc[0]]);
        loops
    }

    /// Maps each node to the index of its strongly connected component.
    fn component_index(&self) -> SecondaryMap<NodeId, usize> {
        let mut index = SecondaryMap::with_capacity(self.nodes.len());
        for (i, scc) in tarjan_scc(&self.signal_graph()).into_iter().enumerate() {
            for id in scc {
                index.insert(id, i);
            }
        }
        index
    }

    fn signal_graph(&self) -> DiGraphMap<NodeId, ()> {
        let mut graph = DiGraphMap::with_capacity(self.nodes.len(), self.wires.len());
        for &id in &self.order {
            graph.add_node(id);
        }
        for wire in self.wires.values() {
            graph.add_edge(wire.start, wire.end, ());
        }
        graph
    }
}
