//! Decompose/recompose conversions between CircuitGraph and flat records.
//!
//! [`decompose`] flattens a graph into a [`DecomposedCircuit`] whose nodes
//! are in node-list order and whose wires address nodes by that index.
//! [`recompose`] builds a brand-new graph from such records, so a failed load
//! never touches a graph the caller already holds.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use logicgraph_core::{
    CircuitGraph, ElbowConfig, Gate, GateKind, Group, NodeId, NodeSeed, Position, WireSeed,
};

use crate::error::StorageError;

/// One node, without identity or dynamic state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub gate: GateKind,
    /// Auxiliary parameter; zero for kinds that have none.
    pub param: u8,
    pub position: Position,
    pub name: Option<String>,
}

/// One wire, addressed by node-list index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireRecord {
    pub elbow_config: ElbowConfig,
    pub start: usize,
    pub end: usize,
}

/// All persistent parts of a circuit as flat vectors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecomposedCircuit {
    pub nodes: Vec<NodeRecord>,
    pub wires: Vec<WireRecord>,
    pub groups: Vec<Group>,
}

/// Flattens `graph` into records.
///
/// The node-index table and the node records are built by two independent
/// read-only passes run in parallel; wires need the table and follow after.
/// Wires are listed grouped by start node, in node-list order.
pub fn decompose(graph: &CircuitGraph) -> DecomposedCircuit {
    let (table, nodes) = rayon::join(|| index_table(graph), || node_records(graph));

    let mut wires = Vec::with_capacity(graph.wire_count());
    for (start, node) in graph.nodes().enumerate() {
        for &w in node.outputs() {
            let Some(wire) = graph.wire(w) else { continue };
            let Some(&end) = table.get(&wire.end()) else { continue };
            wires.push(WireRecord {
                elbow_config: wire.elbow_config(),
                start,
                end,
            });
        }
    }

    debug!(nodes = nodes.len(), wires = wires.len(), "decomposed circuit");
    DecomposedCircuit {
        nodes,
        wires,
        groups: graph.groups().to_vec(),
    }
}

/// Rebuilds a graph from records.
///
/// Fails on an out-of-range gate parameter, a wire index past the node
/// list, a self-loop or a parallel wire.
pub fn recompose(decomposed: &DecomposedCircuit) -> Result<CircuitGraph, StorageError> {
    let seeds = decomposed
        .nodes
        .iter()
        .map(|record| {
            Ok(NodeSeed {
                position: record.position,
                gate: Gate::new(record.gate, record.param)?,
                name: record.name.clone(),
            })
        })
        .collect::<Result<Vec<_>, StorageError>>()?;

    let wires: Vec<WireSeed> = decomposed
        .wires
        .iter()
        .map(|w| WireSeed {
            start: w.start,
            end: w.end,
            elbow_config: w.elbow_config,
        })
        .collect();

    Ok(CircuitGraph::from_parts(seeds, &wires, decomposed.groups.clone())?)
}

fn index_table(graph: &CircuitGraph) -> HashMap<NodeId, usize> {
    graph
        .node_ids()
        .iter()
        .enumerate()
        .map(|(i, &id)| (id, i))
        .collect()
}

fn node_records(graph: &CircuitGraph) -> Vec<NodeRecord> {
    graph
        .nodes()
        .map(|node| NodeRecord {
            gate: node.kind(),
            param: node.gate().param(),
            position: node.position(),
            name: node.name().map(str::to_owned),
        })
        .collect()
}
