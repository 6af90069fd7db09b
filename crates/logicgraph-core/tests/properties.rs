//! Property tests: random edit sequences must never break graph bookkeeping
//! or the evaluation-order guarantee.

use proptest::prelude::*;

use logicgraph_core::{CircuitGraph, CoreError, Gate, GateKind, NodeId, Position, WireId};

#[derive(Debug, Clone)]
enum Edit {
    CreateNode { x: i32, y: i32, kind: usize },
    CreateWire { start: usize, end: usize },
    DestroyNode(usize),
    DestroyWire(usize),
    ReverseWire(usize),
    BisectWire { wire: usize, node: usize },
    Bypass(usize),
    BypassComplex(usize),
    Merge { deprecating: usize, overriding: usize },
}

fn edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        4 => (0..16i32, 0..16i32, 0..GateKind::ALL.len())
            .prop_map(|(x, y, kind)| Edit::CreateNode { x: x * 8, y: y * 8, kind }),
        6 => (any::<usize>(), any::<usize>()).prop_map(|(start, end)| Edit::CreateWire { start, end }),
        1 => any::<usize>().prop_map(Edit::DestroyNode),
        1 => any::<usize>().prop_map(Edit::DestroyWire),
        1 => any::<usize>().prop_map(Edit::ReverseWire),
        1 => (any::<usize>(), any::<usize>()).prop_map(|(wire, node)| Edit::BisectWire { wire, node }),
        1 => any::<usize>().prop_map(Edit::Bypass),
        1 => any::<usize>().prop_map(Edit::BypassComplex),
        1 => (any::<usize>(), any::<usize>())
            .prop_map(|(deprecating, overriding)| Edit::Merge { deprecating, overriding }),
    ]
}

fn pick_node(graph: &CircuitGraph, i: usize) -> Option<NodeId> {
    let ids = graph.node_ids();
    (!ids.is_empty()).then(|| ids[i % ids.len()])
}

fn pick_wire(graph: &CircuitGraph, i: usize) -> Option<WireId> {
    let ids: Vec<WireId> = graph.wires().map(|w| w.id()).collect();
    (!ids.is_empty()).then(|| ids[i % ids.len()])
}

/// Applies an edit; precondition failures are fine, anything else is not.
fn apply(graph: &mut CircuitGraph, edit: &Edit) {
    let result = match *edit {
        Edit::CreateNode { x, y, kind } => {
            let gate = Gate::new(GateKind::ALL[kind], 0).unwrap();
            graph.create_node(Position::new(x, y), gate).unwrap();
            Ok(())
        }
        Edit::CreateWire { start, end } => match (pick_node(graph, start), pick_node(graph, end)) {
            (Some(s), Some(e)) => graph.connect(s, e).map(|_| ()),
            _ => Ok(()),
        },
        Edit::DestroyNode(i) => match pick_node(graph, i) {
            Some(n) => graph.destroy_node(n).map(|_| ()),
            None => Ok(()),
        },
        Edit::DestroyWire(i) => match pick_wire(graph, i) {
            Some(w) => graph.destroy_wire(w).map(|_| ()),
            None => Ok(()),
        },
        Edit::ReverseWire(i) => match pick_wire(graph, i) {
            Some(w) => graph.reverse_wire(w).map(|_| ()),
            None => Ok(()),
        },
        Edit::BisectWire { wire, node } => match (pick_wire(graph, wire), pick_node(graph, node)) {
            (Some(w), Some(n)) => graph.bisect_wire(w, n).map(|_| ()),
            _ => Ok(()),
        },
        Edit::Bypass(i) => match pick_node(graph, i) {
            Some(n) => graph.bypass_node(n),
            None => Ok(()),
        },
        Edit::BypassComplex(i) => match pick_node(graph, i) {
            Some(n) => graph.bypass_node_complex(n),
            None => Ok(()),
        },
        Edit::Merge { deprecating, overriding } => {
            match (pick_node(graph, deprecating), pick_node(graph, overriding)) {
                (Some(d), Some(o)) => graph.merge_nodes(d, o).map(|_| ()),
                _ => Ok(()),
            }
        }
    };
    match result {
        Ok(())
        | Err(CoreError::SelfLoop { .. })
        | Err(CoreError::MergeIntoSelf { .. })
        | Err(CoreError::NotBypassable { .. })
        | Err(CoreError::BisectEndpoint { .. }) => {}
        Err(other) => panic!("unexpected error from {:?}: {}", edit, other),
    }
}

proptest! {
    #[test]
    fn edits_preserve_bookkeeping(edits in prop::collection::vec(edit(), 1..60)) {
        let mut graph = CircuitGraph::new();
        for edit in &edits {
            apply(&mut graph, edit);
            prop_assert!(graph.validate().is_ok(), "{:?}", graph.validate());

            for node in graph.nodes() {
                prop_assert!(node.input_count() <= node.wires().len());
                for &w in node.inputs() {
                    prop_assert_eq!(graph.wire(w).unwrap().end(), node.id());
                }
                for &w in node.outputs() {
                    prop_assert_eq!(graph.wire(w).unwrap().start(), node.id());
                }
            }
        }
    }

    #[test]
    fn no_parallel_or_self_wires(edits in prop::collection::vec(edit(), 1..60)) {
        let mut graph = CircuitGraph::new();
        for edit in &edits {
            apply(&mut graph, edit);
        }
        let mut pairs: Vec<(NodeId, NodeId)> = graph
            .wires()
            .map(|w| (w.start().min(w.end()), w.start().max(w.end())))
            .collect();
        let total = pairs.len();
        pairs.sort();
        pairs.dedup();
        prop_assert_eq!(pairs.len(), total);
        prop_assert!(graph.wires().all(|w| w.start() != w.end()));
    }

    #[test]
    fn sort_orders_every_acyclic_wire(edits in prop::collection::vec(edit(), 1..80)) {
        let mut graph = CircuitGraph::new();
        for edit in &edits {
            apply(&mut graph, edit);
        }
        graph.sort();
        prop_assert!(!graph.is_order_dirty());
        prop_assert_eq!(graph.node_ids().len(), graph.node_count());

        let loops = graph.feedback_loops();
        for wire in graph.wires() {
            let shared = loops
                .iter()
                .any(|l| l.contains(&wire.start()) && l.contains(&wire.end()));
            if !shared {
                prop_assert!(graph.node_index(wire.start()) < graph.node_index(wire.end()));
            }
        }

        // Evaluation never panics and never re-dirties the order.
        graph.evaluate();
        prop_assert!(!graph.is_order_dirty());
    }
}
