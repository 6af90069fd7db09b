//! CircuitGraph: the owner of every node and wire of one circuit.
//!
//! [`CircuitGraph`] is the single entry point for editing a circuit. All
//! structural edits (node/wire creation and destruction, bypass, merge,
//! reverse, bisect) go through its methods so that three pieces of
//! bookkeeping never drift apart:
//!
//! - every node's incident wire list stays partitioned into inputs then
//!   outputs, with `input_count` marking the boundary;
//! - `start_nodes` holds exactly the nodes with zero inputs;
//! - `order_dirty` is raised by every structural edit and cleared only by
//!   [`sort`](CircuitGraph::sort).
//!
//! # Wire uniqueness
//!
//! At most one wire joins any pair of nodes. Creating a wire that already
//! exists returns the existing handle; creating one whose reverse exists
//! reverses that wire instead of adding a parallel one. This keeps the
//! interactive editor forgiving; a batch caller that wants a hard error can
//! check [`wire_between`](CircuitGraph::wire_between) first.

use indexmap::IndexSet;
use slotmap::SlotMap;
use tracing::debug;

use crate::error::CoreError;
use crate::gate::Gate;
use crate::geometry::{ElbowConfig, Position, Rect, ELBOW_PICK_RADIUS, NODE_RADIUS, WIRE_PICK_RADIUS};
use crate::group::Group;
use crate::id::{NodeId, WireId};
use crate::node::Node;
use crate::wire::Wire;

/// Everything needed to allocate one node during bulk reconstruction.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSeed {
    pub position: Position,
    pub gate: Gate,
    pub name: Option<String>,
}

/// A wire record addressed by node-list index, used for bulk reconstruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireSeed {
    pub start: usize,
    pub end: usize,
    pub elbow_config: ElbowConfig,
}

/// A circuit: nodes, wires, annotation groups and the cached evaluation order.
#[derive(Debug, Clone, Default)]
pub struct CircuitGraph {
    pub(crate) nodes: SlotMap<NodeId, Node>,
    pub(crate) wires: SlotMap<WireId, Wire>,
    /// Every live node; in evaluation order whenever `order_dirty` is false.
    pub(crate) order: Vec<NodeId>,
    /// Nodes with zero inputs, in the order they became sources.
    pub(crate) start_nodes: IndexSet<NodeId>,
    pub(crate) groups: Vec<Group>,
    pub(crate) order_dirty: bool,
}

impl CircuitGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a graph from bulk records.
    ///
    /// All nodes are allocated first in list order, then every wire is
    /// attached to its endpoints' output and input partitions in record
    /// order. Used by loaders, which must either produce a complete graph or
    /// nothing: any bad record rejects the whole batch.
    pub fn from_parts(
        nodes: Vec<NodeSeed>,
        wires: &[WireSeed],
        groups: Vec<Group>,
    ) -> Result<Self, CoreError> {
        let mut graph = CircuitGraph::new();
        let len = nodes.len();

        for seed in nodes {
            seed.gate.validate()?;
            check_position(seed.position)?;
            let id = graph
                .nodes
                .insert_with_key(|id| Node::new(id, seed.position, seed.gate));
            graph.nodes[id].name = seed.name;
            graph.order.push(id);
        }

        for seed in wires {
            for index in [seed.start, seed.end] {
                if index >= len {
                    return Err(CoreError::DanglingIndex { index, len });
                }
            }
            if seed.start == seed.end {
                return Err(CoreError::IndexSelfLoop { index: seed.start });
            }
            let start = graph.order[seed.start];
            let end = graph.order[seed.end];
            if graph.wire_between(start, end).is_some() || graph.wire_between(end, start).is_some() {
                return Err(CoreError::ParallelWire {
                    start: seed.start,
                    end: seed.end,
                });
            }
            graph.attach_wire(start, end, seed.elbow_config);
        }

        graph.start_nodes = graph
            .order
            .iter()
            .copied()
            .filter(|&id| graph.nodes[id].is_source())
            .collect();
        for group in &groups {
            if !group.rect.in_bounds() {
                return Err(CoreError::PositionOutOfRange {
                    x: group.rect.x,
                    y: group.rect.y,
                });
            }
        }
        graph.groups = groups;
        graph.order_dirty = true;

        #[cfg(debug_assertions)]
        graph.assert_consistency();

        Ok(graph)
    }

    // -----------------------------------------------------------------------
    // Read-only accessors
    // -----------------------------------------------------------------------

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn wire(&self, id: WireId) -> Option<&Wire> {
        self.wires.get(id)
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn contains_wire(&self, id: WireId) -> bool {
        self.wires.contains_key(id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn wire_count(&self) -> usize {
        self.wires.len()
    }

    /// Node handles in node-list order (evaluation order once sorted).
    pub fn node_ids(&self) -> &[NodeId] {
        &self.order
    }

    /// Nodes in node-list order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.order.iter().map(move |&id| &self.nodes[id])
    }

    /// Wires in arena order.
    pub fn wires(&self) -> impl Iterator<Item = &Wire> + '_ {
        self.wires.values()
    }

    /// Nodes with zero inputs: the roots of evaluation ordering.
    pub fn start_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.start_nodes.iter().copied()
    }

    /// Returns `true` if the node list must be re-sorted before evaluation.
    pub fn is_order_dirty(&self) -> bool {
        self.order_dirty
    }

    /// Position of `id` in the node list. Not stable across edits.
    pub fn node_index(&self, id: NodeId) -> Option<usize> {
        self.order.iter().position(|&n| n == id)
    }

    /// Signal carried by a wire: its start node's output.
    pub fn wire_state(&self, id: WireId) -> Option<bool> {
        let wire = self.wires.get(id)?;
        self.nodes.get(wire.start).map(Node::state)
    }

    /// The wire from `start` to `end`, if one exists in that direction.
    pub fn wire_between(&self, start: NodeId, end: NodeId) -> Option<WireId> {
        let node = self.nodes.get(start)?;
        node.outputs()
            .iter()
            .copied()
            .find(|&w| self.wires[w].end == end)
    }

    /// First node with a label equal to `name`, in node-list order.
    pub fn find_node_by_name(&self, name: &str) -> Option<NodeId> {
        self.nodes().find(|n| n.name() == Some(name)).map(Node::id)
    }

    pub(crate) fn node_ref(&self, id: NodeId) -> Result<&Node, CoreError> {
        self.nodes.get(id).ok_or(CoreError::NodeNotFound { id })
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, CoreError> {
        self.nodes.get_mut(id).ok_or(CoreError::NodeNotFound { id })
    }

    fn wire_ref(&self, id: WireId) -> Result<&Wire, CoreError> {
        self.wires.get(id).ok_or(CoreError::WireNotFound { id })
    }

    // -----------------------------------------------------------------------
    // Node creation and destruction
    // -----------------------------------------------------------------------

    /// Allocates an unconnected node.
    ///
    /// The node is prepended to the node list so already-sorted nodes keep
    /// their relative order, and it joins the start-node set because it has
    /// no inputs yet. Fails if the gate's parameters or the position are
    /// out of range.
    pub fn create_node(&mut self, position: Position, gate: Gate) -> Result<NodeId, CoreError> {
        gate.validate()?;
        check_position(position)?;
        let id = self
            .nodes
            .insert_with_key(|id| Node::new(id, position, gate));
        self.order.insert(0, id);
        self.start_nodes.insert(id);
        self.order_dirty = true;
        Ok(id)
    }

    /// Severs every wire of `id`, then removes the node.
    pub fn destroy_node(&mut self, id: NodeId) -> Result<Node, CoreError> {
        let wires = self.node_ref(id)?.wires.to_vec();
        for wire in wires {
            self.destroy_wire(wire)?;
        }
        let node = self.nodes.remove(id).ok_or(CoreError::NodeNotFound { id })?;
        self.order.retain(|&n| n != id);
        self.start_nodes.shift_remove(&id);
        self.order_dirty = true;

        #[cfg(debug_assertions)]
        self.assert_consistency();

        Ok(node)
    }

    // -----------------------------------------------------------------------
    // Wire creation and destruction
    // -----------------------------------------------------------------------

    /// Connects `start` to `end` with the default elbow.
    pub fn connect(&mut self, start: NodeId, end: NodeId) -> Result<WireId, CoreError> {
        self.create_wire(start, end, ElbowConfig::default())
    }

    /// Creates a wire from `start` to `end`.
    ///
    /// Returns the existing wire if the pair is already connected in this
    /// direction; reverses the existing wire if it runs the other way.
    pub fn create_wire(
        &mut self,
        start: NodeId,
        end: NodeId,
        elbow_config: ElbowConfig,
    ) -> Result<WireId, CoreError> {
        if start == end {
            return Err(CoreError::SelfLoop { node: start });
        }
        self.node_ref(start)?;
        self.node_ref(end)?;

        if let Some(existing) = self.wire_between(start, end) {
            return Ok(existing);
        }
        if let Some(reverse) = self.wire_between(end, start) {
            debug!(%reverse, "wire requested against an existing one; reversing it");
            return self.reverse_wire(reverse);
        }

        let id = self.attach_wire(start, end, elbow_config);

        #[cfg(debug_assertions)]
        self.assert_consistency();

        Ok(id)
    }

    /// Allocates a wire and threads it into both endpoints' partitions.
    ///
    /// Callers have already checked both nodes exist, differ, and are not
    /// yet connected.
    fn attach_wire(&mut self, start: NodeId, end: NodeId, elbow_config: ElbowConfig) -> WireId {
        let elbow = elbow_config.elbow(self.nodes[start].position, self.nodes[end].position);
        let id = self.wires.insert_with_key(|id| Wire {
            id,
            start,
            end,
            elbow_config,
            elbow,
        });
        self.nodes[start].add_wire_output(id);
        self.nodes[end].add_wire_input(id);
        self.start_nodes.shift_remove(&end);
        self.order_dirty = true;
        id
    }

    /// Removes a wire from both endpoints and from the graph.
    ///
    /// A destination left without inputs becomes a start node again.
    pub fn destroy_wire(&mut self, id: WireId) -> Result<Wire, CoreError> {
        let wire = self.wires.remove(id).ok_or(CoreError::WireNotFound { id })?;
        if let Some(start) = self.nodes.get_mut(wire.start) {
            start.remove_wire(id);
        }
        if let Some(end) = self.nodes.get_mut(wire.end) {
            end.remove_wire(id);
            if end.is_source() {
                self.start_nodes.insert(wire.end);
            }
        }
        self.order_dirty = true;
        Ok(wire)
    }

    /// Replaces a wire with one running the other way.
    ///
    /// The elbow stays where it was, snapped to the nearest configuration
    /// that is legal for the swapped endpoints. The old handle is dead
    /// afterwards; use the returned one.
    pub fn reverse_wire(&mut self, id: WireId) -> Result<WireId, CoreError> {
        let wire = self.destroy_wire(id)?;
        let config = ElbowConfig::snap(
            self.nodes[wire.end].position,
            self.nodes[wire.start].position,
            wire.elbow,
        );
        let reversed = self.attach_wire(wire.end, wire.start, config);

        #[cfg(debug_assertions)]
        self.assert_consistency();

        Ok(reversed)
    }

    /// Splits a wire around `node`: `start -> node -> end`.
    ///
    /// Both halves inherit the original elbow configuration; their elbow
    /// points are recomputed for the new geometry.
    pub fn bisect_wire(&mut self, id: WireId, node: NodeId) -> Result<(WireId, WireId), CoreError> {
        let wire = self.wire_ref(id)?.clone();
        self.node_ref(node)?;
        if node == wire.start || node == wire.end {
            return Err(CoreError::BisectEndpoint { wire: id, node });
        }

        self.destroy_wire(id)?;
        let first = self.create_wire(wire.start, node, wire.elbow_config)?;
        let second = self.create_wire(node, wire.end, wire.elbow_config)?;
        Ok((first, second))
    }

    // -----------------------------------------------------------------------
    // Bypass and merge
    // -----------------------------------------------------------------------

    /// Removes a node with one input (or one output), wiring its sole
    /// counterpart straight to every neighbor on the other side.
    ///
    /// The new wires keep the elbow configuration of the wire they replace
    /// on the fan-out side.
    pub fn bypass_node(&mut self, id: NodeId) -> Result<(), CoreError> {
        let node = self.node_ref(id)?;
        if !node.is_simple_bypassable() {
            return Err(CoreError::NotBypassable {
                node: id,
                shape: "simple",
                inputs: node.input_count(),
                outputs: node.output_count(),
            });
        }

        let links: Vec<(NodeId, NodeId, ElbowConfig)> = if node.input_count() == 1 {
            let source = self.wires[node.inputs()[0]].start;
            node.outputs()
                .iter()
                .map(|&w| (source, self.wires[w].end, self.wires[w].elbow_config))
                .collect()
        } else {
            let sink = self.wires[node.outputs()[0]].end;
            node.inputs()
                .iter()
                .map(|&w| (self.wires[w].start, sink, self.wires[w].elbow_config))
                .collect()
        };

        self.destroy_node(id)?;
        self.relink(links)
    }

    /// Removes a node with several inputs and several outputs, connecting
    /// every input source to every output destination.
    pub fn bypass_node_complex(&mut self, id: NodeId) -> Result<(), CoreError> {
        let node = self.node_ref(id)?;
        if !node.is_complex_bypassable() {
            return Err(CoreError::NotBypassable {
                node: id,
                shape: "complex",
                inputs: node.input_count(),
                outputs: node.output_count(),
            });
        }

        let mut links = Vec::with_capacity(node.input_count() * node.output_count());
        for &input in node.inputs() {
            let source = self.wires[input].start;
            for &output in node.outputs() {
                let out = &self.wires[output];
                links.push((source, out.end, out.elbow_config));
            }
        }

        self.destroy_node(id)?;
        self.relink(links)
    }

    /// Creates each link, skipping ones that would loop a node onto itself.
    fn relink(&mut self, links: Vec<(NodeId, NodeId, ElbowConfig)>) -> Result<(), CoreError> {
        for (start, end, config) in links {
            if start != end {
                self.create_wire(start, end, config)?;
            }
        }
        Ok(())
    }

    /// Fuses two nodes into a fresh one.
    ///
    /// The new node sits at `deprecating`'s position, takes `overriding`'s
    /// gate (with dynamic state cleared) and name (falling back to
    /// `deprecating`'s), and inherits every wire of both except a wire
    /// running directly between them, which is dropped.
    pub fn merge_nodes(&mut self, deprecating: NodeId, overriding: NodeId) -> Result<NodeId, CoreError> {
        if deprecating == overriding {
            return Err(CoreError::MergeIntoSelf { node: deprecating });
        }
        let dep = self.node_ref(deprecating)?;
        let over = self.node_ref(overriding)?;

        let position = dep.position;
        let gate = over.gate.reset();
        let name = over.name.clone().or_else(|| dep.name.clone());

        let pair = [deprecating, overriding];
        let mut sources = Vec::new();
        let mut sinks = Vec::new();
        for node in [dep, over] {
            for &w in node.inputs() {
                let wire = &self.wires[w];
                if !pair.contains(&wire.start) {
                    sources.push((wire.start, wire.elbow_config));
                }
            }
            for &w in node.outputs() {
                let wire = &self.wires[w];
                if !pair.contains(&wire.end) {
                    sinks.push((wire.end, wire.elbow_config));
                }
            }
        }

        let merged = self.create_node(position, gate)?;
        self.nodes[merged].name = name;
        for (source, config) in sources {
            self.create_wire(source, merged, config)?;
        }
        for (sink, config) in sinks {
            self.create_wire(merged, sink, config)?;
        }
        self.destroy_node(deprecating)?;
        self.destroy_node(overriding)?;
        Ok(merged)
    }

    // -----------------------------------------------------------------------
    // Attribute edits
    // -----------------------------------------------------------------------

    /// Replaces the gate of a node.
    pub fn set_gate(&mut self, id: NodeId, gate: Gate) -> Result<(), CoreError> {
        gate.validate()?;
        let node = self.node_mut(id)?;
        let kind_changed = node.gate.kind() != gate.kind();
        node.gate = gate;
        if kind_changed {
            self.order_dirty = true;
        }
        Ok(())
    }

    /// Flips a source node between OR (always low) and NOR (always high),
    /// turning it into a manual input switch.
    pub fn toggle_switch(&mut self, id: NodeId) -> Result<(), CoreError> {
        let node = self.node_mut(id)?;
        if !node.is_source() {
            return Err(CoreError::NotASwitch { node: id });
        }
        node.gate = match node.gate {
            Gate::Or => Gate::Nor,
            Gate::Nor => Gate::Or,
            _ => return Err(CoreError::NotASwitch { node: id }),
        };
        Ok(())
    }

    pub fn set_name(&mut self, id: NodeId, name: Option<String>) -> Result<(), CoreError> {
        self.node_mut(id)?.name = name;
        Ok(())
    }

    /// Moves a node to the grid point nearest `position` and recomputes the
    /// elbows of all its wires.
    pub fn move_node(&mut self, id: NodeId, position: Position) -> Result<(), CoreError> {
        check_position(position)?;
        let node = self.node_mut(id)?;
        node.position = position.snapped();
        let wires = node.wires.clone();
        for w in wires {
            self.refresh_elbow(w);
        }
        Ok(())
    }

    /// Changes how a wire bends.
    pub fn set_elbow_config(&mut self, id: WireId, config: ElbowConfig) -> Result<(), CoreError> {
        self.wires
            .get_mut(id)
            .ok_or(CoreError::WireNotFound { id })?
            .elbow_config = config;
        self.refresh_elbow(id);
        Ok(())
    }

    fn refresh_elbow(&mut self, id: WireId) {
        let wire = &self.wires[id];
        let start = self.nodes[wire.start].position;
        let end = self.nodes[wire.end].position;
        self.wires[id].update_elbow(start, end);
    }

    // -----------------------------------------------------------------------
    // Hit-testing queries
    // -----------------------------------------------------------------------

    /// First node (in node-list order) whose body covers `pos`.
    pub fn find_node_at_position(&self, pos: Position) -> Option<NodeId> {
        self.nodes()
            .find(|n| n.position.is_within(pos, NODE_RADIUS))
            .map(Node::id)
    }

    /// A wire passing within pick distance of `pos`.
    pub fn find_wire_at_position(&self, pos: Position) -> Option<WireId> {
        self.wires
            .values()
            .find(|w| {
                let start = self.nodes[w.start].position;
                let end = self.nodes[w.end].position;
                w.distance_to(pos, start, end) <= WIRE_PICK_RADIUS
            })
            .map(Wire::id)
    }

    /// A wire whose elbow lies within pick distance of `pos`.
    pub fn find_wire_elbow_at_position(&self, pos: Position) -> Option<WireId> {
        self.wires
            .values()
            .find(|w| w.elbow.is_within(pos, ELBOW_PICK_RADIUS))
            .map(Wire::id)
    }

    /// Every node whose position lies inside `rect`, in node-list order.
    pub fn find_nodes_in_rect(&self, rect: Rect) -> Vec<NodeId> {
        self.nodes()
            .filter(|n| rect.contains(n.position))
            .map(Node::id)
            .collect()
    }

    // -----------------------------------------------------------------------
    // Consistency checks
    // -----------------------------------------------------------------------

    /// Verifies partitioning, wire ownership and start-node bookkeeping.
    pub fn validate(&self) -> Result<(), CoreError> {
        let fail = |reason: String| -> Result<(), CoreError> {
            Err(CoreError::GraphInconsistency { reason })
        };

        if self.order.len() != self.nodes.len() {
            return fail(format!(
                "node list has {} entries for {} nodes",
                self.order.len(),
                self.nodes.len()
            ));
        }

        let mut references = 0usize;
        for (id, node) in &self.nodes {
            if node.input_count > node.wires.len() {
                return fail(format!("{} input count exceeds its wire list", id));
            }
            for &w in node.inputs() {
                match self.wires.get(w) {
                    Some(wire) if wire.end == id => {}
                    _ => return fail(format!("{} input {} does not end at it", id, w)),
                }
            }
            for &w in node.outputs() {
                match self.wires.get(w) {
                    Some(wire) if wire.start == id => {}
                    _ => return fail(format!("{} output {} does not start at it", id, w)),
                }
            }
            if node.is_source() != self.start_nodes.contains(&id) {
                return fail(format!("{} start-node membership is stale", id));
            }
            references += node.wires.len();
        }

        // Each wire is referenced once by its start and once by its end.
        if references != 2 * self.wires.len() {
            return fail(format!(
                "{} wire references for {} wires",
                references,
                self.wires.len()
            ));
        }
        for (id, wire) in &self.wires {
            if wire.start == wire.end {
                return fail(format!("{} loops onto itself", id));
            }
            let listed_out = self.nodes.get(wire.start).map(|n| n.outputs().contains(&id));
            let listed_in = self.nodes.get(wire.end).map(|n| n.inputs().contains(&id));
            if listed_out != Some(true) || listed_in != Some(true) {
                return fail(format!("{} is missing from an endpoint", id));
            }
        }
        Ok(())
    }

    #[cfg(debug_assertions)]
    fn assert_consistency(&self) {
        if let Err(err) = self.validate() {
            panic!("{}", err);
        }
    }
}

fn check_position(position: Position) -> Result<(), CoreError> {
    if position.in_bounds() {
        Ok(())
    } else {
        Err(CoreError::PositionOutOfRange {
            x: position.x,
            y: position.y,
        })
    }
}
