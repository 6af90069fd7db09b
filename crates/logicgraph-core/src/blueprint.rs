//! Relocatable subgraph templates.
//!
//! A [`BlueprintTemplate`] is a snapshot of an induced subgraph with node
//! positions made relative to the selection's top-left corner and wires
//! addressed by index into the template's own node list. Templates are
//! built by reading a live graph and consumed by inserting fresh nodes and
//! wires into any graph, any number of times.
//!
//! # I/O nodes
//!
//! A template node is flagged `is_io` when it is input-only, output-only, or
//! has a wire leaving the sampled set. Those are the nodes a user would wire
//! to after placing the blueprint.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CoreError;
use crate::gate::{Gate, GateKind};
use crate::geometry::{ElbowConfig, Position, Rect};
use crate::graph::CircuitGraph;
use crate::id::NodeId;
use crate::render::{Color, NodeGlyph, Renderer};

/// One node of a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeTemplate {
    pub is_io: bool,
    pub gate: GateKind,
    pub param: u8,
    /// Offset from the template's top-left corner.
    pub relative_position: Position,
    pub name: Option<String>,
}

/// One wire of a template, addressed by node index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireTemplate {
    pub start_index: usize,
    pub end_index: usize,
    pub elbow_config: ElbowConfig,
}

/// A named, relocatable subgraph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlueprintTemplate {
    pub name: String,
    pub nodes: Vec<NodeTemplate>,
    pub wires: Vec<WireTemplate>,
}

impl BlueprintTemplate {
    /// Samples `nodes` (duplicates ignored) from `graph`.
    ///
    /// Node records and wire records come from two independent read-only
    /// passes that run in parallel.
    pub fn build_from_nodes(
        graph: &CircuitGraph,
        name: impl Into<String>,
        nodes: &[NodeId],
    ) -> Result<Self, CoreError> {
        let set: IndexSet<NodeId> = nodes.iter().copied().collect();
        for &id in &set {
            graph.node_ref(id)?;
        }

        let ((mut records, bounds), wires) = rayon::join(
            || sample_nodes(graph, &set),
            || sample_wires(graph, &set),
        );

        let origin = bounds.map(|b| b.min()).unwrap_or_default();
        for record in &mut records {
            record.relative_position = record.relative_position - origin;
        }

        let template = BlueprintTemplate {
            name: name.into(),
            nodes: records,
            wires,
        };
        debug!(
            name = %template.name,
            nodes = template.nodes.len(),
            wires = template.wires.len(),
            "built blueprint"
        );
        Ok(template)
    }

    /// Samples every node whose position lies inside `rect`.
    pub fn from_rect(graph: &CircuitGraph, name: impl Into<String>, rect: Rect) -> Result<Self, CoreError> {
        Self::build_from_nodes(graph, name, &graph.find_nodes_in_rect(rect))
    }

    /// Smallest rectangle around the template's node positions, anchored at
    /// the origin.
    pub fn bounds(&self) -> Rect {
        Rect::bounding(self.nodes.iter().map(|n| n.relative_position)).unwrap_or_default()
    }

    /// Checks every record so that instantiation cannot fail halfway.
    pub fn validate(&self) -> Result<(), CoreError> {
        self.gates().map(|_| ())?;
        let len = self.nodes.len();
        let mut seen = IndexSet::with_capacity(self.wires.len());
        for wire in &self.wires {
            for index in [wire.start_index, wire.end_index] {
                if index >= len {
                    return Err(CoreError::DanglingIndex { index, len });
                }
            }
            if wire.start_index == wire.end_index {
                return Err(CoreError::IndexSelfLoop {
                    index: wire.start_index,
                });
            }
            let pair = (
                wire.start_index.min(wire.end_index),
                wire.start_index.max(wire.end_index),
            );
            if !seen.insert(pair) {
                return Err(CoreError::ParallelWire {
                    start: wire.start_index,
                    end: wire.end_index,
                });
            }
        }
        Ok(())
    }

    fn gates(&self) -> Result<Vec<Gate>, CoreError> {
        self.nodes.iter().map(|n| Gate::new(n.gate, n.param)).collect()
    }

    /// Inserts a copy of the template with its top-left corner at `offset`.
    ///
    /// The whole template is validated before the graph is touched, so a
    /// corrupt template leaves `graph` unchanged. Returns the new nodes in
    /// template order.
    pub fn instantiate(&self, graph: &mut CircuitGraph, offset: Position) -> Result<Vec<NodeId>, CoreError> {
        self.validate()?;
        let gates = self.gates()?;

        let positions = self
            .nodes
            .iter()
            .map(|record| {
                record
                    .relative_position
                    .offset_within_bounds(offset)
                    .ok_or(CoreError::PositionOutOfRange {
                        x: offset.x,
                        y: offset.y,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut ids = Vec::with_capacity(self.nodes.len());
        for ((record, gate), position) in self.nodes.iter().zip(gates).zip(positions) {
            let id = graph.create_node(position, gate)?;
            graph.nodes[id].name = record.name.clone();
            ids.push(id);
        }

        for wire in &self.wires {
            graph.create_wire(ids[wire.start_index], ids[wire.end_index], wire.elbow_config)?;
        }
        Ok(ids)
    }

    /// Draws a ghost of the template at `offset` with its bounding box.
    pub fn draw_preview(&self, renderer: &mut dyn Renderer, offset: Position) {
        renderer.draw_selection(self.bounds().translated(offset));
        for wire in &self.wires {
            let (Some(start), Some(end)) = (self.nodes.get(wire.start_index), self.nodes.get(wire.end_index)) else {
                continue;
            };
            let start = start.relative_position + offset;
            let end = end.relative_position + offset;
            renderer.draw_wire(start, wire.elbow_config.elbow(start, end), end, Color::GRAY);
        }
        for node in &self.nodes {
            renderer.draw_node(&NodeGlyph {
                id: None,
                position: node.relative_position + offset,
                kind: node.gate,
                param: node.param,
                state: false,
                previous_state: false,
                name: node.name.as_deref(),
            });
        }
    }
}

/// Pass (a): node records with absolute positions, plus their bounds.
fn sample_nodes(graph: &CircuitGraph, set: &IndexSet<NodeId>) -> (Vec<NodeTemplate>, Option<Rect>) {
    let records: Vec<NodeTemplate> = set
        .iter()
        .map(|&id| {
            let node = &graph.nodes[id];
            let crosses = node.wires().iter().any(|&w| {
                graph.wires[w]
                    .other_end(id)
                    .is_some_and(|other| !set.contains(&other))
            });
            NodeTemplate {
                is_io: node.input_count() == 0 || node.output_count() == 0 || crosses,
                gate: node.kind(),
                param: node.gate().param(),
                relative_position: node.position(),
                name: node.name.clone(),
            }
        })
        .collect();
    let bounds = Rect::bounding(records.iter().map(|r| r.relative_position));
    (records, bounds)
}

/// Pass (b): wires with both ends inside the set, each enumerated once from
/// its start node.
fn sample_wires(graph: &CircuitGraph, set: &IndexSet<NodeId>) -> Vec<WireTemplate> {
    let mut wires = Vec::new();
    for (start_index, &id) in set.iter().enumerate() {
        for &w in graph.nodes[id].outputs() {
            let wire = &graph.wires[w];
            if let Some(end_index) = set.get_index_of(&wire.end) {
                wires.push(WireTemplate {
                    start_index,
                    end_index,
                    elbow_config: wire.elbow_config,
                });
            }
        }
    }
    wires
}

// ---------------------------------------------------------------------------
// Library
// ---------------------------------------------------------------------------

/// An ordered, name-keyed catalog of templates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlueprintLibrary {
    templates: Vec<BlueprintTemplate>,
}

impl BlueprintLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// A small catalog of everyday circuits: half adder and SR latch.
    pub fn builtin() -> Result<Self, CoreError> {
        let mut library = BlueprintLibrary::new();
        library.insert(half_adder()?);
        library.insert(sr_latch()?);
        Ok(library)
    }

    /// Adds a template, replacing any template with the same name.
    ///
    /// Returns the replaced template.
    pub fn insert(&mut self, template: BlueprintTemplate) -> Option<BlueprintTemplate> {
        match self.templates.iter_mut().find(|t| t.name == template.name) {
            Some(slot) => Some(std::mem::replace(slot, template)),
            None => {
                self.templates.push(template);
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&BlueprintTemplate> {
        self.templates.iter().find(|t| t.name == name)
    }

    pub fn remove(&mut self, name: &str) -> Option<BlueprintTemplate> {
        let index = self.templates.iter().position(|t| t.name == name)?;
        Some(self.templates.remove(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = &BlueprintTemplate> + '_ {
        self.templates.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.templates.iter().map(|t| t.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

fn named(graph: &mut CircuitGraph, pos: Position, gate: Gate, name: &str) -> Result<NodeId, CoreError> {
    let id = graph.create_node(pos, gate)?;
    graph.set_name(id, Some(name.to_owned()))?;
    Ok(id)
}

fn half_adder() -> Result<BlueprintTemplate, CoreError> {
    let mut graph = CircuitGraph::new();
    let a = named(&mut graph, Position::new(0, 0), Gate::Or, "a")?;
    let b = named(&mut graph, Position::new(0, 16), Gate::Or, "b")?;
    let sum = named(&mut graph, Position::new(24, 0), Gate::Xor, "sum")?;
    let carry = named(&mut graph, Position::new(24, 16), Gate::And, "carry")?;
    for (start, end) in [(a, sum), (b, sum), (a, carry), (b, carry)] {
        graph.connect(start, end)?;
    }
    BlueprintTemplate::build_from_nodes(&graph, "half adder", &[a, b, sum, carry])
}

fn sr_latch() -> Result<BlueprintTemplate, CoreError> {
    let mut graph = CircuitGraph::new();
    let set = named(&mut graph, Position::new(0, 0), Gate::Or, "s")?;
    let reset = named(&mut graph, Position::new(0, 24), Gate::Or, "r")?;
    let q = named(&mut graph, Position::new(24, 24), Gate::Nor, "q")?;
    let q_bar = named(&mut graph, Position::new(24, 0), Gate::Nor, "q_bar")?;
    let link = graph.create_node(Position::new(16, 8), Gate::Or)?;
    for (start, end) in [(reset, q), (q_bar, q), (set, q_bar), (q, link), (link, q_bar)] {
        graph.connect(start, end)?;
    }
    BlueprintTemplate::build_from_nodes(&graph, "sr latch", &[set, reset, q, q_bar, link])
}
