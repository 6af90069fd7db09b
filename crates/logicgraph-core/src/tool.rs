//! Editing tools: the pointer-driven state machine an editor runs on top of
//! a [`CircuitGraph`].
//!
//! Exactly one [`Tool`] is active at a time. The host forwards every pointer
//! event to [`Tool::on_update`] and calls [`Tool::on_draw`] after drawing the
//! circuit so the tool can overlay its in-progress state (a rubber-band wire,
//! a selection rectangle).

use tracing::debug;

use crate::blueprint::BlueprintTemplate;
use crate::error::CoreError;
use crate::gate::{Gate, GateKind};
use crate::geometry::{ElbowConfig, Position, Rect};
use crate::graph::CircuitGraph;
use crate::id::NodeId;
use crate::render::{Color, Renderer};

/// What the pointer did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerAction {
    Press,
    Move,
    Release,
}

/// A pointer event in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointerEvent {
    pub position: Position,
    pub action: PointerAction,
}

impl PointerEvent {
    pub fn press(position: Position) -> Self {
        PointerEvent { position, action: PointerAction::Press }
    }

    pub fn moved(position: Position) -> Self {
        PointerEvent { position, action: PointerAction::Move }
    }

    pub fn release(position: Position) -> Self {
        PointerEvent { position, action: PointerAction::Release }
    }
}

/// Places nodes and draws wires.
#[derive(Debug, Clone, PartialEq)]
pub struct PenTool {
    pub gate: Gate,
    pub elbow_config: ElbowConfig,
    wire_from: Option<NodeId>,
    cursor: Position,
}

/// Moves nodes, selects regions, copies and pastes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditTool {
    selection: Vec<NodeId>,
    drag: Option<Drag>,
    clipboard: Option<BlueprintTemplate>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Drag {
    /// Moving nodes; holds the last grid point the pointer was at.
    Nodes { grabbed: NodeId, last: Position },
    /// Rubber-band selection from `anchor` to `cursor`.
    Select { anchor: Position, cursor: Position },
}

/// The active editing tool.
#[derive(Debug, Clone, PartialEq)]
pub enum Tool {
    Pen(PenTool),
    Edit(EditTool),
    Erase,
    Interact,
}

impl Default for Tool {
    fn default() -> Self {
        Tool::pen(Gate::Or)
    }
}

impl Tool {
    pub fn pen(gate: Gate) -> Self {
        Tool::Pen(PenTool {
            gate,
            elbow_config: ElbowConfig::default(),
            wire_from: None,
            cursor: Position::default(),
        })
    }

    pub fn edit() -> Self {
        Tool::Edit(EditTool::default())
    }

    pub fn name(&self) -> &'static str {
        match self {
            Tool::Pen(_) => "pen",
            Tool::Edit(_) => "edit",
            Tool::Erase => "erase",
            Tool::Interact => "interact",
        }
    }

    /// Applies one pointer event to `graph`.
    pub fn on_update(&mut self, graph: &mut CircuitGraph, event: PointerEvent) -> Result<(), CoreError> {
        match self {
            Tool::Pen(pen) => pen.on_update(graph, event),
            Tool::Edit(edit) => edit.on_update(graph, event),
            Tool::Erase => erase(graph, event),
            Tool::Interact => interact(graph, event),
        }
    }

    /// Overlays in-progress tool state.
    pub fn on_draw(&self, graph: &CircuitGraph, renderer: &mut dyn Renderer) {
        match self {
            Tool::Pen(pen) => pen.on_draw(graph, renderer),
            Tool::Edit(edit) => edit.on_draw(graph, renderer),
            Tool::Erase | Tool::Interact => {}
        }
    }
}

impl PenTool {
    /// The node a wire is being drawn from, if any.
    pub fn wire_from(&self) -> Option<NodeId> {
        self.wire_from
    }

    fn on_update(&mut self, graph: &mut CircuitGraph, event: PointerEvent) -> Result<(), CoreError> {
        self.cursor = event.position;
        match event.action {
            PointerAction::Press => {
                let node = match graph.find_node_at_position(event.position) {
                    Some(node) => node,
                    None => self.place(graph, event.position)?,
                };
                self.wire_from = Some(node);
            }
            PointerAction::Move => {}
            PointerAction::Release => {
                let Some(start) = self.wire_from.take() else {
                    return Ok(());
                };
                if !graph.contains_node(start) {
                    return Ok(());
                }
                let end = match graph.find_node_at_position(event.position) {
                    Some(end) => end,
                    None => graph.create_node(event.position.snapped(), self.gate)?,
                };
                if end != start {
                    graph.create_wire(start, end, self.elbow_config)?;
                }
            }
        }
        Ok(())
    }

    /// Creates a node at `pos`, splicing it into a wire lying under it.
    fn place(&self, graph: &mut CircuitGraph, pos: Position) -> Result<NodeId, CoreError> {
        let under = graph.find_wire_at_position(pos);
        let node = graph.create_node(pos.snapped(), self.gate)?;
        if let Some(wire) = under {
            debug!(%wire, %node, "splicing new node into wire");
            graph.bisect_wire(wire, node)?;
        }
        Ok(node)
    }

    fn on_draw(&self, graph: &CircuitGraph, renderer: &mut dyn Renderer) {
        if let Some(start) = self.wire_from.and_then(|id| graph.node(id)) {
            let start = start.position();
            let end = self.cursor;
            renderer.draw_wire(start, self.elbow_config.elbow(start, end), end, Color::YELLOW);
        }
    }
}

impl EditTool {
    /// Currently selected nodes, in node-list order at selection time.
    pub fn selection(&self) -> &[NodeId] {
        &self.selection
    }

    pub fn clipboard(&self) -> Option<&BlueprintTemplate> {
        self.clipboard.as_ref()
    }

    fn on_update(&mut self, graph: &mut CircuitGraph, event: PointerEvent) -> Result<(), CoreError> {
        let pos = event.position;
        match (event.action, self.drag) {
            (PointerAction::Press, _) => {
                self.drag = Some(match graph.find_node_at_position(pos) {
                    Some(grabbed) => Drag::Nodes {
                        grabbed,
                        last: pos.snapped(),
                    },
                    None => {
                        self.selection.clear();
                        Drag::Select { anchor: pos, cursor: pos }
                    }
                });
            }
            (PointerAction::Move, Some(Drag::Nodes { grabbed, last })) => {
                let here = pos.snapped();
                if !here.in_bounds() {
                    return Ok(());
                }
                let delta = here - last;
                if delta != Position::default() {
                    let moving = if self.selection.contains(&grabbed) {
                        self.selection.clone()
                    } else {
                        vec![grabbed]
                    };
                    for id in moving {
                        if let Some(node) = graph.node(id) {
                            let to = node.position() + delta;
                            graph.move_node(id, to)?;
                        }
                    }
                    self.drag = Some(Drag::Nodes { grabbed, last: here });
                }
            }
            (PointerAction::Move, Some(Drag::Select { anchor, .. })) => {
                self.drag = Some(Drag::Select { anchor, cursor: pos });
            }
            (PointerAction::Release, Some(Drag::Select { anchor, .. })) => {
                self.selection = graph.find_nodes_in_rect(Rect::from_corners(anchor, pos));
                self.drag = None;
            }
            (PointerAction::Release, _) => self.drag = None,
            (PointerAction::Move, None) => {}
        }
        Ok(())
    }

    /// Captures the selection as a blueprint on the clipboard.
    pub fn copy_selection(&mut self, graph: &CircuitGraph) -> Result<Option<&BlueprintTemplate>, CoreError> {
        self.selection.retain(|&id| graph.contains_node(id));
        if self.selection.is_empty() {
            return Ok(None);
        }
        let template = BlueprintTemplate::build_from_nodes(graph, "clipboard", &self.selection)?;
        let template = &*self.clipboard.insert(template);
        Ok(Some(template))
    }

    /// Places the clipboard with its top-left corner at `at` and selects the
    /// copy. Does nothing with an empty clipboard.
    pub fn paste(&mut self, graph: &mut CircuitGraph, at: Position) -> Result<Vec<NodeId>, CoreError> {
        let Some(template) = &self.clipboard else {
            return Ok(Vec::new());
        };
        let placed = template.instantiate(graph, at.snapped())?;
        self.selection = placed.clone();
        Ok(placed)
    }

    /// Destroys every selected node.
    pub fn delete_selection(&mut self, graph: &mut CircuitGraph) -> Result<(), CoreError> {
        for id in self.selection.drain(..) {
            if graph.contains_node(id) {
                graph.destroy_node(id)?;
            }
        }
        Ok(())
    }

    fn on_draw(&self, graph: &CircuitGraph, renderer: &mut dyn Renderer) {
        if let Some(Drag::Select { anchor, cursor }) = self.drag {
            renderer.draw_selection(Rect::from_corners(anchor, cursor));
        }
        let selected = self
            .selection
            .iter()
            .filter_map(|&id| graph.node(id))
            .map(|n| n.position());
        if let Some(rect) = Rect::bounding(selected) {
            renderer.draw_selection(rect);
        }
    }
}

fn erase(graph: &mut CircuitGraph, event: PointerEvent) -> Result<(), CoreError> {
    if event.action != PointerAction::Press {
        return Ok(());
    }
    if let Some(node) = graph.find_node_at_position(event.position) {
        graph.destroy_node(node)?;
    } else if let Some(wire) = graph.find_wire_at_position(event.position) {
        graph.destroy_wire(wire)?;
    }
    Ok(())
}

fn interact(graph: &mut CircuitGraph, event: PointerEvent) -> Result<(), CoreError> {
    if event.action != PointerAction::Press {
        return Ok(());
    }
    let Some(id) = graph.find_node_at_position(event.position) else {
        return Ok(());
    };
    let switchable = graph
        .node(id)
        .is_some_and(|n| n.is_source() && matches!(n.kind(), GateKind::Or | GateKind::Nor));
    if switchable {
        graph.toggle_switch(id)?;
    }
    Ok(())
}
