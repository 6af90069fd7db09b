//! Drawing interface between the circuit and whatever displays it.
//!
//! The core never draws anything itself. It walks its nodes and wires and
//! hands each one to a [`Renderer`] with the geometry and state already
//! resolved, so a backend only has to turn primitives into pixels (or SVG
//! elements, or test assertions).

use serde::{Deserialize, Serialize};

use crate::gate::{GateKind, LED_COLOR_COUNT};
use crate::geometry::{Position, Rect};
use crate::graph::CircuitGraph;
use crate::group::Group;
use crate::id::NodeId;

/// An 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const GRAY: Color = Color::rgb(128, 128, 128);
    pub const DARK_GRAY: Color = Color::rgb(64, 64, 64);
    pub const RED: Color = Color::rgb(230, 41, 55);
    pub const GREEN: Color = Color::rgb(0, 228, 48);
    pub const BLUE: Color = Color::rgb(0, 121, 241);
    pub const YELLOW: Color = Color::rgb(253, 249, 0);

    /// Resistor color-code bands, indexed by an LED's color parameter.
    pub const LED_BANDS: [Color; LED_COLOR_COUNT as usize] = [
        Color::rgb(0, 0, 0),
        Color::rgb(127, 80, 40),
        Color::rgb(230, 41, 55),
        Color::rgb(255, 161, 0),
        Color::rgb(253, 249, 0),
        Color::rgb(0, 228, 48),
        Color::rgb(0, 121, 241),
        Color::rgb(200, 122, 255),
        Color::rgb(128, 128, 128),
        Color::rgb(255, 255, 255),
    ];

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Color { r, g, b, a }
    }

    pub const fn with_alpha(self, a: u8) -> Self {
        Color { a, ..self }
    }

    /// Band color for an LED parameter, wrapping out-of-range values.
    pub fn led(index: u8) -> Self {
        Self::LED_BANDS[index as usize % Self::LED_BANDS.len()]
    }

    /// `#rrggbb`, ignoring alpha.
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::GRAY
    }
}

/// Everything a backend needs to draw one node.
///
/// `id` is `None` for nodes that are not live in a graph, such as blueprint
/// previews.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeGlyph<'a> {
    pub id: Option<NodeId>,
    pub position: Position,
    pub kind: GateKind,
    pub param: u8,
    pub state: bool,
    pub previous_state: bool,
    pub name: Option<&'a str>,
}

/// A drawing backend.
pub trait Renderer {
    /// Draws a two-segment wire `start -> elbow -> end`.
    fn draw_wire(&mut self, start: Position, elbow: Position, end: Position, color: Color);

    fn draw_node(&mut self, glyph: &NodeGlyph<'_>);

    /// Outlines a selection or preview rectangle.
    fn draw_selection(&mut self, _rect: Rect) {}

    fn draw_group(&mut self, _group: &Group) {}
}

impl CircuitGraph {
    /// Draws every wire, colored by the state of its start node.
    pub fn draw_wires(&self, renderer: &mut dyn Renderer, active: Color, inactive: Color) {
        for wire in self.wires.values() {
            let start = &self.nodes[wire.start];
            let end = &self.nodes[wire.end];
            let color = if start.state { active } else { inactive };
            renderer.draw_wire(start.position, wire.elbow, end.position, color);
        }
    }

    /// Draws every node in node-list order.
    pub fn draw_nodes(&self, renderer: &mut dyn Renderer) {
        for node in self.nodes() {
            renderer.draw_node(&NodeGlyph {
                id: Some(node.id),
                position: node.position,
                kind: node.kind(),
                param: node.gate.param(),
                state: node.state,
                previous_state: node.previous_state,
                name: node.name(),
            });
        }
    }

    pub fn draw_groups(&self, renderer: &mut dyn Renderer) {
        for group in &self.groups {
            renderer.draw_group(group);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::Gate;

    #[derive(Default)]
    struct Recorder {
        wires: Vec<(Position, Position, Position, Color)>,
        nodes: Vec<(Option<NodeId>, GateKind, bool, Option<String>)>,
        groups: usize,
    }

    impl Renderer for Recorder {
        fn draw_wire(&mut self, start: Position, elbow: Position, end: Position, color: Color) {
            self.wires.push((start, elbow, end, color));
        }

        fn draw_node(&mut self, glyph: &NodeGlyph<'_>) {
            self.nodes
                .push((glyph.id, glyph.kind, glyph.state, glyph.name.map(str::to_owned)));
        }

        fn draw_group(&mut self, _group: &Group) {
            self.groups += 1;
        }
    }

    #[test]
    fn wires_take_their_start_state() {
        let mut graph = CircuitGraph::new();
        let on = graph.create_node(Position::new(0, 0), Gate::Battery).unwrap();
        let off = graph.create_node(Position::new(0, 16), Gate::Or).unwrap();
        let sink = graph.create_node(Position::new(16, 8), Gate::Or).unwrap();
        graph.connect(on, sink).unwrap();
        graph.connect(off, sink).unwrap();
        graph.evaluate();

        let mut recorder = Recorder::default();
        graph.draw_wires(&mut recorder, Color::RED, Color::DARK_GRAY);
        let mut colors: Vec<_> = recorder.wires.iter().map(|w| (w.0, w.3)).collect();
        colors.sort_by_key(|(p, _)| p.y);
        assert_eq!(
            colors,
            vec![
                (Position::new(0, 0), Color::RED),
                (Position::new(0, 16), Color::DARK_GRAY)
            ]
        );
        assert_eq!(recorder.wires[0].1, Position::new(16, recorder.wires[0].0.y));
    }

    #[test]
    fn nodes_and_groups_are_visited() {
        let mut graph = CircuitGraph::new();
        let a = graph.create_node(Position::new(0, 0), Gate::Led { color: 2 }).unwrap();
        graph.set_name(a, Some("lamp".into())).unwrap();
        graph.create_group(Group::new(Rect::new(0, 0, 8, 8), Color::BLUE, "g"));

        let mut recorder = Recorder::default();
        graph.draw_nodes(&mut recorder);
        graph.draw_groups(&mut recorder);
        assert_eq!(
            recorder.nodes,
            vec![(Some(a), GateKind::Led, false, Some("lamp".to_owned()))]
        );
        assert_eq!(recorder.groups, 1);
    }

    #[test]
    fn hex_and_led_palette() {
        assert_eq!(Color::rgb(255, 16, 0).to_hex(), "#ff1000");
        assert_eq!(Color::led(2), Color::RED);
        assert_eq!(Color::led(12), Color::led(2));
        assert_eq!(Color::WHITE.with_alpha(0).a, 0);
    }
}
