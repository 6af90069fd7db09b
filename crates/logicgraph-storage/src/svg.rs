//! One-way SVG export.
//!
//! [`SvgRenderer`] implements the core [`Renderer`] trait and buffers what
//! it is asked to draw. [`SvgRenderer::finish`] then emits one `<symbol>`
//! per gate kind that appeared, the group rectangles, the wire polylines and
//! a `<use>` per node.

use std::collections::BTreeSet;
use std::fmt::Write as _;

use logicgraph_core::geometry::NODE_RADIUS;
use logicgraph_core::{CircuitGraph, Color, GateKind, Group, NodeGlyph, Position, Rect, Renderer};

/// Colors and padding for [`export_svg`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SvgOptions {
    pub active: Color,
    pub inactive: Color,
    pub background: Color,
    /// Padding around the drawing, in grid units.
    pub margin: i32,
}

impl Default for SvgOptions {
    fn default() -> Self {
        SvgOptions {
            active: Color::RED,
            inactive: Color::DARK_GRAY,
            background: Color::WHITE,
            margin: 8,
        }
    }
}

/// Renders `graph` to a standalone SVG document.
pub fn export_svg(graph: &CircuitGraph, options: &SvgOptions) -> String {
    let mut renderer = SvgRenderer::new(*options);
    graph.draw_groups(&mut renderer);
    graph.draw_wires(&mut renderer, options.active, options.inactive);
    graph.draw_nodes(&mut renderer);
    renderer.finish()
}

#[derive(Debug, Clone)]
struct NodeMark {
    position: Position,
    kind: GateKind,
    fill: Color,
    name: Option<String>,
}

/// A [`Renderer`] that accumulates SVG elements.
#[derive(Debug, Clone)]
pub struct SvgRenderer {
    options: SvgOptions,
    kinds: BTreeSet<GateKind>,
    groups: Vec<Group>,
    wires: Vec<([Position; 3], Color)>,
    nodes: Vec<NodeMark>,
    selections: Vec<Rect>,
}

impl SvgRenderer {
    pub fn new(options: SvgOptions) -> Self {
        SvgRenderer {
            options,
            kinds: BTreeSet::new(),
            groups: Vec::new(),
            wires: Vec::new(),
            nodes: Vec::new(),
            selections: Vec::new(),
        }
    }

    fn view_box(&self) -> Rect {
        let points = self
            .nodes
            .iter()
            .map(|n| n.position)
            .chain(self.wires.iter().flat_map(|(p, _)| p.iter().copied()))
            .chain(self.groups.iter().flat_map(|g| [g.rect.min(), g.rect.max()]))
            .chain(self.selections.iter().flat_map(|r| [r.min(), r.max()]));
        let bounds = Rect::bounding(points).unwrap_or_default();
        let pad = self.options.margin + NODE_RADIUS;
        Rect::new(bounds.x - pad, bounds.y - pad, bounds.w + 2 * pad, bounds.h + 2 * pad)
    }

    /// Emits the buffered drawing as an SVG document.
    pub fn finish(self) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail.
        let _ = self.write(&mut out);
        out
    }

    fn write(&self, out: &mut String) -> std::fmt::Result {
        let view = self.view_box();
        writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="{} {} {} {}" width="{}" height="{}">"#,
            view.x, view.y, view.w, view.h, view.w, view.h
        )?;

        writeln!(out, "<defs>")?;
        let r = NODE_RADIUS;
        for kind in &self.kinds {
            writeln!(
                out,
                r##"<symbol id="gate-{}" viewBox="{} {} {} {}"><rect x="{}" y="{}" width="{}" height="{}" rx="1" stroke="#000000" stroke-width="0.5"/><text x="0" y="1.5" font-size="5" text-anchor="middle" fill="#000000">{}</text></symbol>"##,
                kind.name(),
                -r,
                -r,
                2 * r,
                2 * r,
                -r,
                -r,
                2 * r,
                2 * r,
                escape(&kind.symbol().to_string()),
            )?;
        }
        writeln!(out, "</defs>")?;

        writeln!(
            out,
            r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{}"/>"#,
            view.x,
            view.y,
            view.w,
            view.h,
            self.options.background.to_hex()
        )?;

        for group in &self.groups {
            let Rect { x, y, w, h } = group.rect;
            writeln!(
                out,
                r#"<rect class="group" x="{x}" y="{y}" width="{w}" height="{h}" fill="{}" fill-opacity="{:.2}"/>"#,
                group.color.to_hex(),
                f32::from(group.color.a) / 255.0 * 0.25,
            )?;
            if !group.label.is_empty() {
                writeln!(
                    out,
                    r#"<text x="{}" y="{}" font-size="4">{}</text>"#,
                    x + 1,
                    y + 4,
                    escape(&group.label)
                )?;
            }
        }

        for ([start, elbow, end], color) in &self.wires {
            writeln!(
                out,
                r#"<polyline points="{},{} {},{} {},{}" fill="none" stroke="{}" stroke-width="1"/>"#,
                start.x,
                start.y,
                elbow.x,
                elbow.y,
                end.x,
                end.y,
                color.to_hex()
            )?;
        }

        for node in &self.nodes {
            writeln!(
                out,
                "<use href=\"#gate-{}\" x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\"/>",
                node.kind.name(),
                node.position.x - r,
                node.position.y - r,
                2 * r,
                2 * r,
                node.fill.to_hex()
            )?;
            if let Some(name) = &node.name {
                writeln!(
                    out,
                    r#"<text x="{}" y="{}" font-size="4" text-anchor="middle">{}</text>"#,
                    node.position.x,
                    node.position.y + r + 5,
                    escape(name)
                )?;
            }
        }

        for rect in &self.selections {
            writeln!(
                out,
                r#"<rect class="selection" x="{}" y="{}" width="{}" height="{}" fill="none" stroke="{}" stroke-dasharray="2"/>"#,
                rect.x,
                rect.y,
                rect.w,
                rect.h,
                Color::BLUE.to_hex()
            )?;
        }

        writeln!(out, "</svg>")
    }
}

impl Renderer for SvgRenderer {
    fn draw_wire(&mut self, start: Position, elbow: Position, end: Position, color: Color) {
        self.wires.push(([start, elbow, end], color));
    }

    fn draw_node(&mut self, glyph: &NodeGlyph<'_>) {
        self.kinds.insert(glyph.kind);
        let fill = match (glyph.kind, glyph.state) {
            (GateKind::Led, true) => Color::led(glyph.param),
            (_, true) => self.options.active,
            (_, false) => Color::GRAY,
        };
        self.nodes.push(NodeMark {
            position: glyph.position,
            kind: glyph.kind,
            fill,
            name: glyph.name.map(str::to_owned),
        });
    }

    fn draw_selection(&mut self, rect: Rect) {
        self.selections.push(rect);
    }

    fn draw_group(&mut self, group: &Group) {
        self.groups.push(group.clone());
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use logicgraph_core::Gate;

    #[test]
    fn one_symbol_per_kind_and_one_use_per_node() {
        let mut graph = CircuitGraph::new();
        let a = graph.create_node(Position::new(0, 0), Gate::And).unwrap();
        let b = graph.create_node(Position::new(0, 16), Gate::And).unwrap();
        let out = graph.create_node(Position::new(24, 8), Gate::Xor).unwrap();
        graph.connect(a, out).unwrap();
        graph.connect(b, out).unwrap();

        let svg = export_svg(&graph, &SvgOptions::default());
        assert!(svg.starts_with("<svg "));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert_eq!(svg.matches("<symbol ").count(), 2);
        assert!(svg.contains(r#"id="gate-and""#));
        assert!(svg.contains(r#"id="gate-xor""#));
        assert_eq!(svg.matches("<use ").count(), 3);
        assert_eq!(svg.matches("<polyline ").count(), 2);
        // The AND glyph must be escaped.
        assert!(svg.contains(">&amp;</text>"));
    }

    #[test]
    fn active_wires_use_active_color() {
        let mut graph = CircuitGraph::new();
        let battery = graph.create_node(Position::new(0, 0), Gate::Battery).unwrap();
        let led = graph.create_node(Position::new(16, 0), Gate::Led { color: 2 }).unwrap();
        graph.connect(battery, led).unwrap();
        graph.evaluate();
        graph.evaluate();

        let options = SvgOptions::default();
        let svg = export_svg(&graph, &options);
        assert!(svg.contains(&format!(r#"stroke="{}""#, options.active.to_hex())));
        assert!(svg.contains(&format!(r#"fill="{}""#, Color::led(2).to_hex())));
    }

    #[test]
    fn names_and_labels_escaped() {
        let mut graph = CircuitGraph::new();
        let n = graph.create_node(Position::new(0, 0), Gate::Or).unwrap();
        graph.set_name(n, Some("a<b".into())).unwrap();
        graph.create_group(Group::new(Rect::new(0, 0, 8, 8), Color::YELLOW, "x & y"));
        let svg = export_svg(&graph, &SvgOptions::default());
        assert!(svg.contains(">a&lt;b</text>"));
        assert!(svg.contains(">x &amp; y</text>"));
    }

    #[test]
    fn empty_graph_is_valid_document() {
        let svg = export_svg(&CircuitGraph::new(), &SvgOptions::default());
        assert!(svg.contains("<defs>\n</defs>"));
        assert!(!svg.contains("<use "));
    }
}
