//! The line-oriented circuit save format.
//!
//! ```text
//! v2
//! <node count>
//! <gate char> <x> <y> [<aux param>] [<name...>]
//! <wire count>
//! <elbow config> <start index> <end index>
//! <group count>
//! <x> <y> <w> <h> <r> <g> <b> <a> [<label...>]
//! ```
//!
//! The aux parameter is present exactly for kinds with
//! [`GateKind::has_param`]. Names and labels run to the end of the line;
//! they are written trimmed with line breaks turned into spaces, so a name
//! that is only whitespace is saved as no name. Coordinates beyond
//! [`logicgraph_core::COORD_LIMIT`] are rejected on load. Version 1 files
//! have no names and no group section and still load.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use tracing::info;

use logicgraph_core::{CircuitGraph, Color, ElbowConfig, GateKind, Group, Position, Rect};

use crate::convert::{decompose, recompose, DecomposedCircuit, NodeRecord, WireRecord};
use crate::error::StorageError;

/// The version written by [`write_circuit`].
pub const FORMAT_VERSION: u32 = 2;

/// Renders `graph` in the current save format.
pub fn write_circuit(graph: &CircuitGraph) -> String {
    format_records(&decompose(graph))
}

/// Parses a save file into a brand-new graph.
pub fn read_circuit(text: &str) -> Result<CircuitGraph, StorageError> {
    recompose(&parse_records(text)?)
}

pub fn save_to_path(graph: &CircuitGraph, path: impl AsRef<Path>) -> Result<(), StorageError> {
    let path = path.as_ref();
    fs::write(path, write_circuit(graph))?;
    info!(path = %path.display(), nodes = graph.node_count(), "saved circuit");
    Ok(())
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<CircuitGraph, StorageError> {
    let path = path.as_ref();
    let graph = read_circuit(&fs::read_to_string(path)?)?;
    info!(path = %path.display(), nodes = graph.node_count(), "loaded circuit");
    Ok(graph)
}

/// Renders records in the current save format.
pub fn format_records(records: &DecomposedCircuit) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = write_records(&mut out, records);
    out
}

fn write_records(out: &mut String, records: &DecomposedCircuit) -> std::fmt::Result {
    writeln!(out, "v{FORMAT_VERSION}")?;

    writeln!(out, "{}", records.nodes.len())?;
    for node in &records.nodes {
        write!(out, "{} {} {}", node.gate.symbol(), node.position.x, node.position.y)?;
        if node.gate.has_param() {
            write!(out, " {}", node.param)?;
        }
        if let Some(name) = node.name.as_deref().map(single_line).filter(|n| !n.is_empty()) {
            write!(out, " {name}")?;
        }
        writeln!(out)?;
    }

    writeln!(out, "{}", records.wires.len())?;
    for wire in &records.wires {
        writeln!(out, "{} {} {}", wire.elbow_config.index(), wire.start, wire.end)?;
    }

    writeln!(out, "{}", records.groups.len())?;
    for group in &records.groups {
        let Rect { x, y, w, h } = group.rect;
        let Color { r, g, b, a } = group.color;
        write!(out, "{x} {y} {w} {h} {r} {g} {b} {a}")?;
        let label = single_line(&group.label);
        if !label.is_empty() {
            write!(out, " {label}")?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn single_line(s: &str) -> String {
    s.split(['\n', '\r']).collect::<Vec<_>>().join(" ").trim().to_owned()
}

/// Parses a save file (version 1 or 2) into records without building a graph.
pub fn parse_records(text: &str) -> Result<DecomposedCircuit, StorageError> {
    let mut lines = Lines::new(text);

    let (_, header) = lines.next_line("version header")?;
    let version = match header.trim() {
        "v1" => 1,
        "v2" => 2,
        other => {
            return Err(StorageError::UnsupportedVersion {
                version: other.to_owned(),
            })
        }
    };

    let mut records = DecomposedCircuit::default();

    let count = lines.count("node count")?;
    records.nodes.reserve(count);
    for _ in 0..count {
        let (line, text) = lines.next_line("node record")?;
        records.nodes.push(parse_node(line, text, version)?);
    }

    let count = lines.count("wire count")?;
    records.wires.reserve(count);
    for _ in 0..count {
        let (line, text) = lines.next_line("wire record")?;
        let (fields, _) = split_fields(text, 3).ok_or_else(|| parse_error(line, "expected 3 fields"))?;
        let config: u8 = number(line, fields[0])?;
        records.wires.push(WireRecord {
            elbow_config: ElbowConfig::from_index(config)
                .ok_or_else(|| parse_error(line, format!("unknown elbow config {config}")))?,
            start: number(line, fields[1])?,
            end: number(line, fields[2])?,
        });
    }

    if version >= 2 {
        let count = lines.count("group count")?;
        for _ in 0..count {
            let (line, text) = lines.next_line("group record")?;
            records.groups.push(parse_group(line, text)?);
        }
    }

    if let Some((line, _)) = lines.next_nonblank() {
        return Err(parse_error(line, "unexpected trailing content"));
    }
    Ok(records)
}

fn parse_node(line: usize, text: &str, version: u32) -> Result<NodeRecord, StorageError> {
    let (fields, _) = split_fields(text, 1).ok_or_else(|| parse_error(line, "empty node record"))?;
    let mut chars = fields[0].chars();
    let gate = match (chars.next(), chars.next()) {
        (Some(c), None) => GateKind::from_symbol(c),
        _ => None,
    }
    .ok_or_else(|| parse_error(line, format!("unknown gate {:?}", fields[0])))?;

    let wanted = if gate.has_param() { 4 } else { 3 };
    let (fields, rest) = split_fields(text, wanted)
        .ok_or_else(|| parse_error(line, format!("expected {wanted} fields")))?;
    let param = if gate.has_param() { number(line, fields[3])? } else { 0 };
    let name = (version >= 2 && !rest.is_empty()).then(|| rest.to_owned());

    let position = Position::new(number(line, fields[1])?, number(line, fields[2])?);
    if !position.in_bounds() {
        return Err(parse_error(line, "coordinates out of range"));
    }

    Ok(NodeRecord {
        gate,
        param,
        position,
        name,
    })
}

fn parse_group(line: usize, text: &str) -> Result<Group, StorageError> {
    let (f, rest) = split_fields(text, 8).ok_or_else(|| parse_error(line, "expected 8 fields"))?;
    let rect = Rect::new(
        number(line, f[0])?,
        number(line, f[1])?,
        number(line, f[2])?,
        number(line, f[3])?,
    );
    if !rect.in_bounds() {
        return Err(parse_error(line, "coordinates out of range"));
    }
    let color = Color::rgba(
        number(line, f[4])?,
        number(line, f[5])?,
        number(line, f[6])?,
        number(line, f[7])?,
    );
    Ok(Group::new(rect, color, rest))
}

/// Takes `n` whitespace-separated fields and returns them with the trimmed
/// remainder of the line.
fn split_fields(line: &str, n: usize) -> Option<(Vec<&str>, &str)> {
    let mut rest = line.trim_start();
    let mut fields = Vec::with_capacity(n);
    for _ in 0..n {
        if rest.is_empty() {
            return None;
        }
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        fields.push(&rest[..end]);
        rest = rest[end..].trim_start();
    }
    Some((fields, rest.trim_end()))
}

fn number<T: std::str::FromStr>(line: usize, field: &str) -> Result<T, StorageError> {
    field
        .parse()
        .map_err(|_| parse_error(line, format!("invalid number {field:?}")))
}

fn parse_error(line: usize, reason: impl Into<String>) -> StorageError {
    StorageError::Parse {
        line,
        reason: reason.into(),
    }
}

/// Line cursor with 1-based numbering.
struct Lines<'a> {
    inner: std::iter::Enumerate<std::str::Lines<'a>>,
    last: usize,
}

impl<'a> Lines<'a> {
    fn new(text: &'a str) -> Self {
        Lines {
            inner: text.lines().enumerate(),
            last: 0,
        }
    }

    fn next_line(&mut self, what: &str) -> Result<(usize, &'a str), StorageError> {
        match self.inner.next() {
            Some((i, text)) => {
                self.last = i + 1;
                Ok((i + 1, text))
            }
            None => Err(parse_error(self.last + 1, format!("unexpected end of file, expected {what}"))),
        }
    }

    fn count(&mut self, what: &str) -> Result<usize, StorageError> {
        let (line, text) = self.next_line(what)?;
        number(line, text.trim())
    }

    fn next_nonblank(&mut self) -> Option<(usize, &'a str)> {
        self.inner
            .by_ref()
            .find(|(_, text)| !text.trim().is_empty())
            .map(|(i, text)| (i + 1, text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logicgraph_core::{CoreError, Gate};

    fn latch() -> CircuitGraph {
        let mut graph = CircuitGraph::new();
        let set = graph.create_node(Position::new(0, 0), Gate::Or).unwrap();
        let q = graph.create_node(Position::new(16, 0), Gate::Nor).unwrap();
        let led = graph.create_node(Position::new(32, 0), Gate::Led { color: 5 }).unwrap();
        graph.connect(set, q).unwrap();
        graph.connect(q, led).unwrap();
        graph.set_name(set, Some("set".into())).unwrap();
        graph.set_name(led, Some("q out".into())).unwrap();
        graph.create_group(Group::new(Rect::new(-8, -8, 48, 16), Color::GREEN, "latch"));
        graph
    }

    #[test]
    fn writes_version_two() {
        insta::assert_snapshot!(write_circuit(&latch()), @r"
        v2
        3
        @ 32 0 5 q out
        ! 16 0
        | 0 0 set
        2
        0 1 0
        0 2 1
        1
        -8 -8 48 16 0 228 48 255 latch
        ");
    }

    #[test]
    fn save_load_save_is_stable() {
        let text = write_circuit(&latch());
        let loaded = read_circuit(&text).unwrap();
        assert_eq!(write_circuit(&loaded), text);
        let led = loaded.find_node_by_name("q out").unwrap();
        assert_eq!(loaded.node(led).unwrap().led_color().unwrap(), 5);
    }

    #[test]
    fn reads_version_one() {
        let text = "v1\n2\n~ 8 0 3\n| 0 0\n1\n2 1 0\n";
        let graph = read_circuit(text).unwrap();
        assert_eq!(graph.node_count(), 2);
        assert!(graph.groups().is_empty());
        let wire = graph.wires().next().unwrap();
        assert_eq!(wire.elbow_config(), ElbowConfig::Vertical);
        let resistor = graph.node(wire.end()).unwrap();
        assert_eq!(resistor.resistance().unwrap(), 3);
    }

    #[test]
    fn unknown_version_rejected() {
        assert!(matches!(
            read_circuit("v9\n0\n0\n0\n"),
            Err(StorageError::UnsupportedVersion { version }) if version == "v9"
        ));
    }

    #[test]
    fn parse_errors_carry_line_numbers() {
        let err = read_circuit("v2\n1\nQ 0 0\n0\n0\n").unwrap_err();
        assert!(matches!(err, StorageError::Parse { line: 3, .. }));

        let err = read_circuit("v2\n1\n~ 0 0\n0\n0\n").unwrap_err();
        assert!(matches!(err, StorageError::Parse { line: 3, .. }));

        let err = read_circuit("v2\n2\n| 0 0\n").unwrap_err();
        assert!(matches!(err, StorageError::Parse { line: 4, .. }));

        let err = read_circuit("v2\n0\n0\n0\nextra\n").unwrap_err();
        assert!(matches!(err, StorageError::Parse { line: 5, .. }));
    }

    #[test]
    fn coordinates_out_of_range_rejected() {
        let err = read_circuit("v2\n2\n| 2147483647 0\n| -2147483648 0\n1\n0 0 1\n0\n").unwrap_err();
        assert!(matches!(err, StorageError::Parse { line: 3, .. }));

        let err = read_circuit("v2\n1\n| 0 0\n0\n1\n0 0 2147483647 8 0 0 0 255 wide\n").unwrap_err();
        assert!(matches!(err, StorageError::Parse { line: 6, .. }));
    }

    #[test]
    fn rejected_gate_edit_keeps_file_loadable() {
        let mut graph = CircuitGraph::new();
        let r = graph.create_node(Position::new(0, 0), Gate::Resistor { threshold: 3 }).unwrap();
        let led = graph.create_node(Position::new(16, 0), Gate::Led { color: 1 }).unwrap();
        graph.connect(r, led).unwrap();

        assert!(graph.set_gate(r, Gate::Resistor { threshold: 10 }).is_err());
        assert!(graph.set_gate(led, Gate::Led { color: 42 }).is_err());
        graph.set_gate(led, Gate::Led { color: 9 }).unwrap();

        let text = write_circuit(&graph);
        let loaded = read_circuit(&text).unwrap();
        assert_eq!(write_circuit(&loaded), text);
        assert!(text.contains("~ 0 0 3\n"));
        assert!(text.contains("@ 16 0 9\n"));
    }

    #[test]
    fn blank_names_saved_as_unnamed() {
        let mut graph = CircuitGraph::new();
        let n = graph.create_node(Position::new(0, 0), Gate::Or).unwrap();
        graph.set_name(n, Some(" \n\t".into())).unwrap();
        let text = write_circuit(&graph);
        assert!(text.contains("| 0 0\n"));
        let loaded = read_circuit(&text).unwrap();
        let id = loaded.node_ids()[0];
        assert_eq!(loaded.node(id).unwrap().name(), None);
    }

    #[test]
    fn bad_records_reject_whole_file() {
        let err = read_circuit("v2\n1\n| 0 0\n1\n0 0 0\n0\n").unwrap_err();
        assert!(matches!(err, StorageError::Core(CoreError::IndexSelfLoop { index: 0 })));

        let err = read_circuit("v2\n1\n@ 0 0 12\n0\n0\n").unwrap_err();
        assert!(matches!(err, StorageError::Core(CoreError::ParameterOutOfRange { .. })));
    }

    #[test]
    fn multiline_names_flattened() {
        let mut graph = CircuitGraph::new();
        let n = graph.create_node(Position::new(0, 0), Gate::Battery).unwrap();
        graph.set_name(n, Some("two\nlines".into())).unwrap();
        let text = write_circuit(&graph);
        assert!(text.contains("T 0 0 two lines\n"));
        let loaded = read_circuit(&text).unwrap();
        assert!(loaded.find_node_by_name("two lines").is_some());
    }

    #[test]
    fn path_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latch.lgc");
        save_to_path(&latch(), &path).unwrap();
        let loaded = load_from_path(&path).unwrap();
        assert_eq!(write_circuit(&loaded), write_circuit(&latch()));
    }
}
