//! Labelled rectangles drawn behind the circuit.
//!
//! Groups are annotations only: they never take part in evaluation and
//! editing them does not dirty the evaluation order.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::geometry::{Position, Rect};
use crate::graph::CircuitGraph;
use crate::render::Color;

/// A colored, labelled region of the canvas.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub rect: Rect,
    pub color: Color,
    pub label: String,
}

impl Group {
    pub fn new(rect: Rect, color: Color, label: impl Into<String>) -> Self {
        Group {
            rect,
            color,
            label: label.into(),
        }
    }
}

impl CircuitGraph {
    /// All groups, oldest first.
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Adds a group and returns its index.
    pub fn create_group(&mut self, group: Group) -> usize {
        self.groups.push(group);
        self.groups.len() - 1
    }

    /// Removes the group at `index`, shifting later groups down.
    pub fn destroy_group(&mut self, index: usize) -> Result<Group, CoreError> {
        if index >= self.groups.len() {
            return Err(CoreError::GroupNotFound { index });
        }
        Ok(self.groups.remove(index))
    }

    /// The most recently created group containing `pos`.
    pub fn find_group_at_position(&self, pos: Position) -> Option<usize> {
        self.groups.iter().rposition(|g| g.rect.contains(pos))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newest_group_wins_overlap() {
        let mut graph = CircuitGraph::new();
        let outer = graph.create_group(Group::new(Rect::new(0, 0, 100, 100), Color::GRAY, "outer"));
        let inner = graph.create_group(Group::new(Rect::new(10, 10, 20, 20), Color::BLUE, "inner"));

        assert_eq!(graph.find_group_at_position(Position::new(15, 15)), Some(inner));
        assert_eq!(graph.find_group_at_position(Position::new(50, 50)), Some(outer));
        assert_eq!(graph.find_group_at_position(Position::new(500, 50)), None);
    }

    #[test]
    fn destroying_groups_does_not_dirty_order() {
        let mut graph = CircuitGraph::new();
        graph.sort();
        graph.create_group(Group::new(Rect::new(0, 0, 8, 8), Color::RED, "a"));
        assert!(!graph.is_order_dirty());

        let removed = graph.destroy_group(0).unwrap();
        assert_eq!(removed.label, "a");
        assert_eq!(
            graph.destroy_group(0),
            Err(CoreError::GroupNotFound { index: 0 })
        );
    }
}
