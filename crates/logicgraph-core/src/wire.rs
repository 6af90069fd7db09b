//! Directed signal paths between nodes.
//!
//! A wire has no signal state of its own: its state is always the output of
//! its start node, read through
//! [`CircuitGraph::wire_state`](crate::graph::CircuitGraph::wire_state).

use serde::{Deserialize, Serialize};

use crate::geometry::{distance_to_segment, ElbowConfig, Position};
use crate::id::{NodeId, WireId};

/// A directed connection from `start` (signal source) to `end` (destination).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Wire {
    pub(crate) id: WireId,
    pub(crate) start: NodeId,
    pub(crate) end: NodeId,
    pub(crate) elbow_config: ElbowConfig,
    pub(crate) elbow: Position,
}

impl Wire {
    pub fn id(&self) -> WireId {
        self.id
    }

    pub fn start(&self) -> NodeId {
        self.start
    }

    pub fn end(&self) -> NodeId {
        self.end
    }

    pub fn elbow_config(&self) -> ElbowConfig {
        self.elbow_config
    }

    /// Routing point between the two segments.
    pub fn elbow(&self) -> Position {
        self.elbow
    }

    /// The endpoint that is not `node`, if `node` is an endpoint at all.
    pub fn other_end(&self, node: NodeId) -> Option<NodeId> {
        if node == self.start {
            Some(self.end)
        } else if node == self.end {
            Some(self.start)
        } else {
            None
        }
    }

    pub(crate) fn update_elbow(&mut self, start: Position, end: Position) {
        self.elbow = self.elbow_config.elbow(start, end);
    }

    /// Distance from `p` to the nearer of the two segments.
    pub(crate) fn distance_to(&self, p: Position, start: Position, end: Position) -> f32 {
        distance_to_segment(p, start, self.elbow).min(distance_to_segment(p, self.elbow, end))
    }
}
