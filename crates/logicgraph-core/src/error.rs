//! Core error types for logicgraph-core.
//!
//! Every variant is a precondition violation: the editing layer offered an
//! operation it should have disabled (self-looped wire, merging a node into
//! itself, bypassing a node of the wrong shape, a dangling blueprint index).
//! Queries that find nothing return `Option::None` instead of an error.

use thiserror::Error;

use crate::gate::GateKind;
use crate::id::{NodeId, WireId};

/// Core errors produced by the logicgraph-core crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A node handle does not resolve to a live node of this graph.
    #[error("node not found: {id}")]
    NodeNotFound { id: NodeId },

    /// A wire handle does not resolve to a live wire of this graph.
    #[error("wire not found: {id}")]
    WireNotFound { id: WireId },

    /// A wire was requested from a node to itself.
    #[error("wire would loop {node} onto itself")]
    SelfLoop { node: NodeId },

    /// `merge_nodes` was called with the same node twice.
    #[error("cannot merge {node} into itself")]
    MergeIntoSelf { node: NodeId },

    /// The node's input/output shape does not allow the requested bypass.
    #[error("{node} is not {shape}-bypassable ({inputs} inputs, {outputs} outputs)")]
    NotBypassable {
        node: NodeId,
        shape: &'static str,
        inputs: usize,
        outputs: usize,
    },

    /// The node inserted by a bisect is already an endpoint of the wire.
    #[error("cannot bisect {wire} with its own endpoint {node}")]
    BisectEndpoint { wire: WireId, node: NodeId },

    /// A kind-specific accessor was used on a node of another gate kind.
    #[error("gate mismatch on {node}: expected {expected:?}, found {found:?}")]
    GateMismatch {
        node: NodeId,
        expected: GateKind,
        found: GateKind,
    },

    /// A wire record references a node index that does not exist.
    #[error("wire references node index {index}, only {len} nodes")]
    DanglingIndex { index: usize, len: usize },

    /// A wire record connects a node index to itself.
    #[error("wire record loops node index {index} onto itself")]
    IndexSelfLoop { index: usize },

    /// A second wire between the same pair of nodes was supplied in bulk.
    #[error("parallel wire between node indices {start} and {end}")]
    ParallelWire { start: usize, end: usize },

    /// A gate parameter is outside its documented range.
    #[error("{kind:?} parameter {value} out of range (max {max})")]
    ParameterOutOfRange { kind: GateKind, value: u8, max: u8 },

    /// A node position or group corner lies outside the coordinate limit.
    #[error("position ({x}, {y}) out of range")]
    PositionOutOfRange { x: i32, y: i32 },

    /// A group index is out of range.
    #[error("group not found: index {index}")]
    GroupNotFound { index: usize },

    /// Graph bookkeeping disagrees with itself.
    #[error("graph inconsistency: {reason}")]
    GraphInconsistency { reason: String },

    /// The requested operation needs a source node with a switchable gate.
    #[error("{node} is not a switch (needs zero inputs and an OR or NOR gate)")]
    NotASwitch { node: NodeId },
}
