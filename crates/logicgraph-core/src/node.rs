//! The node (logic element) stored in a circuit graph.
//!
//! A node's incident wires are kept in one ordered list partitioned by
//! `input_count`: wires whose destination is this node occupy the prefix,
//! wires whose source is this node occupy the suffix.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::CoreError;
use crate::gate::{Gate, GateKind};
use crate::geometry::Position;
use crate::id::{NodeId, WireId};

/// A single logic element.
///
/// Nodes are created and destroyed only through
/// [`CircuitGraph`](crate::graph::CircuitGraph); the partition bookkeeping is
/// maintained by the graph and is read-only from outside the crate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) position: Position,
    pub(crate) gate: Gate,
    pub(crate) state: bool,
    pub(crate) previous_state: bool,
    pub(crate) name: Option<String>,
    pub(crate) wires: SmallVec<[WireId; 4]>,
    pub(crate) input_count: usize,
}

impl Node {
    pub(crate) fn new(id: NodeId, position: Position, gate: Gate) -> Self {
        Node {
            id,
            position,
            gate,
            state: false,
            previous_state: false,
            name: None,
            wires: SmallVec::new(),
            input_count: 0,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn gate(&self) -> &Gate {
        &self.gate
    }

    pub fn kind(&self) -> GateKind {
        self.gate.kind()
    }

    /// Output computed on the most recent tick.
    pub fn state(&self) -> bool {
        self.state
    }

    /// Output computed on the tick before the most recent one.
    pub fn previous_state(&self) -> bool {
        self.previous_state
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// All incident wires: inputs first, then outputs.
    pub fn wires(&self) -> &[WireId] {
        &self.wires
    }

    /// Wires whose destination is this node.
    pub fn inputs(&self) -> &[WireId] {
        &self.wires[..self.input_count]
    }

    /// Wires whose source is this node.
    pub fn outputs(&self) -> &[WireId] {
        &self.wires[self.input_count..]
    }

    pub fn input_count(&self) -> usize {
        self.input_count
    }

    pub fn output_count(&self) -> usize {
        self.wires.len() - self.input_count
    }

    /// A node with no inputs; a root for evaluation ordering.
    pub fn is_source(&self) -> bool {
        self.input_count == 0
    }

    /// Exactly one input, an OR gate and something listening: the output is a
    /// plain copy of the sole input.
    pub fn is_passthrough(&self) -> bool {
        self.input_count == 1 && self.output_count() > 0 && self.gate == Gate::Or
    }

    /// One input and any outputs, or one output and any inputs.
    pub fn is_simple_bypassable(&self) -> bool {
        let (i, o) = (self.input_count(), self.output_count());
        (i == 1 && o >= 1) || (o == 1 && i >= 1)
    }

    /// More than one input and more than one output.
    pub fn is_complex_bypassable(&self) -> bool {
        self.input_count() > 1 && self.output_count() > 1
    }

    // -----------------------------------------------------------------------
    // Kind-checked auxiliary accessors
    // -----------------------------------------------------------------------

    fn mismatch(&self, expected: GateKind) -> CoreError {
        CoreError::GateMismatch {
            node: self.id,
            expected,
            found: self.kind(),
        }
    }

    /// Threshold of a resistor node.
    pub fn resistance(&self) -> Result<u8, CoreError> {
        match self.gate {
            Gate::Resistor { threshold } => Ok(threshold),
            _ => Err(self.mismatch(GateKind::Resistor)),
        }
    }

    /// Capacity of a capacitor node.
    pub fn capacity(&self) -> Result<u8, CoreError> {
        match self.gate {
            Gate::Capacitor { capacity, .. } => Ok(capacity),
            _ => Err(self.mismatch(GateKind::Capacitor)),
        }
    }

    /// Current charge of a capacitor node.
    pub fn charge(&self) -> Result<u8, CoreError> {
        match self.gate {
            Gate::Capacitor { charge, .. } => Ok(charge),
            _ => Err(self.mismatch(GateKind::Capacitor)),
        }
    }

    /// Color band of an LED node.
    pub fn led_color(&self) -> Result<u8, CoreError> {
        match self.gate {
            Gate::Led { color } => Ok(color),
            _ => Err(self.mismatch(GateKind::Led)),
        }
    }

    /// Value a delay node will output on the next tick.
    pub fn delay_memory(&self) -> Result<bool, CoreError> {
        match self.gate {
            Gate::Delay { memory } => Ok(memory),
            _ => Err(self.mismatch(GateKind::Delay)),
        }
    }

    // -----------------------------------------------------------------------
    // Partition bookkeeping (graph-internal)
    // -----------------------------------------------------------------------

    /// Appends `wire` to the end of the input prefix.
    pub(crate) fn add_wire_input(&mut self, wire: WireId) {
        self.wires.insert(self.input_count, wire);
        self.input_count += 1;
    }

    /// Appends `wire` to the end of the output suffix.
    pub(crate) fn add_wire_output(&mut self, wire: WireId) {
        self.wires.push(wire);
    }

    /// Removes `wire` from whichever partition holds it.
    ///
    /// Returns `false` if the node does not reference the wire.
    pub(crate) fn remove_wire(&mut self, wire: WireId) -> bool {
        match self.wires.iter().position(|&w| w == wire) {
            Some(pos) => {
                if pos < self.input_count {
                    self.input_count -= 1;
                }
                self.wires.remove(pos);
                true
            }
            None => false,
        }
    }
}
