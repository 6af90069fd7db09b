//! Gate kinds and the per-tick gate state machine.
//!
//! [`GateKind`] is the plain tag used for display, persistence and kind
//! checks. [`Gate`] is the tagged variant that carries the auxiliary data
//! each kind needs (resistor threshold, capacitor charge, LED color band,
//! delay memory) so that data can only be reached through the matching kind.
//!
//! # Truth tables
//!
//! | Gate | Output |
//! |---|---|
//! | OR / LED | any input high |
//! | NOR | no input high (high with zero inputs) |
//! | AND | at least one input, all high |
//! | XOR | exactly one input high |
//! | RESISTOR | more high inputs than the threshold |
//! | CAPACITOR | charge > 0 or any input high; charge moves one step per tick |
//! | DELAY | previous tick's "any input high" |
//! | BATTERY | always high |

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Highest resistor threshold the editor exposes.
pub const MAX_RESISTANCE: u8 = 9;

/// Number of LED color bands.
pub const LED_COLOR_COUNT: u8 = 10;

/// The boolean function a node computes, without its auxiliary data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GateKind {
    Or,
    And,
    Nor,
    Xor,
    Resistor,
    Capacitor,
    Led,
    Delay,
    Battery,
}

impl GateKind {
    /// All kinds in declaration order.
    pub const ALL: [GateKind; 9] = [
        GateKind::Or,
        GateKind::And,
        GateKind::Nor,
        GateKind::Xor,
        GateKind::Resistor,
        GateKind::Capacitor,
        GateKind::Led,
        GateKind::Delay,
        GateKind::Battery,
    ];

    /// The single character used for this kind in save files.
    pub fn symbol(self) -> char {
        match self {
            GateKind::Or => '|',
            GateKind::And => '&',
            GateKind::Nor => '!',
            GateKind::Xor => '^',
            GateKind::Resistor => '~',
            GateKind::Capacitor => '=',
            GateKind::Led => '@',
            GateKind::Delay => ';',
            GateKind::Battery => 'T',
        }
    }

    pub fn from_symbol(symbol: char) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.symbol() == symbol)
    }

    /// Lowercase identifier, used for symbol ids in vector exports.
    pub fn name(self) -> &'static str {
        match self {
            GateKind::Or => "or",
            GateKind::And => "and",
            GateKind::Nor => "nor",
            GateKind::Xor => "xor",
            GateKind::Resistor => "resistor",
            GateKind::Capacitor => "capacitor",
            GateKind::Led => "led",
            GateKind::Delay => "delay",
            GateKind::Battery => "battery",
        }
    }

    /// Returns `true` if this kind stores an auxiliary parameter in save files.
    pub fn has_param(self) -> bool {
        matches!(self, GateKind::Resistor | GateKind::Capacitor | GateKind::Led)
    }

    /// Largest legal auxiliary parameter for this kind.
    pub fn max_param(self) -> u8 {
        match self {
            GateKind::Resistor => MAX_RESISTANCE,
            GateKind::Led => LED_COLOR_COUNT - 1,
            GateKind::Capacitor => u8::MAX,
            _ => 0,
        }
    }
}

/// A gate together with its per-kind auxiliary state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gate {
    Or,
    And,
    Nor,
    Xor,
    /// Passes when more than `threshold` inputs are high.
    Resistor { threshold: u8 },
    /// Charges by one per tick while powered, up to `capacity`.
    Capacitor { capacity: u8, charge: u8 },
    /// Behaves like OR; `color` selects the display band.
    Led { color: u8 },
    /// Holds last tick's input for one tick.
    Delay { memory: bool },
    Battery,
}

impl Gate {
    /// Builds a gate of `kind` with auxiliary parameter `param`.
    ///
    /// Kinds without a parameter ignore it. Dynamic state (capacitor charge,
    /// delay memory) starts empty.
    pub fn new(kind: GateKind, param: u8) -> Result<Self, CoreError> {
        let gate = match kind {
            GateKind::Or => Gate::Or,
            GateKind::And => Gate::And,
            GateKind::Nor => Gate::Nor,
            GateKind::Xor => Gate::Xor,
            GateKind::Resistor => Gate::Resistor { threshold: param },
            GateKind::Capacitor => Gate::Capacitor {
                capacity: param,
                charge: 0,
            },
            GateKind::Led => Gate::Led { color: param },
            GateKind::Delay => Gate::Delay { memory: false },
            GateKind::Battery => Gate::Battery,
        };
        gate.validate()?;
        Ok(gate)
    }

    /// Checks the auxiliary fields against the limits of the kind. A
    /// capacitor's charge may not exceed its capacity.
    pub fn validate(&self) -> Result<(), CoreError> {
        let kind = self.kind();
        let param = self.param();
        if kind.has_param() && param > kind.max_param() {
            return Err(CoreError::ParameterOutOfRange {
                kind,
                value: param,
                max: kind.max_param(),
            });
        }
        if let Gate::Capacitor { capacity, charge } = *self {
            if charge > capacity {
                return Err(CoreError::ParameterOutOfRange {
                    kind,
                    value: charge,
                    max: capacity,
                });
            }
        }
        Ok(())
    }

    pub fn kind(&self) -> GateKind {
        match self {
            Gate::Or => GateKind::Or,
            Gate::And => GateKind::And,
            Gate::Nor => GateKind::Nor,
            Gate::Xor => GateKind::Xor,
            Gate::Resistor { .. } => GateKind::Resistor,
            Gate::Capacitor { .. } => GateKind::Capacitor,
            Gate::Led { .. } => GateKind::Led,
            Gate::Delay { .. } => GateKind::Delay,
            Gate::Battery => GateKind::Battery,
        }
    }

    /// The auxiliary parameter persisted for this gate (0 when it has none).
    pub fn param(&self) -> u8 {
        match *self {
            Gate::Resistor { threshold } => threshold,
            Gate::Capacitor { capacity, .. } => capacity,
            Gate::Led { color } => color,
            _ => 0,
        }
    }

    /// Same gate with dynamic state (charge, delay memory) cleared.
    pub fn reset(&self) -> Self {
        match *self {
            Gate::Capacitor { capacity, .. } => Gate::Capacitor {
                capacity,
                charge: 0,
            },
            Gate::Delay { .. } => Gate::Delay { memory: false },
            other => other,
        }
    }

    /// Advances the gate by one tick given `total` inputs of which `high` are
    /// true, and returns the new output.
    ///
    /// Must be called exactly once per node per tick: capacitors and delays
    /// mutate their state here.
    pub fn step(&mut self, total: usize, high: usize) -> bool {
        let any = high > 0;
        match self {
            Gate::Or | Gate::Led { .. } => any,
            Gate::Nor => !any,
            Gate::And => total > 0 && high == total,
            Gate::Xor => high == 1,
            Gate::Resistor { threshold } => high > *threshold as usize,
            Gate::Capacitor { capacity, charge } => {
                if any {
                    *charge = charge.saturating_add(1).min(*capacity);
                } else {
                    *charge = charge.saturating_sub(1);
                }
                *charge > 0 || any
            }
            Gate::Delay { memory } => std::mem::replace(memory, any),
            Gate::Battery => true,
        }
    }

    /// Convenience wrapper over [`step`](Self::step) for an explicit input vector.
    pub fn step_inputs(&mut self, inputs: &[bool]) -> bool {
        let high = inputs.iter().filter(|&&b| b).count();
        self.step(inputs.len(), high)
    }
}
