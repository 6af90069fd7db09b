//! Tick driver with a run state machine.
//!
//! The [`Simulator`] owns a [`CircuitGraph`] and advances it one
//! [`evaluate`](CircuitGraph::evaluate) at a time. Its state transitions are
//! `Idle -> Running -> (Stable | Oscillating | TickLimit)`; any structural
//! edit made through [`Simulator::graph_mut`] drops it back to `Idle`.
//!
//! Settle detection hashes the full dynamic state after every tick (see
//! [`fingerprint`](crate::fingerprint::fingerprint)). The first repeated
//! fingerprint closes a cycle: a cycle of length one is a stable circuit,
//! anything longer is an oscillator with that period.

use std::collections::HashMap;

use tracing::{debug, trace};

use logicgraph_core::{CircuitGraph, GateKind, NodeId};

use crate::error::SimError;
use crate::fingerprint::fingerprint;
use crate::stimulus::RandomStimulus;
use crate::trace::TickTrace;

/// Simulation configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimConfig {
    /// Whether to record a [`TickTrace`] per tick.
    pub trace_enabled: bool,
    /// Ticks after which the simulator refuses to step. Default: 10_000.
    pub max_ticks: u64,
    /// Maximum oscillation period reported; longer cycles still stop the
    /// run but are reported as `TickLimit`. Default: 64.
    pub stability_window: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            trace_enabled: false,
            max_ticks: 10_000,
            stability_window: 64,
        }
    }
}

/// Where the simulator is in its run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimState {
    /// Not yet stepped since construction, reset, or an edit.
    Idle,
    /// Stepped at least once; no verdict yet.
    Running,
    /// Every tick since `tick` reproduces the same state.
    Stable { tick: u64 },
    /// The circuit cycles through `period` distinct states.
    Oscillating { period: u64 },
    /// `max_ticks` reached without a verdict.
    TickLimit { ticks: u64 },
}

/// Drives a circuit tick by tick.
#[derive(Debug, Clone)]
pub struct Simulator {
    graph: CircuitGraph,
    config: SimConfig,
    state: SimState,
    tick: u64,
    trace: Vec<TickTrace>,
    /// Fingerprint -> tick it was first seen at during the current settle run.
    history: HashMap<blake3::Hash, u64>,
}

impl Simulator {
    pub fn new(graph: CircuitGraph, config: SimConfig) -> Self {
        Simulator {
            graph,
            config,
            state: SimState::Idle,
            tick: 0,
            trace: Vec::new(),
            history: HashMap::new(),
        }
    }

    pub fn graph(&self) -> &CircuitGraph {
        &self.graph
    }

    /// Mutable access for edits; returns the simulator to `Idle`.
    pub fn graph_mut(&mut self) -> &mut CircuitGraph {
        self.state = SimState::Idle;
        &mut self.graph
    }

    pub fn into_graph(self) -> CircuitGraph {
        self.graph
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn state(&self) -> SimState {
        self.state
    }

    /// Ticks run since construction or the last reset.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn trace(&self) -> &[TickTrace] {
        &self.trace
    }

    /// The recorded trace as pretty JSON.
    pub fn trace_json(&self) -> Result<String, SimError> {
        Ok(serde_json::to_string_pretty(&self.trace)?)
    }

    /// Clears outputs, gate memories, the tick counter and the trace.
    pub fn reset(&mut self) {
        self.graph.reset_state();
        self.tick = 0;
        self.trace.clear();
        self.state = SimState::Idle;
    }

    // -----------------------------------------------------------------------
    // Stepping
    // -----------------------------------------------------------------------

    /// Runs one tick and returns how many node outputs changed.
    pub fn step(&mut self) -> Result<usize, SimError> {
        self.step_with(None)
    }

    fn step_with(&mut self, toggled: Option<usize>) -> Result<usize, SimError> {
        if self.tick >= self.config.max_ticks {
            self.state = SimState::TickLimit { ticks: self.tick };
            return Err(SimError::TickLimit {
                limit: self.config.max_ticks,
            });
        }

        self.state = SimState::Running;
        self.graph.evaluate();
        self.tick += 1;

        let changed: Vec<usize> = self
            .graph
            .nodes()
            .enumerate()
            .filter(|(_, n)| n.state() != n.previous_state())
            .map(|(i, _)| i)
            .collect();
        trace!(tick = self.tick, changed = changed.len(), "tick");

        let count = changed.len();
        if self.config.trace_enabled {
            self.trace.push(TickTrace {
                tick: self.tick,
                changed,
                toggled,
            });
        }
        Ok(count)
    }

    /// Steps up to `ticks` times, stopping early at the tick limit. Returns
    /// the number of ticks actually run.
    pub fn run(&mut self, ticks: u64) -> Result<u64, SimError> {
        let mut ran = 0;
        for _ in 0..ticks {
            match self.step() {
                Ok(_) => ran += 1,
                Err(SimError::TickLimit { .. }) => break,
                Err(other) => return Err(other),
            }
        }
        Ok(ran)
    }

    /// Steps until the circuit's state repeats or the tick limit is hit.
    pub fn run_until_settled(&mut self) -> Result<SimState, SimError> {
        if self.graph.is_order_dirty() {
            self.graph.sort();
        }
        self.history.clear();
        self.history.insert(fingerprint(&self.graph), self.tick);

        loop {
            match self.step() {
                Ok(_) => {}
                Err(SimError::TickLimit { .. }) => return Ok(self.state),
                Err(other) => return Err(other),
            }

            let print = fingerprint(&self.graph);
            if let Some(&first) = self.history.get(&print) {
                let period = self.tick - first;
                self.state = if period == 1 {
                    SimState::Stable { tick: first }
                } else if period <= self.config.stability_window {
                    SimState::Oscillating { period }
                } else {
                    SimState::TickLimit { ticks: self.tick }
                };
                debug!(tick = self.tick, period, state = ?self.state, "circuit settled");
                return Ok(self.state);
            }
            self.history.insert(print, self.tick);
        }
    }

    /// Runs `ticks` ticks, letting `stimulus` flip a switch before each.
    pub fn run_with_stimulus(&mut self, ticks: u64, stimulus: &mut RandomStimulus) -> Result<u64, SimError> {
        if self.graph.is_order_dirty() {
            self.graph.sort();
        }
        let mut ran = 0;
        for _ in 0..ticks {
            let toggled = match stimulus.pick(&self.graph, self.tick) {
                Some(id) => {
                    self.graph.toggle_switch(id)?;
                    self.graph.node_index(id)
                }
                None => None,
            };
            match self.step_with(toggled) {
                Ok(_) => ran += 1,
                Err(SimError::TickLimit { .. }) => break,
                Err(other) => return Err(other),
            }
        }
        Ok(ran)
    }

    // -----------------------------------------------------------------------
    // Probing and inputs
    // -----------------------------------------------------------------------

    fn labelled(&self, name: &str) -> Result<NodeId, SimError> {
        self.graph
            .find_node_by_name(name)
            .ok_or_else(|| SimError::ProbeNotFound { name: name.to_owned() })
    }

    /// Output of the first node labelled `name`.
    pub fn probe(&self, name: &str) -> Result<bool, SimError> {
        let id = self.labelled(name)?;
        Ok(self.graph.node(id).is_some_and(|n| n.state()))
    }

    /// Drives the switch labelled `name` to `on`.
    pub fn set_input(&mut self, name: &str, on: bool) -> Result<(), SimError> {
        let id = self.labelled(name)?;
        let is_on = self.graph.node(id).is_some_and(|n| n.kind() == GateKind::Nor);
        if is_on != on {
            self.graph.toggle_switch(id)?;
        }
        Ok(())
    }
}
