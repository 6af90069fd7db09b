//! Tick trace recording.
//!
//! When tracing is enabled via [`SimConfig::trace_enabled`](crate::SimConfig),
//! the simulator records a [`TickTrace`] after every tick.

use serde::{Deserialize, Serialize};

/// What happened on one tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickTrace {
    /// 1-based tick number.
    pub tick: u64,
    /// Node-list indices of the nodes whose output changed.
    pub changed: Vec<usize>,
    /// Node-list index of a switch flipped by a stimulus before the tick.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub toggled: Option<usize>,
}
