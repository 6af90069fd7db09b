//! Simulation error types.

use logicgraph_core::CoreError;

/// Errors produced while driving a circuit.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("tick limit ({limit}) reached")]
    TickLimit { limit: u64 },

    #[error("no node labelled {name:?}")]
    ProbeNotFound { name: String },

    #[error("trace serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}
