pub mod id;
pub mod error;
pub mod geometry;
pub mod gate;
pub mod node;
pub mod wire;
pub mod graph;
pub mod order;
pub mod group;
pub mod blueprint;
pub mod render;
pub mod tool;

// Re-export commonly used types
pub use id::{NodeId, WireId};
pub use error::CoreError;
pub use geometry::{ElbowConfig, Position, Rect, COORD_LIMIT, GRID_SIZE};
pub use gate::{Gate, GateKind};
pub use node::Node;
pub use wire::Wire;
pub use graph::{CircuitGraph, NodeSeed, WireSeed};
pub use order::SortReport;
pub use group::Group;
pub use blueprint::{BlueprintLibrary, BlueprintTemplate, NodeTemplate, WireTemplate};
pub use render::{Color, NodeGlyph, Renderer};
pub use tool::{EditTool, PenTool, PointerAction, PointerEvent, Tool};
