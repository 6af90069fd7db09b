//! Generational handle types for graph entities.
//!
//! Nodes and wires live in slot-map arenas owned by
//! [`CircuitGraph`](crate::graph::CircuitGraph). A handle stays valid only
//! while its entity is alive: once a node or wire is destroyed its slot may
//! be reused, but the bumped generation makes the old handle resolve to
//! nothing instead of aliasing the newcomer.

use std::fmt;

use slotmap::{new_key_type, Key};

new_key_type! {
    /// Handle to a live node in a [`CircuitGraph`](crate::graph::CircuitGraph).
    pub struct NodeId;

    /// Handle to a live wire in a [`CircuitGraph`](crate::graph::CircuitGraph).
    pub struct WireId;
}

// Display implementations print `slot v generation`, matching slotmap's debug form.

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node {:?}", self.data())
    }
}

impl fmt::Display for WireId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "wire {:?}", self.data())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    #[test]
    fn stale_handle_does_not_alias_reused_slot() {
        let mut arena: SlotMap<NodeId, &str> = SlotMap::with_key();
        let first = arena.insert("first");
        arena.remove(first);
        let second = arena.insert("second");

        assert_ne!(first, second);
        assert!(arena.get(first).is_none());
        assert_eq!(arena[second], "second");
    }

    #[test]
    fn null_handles_are_distinct_types() {
        // Both default to the null key but cannot be mixed at the type level.
        assert!(NodeId::default().is_null());
        assert!(WireId::default().is_null());
    }

    #[test]
    fn display_names_the_entity() {
        let mut arena: SlotMap<WireId, ()> = SlotMap::with_key();
        let id = arena.insert(());
        assert!(format!("{}", id).starts_with("wire "));
    }

    #[test]
    fn serde_roundtrip() {
        let mut arena: SlotMap<NodeId, ()> = SlotMap::with_key();
        let id = arena.insert(());
        let json = serde_json::to_string(&id).unwrap();
        let back: NodeId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
