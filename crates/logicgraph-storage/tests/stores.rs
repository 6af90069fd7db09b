//! The same contract checked against every store backend.

use logicgraph_core::{CircuitGraph, Color, Gate, Group, Position, Rect};
use logicgraph_storage::{
    hash_circuit, write_circuit, CircuitId, CircuitStore, DirectoryStore, InMemoryStore,
    SqliteStore, StorageError,
};

fn adder() -> CircuitGraph {
    let mut graph = CircuitGraph::new();
    let a = graph.create_node(Position::new(0, 0), Gate::Or).unwrap();
    let b = graph.create_node(Position::new(0, 16), Gate::Or).unwrap();
    let sum = graph.create_node(Position::new(32, 0), Gate::Xor).unwrap();
    let carry = graph.create_node(Position::new(32, 16), Gate::And).unwrap();
    for input in [a, b] {
        graph.connect(input, sum).unwrap();
        graph.connect(input, carry).unwrap();
    }
    graph.set_name(a, Some("a".into())).unwrap();
    graph.set_name(b, Some("b".into())).unwrap();
    graph.set_name(sum, Some("sum".into())).unwrap();
    graph.create_group(Group::new(Rect::new(-4, -4, 40, 24), Color::YELLOW, "half adder"));
    graph
}

fn exercise(store: &mut dyn CircuitStore) {
    let first = store.create("adder").unwrap();
    let second = store.create("scratch").unwrap();
    assert_ne!(first, second);

    let graph = adder();
    store.save(first, &graph).unwrap();
    let loaded = store.load(first).unwrap();
    loaded.validate().unwrap();
    assert_eq!(write_circuit(&loaded), write_circuit(&graph));

    let listed = store.list().unwrap();
    assert_eq!(
        listed.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
        vec!["adder", "scratch"]
    );
    assert_eq!(
        listed[0].checksum.as_deref(),
        Some(hash_circuit(&graph).to_hex().as_str())
    );
    assert_eq!(store.find_by_name("scratch").unwrap().unwrap().id, second);

    // Saving again replaces everything.
    let mut edited = loaded;
    let extra = edited.create_node(Position::new(64, 0), Gate::Battery).unwrap();
    edited.connect(extra, edited.find_node_by_name("sum").unwrap()).unwrap();
    store.save(first, &edited).unwrap();
    let reloaded = store.load(first).unwrap();
    assert_eq!(reloaded.node_count(), 5);
    assert_eq!(reloaded.wire_count(), 5);

    assert_eq!(store.load(second).unwrap().node_count(), 0);

    store.delete(second).unwrap();
    assert!(matches!(store.load(second), Err(StorageError::CircuitNotFound(_))));
    assert!(matches!(store.delete(second), Err(StorageError::CircuitNotFound(_))));
    assert!(matches!(
        store.save(CircuitId(999), &graph),
        Err(StorageError::CircuitNotFound(999))
    ));
    assert_eq!(store.list().unwrap().len(), 1);

    for bad in ["", "  ", "a/b", ".hidden"] {
        assert!(matches!(store.create(bad), Err(StorageError::InvalidName { .. })));
    }
}

#[test]
fn in_memory_store() {
    exercise(&mut InMemoryStore::new());
}

#[test]
fn directory_store() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = DirectoryStore::open(dir.path().join("circuits")).unwrap();
    exercise(&mut store);
    assert!(store.root().join("1-adder.lgc").exists());
}

#[test]
fn directory_store_ignores_foreign_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("notes.txt"), "hello").unwrap();
    std::fs::write(dir.path().join("draft.lgc"), "v2\n0\n0\n0\n").unwrap();
    let mut store = DirectoryStore::open(dir.path()).unwrap();
    assert!(store.list().unwrap().is_empty());
    assert_eq!(store.create("first").unwrap(), CircuitId(1));
}

#[test]
fn sqlite_store() {
    exercise(&mut SqliteStore::in_memory().unwrap());
}

#[test]
fn sqlite_store_on_disk_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("circuits.db");
    let path = path.to_str().unwrap();
    let id = {
        let mut store = SqliteStore::new(path).unwrap();
        let id = store.create("adder").unwrap();
        store.save(id, &adder()).unwrap();
        id
    };
    let store = SqliteStore::new(path).unwrap();
    let loaded = store.load(id).unwrap();
    assert_eq!(write_circuit(&loaded), write_circuit(&adder()));
}
