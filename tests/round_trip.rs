use pretty_assertions::assert_eq;
use todotree::{Filter, MemoryStore, ROOT_PATH, TodoTree, from_blob, load_tree, save_tree, to_blob};

/// Helper: serialize, deserialize, and assert the restored tree is
/// isomorphic (same pre-order shape, titles, and completed flags).
fn assert_blob_round_trip(tree: &TodoTree) {
    let blob = to_blob(tree).unwrap();
    let restored = from_blob(Some(&blob)).unwrap();
    assert_eq!(
        restored.flatten(Filter::All),
        tree.flatten(Filter::All),
        "round-trip changed the tree"
    );
}

/// A tree exercised through every mutating operation: nested creation,
/// completion cascades, indent/unindent, a reorder, and a purge.
fn well_worked_tree() -> TodoTree {
    let mut tree = TodoTree::new();
    let groceries = tree.create_child(ROOT_PATH, "groceries", None).unwrap();
    tree.create_child(&groceries, "milk", None).unwrap();
    tree.create_child(&groceries, "bread", None).unwrap();
    let chores = tree.create_child(ROOT_PATH, "chores", None).unwrap();
    tree.create_child(&chores, "dishes", None).unwrap();
    tree.create_child(ROOT_PATH, "call the bank", None).unwrap();

    tree.set_completed("root-0-0", true).unwrap();
    let indented = tree.indent("root-2").unwrap();
    tree.unindent(&indented).unwrap();
    tree.move_node("root-2", ROOT_PATH, Some(0)).unwrap();
    tree.set_completed("root-1-1", true).unwrap();
    tree.purge_completed("root-1").unwrap();
    tree
}

// ============================================================================
// Blob round trips
// ============================================================================

#[test]
fn round_trip_empty_tree() {
    assert_blob_round_trip(&TodoTree::new());
}

#[test]
fn round_trip_single_item() {
    let mut tree = TodoTree::new();
    tree.create_child(ROOT_PATH, "only", None).unwrap();
    assert_blob_round_trip(&tree);
}

#[test]
fn round_trip_well_worked_tree() {
    assert_blob_round_trip(&well_worked_tree());
}

#[test]
fn round_trip_deep_chain() {
    let mut tree = TodoTree::new();
    let mut parent = ROOT_PATH.to_string();
    for i in 0..12 {
        parent = tree
            .create_child(&parent, &format!("level {i}"), None)
            .unwrap();
    }
    tree.set_completed("root-0-0-0-0", true).unwrap();
    assert_blob_round_trip(&tree);
}

#[test]
fn round_trip_preserves_mixed_completion() {
    let mut tree = TodoTree::new();
    let a = tree.create_child(ROOT_PATH, "a", None).unwrap();
    tree.create_child(&a, "a1", None).unwrap();
    tree.create_child(&a, "a2", None).unwrap();
    tree.set_completed("root-0-0", true).unwrap();

    let restored = from_blob(Some(&to_blob(&tree).unwrap())).unwrap();
    assert!(restored.completed("root-0-0").unwrap());
    assert!(!restored.completed("root-0-1").unwrap());
    assert!(!restored.completed("root-0").unwrap());
}

#[test]
fn round_trip_empty_and_duplicate_titles() {
    let mut tree = TodoTree::new();
    tree.create_child(ROOT_PATH, "", None).unwrap();
    tree.create_child(ROOT_PATH, "twin", None).unwrap();
    tree.create_child(ROOT_PATH, "twin", None).unwrap();
    tree.create_child(ROOT_PATH, "odd - title -- with hyphens", None)
        .unwrap();
    assert_blob_round_trip(&tree);
}

#[test]
fn serializing_twice_yields_identical_blobs() {
    let tree = well_worked_tree();
    let first = to_blob(&tree).unwrap();
    let again = to_blob(&from_blob(Some(&first)).unwrap()).unwrap();
    assert_eq!(first, again);
}

// ============================================================================
// Through a store
// ============================================================================

#[test]
fn round_trip_through_a_store_slot() {
    let mut store = MemoryStore::new();
    let tree = well_worked_tree();
    save_tree(&mut store, "todos", &tree).unwrap();
    let loaded = load_tree(&store, "todos").unwrap();
    assert_eq!(loaded.flatten(Filter::All), tree.flatten(Filter::All));
    assert!(!loaded.is_dirty());
}

#[test]
fn fresh_store_slot_starts_empty() {
    let store = MemoryStore::new();
    let tree = load_tree(&store, "todos").unwrap();
    assert!(tree.is_empty());
    assert_eq!(tree.counts().total, 0);
}
